/// Render target nodes - logical rendering destinations.
///
/// A `RenderTargetNode` is a descriptor, not a GPU resource: it states the
/// format a destination needs (pixel format, size policy, depth) and the
/// graph resolves it to a pooled physical framebuffer each frame. The screen
/// is a node too, but it is never pooled.
///
/// Nodes live in a `RenderTargets` table and are referenced by
/// `RenderTargetKey`.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use uuid::Uuid;
use winit::dpi::PhysicalSize;

use crate::backend::{FormatKey, FramebufferDesc, PixelFormat, Viewport};
use crate::error::{Error, Result};
use crate::engine_err;

new_key_type! {
    /// Stable handle to a render target within one `RenderTargets` table
    pub struct RenderTargetKey;
}

/// How a target's absolute size is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionPolicy {
    /// Follow the render surface size
    BindRenderSize,
    /// Fixed size in pixels
    Fixed { width: u32, height: u32 },
}

/// Format requested by a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormat {
    pub pixel_format: PixelFormat,
    pub dimension: DimensionPolicy,
    pub enable_depth: bool,
}

impl TargetFormat {
    /// RGBA with depth, sized to the render surface
    pub fn bind_render_size() -> Self {
        Self {
            pixel_format: PixelFormat::Rgba,
            dimension: DimensionPolicy::BindRenderSize,
            enable_depth: true,
        }
    }

    /// RGBA with depth, fixed size
    pub fn fixed(width: u32, height: u32) -> Self {
        Self {
            dimension: DimensionPolicy::Fixed { width, height },
            ..Self::bind_render_size()
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_depth(mut self, enable_depth: bool) -> Self {
        self.enable_depth = enable_depth;
        self
    }
}

impl Default for TargetFormat {
    fn default() -> Self {
        Self::bind_render_size()
    }
}

pub struct RenderTargetNode {
    name: String,
    uuid: Uuid,
    is_screen: bool,
    format: TargetFormat,
    /// Opt out of drop-list recycling; the content survives across passes and frames
    keep_content: bool,
    width_abs: u32,
    height_abs: u32,
    debug_viewport: Viewport,
}

impl RenderTargetNode {
    pub(crate) fn new(name: &str, format: TargetFormat, keep_content: bool) -> Self {
        let (width_abs, height_abs) = match format.dimension {
            DimensionPolicy::Fixed { width, height } => (width.max(1), height.max(1)),
            DimensionPolicy::BindRenderSize => (1, 1),
        };
        Self {
            name: name.to_string(),
            uuid: Uuid::new_v4(),
            is_screen: false,
            format,
            keep_content,
            width_abs,
            height_abs,
            debug_viewport: Viewport::default(),
        }
    }

    pub(crate) fn screen(name: &str) -> Self {
        Self {
            is_screen: true,
            ..Self::new(name, TargetFormat::bind_render_size(), false)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn is_screen(&self) -> bool {
        self.is_screen
    }

    pub fn format(&self) -> &TargetFormat {
        &self.format
    }

    pub fn keep_content(&self) -> bool {
        self.keep_content
    }

    pub fn enable_depth(&self) -> bool {
        self.format.enable_depth
    }

    pub fn width_abs(&self) -> u32 {
        self.width_abs
    }

    pub fn height_abs(&self) -> u32 {
        self.height_abs
    }

    pub fn debug_viewport(&self) -> Viewport {
        self.debug_viewport
    }

    /// Recompute the absolute size from the render surface size
    ///
    /// Fixed targets ignore the surface. Sizes never drop below 1x1.
    pub fn update_size(&mut self, render_size: PhysicalSize<u32>) {
        let (width, height) = match self.format.dimension {
            DimensionPolicy::BindRenderSize => (render_size.width, render_size.height),
            DimensionPolicy::Fixed { width, height } => (width, height),
        };
        self.width_abs = width.max(1);
        self.height_abs = height.max(1);
    }

    /// Pooling key derived from the current absolute size
    pub fn format_key(&self) -> FormatKey {
        FormatKey {
            pixel_format: self.format.pixel_format,
            width: self.width_abs,
            height: self.height_abs,
            depth: self.format.enable_depth,
        }
    }

    /// Descriptor for a physical framebuffer satisfying this target
    pub fn framebuffer_desc(&self, name: String) -> FramebufferDesc {
        FramebufferDesc {
            name,
            width: self.width_abs,
            height: self.height_abs,
            enable_depth: self.format.enable_depth,
            pixel_format: self.format.pixel_format,
        }
    }

    pub(crate) fn set_debug_viewport(&mut self, viewport: Viewport) {
        self.debug_viewport = viewport;
    }
}

/// Table of render target nodes for one graph
///
/// Names are unique. The screen node is created with the table and
/// survives `clear()`. Keys are only meaningful in the table that issued
/// them; every table carries an id so passes and the composer can tell
/// tables apart.
pub struct RenderTargets {
    id: Uuid,
    nodes: SlotMap<RenderTargetKey, RenderTargetNode>,
    names: FxHashMap<String, RenderTargetKey>,
    /// Offscreen targets in creation order
    order: Vec<RenderTargetKey>,
    screen: RenderTargetKey,
}

impl RenderTargets {
    pub fn new(screen_name: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let screen = nodes.insert(RenderTargetNode::screen(screen_name));
        let mut names = FxHashMap::default();
        names.insert(screen_name.to_string(), screen);
        Self {
            id: Uuid::new_v4(),
            nodes,
            names,
            order: Vec::new(),
            screen,
        }
    }

    /// Create a named offscreen target
    ///
    /// # Errors
    ///
    /// `Error::InvalidGraph` if the name is already taken (the screen name included).
    pub fn create_render_target(
        &mut self,
        name: &str,
        format: TargetFormat,
        keep_content: bool,
    ) -> Result<RenderTargetKey> {
        if self.names.contains_key(name) {
            return Err(engine_err!("retina::RenderTargets",
                Error::InvalidGraph(format!("render target '{}' already exists", name))));
        }
        let key = self.nodes.insert(RenderTargetNode::new(name, format, keep_content));
        self.names.insert(name.to_string(), key);
        self.order.push(key);
        Ok(key)
    }

    /// Identity of this table, unchanged by `clear()`
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Key of the screen node
    pub fn screen(&self) -> RenderTargetKey {
        self.screen
    }

    pub fn key(&self, name: &str) -> Option<RenderTargetKey> {
        self.names.get(name).copied()
    }

    pub fn get(&self, key: RenderTargetKey) -> Option<&RenderTargetNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: RenderTargetKey) -> Option<&mut RenderTargetNode> {
        self.nodes.get_mut(key)
    }

    /// Like `get`, but an unknown key is a graph error
    pub fn node(&self, key: RenderTargetKey) -> Result<&RenderTargetNode> {
        self.nodes.get(key).ok_or_else(|| {
            engine_err!("retina::RenderTargets",
                Error::InvalidGraph("render target key does not belong to this graph".to_string()))
        })
    }

    pub fn node_mut(&mut self, key: RenderTargetKey) -> Result<&mut RenderTargetNode> {
        self.nodes.get_mut(key).ok_or_else(|| {
            engine_err!("retina::RenderTargets",
                Error::InvalidGraph("render target key does not belong to this graph".to_string()))
        })
    }

    /// Number of nodes, the screen included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Offscreen targets in creation order
    pub fn offscreen_keys(&self) -> &[RenderTargetKey] {
        &self.order
    }

    /// Refresh every node's absolute size
    pub fn update_sizes(&mut self, render_size: PhysicalSize<u32>) {
        for (_, node) in self.nodes.iter_mut() {
            node.update_size(render_size);
        }
    }

    /// Assign debug viewports
    ///
    /// Offscreen targets are stacked as tiles in a left column whose width is
    /// `column_ratio` of the surface; the screen gets the area to its right.
    pub fn layout_debug_viewports(&mut self, render_size: PhysicalSize<u32>, column_ratio: f32) {
        let width = render_size.width as f32;
        let height = render_size.height as f32;
        let tile_width = width * column_ratio.clamp(0.0, 1.0);
        let tile_height = if width > 0.0 { tile_width * height / width } else { 0.0 };

        for (index, key) in self.order.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(*key) {
                node.set_debug_viewport(Viewport::new(
                    0.0,
                    index as f32 * tile_height,
                    tile_width,
                    tile_height,
                ));
            }
        }

        if let Some(screen) = self.nodes.get_mut(self.screen) {
            screen.set_debug_viewport(Viewport::new(tile_width, 0.0, width - tile_width, height));
        }
    }

    /// Remove every offscreen target, keeping the screen node
    pub fn clear(&mut self) {
        let screen = self.screen;
        self.nodes.retain(|key, _| key == screen);
        self.names.retain(|_, key| *key == screen);
        self.order.clear();
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
