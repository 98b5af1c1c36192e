/// Backend trait - the graphics API surface consumed by the render graph
///
/// Context creation, draw issuance and resource upload are the backend's
/// business. The render graph only binds targets, sets viewports and clear
/// state, swaps override shadings and submits named batches.

use std::sync::Arc;
use glam::Vec4;
use winit::dpi::PhysicalSize;

use crate::backend::{FboProvider, FramebufferDesc, Shading, Viewport};
use crate::error::Result;

/// Callback invoked by the backend after the render surface changed size
pub type ResizeHook = Box<dyn FnMut(PhysicalSize<u32>)>;

/// Graphics backend driven by `RenderPass` and `EffectComposer`
///
/// All calls are synchronous from the graph's point of view; a backend may
/// queue GPU work internally but the graph never waits on it.
pub trait Backend {
    /// Current render surface size in pixels
    fn render_size(&self) -> PhysicalSize<u32>;

    /// Create a physical framebuffer
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` or `Error::BackendError` when creation fails.
    /// The graph does not retry.
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FboProvider>;

    /// Release a physical framebuffer created by `create_framebuffer`
    fn delete_framebuffer(&mut self, framebuffer: &FboProvider);

    /// Bind a framebuffer, or the default surface when `None`
    fn set_render_target(&mut self, framebuffer: Option<&FboProvider>);

    /// Bind the default surface
    fn set_render_target_screen(&mut self) {
        self.set_render_target(None);
    }

    /// Set the viewport in pixels
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set the viewport to cover the whole render surface
    fn set_full_screen_viewport(&mut self);

    /// Clear the color attachment of the bound target
    fn clear_color(&mut self);

    /// Clear the depth attachment of the bound target
    fn clear_depth(&mut self);

    /// Set the color used by subsequent `clear_color` calls
    fn set_clear_color(&mut self, color: Vec4);

    /// Restore the backend's default clear color
    fn reset_default_clear_color(&mut self);

    /// Activate an override shading for subsequent submissions, or clear it
    fn set_override_shading(&mut self, shading: Option<Arc<dyn Shading>>);

    /// Currently active override shading
    fn override_shading(&self) -> Option<Arc<dyn Shading>>;

    /// Submit one named batch of draw calls
    fn render(&mut self, source: &str) -> Result<()>;

    /// Blit a framebuffer onto the screen inside `viewport` (debug view)
    fn render_framebuffer(&mut self, framebuffer: &FboProvider, viewport: Viewport);

    /// Register a callback fired whenever the render surface resizes
    fn hook_resize(&mut self, hook: ResizeHook);
}
