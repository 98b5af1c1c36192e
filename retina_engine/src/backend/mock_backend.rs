/// Mock Backend for unit tests (no GPU required)
///
/// Records every call the render graph makes so tests can assert on
/// ordering, and exposes knobs to fire resizes and inject failures.

use std::sync::{Arc, Mutex};
use glam::Vec4;
use winit::dpi::PhysicalSize;

use crate::backend::{
    Backend, Framebuffer, FboProvider, FramebufferDesc, PixelFormat, ResizeHook, Shading,
    Viewport,
};
use crate::error::{Error, Result};
use crate::engine_bail;

// ============================================================================
// Mock Framebuffer
// ============================================================================

#[derive(Debug)]
pub struct MockFramebuffer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
    pub format: PixelFormat,
}

impl Framebuffer for MockFramebuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn has_depth(&self) -> bool {
        self.depth
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }
}

// ============================================================================
// Mock Shading
// ============================================================================

#[derive(Debug)]
pub struct MockShading {
    pub name: String,
    /// (framebuffer name, uniform name) pairs in binding order
    pub inputs: Mutex<Vec<(String, String)>>,
}

impl MockShading {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn bound_inputs(&self) -> Vec<(String, String)> {
        self.inputs.lock().unwrap().clone()
    }
}

impl Shading for MockShading {
    fn name(&self) -> &str {
        &self.name
    }

    fn define_fbo_input(&self, framebuffer_name: &str, uniform_name: &str) {
        self.inputs
            .lock()
            .unwrap()
            .push((framebuffer_name.to_string(), uniform_name.to_string()));
    }
}

// ============================================================================
// Recorded calls
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateFramebuffer(String),
    DeleteFramebuffer(String),
    /// Framebuffer name, `None` for the screen
    SetRenderTarget(Option<String>),
    SetViewport(Viewport),
    SetFullScreenViewport,
    ClearColor,
    ClearDepth,
    SetClearColor(Vec4),
    ResetDefaultClearColor,
    /// Shading name, `None` when cleared
    SetOverrideShading(Option<String>),
    Render(String),
    RenderFramebuffer(String, Viewport),
}

// ============================================================================
// Mock Backend
// ============================================================================

pub struct MockBackend {
    pub size: PhysicalSize<u32>,
    pub calls: Vec<BackendCall>,
    pub created_framebuffers: Vec<String>,
    pub deleted_framebuffers: Vec<String>,
    /// Fail the next `create_framebuffer` call with OutOfMemory
    pub fail_next_create: bool,
    /// Fail `render` for this source name
    pub failing_source: Option<String>,
    override_shading: Option<Arc<dyn Shading>>,
    resize_hooks: Vec<ResizeHook>,
}

impl MockBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            calls: Vec::new(),
            created_framebuffers: Vec::new(),
            deleted_framebuffers: Vec::new(),
            fail_next_create: false,
            failing_source: None,
            override_shading: None,
            resize_hooks: Vec::new(),
        }
    }

    /// Change the surface size and fire every registered resize hook
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = PhysicalSize::new(width, height);
        let size = self.size;
        for hook in self.resize_hooks.iter_mut() {
            hook(size);
        }
    }

    pub fn resize_hook_count(&self) -> usize {
        self.resize_hooks.len()
    }

    /// Sources submitted through `render`, in order
    pub fn rendered_sources(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Render(source) => Some(source.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, expected: &BackendCall) -> usize {
        self.calls.iter().filter(|call| *call == expected).count()
    }

    pub fn position(&self, expected: &BackendCall) -> Option<usize> {
        self.calls.iter().position(|call| call == expected)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Backend for MockBackend {
    fn render_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FboProvider> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::OutOfMemory);
        }
        self.calls.push(BackendCall::CreateFramebuffer(desc.name.clone()));
        self.created_framebuffers.push(desc.name.clone());
        Ok(Arc::new(MockFramebuffer {
            name: desc.name.clone(),
            width: desc.width,
            height: desc.height,
            depth: desc.enable_depth,
            format: desc.pixel_format,
        }))
    }

    fn delete_framebuffer(&mut self, framebuffer: &FboProvider) {
        self.calls.push(BackendCall::DeleteFramebuffer(framebuffer.name().to_string()));
        self.deleted_framebuffers.push(framebuffer.name().to_string());
    }

    fn set_render_target(&mut self, framebuffer: Option<&FboProvider>) {
        self.calls.push(BackendCall::SetRenderTarget(
            framebuffer.map(|fb| fb.name().to_string()),
        ));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(BackendCall::SetViewport(viewport));
    }

    fn set_full_screen_viewport(&mut self) {
        self.calls.push(BackendCall::SetFullScreenViewport);
    }

    fn clear_color(&mut self) {
        self.calls.push(BackendCall::ClearColor);
    }

    fn clear_depth(&mut self) {
        self.calls.push(BackendCall::ClearDepth);
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.calls.push(BackendCall::SetClearColor(color));
    }

    fn reset_default_clear_color(&mut self) {
        self.calls.push(BackendCall::ResetDefaultClearColor);
    }

    fn set_override_shading(&mut self, shading: Option<Arc<dyn Shading>>) {
        self.calls.push(BackendCall::SetOverrideShading(
            shading.as_ref().map(|s| s.name().to_string()),
        ));
        self.override_shading = shading;
    }

    fn override_shading(&self) -> Option<Arc<dyn Shading>> {
        self.override_shading.clone()
    }

    fn render(&mut self, source: &str) -> Result<()> {
        if self.failing_source.as_deref() == Some(source) {
            engine_bail!("retina::mock", "render: source '{}' rejected", source);
        }
        self.calls.push(BackendCall::Render(source.to_string()));
        Ok(())
    }

    fn render_framebuffer(&mut self, framebuffer: &FboProvider, viewport: Viewport) {
        self.calls.push(BackendCall::RenderFramebuffer(
            framebuffer.name().to_string(),
            viewport,
        ));
    }

    fn hook_resize(&mut self, hook: ResizeHook) {
        self.resize_hooks.push(hook);
    }
}
