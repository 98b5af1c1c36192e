#![allow(dead_code)]
//! Backend test utilities - a headless Backend for integration tests
//!
//! `HeadlessBackend` implements the public `Backend` trait the way an
//! application would, without a GPU. Every call is appended to an event log
//! as a short string (`"target:<fb>"`, `"render:<source>"`, ...) so tests can
//! assert on frame structure through the public API only.

use retina_engine::glam::Vec4;
use retina_engine::retina::backend::{
    Backend, FboProvider, Framebuffer, FramebufferDesc, PhysicalSize, PixelFormat, ResizeHook,
    Shading, Viewport,
};
use retina_engine::retina::{Error, Result};
use std::sync::{Arc, Mutex};

// ============================================================================
// FRAMEBUFFER / SHADING
// ============================================================================

#[derive(Debug)]
pub struct HeadlessFramebuffer {
    desc: FramebufferDesc,
}

impl Framebuffer for HeadlessFramebuffer {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn width(&self) -> u32 {
        self.desc.width
    }

    fn height(&self) -> u32 {
        self.desc.height
    }

    fn has_depth(&self) -> bool {
        self.desc.enable_depth
    }

    fn pixel_format(&self) -> PixelFormat {
        self.desc.pixel_format
    }
}

/// Shading that remembers which framebuffer fed which uniform
#[derive(Debug, Default)]
pub struct RecordingShading {
    name: String,
    bindings: Mutex<Vec<(String, String)>>,
}

impl RecordingShading {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            bindings: Mutex::new(Vec::new()),
        })
    }

    /// (uniform name, framebuffer name) pairs, oldest first
    pub fn bindings(&self) -> Vec<(String, String)> {
        self.bindings.lock().unwrap().clone()
    }

    /// Framebuffer most recently bound to `uniform`
    pub fn last_bound(&self, uniform: &str) -> Option<String> {
        self.bindings
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == uniform)
            .map(|(_, framebuffer)| framebuffer.clone())
    }
}

impl Shading for RecordingShading {
    fn name(&self) -> &str {
        &self.name
    }

    fn define_fbo_input(&self, framebuffer_name: &str, uniform_name: &str) {
        self.bindings
            .lock()
            .unwrap()
            .push((uniform_name.to_string(), framebuffer_name.to_string()));
    }
}

// ============================================================================
// BACKEND
// ============================================================================

pub struct HeadlessBackend {
    size: PhysicalSize<u32>,
    pub events: Vec<String>,
    pub live_framebuffers: usize,
    /// Allocation budget; creation fails with OutOfMemory once exhausted
    pub framebuffer_budget: Option<usize>,
    shading: Option<Arc<dyn Shading>>,
    hooks: Vec<ResizeHook>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            events: Vec::new(),
            live_framebuffers: 0,
            framebuffer_budget: None,
            shading: None,
            hooks: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = PhysicalSize::new(width, height);
        let size = self.size;
        for hook in &mut self.hooks {
            hook(size);
        }
    }

    /// Events starting with `prefix`, prefix stripped
    pub fn events_of(&self, prefix: &str) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }
}

impl Backend for HeadlessBackend {
    fn render_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FboProvider> {
        if let Some(budget) = self.framebuffer_budget {
            if self.live_framebuffers >= budget {
                return Err(Error::OutOfMemory);
            }
        }
        self.live_framebuffers += 1;
        self.events.push(format!("create:{}", desc.name));
        Ok(Arc::new(HeadlessFramebuffer { desc: desc.clone() }))
    }

    fn delete_framebuffer(&mut self, framebuffer: &FboProvider) {
        self.live_framebuffers -= 1;
        self.events.push(format!("delete:{}", framebuffer.name()));
    }

    fn set_render_target(&mut self, framebuffer: Option<&FboProvider>) {
        let name = framebuffer.map_or("screen", |fb| fb.name());
        self.events.push(format!("target:{}", name));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.events.push(format!(
            "viewport:{}x{}+{}+{}",
            viewport.width, viewport.height, viewport.x, viewport.y
        ));
    }

    fn set_full_screen_viewport(&mut self) {
        let size = self.size;
        self.events.push(format!("viewport:{}x{}+0+0", size.width, size.height));
    }

    fn clear_color(&mut self) {
        self.events.push("clear:color".to_string());
    }

    fn clear_depth(&mut self) {
        self.events.push("clear:depth".to_string());
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.events.push(format!("clear_color:{:?}", color.to_array()));
    }

    fn reset_default_clear_color(&mut self) {}

    fn set_override_shading(&mut self, shading: Option<Arc<dyn Shading>>) {
        if let Some(shading) = &shading {
            self.events.push(format!("shading:{}", shading.name()));
        }
        self.shading = shading;
    }

    fn override_shading(&self) -> Option<Arc<dyn Shading>> {
        self.shading.clone()
    }

    fn render(&mut self, source: &str) -> Result<()> {
        self.events.push(format!("render:{}", source));
        Ok(())
    }

    fn render_framebuffer(&mut self, framebuffer: &FboProvider, _viewport: Viewport) {
        self.events.push(format!("blit:{}", framebuffer.name()));
    }

    fn hook_resize(&mut self, hook: ResizeHook) {
        self.hooks.push(hook);
    }
}
