/// Render pass - one step of a render graph.
///
/// A pass draws an ordered list of named batches into one output target,
/// optionally through an override shading whose texture uniforms are fed by
/// other targets (the pass's inputs). The composer resolves every target to a
/// physical framebuffer before calling `execute()`; a pass never allocates.

use std::sync::Arc;
use bitflags::bitflags;
use glam::Vec4;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::backend::{Backend, FboProvider, Shading, Viewport};
use crate::error::{Error, Result};
use crate::{engine_err, engine_error};
use super::render_target::{RenderTargetKey, RenderTargets};

/// Callback run around a pass's draw submission
///
/// Errors abort the remaining passes of the frame.
pub type PassHook = Box<dyn FnMut() -> Result<()>>;

bitflags! {
    /// Attachments cleared before a pass draws
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Binds a render target to a texture uniform of the pass's shading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInput {
    /// Render target name
    pub name: String,
    /// Uniform name in the override shading
    pub map_to: String,
}

/// Description of a pass, referencing targets by name
///
/// ```ignore
/// let blur = PassDesc::new("blur", "blurred")
///     .with_input("scene", "u_source")
///     .with_source("fullscreen_quad")
///     .with_shading(blur_shading);
/// ```
pub struct PassDesc {
    pub name: String,
    pub inputs: Vec<PassInput>,
    /// Output target name (the graph's screen name for the screen)
    pub output: String,
    /// Batches submitted in order
    pub source: Vec<String>,
    pub shading: Option<Arc<dyn Shading>>,
    pub enable_color_clear: bool,
    pub enable_depth_clear: bool,
    pub clear_color: Option<Vec4>,
    pub before_pass_execute: Option<PassHook>,
    pub after_pass_execute: Option<PassHook>,
}

impl PassDesc {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            output: output.to_string(),
            source: Vec::new(),
            shading: None,
            enable_color_clear: true,
            enable_depth_clear: true,
            clear_color: None,
            before_pass_execute: None,
            after_pass_execute: None,
        }
    }

    /// Read `target` through the uniform `uniform`
    pub fn with_input(mut self, target: &str, uniform: &str) -> Self {
        self.inputs.push(PassInput {
            name: target.to_string(),
            map_to: uniform.to_string(),
        });
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source.push(source.to_string());
        self
    }

    pub fn with_shading(mut self, shading: Arc<dyn Shading>) -> Self {
        self.shading = Some(shading);
        self
    }

    pub fn with_clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = Some(color);
        self
    }

    pub fn without_color_clear(mut self) -> Self {
        self.enable_color_clear = false;
        self
    }

    pub fn without_depth_clear(mut self) -> Self {
        self.enable_depth_clear = false;
        self
    }

    pub fn before_execute<F>(mut self, hook: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.before_pass_execute = Some(Box::new(hook));
        self
    }

    pub fn after_execute<F>(mut self, hook: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.after_pass_execute = Some(Box::new(hook));
        self
    }
}

pub struct RenderPass {
    name: String,
    source: Vec<String>,
    /// Id of the `RenderTargets` table the keys below come from
    targets_id: Uuid,
    output: RenderTargetKey,
    output_name: String,
    output_is_screen: bool,
    /// uniform name -> target, in declaration order
    inputs: Vec<(String, RenderTargetKey)>,
    depends: FxHashSet<RenderTargetKey>,
    /// uniform name -> framebuffer, resolved by the composer each frame
    framebuffer_bindings: Vec<(String, FboProvider)>,
    shading: Option<Arc<dyn Shading>>,
    clear: ClearFlags,
    clear_color: Option<Vec4>,
    before_pass_execute: Option<PassHook>,
    after_pass_execute: Option<PassHook>,
}

impl RenderPass {
    /// Resolve a description against a target table
    ///
    /// Reading and writing the same target is accepted here and rejected by
    /// `check_is_valid()`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidGraph` if a target name is unknown, or if an input
    /// names the screen.
    pub fn new(desc: PassDesc, targets: &RenderTargets) -> Result<Self> {
        let output = targets.key(&desc.output).ok_or_else(|| {
            engine_err!("retina::RenderPass", Error::InvalidGraph(format!(
                "pass '{}' outputs to unknown render target '{}'", desc.name, desc.output)))
        })?;

        let mut inputs = Vec::with_capacity(desc.inputs.len());
        let mut depends = FxHashSet::default();
        for input in &desc.inputs {
            let key = targets.key(&input.name).ok_or_else(|| {
                engine_err!("retina::RenderPass", Error::InvalidGraph(format!(
                    "pass '{}' reads unknown render target '{}'", desc.name, input.name)))
            })?;
            if key == targets.screen() {
                return Err(engine_err!("retina::RenderPass", Error::InvalidGraph(format!(
                    "pass '{}' cannot read the screen", desc.name))));
            }
            inputs.push((input.map_to.clone(), key));
            depends.insert(key);
        }

        let mut clear = ClearFlags::empty();
        clear.set(ClearFlags::COLOR, desc.enable_color_clear);
        clear.set(ClearFlags::DEPTH, desc.enable_depth_clear);

        Ok(Self {
            name: desc.name,
            source: desc.source,
            targets_id: targets.id(),
            output,
            output_name: desc.output,
            output_is_screen: output == targets.screen(),
            inputs,
            depends,
            framebuffer_bindings: Vec::new(),
            shading: desc.shading,
            clear,
            clear_color: desc.clear_color,
            before_pass_execute: desc.before_pass_execute,
            after_pass_execute: desc.after_pass_execute,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Id of the target table this pass was resolved against
    pub fn targets_id(&self) -> Uuid {
        self.targets_id
    }

    pub fn output(&self) -> RenderTargetKey {
        self.output
    }

    pub fn is_output_screen(&self) -> bool {
        self.output_is_screen
    }

    /// (uniform name, target) pairs in declaration order
    pub fn inputs(&self) -> &[(String, RenderTargetKey)] {
        &self.inputs
    }

    /// Every target this pass reads
    pub fn framebuffers_depends(&self) -> &FxHashSet<RenderTargetKey> {
        &self.depends
    }

    pub fn depends_on(&self, target: RenderTargetKey) -> bool {
        self.depends.contains(&target)
    }

    /// (uniform name, framebuffer) pairs bound for the current frame
    pub fn framebuffer_bindings(&self) -> &[(String, FboProvider)] {
        &self.framebuffer_bindings
    }

    pub fn clear_flags(&self) -> ClearFlags {
        self.clear
    }

    pub(crate) fn set_framebuffer_bindings(&mut self, bindings: Vec<(String, FboProvider)>) {
        self.framebuffer_bindings = bindings;
    }

    /// Reject a pass that reads the target it writes
    ///
    /// # Errors
    ///
    /// `Error::HazardViolation` naming the pass and target.
    pub fn check_is_valid(&self) -> Result<()> {
        if self.output_is_screen {
            return Ok(());
        }
        if self.depends.contains(&self.output) {
            return Err(engine_err!("retina::RenderPass", Error::HazardViolation {
                pass: self.name.clone(),
                target: self.output_name.clone(),
            }));
        }
        Ok(())
    }

    /// Run the pass
    ///
    /// `framebuffer` is the resolved output (`None` for the screen). Backend
    /// override shading and clear color are restored even when a hook or a
    /// submission fails.
    pub fn execute(
        &mut self,
        backend: &mut dyn Backend,
        framebuffer: Option<&FboProvider>,
        targets: &RenderTargets,
        enable_graph_debugging: bool,
    ) -> Result<()> {
        let result = self.record(backend, framebuffer, targets, enable_graph_debugging);

        backend.set_override_shading(None);
        backend.reset_default_clear_color();

        if let Err(err) = &result {
            engine_error!("retina::RenderPass", "Pass '{}' failed: {}", self.name, err);
            return result;
        }

        if enable_graph_debugging && !self.output_is_screen {
            if let Some(framebuffer) = framebuffer {
                self.render_debug_result(backend, framebuffer, targets)?;
            }
        }

        Ok(())
    }

    fn record(
        &mut self,
        backend: &mut dyn Backend,
        framebuffer: Option<&FboProvider>,
        targets: &RenderTargets,
        enable_graph_debugging: bool,
    ) -> Result<()> {
        let output = targets.node(self.output)?;

        // Render target and viewport
        if self.output_is_screen {
            backend.set_render_target_screen();
            if enable_graph_debugging {
                backend.set_viewport(output.debug_viewport());
            } else {
                backend.set_full_screen_viewport();
            }
        } else {
            let framebuffer = framebuffer.ok_or_else(|| {
                engine_err!("retina::RenderPass", Error::InvalidGraph(format!(
                    "pass '{}' has no framebuffer for '{}'", self.name, self.output_name)))
            })?;
            backend.set_render_target(Some(framebuffer));
            backend.set_viewport(Viewport::full(
                output.width_abs(),
                output.height_abs(),
            ));
        }

        // Input binding
        if let Some(shading) = &self.shading {
            backend.set_override_shading(Some(Arc::clone(shading)));
            let active = backend.override_shading().ok_or_else(|| {
                engine_err!("retina::RenderPass", Error::Unsupported(format!(
                    "backend did not activate override shading '{}'", shading.name())))
            })?;
            for (uniform_name, framebuffer) in &self.framebuffer_bindings {
                active.define_fbo_input(framebuffer.name(), uniform_name);
            }
        }

        // Clear; screen depth is left to the backend
        if self.clear.contains(ClearFlags::COLOR) {
            if let Some(color) = self.clear_color {
                backend.set_clear_color(color);
            }
            backend.clear_color();
        }
        if self.clear.contains(ClearFlags::DEPTH) && !self.output_is_screen && output.enable_depth() {
            backend.clear_depth();
        }

        if let Some(hook) = self.before_pass_execute.as_mut() {
            hook()?;
        }

        for source in &self.source {
            backend.render(source)?;
        }

        if let Some(hook) = self.after_pass_execute.as_mut() {
            hook()?;
        }

        Ok(())
    }

    /// Blit the output and every input into their debug viewports
    fn render_debug_result(
        &self,
        backend: &mut dyn Backend,
        framebuffer: &FboProvider,
        targets: &RenderTargets,
    ) -> Result<()> {
        backend.render_framebuffer(framebuffer, targets.node(self.output)?.debug_viewport());
        for ((_, target), (_, input)) in self.inputs.iter().zip(&self.framebuffer_bindings) {
            backend.render_framebuffer(input, targets.node(*target)?.debug_viewport());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
