/// Render graph - named targets plus an ordered pass list.
///
/// The graph is the definition layer: it turns a `GraphDesc` (targets and
/// passes referenced by name) into a `RenderTargets` table and resolved
/// `RenderPass`es, hands the passes to its `EffectComposer`, and keeps
/// target sizes and debug viewports in sync with the render surface.

use crate::backend::Backend;
use crate::error::Result;
use crate::engine_info;
use super::effect_composer::EffectComposer;
use super::render_pass::{PassDesc, RenderPass};
use super::render_target::{RenderTargetKey, RenderTargets, TargetFormat};

/// Render graph configuration
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Draw every offscreen target into a debug tile column
    pub enable_debugging_view: bool,
    /// Fraction of the surface width used by the debug tile column
    pub debug_column_ratio: f32,
    /// Name reserved for the screen target
    pub screen_target_name: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enable_debugging_view: false,
            debug_column_ratio: 0.2,
            screen_target_name: "screen".to_string(),
        }
    }
}

/// Offscreen render target definition
#[derive(Debug, Clone)]
pub struct RenderTextureDesc {
    pub name: String,
    pub format: TargetFormat,
    /// Never recycle this target's framebuffer (history buffers, accumulators)
    pub keep_content: bool,
}

impl RenderTextureDesc {
    pub fn new(name: &str, format: TargetFormat) -> Self {
        Self {
            name: name.to_string(),
            format,
            keep_content: false,
        }
    }

    pub fn keep_content(mut self) -> Self {
        self.keep_content = true;
        self
    }
}

/// Complete graph definition
#[derive(Default)]
pub struct GraphDesc {
    pub render_textures: Vec<RenderTextureDesc>,
    /// Passes in execution order
    pub passes: Vec<PassDesc>,
}

impl GraphDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render_texture(mut self, texture: RenderTextureDesc) -> Self {
        self.render_textures.push(texture);
        self
    }

    pub fn with_pass(mut self, pass: PassDesc) -> Self {
        self.passes.push(pass);
        self
    }
}

pub struct RenderGraph {
    config: GraphConfig,
    targets: RenderTargets,
    composer: EffectComposer,
}

impl RenderGraph {
    /// Create an empty graph (screen target only)
    pub fn new(backend: &mut dyn Backend, config: GraphConfig) -> Self {
        let targets = RenderTargets::new(&config.screen_target_name);
        Self {
            composer: EffectComposer::new(backend),
            targets,
            config,
        }
    }

    /// Replace the whole graph
    ///
    /// Previous passes and live framebuffers are discarded; pooled
    /// framebuffers stay available.
    ///
    /// # Errors
    ///
    /// `Error::InvalidGraph` on duplicate or unknown target names. The graph
    /// is left empty in that case.
    pub fn set_graph(&mut self, desc: GraphDesc) -> Result<()> {
        self.clear();

        let result = self.build(desc);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn build(&mut self, desc: GraphDesc) -> Result<()> {
        for texture in &desc.render_textures {
            self.targets
                .create_render_target(&texture.name, texture.format, texture.keep_content)?;
        }

        let passes = desc
            .passes
            .into_iter()
            .map(|pass| RenderPass::new(pass, &self.targets))
            .collect::<Result<Vec<_>>>()?;
        let pass_count = passes.len();

        self.composer.set_passes(passes, &self.targets)?;

        engine_info!("retina::RenderGraph", "Graph built: {} target(s), {} pass(es)",
            self.targets.len(), pass_count);
        Ok(())
    }

    /// Render one frame
    pub fn render(&mut self, backend: &mut dyn Backend) -> Result<()> {
        let render_size = backend.render_size();
        self.targets.update_sizes(render_size);
        if self.config.enable_debugging_view {
            self.targets
                .layout_debug_viewports(render_size, self.config.debug_column_ratio);
        }

        self.composer
            .render(backend, &mut self.targets, self.config.enable_debugging_view)
    }

    /// Remove every pass and offscreen target
    pub fn clear(&mut self) {
        self.composer.clear();
        self.targets.clear();
    }

    pub fn set_debugging_view(&mut self, enable: bool) {
        self.config.enable_debugging_view = enable;
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn target_key(&self, name: &str) -> Option<RenderTargetKey> {
        self.targets.key(name)
    }

    pub fn screen(&self) -> RenderTargetKey {
        self.targets.screen()
    }

    pub fn composer(&self) -> &EffectComposer {
        &self.composer
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
