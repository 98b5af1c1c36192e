/// Effect composer - executes an ordered pass list each frame.
///
/// The pass order is the dependency order: the composer never sorts.
/// `set_passes()` derives a drop list per pass (the targets whose
/// framebuffer goes back to the pool once that pass has run) and `render()`
/// walks the passes, resolving every target to a framebuffer through the
/// kept table or the pool.
///
/// Passes carry keys into one `RenderTargets` table. `set_passes()` and
/// `render()` must be given that same table; both reject any other one.

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::backend::{Backend, FboProvider};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_err, engine_info, engine_warn};
use super::framebuffer_pool::FrameBufferPool;
use super::render_pass::RenderPass;
use super::render_target::{RenderTargetKey, RenderTargets};

pub struct EffectComposer {
    passes: Vec<RenderPass>,
    /// Targets released after each pass, indexed like `passes`
    drop_lists: Vec<Vec<RenderTargetKey>>,
    /// Framebuffer currently holding each live target's latest content
    kept: FxHashMap<RenderTargetKey, FboProvider>,
    pool: FrameBufferPool,
    /// Hazard checks done for the current pass list
    validated: bool,
    /// Table the installed passes were resolved against
    targets_id: Option<Uuid>,
}

impl EffectComposer {
    /// Create a composer with its own framebuffer pool
    pub fn new(backend: &mut dyn Backend) -> Self {
        Self {
            passes: Vec::new(),
            drop_lists: Vec::new(),
            kept: FxHashMap::default(),
            pool: FrameBufferPool::new(backend),
            validated: false,
            targets_id: None,
        }
    }

    /// Install an ordered pass list
    ///
    /// Recomputes every drop list and re-arms validation. Framebuffers kept
    /// from a previous list are left alone; call `clear()` between unrelated
    /// graphs.
    ///
    /// # Errors
    ///
    /// `Error::InvalidGraph` if a pass was resolved against another table, or
    /// references a key missing from `targets`.
    pub fn set_passes(&mut self, passes: Vec<RenderPass>, targets: &RenderTargets) -> Result<()> {
        for pass in &passes {
            if pass.targets_id() != targets.id() {
                return Err(engine_err!("retina::EffectComposer", Error::InvalidGraph(format!(
                    "pass '{}' was built against another render target table", pass.name()))));
            }
            targets.node(pass.output())?;
            for (_, input) in pass.inputs() {
                targets.node(*input)?;
            }
        }

        Self::warn_unproduced_inputs(&passes, targets)?;

        self.drop_lists = Self::compute_drop_lists(&passes, targets)?;
        self.passes = passes;
        self.validated = false;
        self.targets_id = Some(targets.id());

        engine_debug!("retina::EffectComposer", "Installed {} pass(es), {} drop(s)",
            self.passes.len(),
            self.drop_lists.iter().map(Vec::len).sum::<usize>());

        Ok(())
    }

    /// Inputs no pass in the list ever writes are bound to uninitialized
    /// framebuffers every frame, unless their content is kept.
    fn warn_unproduced_inputs(passes: &[RenderPass], targets: &RenderTargets) -> Result<()> {
        for pass in passes {
            for (uniform_name, input) in pass.inputs() {
                let node = targets.node(*input)?;
                if node.keep_content() || passes.iter().any(|other| other.output() == *input) {
                    continue;
                }
                engine_warn!("retina::EffectComposer",
                    "Pass '{}' reads '{}' as '{}' but no pass writes it",
                    pass.name(), node.name(), uniform_name);
            }
        }
        Ok(())
    }

    /// For each produced target, find the last later pass reading it.
    ///
    /// Screen and keep-content targets are never dropped. A target nobody
    /// reads afterwards is dropped by its producer.
    fn compute_drop_lists(
        passes: &[RenderPass],
        targets: &RenderTargets,
    ) -> Result<Vec<Vec<RenderTargetKey>>> {
        let mut drop_lists = vec![Vec::new(); passes.len()];

        for (index, pass) in passes.iter().enumerate() {
            let created = pass.output();
            let node = targets.node(created)?;
            if node.is_screen() || node.keep_content() {
                continue;
            }

            let last_consumer = (index + 1..passes.len())
                .rev()
                .find(|&later| passes[later].depends_on(created))
                .unwrap_or(index);

            let drop_list: &mut Vec<RenderTargetKey> = &mut drop_lists[last_consumer];
            if !drop_list.contains(&created) {
                drop_list.push(created);
            }
        }

        Ok(drop_lists)
    }

    /// Execute every pass in order
    ///
    /// A pending surface resize first empties the kept table and the pool.
    /// The first frame after `set_passes()` checks every pass for hazards
    /// before anything is drawn.
    ///
    /// # Errors
    ///
    /// `Error::InvalidGraph` if `targets` is not the table given to
    /// `set_passes()`. Otherwise the first error aborts the remaining passes
    /// and framebuffers touched by the failing pass stay either kept or
    /// pooled.
    pub fn render(
        &mut self,
        backend: &mut dyn Backend,
        targets: &mut RenderTargets,
        enable_graph_debugging: bool,
    ) -> Result<()> {
        if self.targets_id.is_some_and(|id| id != targets.id()) {
            return Err(engine_err!("retina::EffectComposer", Error::InvalidGraph(
                "render target table differs from the one the passes were built against".to_string())));
        }

        if self.pool.is_invalidated() {
            self.kept.clear();
            self.pool.sync_with_surface(backend);
            engine_info!("retina::EffectComposer", "Surface resized, live framebuffers discarded");
        }

        if !self.validated {
            for pass in &self.passes {
                pass.check_is_valid()?;
            }
        }

        let render_size = backend.render_size();

        for index in 0..self.passes.len() {
            let output = self.passes[index].output();
            let output_node = targets.node_mut(output)?;
            output_node.update_size(render_size);

            let (framebuffer, fresh) = if output_node.is_screen() {
                (None, false)
            } else if let Some(kept) = self.kept.get(&output) {
                (Some(kept.clone()), false)
            } else {
                (Some(self.pool.request_framebuffer(backend, output_node)?), true)
            };

            let result = self.run_pass(index, backend, framebuffer.as_ref(), targets, enable_graph_debugging);
            if let Err(err) = result {
                if let (Some(framebuffer), true) = (framebuffer, fresh) {
                    self.pool.return_framebuffer(framebuffer)?;
                }
                return Err(err);
            }

            if let Some(framebuffer) = framebuffer {
                self.kept.insert(output, framebuffer);
            }

            for target in &self.drop_lists[index] {
                if let Some(framebuffer) = self.kept.remove(target) {
                    self.pool.return_framebuffer(framebuffer)?;
                }
            }
        }

        self.validated = true;
        Ok(())
    }

    /// Bind inputs and execute one pass
    fn run_pass(
        &mut self,
        index: usize,
        backend: &mut dyn Backend,
        framebuffer: Option<&FboProvider>,
        targets: &mut RenderTargets,
        enable_graph_debugging: bool,
    ) -> Result<()> {
        let render_size = backend.render_size();
        let inputs = self.passes[index].inputs().to_vec();
        let mut bindings = Vec::with_capacity(inputs.len());

        for (uniform_name, target) in inputs {
            let input = match self.kept.get(&target) {
                Some(kept) => kept.clone(),
                None => {
                    // Nothing produced it yet (e.g. a history target on the first frame)
                    let node = targets.node_mut(target)?;
                    node.update_size(render_size);
                    let fresh = self.pool.request_framebuffer(backend, node)?;
                    engine_debug!("retina::EffectComposer",
                        "Input '{}' of pass '{}' has no content yet, bound '{}'",
                        node.name(), self.passes[index].name(), fresh.name());
                    self.kept.insert(target, fresh.clone());
                    fresh
                }
            };
            bindings.push((uniform_name, input));
        }

        let pass = &mut self.passes[index];
        pass.set_framebuffer_bindings(bindings);
        pass.execute(backend, framebuffer, targets, enable_graph_debugging)
    }

    /// Drop the pass list, the drop lists and the kept table
    ///
    /// Pooled framebuffers stay in the pool for the next graph.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.drop_lists.clear();
        self.kept.clear();
        self.validated = false;
        self.targets_id = None;
    }

    /// Framebuffer currently holding `target`'s content
    pub fn framebuffer(&self, target: RenderTargetKey) -> Option<&FboProvider> {
        self.kept.get(&target)
    }

    /// Number of live (kept) targets
    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// Targets released after pass `index`
    pub fn drop_list(&self, index: usize) -> &[RenderTargetKey] {
        self.drop_lists.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn pool(&self) -> &FrameBufferPool {
        &self.pool
    }

    /// Whether the current pass list passed its hazard checks
    pub fn is_validated(&self) -> bool {
        self.validated
    }
}

#[cfg(test)]
#[path = "effect_composer_tests.rs"]
mod tests;
