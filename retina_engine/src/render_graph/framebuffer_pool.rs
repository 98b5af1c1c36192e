/// Framebuffer pool - amortizes framebuffer allocation by reuse.
///
/// The pool owns every physical framebuffer it creates. A framebuffer is
/// either checked out (held by the composer's kept table) or parked in the
/// free list for its format key, never both.
///
/// A surface resize makes every absolute size, and therefore every format
/// key, stale. The pool registers a resize hook on the backend that raises an
/// invalidation flag. The next `request_framebuffer()` or
/// `sync_with_surface()` deletes everything through the backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::backend::{Backend, FboProvider, FormatKey};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_err, engine_info, engine_trace};
use super::render_target::RenderTargetNode;

pub struct FrameBufferPool {
    /// Every framebuffer this pool created, by generated name
    framebuffers: FxHashMap<String, FboProvider>,
    /// Free lists per format key
    available: FxHashMap<FormatKey, Vec<FboProvider>>,
    /// Raised by the backend's resize hook
    invalidated: Arc<AtomicBool>,
}

impl FrameBufferPool {
    /// Create a pool and hook it to the backend's resize notifications
    pub fn new(backend: &mut dyn Backend) -> Self {
        let invalidated = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invalidated);
        backend.hook_resize(Box::new(move |_size| {
            flag.store(true, Ordering::Release);
        }));

        Self {
            framebuffers: FxHashMap::default(),
            available: FxHashMap::default(),
            invalidated,
        }
    }

    /// Get a framebuffer satisfying `target`
    ///
    /// Honours a pending resize first, then pops a pooled framebuffer with
    /// the same format key if one exists, otherwise allocates a new one
    /// through the backend.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidGraph` if `target` is the screen (never pooled)
    /// - Backend creation errors, propagated as-is
    pub fn request_framebuffer(
        &mut self,
        backend: &mut dyn Backend,
        target: &RenderTargetNode,
    ) -> Result<FboProvider> {
        if target.is_screen() {
            return Err(engine_err!("retina::FrameBufferPool",
                Error::InvalidGraph(format!("screen target '{}' cannot be pooled", target.name()))));
        }

        self.sync_with_surface(backend);

        let key = target.format_key();
        if let Some(pooled) = self.available.get_mut(&key) {
            if let Some(framebuffer) = pooled.pop() {
                if pooled.is_empty() {
                    self.available.remove(&key);
                }
                engine_trace!("retina::FrameBufferPool",
                    "Reusing '{}' ({}) for '{}'", framebuffer.name(), key, target.name());
                return Ok(framebuffer);
            }
        }

        let name = Uuid::new_v4().to_string();
        let framebuffer = backend
            .create_framebuffer(&target.framebuffer_desc(name.clone()))
            .map_err(|err| engine_err!("retina::FrameBufferPool", err))?;
        self.framebuffers.insert(name.clone(), Arc::clone(&framebuffer));

        engine_debug!("retina::FrameBufferPool",
            "Allocated '{}' ({}) for '{}'", name, key, target.name());

        Ok(framebuffer)
    }

    /// Park a framebuffer in the free list for its own format key
    ///
    /// # Errors
    ///
    /// `Error::OwnershipViolation` if this pool did not allocate it, or if it
    /// is already parked.
    pub fn return_framebuffer(&mut self, framebuffer: FboProvider) -> Result<()> {
        if !self.owns(&framebuffer) {
            return Err(engine_err!("retina::FrameBufferPool",
                Error::OwnershipViolation(format!(
                    "framebuffer '{}' does not belong to this pool", framebuffer.name()))));
        }

        let key = FormatKey::of_framebuffer(framebuffer.as_ref());
        let pooled = self.available.entry(key).or_default();
        if pooled.iter().any(|fb| Arc::ptr_eq(fb, &framebuffer)) {
            return Err(engine_err!("retina::FrameBufferPool",
                Error::OwnershipViolation(format!(
                    "framebuffer '{}' returned twice", framebuffer.name()))));
        }

        engine_trace!("retina::FrameBufferPool", "Returned '{}' ({})", framebuffer.name(), key);
        pooled.push(framebuffer);
        Ok(())
    }

    /// Delete every framebuffer through the backend and forget all state
    pub fn clear_all(&mut self, backend: &mut dyn Backend) {
        for framebuffer in self.framebuffers.values() {
            backend.delete_framebuffer(framebuffer);
        }
        let count = self.framebuffers.len();
        self.framebuffers.clear();
        self.available.clear();
        self.invalidated.store(false, Ordering::Release);

        engine_info!("retina::FrameBufferPool", "Deleted {} pooled framebuffer(s)", count);
    }

    /// Honour a pending resize notification
    ///
    /// Returns `true` if the pool was invalidated and has been cleared.
    pub fn sync_with_surface(&mut self, backend: &mut dyn Backend) -> bool {
        if self.invalidated.swap(false, Ordering::AcqRel) {
            self.clear_all(backend);
            true
        } else {
            false
        }
    }

    /// Whether a resize happened since the last `sync_with_surface()`
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Whether `framebuffer` was allocated by this pool
    pub fn owns(&self, framebuffer: &FboProvider) -> bool {
        self.framebuffers
            .get(framebuffer.name())
            .is_some_and(|own| Arc::ptr_eq(own, framebuffer))
    }

    /// Number of physical framebuffers this pool owns (pooled or checked out)
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of framebuffers parked under `key`
    pub fn available_count(&self, key: &FormatKey) -> usize {
        self.available.get(key).map_or(0, Vec::len)
    }

    /// Whether `framebuffer` is currently parked in a free list
    pub fn is_available(&self, framebuffer: &FboProvider) -> bool {
        let key = FormatKey::of_framebuffer(framebuffer.as_ref());
        self.available
            .get(&key)
            .is_some_and(|pooled| pooled.iter().any(|fb| Arc::ptr_eq(fb, framebuffer)))
    }
}

#[cfg(test)]
#[path = "framebuffer_pool_tests.rs"]
mod tests;
