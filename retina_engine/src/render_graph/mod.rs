//! Render graph execution module
//!
//! Sequences an ordered list of passes, resolves each pass's render targets
//! to pooled framebuffers, and returns framebuffers to the pool as soon as
//! their last reader has run.

mod effect_composer;
mod framebuffer_pool;
mod render_graph;
mod render_pass;
mod render_target;

pub use effect_composer::EffectComposer;
pub use framebuffer_pool::FrameBufferPool;
pub use render_graph::{GraphConfig, GraphDesc, RenderGraph, RenderTextureDesc};
pub use render_pass::{ClearFlags, PassDesc, PassHook, PassInput, RenderPass};
pub use render_target::{
    DimensionPolicy, RenderTargetKey, RenderTargetNode, RenderTargets, TargetFormat,
};
