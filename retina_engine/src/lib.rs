/*!
# Retina Engine

Render graph execution for a retained-mode real-time renderer.

A frame is described as an ordered list of passes, each drawing named
batches into one render target and reading other targets through texture
uniforms. The engine allocates off-screen framebuffers from a pool keyed by
format, recycles them as soon as their last reader has run, and rejects
passes that would read the target they write.

## Architecture

- **Backend**: Trait over the graphics API (framebuffers, viewports, clears, draws)
- **RenderTargetNode**: Logical destination (screen or sized offscreen buffer)
- **FrameBufferPool**: Owns physical framebuffers and reuses them by format key
- **RenderPass**: One step: target/viewport/clear setup, input binding, draws
- **EffectComposer**: Drop-list analysis and the per-frame execution loop
- **RenderGraph**: Builds targets and passes from a named description

Execution is single-threaded and synchronous.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod backend;
pub mod render_graph;

// Main retina namespace module
pub mod retina {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger registry
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend sub-module
    pub mod backend {
        pub use crate::backend::*;
    }

    // Render graph sub-module
    pub mod render_graph {
        pub use crate::render_graph::*;
    }
}

// Re-export math library at crate root
pub use glam;
