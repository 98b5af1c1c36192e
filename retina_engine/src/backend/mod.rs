/// Backend module - the narrow graphics API surface the render graph drives

pub mod backend;
pub mod framebuffer;
pub mod shading;

pub use backend::*;
pub use framebuffer::*;
pub use shading::*;

pub use winit::dpi::PhysicalSize;

// Mock backend for tests (no GPU required)
#[cfg(test)]
pub mod mock_backend;
