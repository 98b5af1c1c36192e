/// Physical framebuffer types
///
/// A framebuffer is the GPU-backed destination that satisfies a render
/// target's format. The render graph never creates one directly: it asks
/// `FrameBufferPool`, which asks the `Backend`.

use std::fmt;
use std::sync::Arc;

/// Pixel format of a render target's color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed depth stored in a color attachment
    Depth,
    /// 8-bit RGBA
    Rgba,
}

impl PixelFormat {
    fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Depth => "depth",
            PixelFormat::Rgba => "rgba",
        }
    }
}

/// Physical framebuffer owned by a `FrameBufferPool`
///
/// Implemented by backends. Identity is the allocation itself: two
/// `FboProvider`s refer to the same framebuffer iff `Arc::ptr_eq` holds.
pub trait Framebuffer: fmt::Debug {
    /// Generated name, unique per pool (used as ownership key)
    fn name(&self) -> &str;

    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Whether a depth attachment is present
    fn has_depth(&self) -> bool;

    /// Color attachment format
    fn pixel_format(&self) -> PixelFormat;
}

/// Shared handle to a physical framebuffer
pub type FboProvider = Arc<dyn Framebuffer>;

/// Descriptor for creating a framebuffer
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    /// Generated name, unique per pool
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Attach a depth buffer
    pub enable_depth: bool,
    /// Color attachment format
    pub pixel_format: PixelFormat,
}

/// Equivalence class of framebuffers that may stand in for each other
///
/// Two render targets with equal keys can share a pooled framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatKey {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
}

impl FormatKey {
    /// Key of an existing physical framebuffer
    pub fn of_framebuffer(framebuffer: &dyn Framebuffer) -> Self {
        Self {
            pixel_format: framebuffer.pixel_format(),
            width: framebuffer.width(),
            height: framebuffer.height(),
            depth: framebuffer.has_depth(),
        }
    }

    /// Key a framebuffer created from `desc` will have
    pub fn of_desc(desc: &FramebufferDesc) -> Self {
        Self {
            pixel_format: desc.pixel_format,
            width: desc.width,
            height: desc.height,
            depth: desc.enable_depth,
        }
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}x{}", self.pixel_format.as_str(), self.width, self.height)?;
        if self.depth {
            write!(f, "_depth")?;
        }
        Ok(())
    }
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a `width` x `height` surface from the origin
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
