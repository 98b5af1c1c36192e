/// Override shading seen from the render graph
///
/// Shader compilation lives outside the render graph. A pass only needs to
/// activate a compiled shading and rebind which framebuffer backs each of its
/// texture uniforms, without recompiling the program.
pub trait Shading: std::fmt::Debug {
    /// Human-readable name (logging only)
    fn name(&self) -> &str;

    /// Bind `framebuffer_name` as the texture source of `uniform_name`
    fn define_fbo_input(&self, framebuffer_name: &str, uniform_name: &str);
}
