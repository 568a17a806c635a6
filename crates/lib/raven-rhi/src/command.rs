use crate::backend::{
    Texture, BindingSet, RenderState, ComputeState, RayTracingState,
    BottomLevelAs, TopLevelAs, UpscalingState,
};

/// Records GPU work of one frame.
///
/// Execute callbacks of the render pipeline only see this trait, never the backend itself.
pub trait CommandRecorder {
    fn begin_marker(&mut self, name: &str);

    fn end_marker(&mut self);

    fn clear_texture(&mut self, texture: &Texture, color: [f32; 4]);

    fn copy_texture(&mut self, src: &Texture, dst: &Texture);

    fn draw(
        &mut self,
        state: &RenderState,
        bindings: &[&BindingSet],
        targets: &[&Texture],
        vertex_count: u32,
        instance_count: u32,
    );

    fn dispatch(&mut self, state: &ComputeState, bindings: &[&BindingSet], group_count: [u32; 3]);

    fn trace_rays(&mut self, state: &RayTracingState, bindings: &[&BindingSet], extent: [u32; 2]);

    fn build_bottom_level_as(&mut self, blas: &BottomLevelAs);

    fn build_top_level_as(&mut self, tlas: &TopLevelAs);

    fn upscale(&mut self, state: &UpscalingState, input: &Texture, output: &Texture);
}
