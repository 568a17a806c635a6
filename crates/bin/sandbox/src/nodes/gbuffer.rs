use raven_engine::prelude::*;

use super::{GBUFFER_ALBEDO, GBUFFER_NORMAL, GBUFFER_DEPTH};

/// Rasterizes the scene geometry into albedo, normal and depth targets.
pub struct GBufferNode;

impl RenderPipelineNode for GBufferNode {
    fn name(&self) -> &str {
        "GBuffer"
    }

    fn construct(&mut self, scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        let extent = registry.render_resolution();

        let albedo = registry.create_texture(&TextureDesc::new_2d(extent, Format::Rgba8Unorm), "gbuffer albedo")?;
        let normal = registry.create_texture(&TextureDesc::new_2d(extent, Format::Rgba16Float), "gbuffer normal")?;
        let depth = registry.create_texture(&TextureDesc::new_2d(extent, Format::D32Float), "gbuffer depth")?;

        let state = registry.create_render_state(
            &RenderStateDesc::new(
                ShaderSource::new("gbuffer.hlsl", "vs_main"),
                ShaderSource::new("gbuffer.hlsl", "ps_main"),
            )
            .color_format(Format::Rgba8Unorm)
            .color_format(Format::Rgba16Float)
            .depth_format(Format::D32Float),
            "gbuffer",
        )?;

        let view_constants = registry.create_buffer(
            &BufferDesc::new_cpu_to_gpu(Camera::GPU_SIZE as u64, BufferUsage::UNIFORM | BufferUsage::TRANSFER_DST),
            "gbuffer view constants",
        )?;

        let vertices = registry.get_buffer(SCENE_VERTICES)
            .ok_or_else(|| anyhow::anyhow!("{} is missing", SCENE_VERTICES))?;
        let bindings = registry.create_binding_set(
            &BindingSetDesc::new()
                .bind(0, BindingResource::StorageBuffer { raw: vertices.raw, offset: 0, size: vertices.desc.size })
                .bind(1, BindingResource::Sampler { filter: FilterMode::Linear, wrap: WrapMode::Repeat })
                .bind(2, BindingResource::UniformBuffer { raw: view_constants.raw, offset: 0, size: Camera::GPU_SIZE as u64 }),
            "gbuffer bindings",
        )?;

        registry.publish(GBUFFER_ALBEDO, &albedo);
        registry.publish(GBUFFER_NORMAL, &normal);
        registry.publish(GBUFFER_DEPTH, &depth);

        let index_count = scene.index_count() as u32;
        let aspect_ratio = extent[0] as f32 / extent[1].max(1) as f32;
        Ok(Box::new(move |_, scene, recorder, upload| {
            let mut data = Vec::with_capacity(Camera::GPU_SIZE);
            scene.camera.write_gpu_data(aspect_ratio, &mut data);
            upload.upload_buffer(&view_constants, 0, &data)?;

            recorder.clear_texture(&albedo, [0.0; 4]);
            recorder.clear_texture(&normal, [0.0; 4]);
            recorder.clear_texture(&depth, [0.0; 4]);

            if index_count > 0 {
                recorder.draw(&state, &[&bindings], &[&albedo, &normal, &depth], index_count, 1);
            }
            Ok(())
        }))
    }
}
