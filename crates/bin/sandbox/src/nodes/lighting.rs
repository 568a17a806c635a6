use raven_engine::prelude::*;

use super::{GBUFFER_ALBEDO, GBUFFER_NORMAL, GBUFFER_DEPTH, LIGHTING_OUTPUT};

/// Deferred lighting, with ray traced shadows when the scene publishes a TLAS.
pub struct LightingNode;

impl RenderPipelineNode for LightingNode {
    fn name(&self) -> &str {
        "Lighting"
    }

    fn construct(&mut self, _scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        let extent = registry.render_resolution();

        let (albedo, normal, depth) = match (
            registry.get_texture(GBUFFER_ALBEDO),
            registry.get_texture(GBUFFER_NORMAL),
            registry.get_texture(GBUFFER_DEPTH),
        ) {
            (Some(albedo), Some(normal), Some(depth)) => (albedo, normal, depth),
            _ => anyhow::bail!("Lighting requires the gbuffer"),
        };
        let lights = registry.get_buffer(SCENE_LIGHTS)
            .ok_or_else(|| anyhow::anyhow!("{} is missing", SCENE_LIGHTS))?;

        let output = registry.create_texture(&TextureDesc::new_2d(extent, Format::Rgba16Float), "lighting output")?;
        let state = registry.create_compute_state(
            &ComputeStateDesc::new(ShaderSource::new("deferred_lighting.hlsl", "main"), [8, 8, 1]),
            "deferred lighting",
        )?;
        let bindings = registry.create_binding_set(
            &BindingSetDesc::new()
                .bind(0, BindingResource::SampledTexture(albedo.raw))
                .bind(1, BindingResource::SampledTexture(normal.raw))
                .bind(2, BindingResource::SampledTexture(depth.raw))
                .bind(3, BindingResource::StorageBuffer { raw: lights.raw, offset: 0, size: lights.desc.size })
                .bind(4, BindingResource::StorageTexture(output.raw)),
            "lighting bindings",
        )?;

        let shadows = match registry.get_top_level_as(SCENE_TLAS) {
            Some(tlas) => {
                let state = registry.create_ray_tracing_state(&RayTracingStateDesc {
                    raygen_shader: ShaderSource::new("rt_shadows.hlsl", "raygen"),
                    miss_shaders: vec![ShaderSource::new("rt_shadows.hlsl", "miss")],
                    hit_shaders: Vec::new(),
                    max_recursion_depth: 1,
                }, "rt shadows")?;
                let bindings = registry.create_binding_set(
                    &BindingSetDesc::new()
                        .bind(0, BindingResource::AccelerationStructure(tlas.raw))
                        .bind(1, BindingResource::SampledTexture(depth.raw))
                        .bind(2, BindingResource::StorageTexture(output.raw)),
                    "rt shadows bindings",
                )?;
                Some((state, bindings))
            }
            None => None,
        };

        registry.publish(LIGHTING_OUTPUT, &output);

        let group_count = state.desc.group_count(extent);
        Ok(Box::new(move |_, _, recorder, _| {
            recorder.dispatch(&state, &[&bindings], group_count);

            if let Some((state, bindings)) = &shadows {
                recorder.trace_rays(state, &[bindings], extent);
            }
            Ok(())
        }))
    }
}
