use raven_engine::prelude::*;

use super::{LIGHTING_OUTPUT, BLOOM_OUTPUT};

const BLOOM_CHAIN_EXTENT: [u32; 2] = [512, 512];

/// Optional bloom, the downsample chain does not depend on the resolution and survives resizes.
pub struct BloomNode {
    pub enabled: bool,
}

impl RenderPipelineNode for BloomNode {
    fn name(&self) -> &str {
        "Bloom"
    }

    fn construct(&mut self, _scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        if !self.enabled {
            return Ok(noop_callback());
        }

        let input = match registry.get_texture(LIGHTING_OUTPUT) {
            Some(input) => input,
            None => return Ok(noop_callback()),
        };

        let chain = registry.create_or_reuse_texture_2d(
            "Bloom.Chain",
            BLOOM_CHAIN_EXTENT,
            Format::Rgba16Float,
            FilterMode::Linear,
            MipmapMode::Full,
            WrapMode::ClampToEdge,
        )?;
        if chain.status == ReuseStatus::Reused {
            trace!("Bloom chain kept from the previous epoch");
        }
        let chain = chain.resource;

        let output = registry.create_texture(&TextureDesc::new_2d(registry.render_resolution(), Format::Rgba16Float), "bloom output")?;
        let downsample = registry.create_compute_state(
            &ComputeStateDesc::new(ShaderSource::new("bloom.hlsl", "downsample"), [8, 8, 1]),
            "bloom downsample",
        )?;
        let composite = registry.create_compute_state(
            &ComputeStateDesc::new(ShaderSource::new("bloom.hlsl", "composite"), [8, 8, 1]),
            "bloom composite",
        )?;
        let bindings = registry.create_binding_set(
            &BindingSetDesc::new()
                .bind(0, BindingResource::SampledTexture(input.raw))
                .bind(1, BindingResource::StorageTexture(chain.raw))
                .bind(2, BindingResource::StorageTexture(output.raw)),
            "bloom bindings",
        )?;

        registry.publish(BLOOM_OUTPUT, &output);

        let mip_levels = chain.desc.mip_levels();
        let output_groups = composite.desc.group_count(output.desc.extent);
        Ok(Box::new(move |_, _, recorder, _| {
            for mip in 0..mip_levels {
                let extent = [(BLOOM_CHAIN_EXTENT[0] >> mip).max(1), (BLOOM_CHAIN_EXTENT[1] >> mip).max(1)];
                recorder.dispatch(&downsample, &[&bindings], downsample.desc.group_count(extent));
            }
            recorder.dispatch(&composite, &[&bindings], output_groups);
            Ok(())
        }))
    }

    fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        GuiResponse::rebuild(gui.checkbox("enabled", &mut self.enabled))
    }
}
