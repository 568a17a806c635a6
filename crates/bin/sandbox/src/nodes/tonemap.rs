use std::cell::Cell;
use std::rc::Rc;

use raven_engine::prelude::*;

use super::{LIGHTING_OUTPUT, BLOOM_OUTPUT, UPSCALE_OUTPUT, TONEMAP_OUTPUT};

/// Final node, tonemaps the upscaled (or native) lighting with optional bloom on top.
pub struct TonemapNode {
    exposure: Rc<Cell<f32>>,
    black: Option<Texture>,
}

impl TonemapNode {
    pub fn new() -> Self {
        Self {
            exposure: Rc::new(Cell::new(1.0)),
            black: None,
        }
    }

    /// 1x1 texture bound when bloom is off, it lives as long as the device.
    fn black_texture(&mut self, registry: &Registry) -> anyhow::Result<RawHandle> {
        if let Some(black) = &self.black {
            return Ok(black.raw);
        }

        let black = registry.device().create_persistent_texture(
            &TextureDesc::new_2d([1, 1], Format::Rgba8Unorm).usage(TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST),
            "black 1x1",
        )?;
        let raw = black.raw;
        self.black = Some(black);
        Ok(raw)
    }
}

impl RenderPipelineNode for TonemapNode {
    fn name(&self) -> &str {
        "Tonemap"
    }

    fn construct(&mut self, _scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        let input = match registry.get_texture(UPSCALE_OUTPUT) {
            Some(upscaled) => upscaled,
            None => registry.get_texture(LIGHTING_OUTPUT)
                .ok_or_else(|| anyhow::anyhow!("Nothing to tonemap, {} is missing", LIGHTING_OUTPUT))?,
        };
        let bloom = match registry.get_texture(BLOOM_OUTPUT) {
            Some(bloom) => bloom.raw,
            None => self.black_texture(registry)?,
        };

        let [width, height] = registry.output_resolution();
        let output = registry.create_or_reuse_texture_2d(
            &format!("{}.{}x{}", TONEMAP_OUTPUT, width, height),
            [width, height],
            Format::Rgba8Unorm,
            FilterMode::Linear,
            MipmapMode::None,
            WrapMode::ClampToEdge,
        )?.resource;

        let constants = registry.create_buffer(
            &BufferDesc::new_cpu_to_gpu(16, BufferUsage::UNIFORM | BufferUsage::TRANSFER_DST),
            "tonemap constants",
        )?;
        let state = registry.create_compute_state(
            &ComputeStateDesc::new(ShaderSource::new("tonemap.hlsl", "main").define("ACES", "1"), [8, 8, 1]),
            "tonemap",
        )?;
        let bindings = registry.create_binding_set(
            &BindingSetDesc::new()
                .bind(0, BindingResource::SampledTexture(input.raw))
                .bind(1, BindingResource::SampledTexture(bloom))
                .bind(2, BindingResource::UniformBuffer { raw: constants.raw, offset: 0, size: 16 })
                .bind(3, BindingResource::StorageTexture(output.raw)),
            "tonemap bindings",
        )?;

        registry.publish(TONEMAP_OUTPUT, &output);

        let exposure = self.exposure.clone();
        let group_count = state.desc.group_count([width, height]);
        Ok(Box::new(move |app_state, scene, recorder, upload| {
            let mut data = [0u8; 16];
            data[0..4].copy_from_slice(&exposure.get().to_le_bytes());
            data[4..8].copy_from_slice(&scene.global_mip_bias.to_le_bytes());
            data[8..12].copy_from_slice(&app_state.delta_seconds().to_le_bytes());
            upload.upload_buffer(&constants, 0, &data)?;

            recorder.dispatch(&state, &[&bindings], group_count);
            Ok(())
        }))
    }

    fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        let mut exposure = self.exposure.get();
        if gui.slider_f32("exposure", &mut exposure, 0.1..=8.0) {
            self.exposure.set(exposure);
        }
        GuiResponse::default()
    }
}
