use raven_engine::prelude::*;

use super::{LIGHTING_OUTPUT, UPSCALE_OUTPUT};

const TECH_NAMES: [&str; 3] = ["None", "FSR", "DLSS"];

pub struct UpscaleNode {
    pub tech: UpscalingTech,
}

impl UpscaleNode {
    fn tech_index(&self) -> usize {
        match self.tech {
            UpscalingTech::None => 0,
            UpscalingTech::Fsr(_) => 1,
            UpscalingTech::Dlss(_) => 2,
        }
    }
}

impl RenderPipelineNode for UpscaleNode {
    fn name(&self) -> &str {
        "Upscale"
    }

    fn construct(&mut self, _scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        if self.tech == UpscalingTech::None {
            return Ok(noop_callback());
        }

        let input = registry.get_texture(LIGHTING_OUTPUT)
            .ok_or_else(|| anyhow::anyhow!("Nothing to upscale, {} is missing", LIGHTING_OUTPUT))?;

        let output_extent = registry.output_resolution();
        let output = registry.create_texture(&TextureDesc::new_2d(output_extent, Format::Rgba16Float), "upscaled")?;
        let state = registry.create_upscaling_state(&UpscalingStateDesc {
            tech: self.tech,
            render_extent: registry.render_resolution(),
            output_extent,
            color_format: Format::Rgba16Float,
        }, "upscaler")?;

        registry.publish(UPSCALE_OUTPUT, &output);

        Ok(Box::new(move |_, _, recorder, _| {
            recorder.upscale(&state, &input, &output);
            Ok(())
        }))
    }

    fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        let mut selected = self.tech_index();
        if gui.combo("technique", &mut selected, &TECH_NAMES) {
            self.tech = match selected {
                1 => UpscalingTech::Fsr(UpscalingQuality::Balanced),
                2 => UpscalingTech::Dlss(UpscalingQuality::Quality),
                _ => UpscalingTech::None,
            };
        }

        // a technique change is picked up by the pipeline itself
        GuiResponse::default()
    }

    fn upscaling_tech(&self) -> Option<UpscalingTech> {
        Some(self.tech)
    }
}
