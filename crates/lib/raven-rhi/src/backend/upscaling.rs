use super::{RawHandle, Format};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum UpscalingQuality {
    Quality,
    Balanced,
    Performance,
    UltraPerformance,
}

impl UpscalingQuality {
    pub fn scale_factor(self) -> f32 {
        match self {
            UpscalingQuality::Quality => 1.5,
            UpscalingQuality::Balanced => 1.7,
            UpscalingQuality::Performance => 2.0,
            UpscalingQuality::UltraPerformance => 3.0,
        }
    }
}

/// Temporal upscaling technique used by a pipeline.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum UpscalingTech {
    None,
    Fsr(UpscalingQuality),
    Dlss(UpscalingQuality),
}

impl UpscalingTech {
    pub fn scale_factor(self) -> f32 {
        match self {
            UpscalingTech::None => 1.0,
            UpscalingTech::Fsr(quality) | UpscalingTech::Dlss(quality) => quality.scale_factor(),
        }
    }

    /// Resolution to render at, before being upscaled to `output_resolution`.
    pub fn render_resolution(self, output_resolution: [u32; 2]) -> [u32; 2] {
        let factor = self.scale_factor();

        [
            ((output_resolution[0] as f32 / factor).ceil() as u32).max(1),
            ((output_resolution[1] as f32 / factor).ceil() as u32).max(1),
        ]
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct UpscalingStateDesc {
    pub tech: UpscalingTech,
    pub render_extent: [u32; 2],
    pub output_extent: [u32; 2],
    pub color_format: Format,
}

#[derive(Clone, Debug)]
pub struct UpscalingState {
    pub raw: RawHandle,
    pub desc: UpscalingStateDesc,
}
