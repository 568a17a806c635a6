use std::path::PathBuf;

use structopt::StructOpt;

use raven_engine::prelude::*;

#[derive(Debug, StructOpt)]
#[structopt(name = "sandbox", about = "Runs a demo render pipeline on the null backend.")]
pub struct SandboxArgs {
    /// log level (please choose from trace, debug, info, warn, error)
    #[structopt(short, long, default_value = "debug")]
    pub level: String,

    /// log file, truncated on start
    #[structopt(long, default_value = "log/log.txt", parse(from_os_str))]
    pub log_file: PathBuf,

    /// log target to keep out of the console, e.g. raven_rg::registry
    #[structopt(long)]
    pub mute: Vec<String>,

    /// number of frames to draw
    #[structopt(short, long, default_value = "16")]
    pub frames: u64,

    #[structopt(long, default_value = "1920")]
    pub width: u32,

    #[structopt(long, default_value = "1080")]
    pub height: u32,

    /// frame at which the output is resized to half its size
    #[structopt(long)]
    pub resize_at: Option<u64>,

    /// none, fsr or dlss
    #[structopt(long, default_value = "none")]
    pub upscaling: String,

    #[structopt(long)]
    pub ray_tracing: bool,

    #[structopt(long)]
    pub bloom: bool,

    /// treat misordered nodes as fatal
    #[structopt(long)]
    pub strict: bool,
}

impl SandboxArgs {
    pub fn upscaling_tech(&self) -> anyhow::Result<UpscalingTech> {
        let tech = match self.upscaling.to_lowercase().trim() {
            "none" => UpscalingTech::None,
            "fsr" => UpscalingTech::Fsr(UpscalingQuality::Balanced),
            "dlss" => UpscalingTech::Dlss(UpscalingQuality::Quality),
            other => anyhow::bail!("Unknown upscaling technique {:?}! (please choose from none, fsr, dlss)", other),
        };

        Ok(tech)
    }

    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let level = parse_level(&self.level)?;

        Ok(EngineConfig {
            pipeline: PipelineConfig { strict_ordering: self.strict },
            log: Some(LogConfig {
                level,
                log_file: Some(self.log_file.clone()),
                muted_targets: self.mute.clone(),
            }),
            output_resolution: [self.width, self.height],
            ray_tracing: self.ray_tracing,
            ..Default::default()
        })
    }
}
