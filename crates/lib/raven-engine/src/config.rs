use raven_log::LogConfig;
use raven_rg::{DeviceConfig, PipelineConfig, RegistryConfig};

/// Everything needed to bring the engine up.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub device: DeviceConfig,
    pub registry: RegistryConfig,
    pub pipeline: PipelineConfig,
    /// `None` leaves the global logger untouched.
    pub log: Option<LogConfig>,

    pub output_resolution: [u32; 2],
    pub ray_tracing: bool,
    /// Bytes the upload buffer can stage per frame.
    pub upload_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            registry: RegistryConfig::default(),
            pipeline: PipelineConfig::default(),
            log: Some(LogConfig::default()),
            output_resolution: [1920, 1080],
            ray_tracing: cfg!(feature = "gpu_ray_tracing"),
            upload_capacity: 16 * 1024 * 1024,
        }
    }
}
