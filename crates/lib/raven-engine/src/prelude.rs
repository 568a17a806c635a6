// Raven Engine exposed APIs
pub use super::user::App;
pub use super::{EngineConfig, EngineContext, FrameSummary};

pub use crate::raven_main;

// render pipeline
pub use raven_rg::{
    AppState, ExecuteCallback, Gui, GuiResponse, Registry, RenderPipelineNode, RgHandle,
    PipelineConfig, RegistryConfig, RegistryState, DeviceConfig, ReuseStatus,
    noop_callback,
    SCENE_VERTICES, SCENE_INDICES, SCENE_LIGHTS, SCENE_BLAS, SCENE_TLAS,
};
pub use raven_rhi::{CommandRecorder, UploadBuffer};
pub use raven_rhi::backend::*;

// scene
pub use raven_scene::{Scene, Mesh, Light, Camera, CameraTransform};
pub use raven_math::{Vec3, Quat, Mat4};

pub use raven_log::{LogConfig, LevelFilter, parse_level};
