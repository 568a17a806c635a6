mod device;
mod resource;
mod registry;
mod arena;

mod node;
mod lambda_node;
mod scene_node;
mod pipeline;

mod app_state;
mod gui;
mod timer;
mod error;

pub use device::{RenderDevice, DeviceConfig, GpuResourceHandle};
pub use resource::{RgResource, RgHandle, RgResourceKind, RegistryId};
pub use registry::{
    Registry, RegistryConfig, RegistryState, PipelineToken,
    ReuseStatus, ReuseResult, NodeDependency, UnresolvedRequest,
};
pub use arena::ArenaRef;

pub use node::{RenderPipelineNode, ExecuteCallback, noop_callback};
pub use lambda_node::LambdaNode;
pub use scene_node::{SCENE_NODE_NAME, SCENE_VERTICES, SCENE_INDICES, SCENE_LIGHTS, SCENE_BLAS, SCENE_TLAS};
pub use pipeline::{RenderPipeline, PipelineConfig, OrderingViolation};

pub use app_state::AppState;
pub use gui::{Gui, GuiResponse};
pub use timer::{NodeTimer, NodeTiming};
pub use error::{RegistryError, PipelineError};

extern crate log as glog;
