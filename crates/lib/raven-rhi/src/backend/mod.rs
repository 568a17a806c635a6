mod error;
mod texture;
mod buffer;
mod binding;
mod pipeline;
mod accel;
mod upscaling;

pub mod null;

use std::fmt;

pub use error::RhiError;
pub use texture::{Texture, TextureDesc, TextureUsage, Format, FilterMode, MipmapMode, WrapMode};
pub use buffer::{Buffer, BufferDesc, BufferUsage, MemoryLocation};
pub use binding::{BindingSet, BindingSetDesc, BindingEntry, BindingResource};
pub use pipeline::{
    ShaderSource, CullMode, BlendMode,
    RenderState, RenderStateDesc,
    ComputeState, ComputeStateDesc,
    RayTracingState, RayTracingStateDesc,
};
pub use accel::{BottomLevelAs, BottomLevelAsDesc, TopLevelAs, TopLevelAsDesc};
pub use upscaling::{UpscalingTech, UpscalingQuality, UpscalingState, UpscalingStateDesc};

/// Opaque backend object id.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawHandle(pub u64);

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    Buffer,
    BindingSet,
    RenderState,
    BottomLevelAs,
    TopLevelAs,
    RayTracingState,
    ComputeState,
    UpscalingState,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Buffer => "buffer",
            ResourceKind::BindingSet => "binding set",
            ResourceKind::RenderState => "render state",
            ResourceKind::BottomLevelAs => "bottom level acceleration structure",
            ResourceKind::TopLevelAs => "top level acceleration structure",
            ResourceKind::RayTracingState => "ray tracing state",
            ResourceKind::ComputeState => "compute state",
            ResourceKind::UpscalingState => "upscaling state",
        };

        f.write_str(name)
    }
}

/// Any backend object created through a [`Backend`].
#[derive(Clone, Debug)]
pub enum GpuResource {
    Texture(Texture),
    Buffer(Buffer),
    BindingSet(BindingSet),
    RenderState(RenderState),
    BottomLevelAs(BottomLevelAs),
    TopLevelAs(TopLevelAs),
    RayTracingState(RayTracingState),
    ComputeState(ComputeState),
    UpscalingState(UpscalingState),
}

impl GpuResource {
    pub fn raw(&self) -> RawHandle {
        match self {
            GpuResource::Texture(res) => res.raw,
            GpuResource::Buffer(res) => res.raw,
            GpuResource::BindingSet(res) => res.raw,
            GpuResource::RenderState(res) => res.raw,
            GpuResource::BottomLevelAs(res) => res.raw,
            GpuResource::TopLevelAs(res) => res.raw,
            GpuResource::RayTracingState(res) => res.raw,
            GpuResource::ComputeState(res) => res.raw,
            GpuResource::UpscalingState(res) => res.raw,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            GpuResource::Texture(_) => ResourceKind::Texture,
            GpuResource::Buffer(_) => ResourceKind::Buffer,
            GpuResource::BindingSet(_) => ResourceKind::BindingSet,
            GpuResource::RenderState(_) => ResourceKind::RenderState,
            GpuResource::BottomLevelAs(_) => ResourceKind::BottomLevelAs,
            GpuResource::TopLevelAs(_) => ResourceKind::TopLevelAs,
            GpuResource::RayTracingState(_) => ResourceKind::RayTracingState,
            GpuResource::ComputeState(_) => ResourceKind::ComputeState,
            GpuResource::UpscalingState(_) => ResourceKind::UpscalingState,
        }
    }
}

/// Device facing part of the render hardware interface.
///
/// Every object created here must be given back through [`Backend::destroy_resource`] exactly once.
pub trait Backend {
    fn name(&self) -> &str;

    fn supports_ray_tracing(&self) -> bool;

    fn create_texture(&self, desc: &TextureDesc, name: &str) -> anyhow::Result<Texture, RhiError>;

    fn create_buffer(&self, desc: &BufferDesc, name: &str) -> anyhow::Result<Buffer, RhiError>;

    fn create_binding_set(&self, desc: &BindingSetDesc, name: &str) -> anyhow::Result<BindingSet, RhiError>;

    fn create_render_state(&self, desc: &RenderStateDesc, name: &str) -> anyhow::Result<RenderState, RhiError>;

    fn create_bottom_level_as(&self, desc: &BottomLevelAsDesc, name: &str) -> anyhow::Result<BottomLevelAs, RhiError>;

    fn create_top_level_as(&self, desc: &TopLevelAsDesc, name: &str) -> anyhow::Result<TopLevelAs, RhiError>;

    fn create_ray_tracing_state(&self, desc: &RayTracingStateDesc, name: &str) -> anyhow::Result<RayTracingState, RhiError>;

    fn create_compute_state(&self, desc: &ComputeStateDesc, name: &str) -> anyhow::Result<ComputeState, RhiError>;

    fn create_upscaling_state(&self, desc: &UpscalingStateDesc, name: &str) -> anyhow::Result<UpscalingState, RhiError>;

    /// Rename a live object, used by debuggers and captures.
    fn set_debug_name(&self, raw: RawHandle, name: &str);

    fn destroy_resource(&self, resource: GpuResource);
}
