//! Backend which validates descriptors and tracks object lifetimes without touching any GPU.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::command::CommandRecorder;
use crate::upload::UploadBuffer;

use super::*;

#[derive(Default, Debug)]
pub struct NullBackendStats {
    created: Cell<usize>,
    destroyed: Cell<usize>,
    live: RefCell<HashMap<RawHandle, (ResourceKind, String)>>,
}

impl NullBackendStats {
    pub fn created_count(&self) -> usize {
        self.created.get()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.get()
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, raw: RawHandle) -> bool {
        self.live.borrow().contains_key(&raw)
    }

    pub fn debug_name(&self, raw: RawHandle) -> Option<String> {
        self.live.borrow().get(&raw).map(|(_, name)| name.clone())
    }

    pub fn live_of_kind(&self, kind: ResourceKind) -> usize {
        self.live.borrow().values().filter(|(k, _)| *k == kind).count()
    }
}

pub struct NullBackend {
    ray_tracing: bool,
    next_id: Cell<u64>,
    stats: Rc<NullBackendStats>,
}

impl NullBackend {
    pub fn new(ray_tracing: bool) -> Self {
        Self {
            ray_tracing,
            next_id: Cell::new(1),
            stats: Rc::new(NullBackendStats::default()),
        }
    }

    /// Shared view of the lifetime counters, still readable after the backend is boxed.
    pub fn stats(&self) -> Rc<NullBackendStats> {
        self.stats.clone()
    }

    fn register(&self, kind: ResourceKind, name: &str) -> RawHandle {
        let raw = RawHandle(self.next_id.get());
        self.next_id.set(raw.0 + 1);

        self.stats.created.set(self.stats.created.get() + 1);
        self.stats.live.borrow_mut().insert(raw, (kind, name.to_owned()));

        glog::trace!("[{}] create {} {:?} {}", self.name(), kind, name, raw);
        raw
    }

    fn require_ray_tracing(&self) -> anyhow::Result<(), RhiError> {
        if self.ray_tracing {
            Ok(())
        } else {
            Err(RhiError::Unsupported {
                feature: "ray tracing",
                backend: self.name().to_owned(),
            })
        }
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> RhiError {
    RhiError::InvalidDescriptor {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

impl Backend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn supports_ray_tracing(&self) -> bool {
        self.ray_tracing
    }

    fn create_texture(&self, desc: &TextureDesc, name: &str) -> anyhow::Result<Texture, RhiError> {
        if desc.extent[0] == 0 || desc.extent[1] == 0 {
            return Err(invalid(name, format!("zero sized extent {:?}", desc.extent)));
        }
        if desc.array_layers == 0 {
            return Err(invalid(name, "texture must have at least one array layer"));
        }
        if let MipmapMode::Levels(levels) = desc.mipmap {
            let full = TextureDesc { mipmap: MipmapMode::Full, ..*desc }.mip_levels();
            if levels > full {
                return Err(invalid(name, format!("{} mip levels requested, at most {}", levels, full)));
            }
        }
        if desc.format.is_depth() && desc.usage.contains(TextureUsage::STORAGE) {
            return Err(invalid(name, "depth formats can not be used as storage"));
        }

        Ok(Texture {
            raw: self.register(ResourceKind::Texture, name),
            desc: *desc,
        })
    }

    fn create_buffer(&self, desc: &BufferDesc, name: &str) -> anyhow::Result<Buffer, RhiError> {
        if desc.size == 0 {
            return Err(invalid(name, "zero sized buffer"));
        }
        if let Some(alignment) = desc.alignment {
            if !alignment.is_power_of_two() {
                return Err(invalid(name, format!("alignment {} is not a power of two", alignment)));
            }
        }

        Ok(Buffer {
            raw: self.register(ResourceKind::Buffer, name),
            desc: *desc,
        })
    }

    fn create_binding_set(&self, desc: &BindingSetDesc, name: &str) -> anyhow::Result<BindingSet, RhiError> {
        if !desc.has_unique_slots() {
            return Err(invalid(name, "duplicated binding slot"));
        }
        if desc.entries.iter().any(|entry| matches!(entry.resource, BindingResource::AccelerationStructure(_))) {
            self.require_ray_tracing()?;
        }

        Ok(BindingSet {
            raw: self.register(ResourceKind::BindingSet, name),
            desc: desc.clone(),
        })
    }

    fn create_render_state(&self, desc: &RenderStateDesc, name: &str) -> anyhow::Result<RenderState, RhiError> {
        if desc.color_formats.is_empty() && desc.depth_format.is_none() {
            return Err(invalid(name, "render state without any attachment"));
        }
        if let Some(format) = desc.color_formats.iter().find(|format| format.is_depth()) {
            return Err(invalid(name, format!("{:?} is not a color format", format)));
        }
        if let Some(format) = desc.depth_format {
            if !format.is_depth() {
                return Err(invalid(name, format!("{:?} is not a depth format", format)));
            }
        }

        Ok(RenderState {
            raw: self.register(ResourceKind::RenderState, name),
            desc: desc.clone(),
        })
    }

    fn create_bottom_level_as(&self, desc: &BottomLevelAsDesc, name: &str) -> anyhow::Result<BottomLevelAs, RhiError> {
        self.require_ray_tracing()?;
        if desc.vertex_count == 0 || desc.vertex_stride == 0 {
            return Err(invalid(name, "empty geometry"));
        }

        Ok(BottomLevelAs {
            raw: self.register(ResourceKind::BottomLevelAs, name),
            desc: *desc,
        })
    }

    fn create_top_level_as(&self, desc: &TopLevelAsDesc, name: &str) -> anyhow::Result<TopLevelAs, RhiError> {
        self.require_ray_tracing()?;
        if desc.instances.len() > desc.max_instances as usize {
            return Err(invalid(name, format!("{} instances exceed the maximum of {}", desc.instances.len(), desc.max_instances)));
        }

        Ok(TopLevelAs {
            raw: self.register(ResourceKind::TopLevelAs, name),
            desc: desc.clone(),
        })
    }

    fn create_ray_tracing_state(&self, desc: &RayTracingStateDesc, name: &str) -> anyhow::Result<RayTracingState, RhiError> {
        self.require_ray_tracing()?;
        if desc.max_recursion_depth == 0 {
            return Err(invalid(name, "recursion depth must be at least 1"));
        }

        Ok(RayTracingState {
            raw: self.register(ResourceKind::RayTracingState, name),
            desc: desc.clone(),
        })
    }

    fn create_compute_state(&self, desc: &ComputeStateDesc, name: &str) -> anyhow::Result<ComputeState, RhiError> {
        if desc.group_size.iter().any(|size| *size == 0) {
            return Err(invalid(name, format!("invalid group size {:?}", desc.group_size)));
        }

        Ok(ComputeState {
            raw: self.register(ResourceKind::ComputeState, name),
            desc: desc.clone(),
        })
    }

    fn create_upscaling_state(&self, desc: &UpscalingStateDesc, name: &str) -> anyhow::Result<UpscalingState, RhiError> {
        if desc.tech == UpscalingTech::None {
            return Err(invalid(name, "no upscaling technique"));
        }
        if desc.render_extent[0] > desc.output_extent[0] || desc.render_extent[1] > desc.output_extent[1] {
            return Err(invalid(name, format!("render extent {:?} is larger than output extent {:?}", desc.render_extent, desc.output_extent)));
        }

        Ok(UpscalingState {
            raw: self.register(ResourceKind::UpscalingState, name),
            desc: *desc,
        })
    }

    fn set_debug_name(&self, raw: RawHandle, name: &str) {
        if let Some((_, old)) = self.stats.live.borrow_mut().get_mut(&raw) {
            *old = name.to_owned();
        }
    }

    fn destroy_resource(&self, resource: GpuResource) {
        let raw = resource.raw();

        match self.stats.live.borrow_mut().remove(&raw) {
            Some((kind, name)) => {
                assert_eq!(kind, resource.kind());
                glog::trace!("[{}] destroy {} {:?} {}", self.name(), kind, name, raw);
            }
            None => panic!("Destroying {} {} which is not alive in backend {}!", resource.kind(), raw, self.name()),
        }

        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    BeginMarker(String),
    EndMarker,
    ClearTexture {
        texture: RawHandle,
        color: [f32; 4],
    },
    CopyTexture {
        src: RawHandle,
        dst: RawHandle,
    },
    Draw {
        state: RawHandle,
        bindings: Vec<RawHandle>,
        targets: Vec<RawHandle>,
        vertex_count: u32,
        instance_count: u32,
    },
    Dispatch {
        state: RawHandle,
        bindings: Vec<RawHandle>,
        group_count: [u32; 3],
    },
    TraceRays {
        state: RawHandle,
        bindings: Vec<RawHandle>,
        extent: [u32; 2],
    },
    BuildBottomLevelAs(RawHandle),
    BuildTopLevelAs(RawHandle),
    Upscale {
        state: RawHandle,
        input: RawHandle,
        output: RawHandle,
    },
}

/// Command recorder which keeps the recorded commands around for inspection.
#[derive(Default, Debug)]
pub struct NullCommandRecorder {
    commands: Vec<RecordedCommand>,
    marker_depth: u32,
}

impl NullCommandRecorder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn reset(&mut self) {
        assert_eq!(self.marker_depth, 0, "Unbalanced debug markers!");
        self.commands.clear();
    }
}

fn raw_list(bindings: &[&BindingSet]) -> Vec<RawHandle> {
    bindings.iter().map(|set| set.raw).collect()
}

impl CommandRecorder for NullCommandRecorder {
    fn begin_marker(&mut self, name: &str) {
        self.marker_depth += 1;
        self.commands.push(RecordedCommand::BeginMarker(name.to_owned()));
    }

    fn end_marker(&mut self) {
        assert!(self.marker_depth > 0, "end_marker() without a matching begin_marker()!");
        self.marker_depth -= 1;
        self.commands.push(RecordedCommand::EndMarker);
    }

    fn clear_texture(&mut self, texture: &Texture, color: [f32; 4]) {
        self.commands.push(RecordedCommand::ClearTexture { texture: texture.raw, color });
    }

    fn copy_texture(&mut self, src: &Texture, dst: &Texture) {
        self.commands.push(RecordedCommand::CopyTexture { src: src.raw, dst: dst.raw });
    }

    fn draw(
        &mut self,
        state: &RenderState,
        bindings: &[&BindingSet],
        targets: &[&Texture],
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.commands.push(RecordedCommand::Draw {
            state: state.raw,
            bindings: raw_list(bindings),
            targets: targets.iter().map(|tex| tex.raw).collect(),
            vertex_count,
            instance_count,
        });
    }

    fn dispatch(&mut self, state: &ComputeState, bindings: &[&BindingSet], group_count: [u32; 3]) {
        self.commands.push(RecordedCommand::Dispatch {
            state: state.raw,
            bindings: raw_list(bindings),
            group_count,
        });
    }

    fn trace_rays(&mut self, state: &RayTracingState, bindings: &[&BindingSet], extent: [u32; 2]) {
        self.commands.push(RecordedCommand::TraceRays {
            state: state.raw,
            bindings: raw_list(bindings),
            extent,
        });
    }

    fn build_bottom_level_as(&mut self, blas: &BottomLevelAs) {
        self.commands.push(RecordedCommand::BuildBottomLevelAs(blas.raw));
    }

    fn build_top_level_as(&mut self, tlas: &TopLevelAs) {
        self.commands.push(RecordedCommand::BuildTopLevelAs(tlas.raw));
    }

    fn upscale(&mut self, state: &UpscalingState, input: &Texture, output: &Texture) {
        self.commands.push(RecordedCommand::Upscale {
            state: state.raw,
            input: input.raw,
            output: output.raw,
        });
    }
}

/// Staging buffer with a fixed per frame budget, data is counted but not stored.
#[derive(Debug)]
pub struct NullUploadBuffer {
    capacity: usize,
    used: usize,
    uploads: Vec<(RawHandle, usize)>,
}

impl NullUploadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            uploads: Vec::new(),
        }
    }

    /// Destination and size of every upload since the last reset.
    pub fn uploads(&self) -> &[(RawHandle, usize)] {
        &self.uploads
    }

    fn stage(&mut self, dst: RawHandle, size: usize) -> anyhow::Result<(), RhiError> {
        if size > self.remaining() {
            return Err(RhiError::StagingOverflow {
                requested: size,
                remaining: self.remaining(),
            });
        }

        self.used += size;
        self.uploads.push((dst, size));
        Ok(())
    }
}

impl UploadBuffer for NullUploadBuffer {
    fn upload_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8]) -> anyhow::Result<(), RhiError> {
        if offset + data.len() as u64 > dst.desc.size {
            return Err(RhiError::InvalidDescriptor {
                name: dst.raw.to_string(),
                reason: format!("upload of {} bytes at offset {} overruns buffer of {} bytes", data.len(), offset, dst.desc.size),
            });
        }

        self.stage(dst.raw, data.len())
    }

    fn upload_texture(&mut self, dst: &Texture, data: &[u8]) -> anyhow::Result<(), RhiError> {
        if data.len() as u64 > dst.desc.size_in_bytes() {
            return Err(RhiError::InvalidDescriptor {
                name: dst.raw.to_string(),
                reason: format!("{} bytes uploaded into a texture of {} bytes", data.len(), dst.desc.size_in_bytes()),
            });
        }

        self.stage(dst.raw, data.len())
    }

    fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    fn reset(&mut self) {
        self.used = 0;
        self.uploads.clear();
    }
}
