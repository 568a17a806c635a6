use anyhow::Context;

use raven_math::min_value_align_to;
use raven_rhi::{CommandRecorder, UploadBuffer};
use raven_rhi::backend::{BufferDesc, BufferUsage, BottomLevelAsDesc, TopLevelAsDesc, Buffer, BottomLevelAs, TopLevelAs};
use raven_scene::{Light, Mesh, Scene};

use crate::node::{ExecuteCallback, RenderPipelineNode};
use crate::registry::Registry;
use crate::resource::RgHandle;

pub const SCENE_NODE_NAME: &str = "Scene";

pub const SCENE_VERTICES: &str = "Scene.Vertices";
pub const SCENE_INDICES: &str = "Scene.Indices";
pub const SCENE_LIGHTS: &str = "Scene.Lights";
pub const SCENE_BLAS: &str = "Scene.BLAS";
pub const SCENE_TLAS: &str = "Scene.TLAS";

/// Smallest buffer the scene node creates, empty scenes still publish valid buffers.
const MIN_BUFFER_SIZE: usize = 16;

/// Built-in first node of every pipeline, publishes the scene geometry and lights.
pub(crate) struct SceneNode;

struct SceneUploadState {
    uploaded_revision: Option<u64>,
}

struct SceneBuffers {
    vertices: RgHandle<Buffer>,
    indices: RgHandle<Buffer>,
    lights: RgHandle<Buffer>,
    accel: Option<(RgHandle<BottomLevelAs>, RgHandle<TopLevelAs>)>,
}

fn buffer_size(bytes: usize) -> u64 {
    min_value_align_to(bytes.max(MIN_BUFFER_SIZE), MIN_BUFFER_SIZE) as u64
}

impl SceneBuffers {
    fn upload(&self, scene: &Scene, recorder: &mut dyn CommandRecorder, upload: &mut dyn UploadBuffer) -> anyhow::Result<()> {
        let geometry_hint = "scene geometry outgrew its buffers, the pipeline must be rebuilt";

        upload.upload_buffer(&self.vertices, 0, &scene.vertex_data()).context(geometry_hint)?;
        upload.upload_buffer(&self.indices, 0, &scene.index_data()).context(geometry_hint)?;
        upload.upload_buffer(&self.lights, 0, &scene.light_data()).context(geometry_hint)?;

        if let Some((blas, tlas)) = &self.accel {
            recorder.build_bottom_level_as(blas);
            recorder.build_top_level_as(tlas);
        }

        Ok(())
    }
}

impl RenderPipelineNode for SceneNode {
    fn name(&self) -> &str {
        SCENE_NODE_NAME
    }

    fn construct(&mut self, scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        let geometry_usage = BufferUsage::STORAGE | BufferUsage::TRANSFER_DST | BufferUsage::ACCEL_STRUCT_INPUT;

        let vertices = registry.create_buffer(
            &BufferDesc::new_gpu_only(buffer_size(scene.vertex_count() * Mesh::VERTEX_STRIDE), BufferUsage::VERTEX | geometry_usage),
            SCENE_VERTICES,
        )?;
        let indices = registry.create_buffer(
            &BufferDesc::new_gpu_only(buffer_size(scene.index_count() * 4), BufferUsage::INDEX | geometry_usage),
            SCENE_INDICES,
        )?;
        let lights = registry.create_buffer(
            &BufferDesc::new_gpu_only(buffer_size(scene.lights().len() * Light::GPU_SIZE), BufferUsage::STORAGE | BufferUsage::TRANSFER_DST),
            SCENE_LIGHTS,
        )?;

        registry.publish(SCENE_VERTICES, &vertices);
        registry.publish(SCENE_INDICES, &indices);
        registry.publish(SCENE_LIGHTS, &lights);

        let ray_tracing = scene.ray_tracing_enabled() && registry.device().backend().supports_ray_tracing();
        if scene.ray_tracing_enabled() && !ray_tracing {
            glog::warn!("Ray tracing requested, but backend {} does not support it", registry.device().backend().name());
        }

        let accel = if ray_tracing && scene.vertex_count() > 0 {
            let blas = registry.create_bottom_level_as(&BottomLevelAsDesc {
                vertex_buffer: vertices.raw,
                vertex_count: scene.vertex_count() as u32,
                vertex_stride: Mesh::VERTEX_STRIDE as u32,
                index_buffer: Some(indices.raw),
                index_count: scene.index_count() as u32,
                opaque: true,
            }, SCENE_BLAS)?;
            let tlas = registry.create_top_level_as(&TopLevelAsDesc {
                max_instances: 1,
                instances: vec![blas.raw],
            }, SCENE_TLAS)?;

            registry.publish(SCENE_BLAS, &blas);
            registry.publish(SCENE_TLAS, &tlas);
            Some((blas, tlas))
        } else {
            None
        };

        let buffers = SceneBuffers {
            vertices,
            indices,
            lights,
            accel,
        };
        let mut state = registry.allocate(SceneUploadState { uploaded_revision: None });

        Ok(Box::new(move |app_state, scene, recorder, upload| {
            if !app_state.first_frame && state.uploaded_revision == Some(scene.revision()) {
                return Ok(());
            }

            recorder.begin_marker("scene upload");
            let result = buffers.upload(scene, recorder, upload);
            recorder.end_marker();
            result?;

            glog::trace!("Scene revision {} uploaded on frame {}", scene.revision(), app_state.frame_index);
            state.uploaded_revision = Some(scene.revision());
            Ok(())
        }))
    }
}
