use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;

use raven_rg::{AppState, Gui, GuiResponse, Registry, RenderDevice, RenderPipeline};
use raven_rhi::{NullCommandRecorder, NullUploadBuffer, UploadBuffer};
use raven_scene::Scene;

use crate::config::EngineConfig;

/// What one `draw_frame()` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    pub frame_index: u64,
    pub epoch: u64,
    pub rebuilt: bool,
    pub recorded_commands: usize,
    pub uploads: usize,
    pub destroyed_resources: usize,
}

/// Scene properties the scene node sizes its buffers from, a change forces a new epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SceneShape {
    vertex_count: usize,
    index_count: usize,
    light_count: usize,
    ray_tracing: bool,
}

impl SceneShape {
    fn of(scene: &Scene) -> Self {
        Self {
            vertex_count: scene.vertex_count(),
            index_count: scene.index_count(),
            light_count: scene.lights().len(),
            ray_tracing: scene.ray_tracing_enabled(),
        }
    }
}

/// Global engine context to have control on engine on user side.
///
/// Owns the device, the current registry epoch and the pipeline. Frames are recorded into a null command recorder.
pub struct EngineContext {
    config: EngineConfig,

    device: Rc<RenderDevice>,
    registry: Option<Registry>,
    pipeline: RenderPipeline,

    recorder: NullCommandRecorder,
    upload: NullUploadBuffer,

    frame_index: u64,
    first_frame: bool,
    rebuild_requested: bool,
    constructed_shape: Option<SceneShape>,

    start_time: Instant,
    last_frame_time: Instant,
}

impl EngineContext {
    pub(crate) fn new(config: EngineConfig, device: Rc<RenderDevice>, scene: Scene) -> Self {
        let pipeline = RenderPipeline::new(scene, config.output_resolution, config.pipeline);
        let upload = NullUploadBuffer::new(config.upload_capacity);
        let now = Instant::now();

        Self {
            config,
            device,
            registry: None,
            pipeline,
            recorder: NullCommandRecorder::new(),
            upload,
            frame_index: 0,
            first_frame: true,
            rebuild_requested: true,
            constructed_shape: None,
            start_time: now,
            last_frame_time: now,
        }
    }

    /// Start a new registry epoch with the current one as its previous and construct every node against it.
    ///
    /// A failed epoch stays as the current registry with the reusable resources, the next frame retries on top of it.
    pub fn rebuild(&mut self) -> anyhow::Result<()> {
        let previous = self.registry.take();
        let mut registry = Registry::new(&self.device, self.config.registry, previous);
        let epoch = registry.epoch();

        if let Err(err) = self.pipeline.construct_all(&mut registry) {
            self.registry = Some(registry);
            self.rebuild_requested = true;
            return Err(err.context(format!("Failed to rebuild render pipeline at registry epoch {}", epoch)));
        }

        glog::debug!("Render pipeline rebuilt, registry epoch {} ({} live gpu resources)",
            registry.epoch(), self.device.live_resource_count());

        self.constructed_shape = Some(SceneShape::of(self.pipeline.scene()));
        self.registry = Some(registry);
        self.first_frame = true;
        self.rebuild_requested = false;
        Ok(())
    }

    fn needs_rebuild(&self) -> bool {
        self.rebuild_requested
            || self.registry.is_none()
            || self.constructed_shape != Some(SceneShape::of(self.pipeline.scene()))
    }

    /// Record and retire one frame, rebuilding the pipeline first if anything asked for it.
    pub fn draw_frame(&mut self) -> anyhow::Result<FrameSummary> {
        let rebuilt = self.needs_rebuild();
        if rebuilt {
            self.rebuild()?;
        }

        let now = Instant::now();
        let delta = if self.frame_index == 0 { Duration::ZERO } else { now - self.last_frame_time };
        self.last_frame_time = now;

        let frame_index = self.device.begin_frame();
        let app_state = AppState::new(frame_index, now - self.start_time, delta, self.first_frame);

        let registry = match self.registry.as_ref() {
            Some(registry) => registry,
            None => anyhow::bail!("No registry to execute frame {} against!", frame_index),
        };
        let result = self.pipeline.execute(registry, &app_state, &mut self.recorder, &mut self.upload);

        let recorded_commands = self.recorder.commands().len();
        let uploads = self.upload.uploads().len();
        self.recorder.reset();
        self.upload.reset();

        let destroyed_resources = self.device.end_frame();
        self.frame_index += 1;
        self.first_frame = false;

        result.with_context(|| format!("Failed to draw frame {}", frame_index))?;
        glog::trace!("Frame {} recorded {} commands, {} uploads", frame_index, recorded_commands, uploads);

        Ok(FrameSummary {
            frame_index,
            epoch: registry.epoch(),
            rebuilt,
            recorded_commands,
            uploads,
            destroyed_resources,
        })
    }

    pub fn run_frames(&mut self, count: u64) -> anyhow::Result<Vec<FrameSummary>> {
        (0..count).map(|_| self.draw_frame()).collect()
    }

    /// Apply a new output resolution, the pipeline is rebuilt on the next frame if it changed.
    pub fn resize(&mut self, resolution: [u32; 2]) -> bool {
        let changed = self.pipeline.set_output_resolution(resolution);
        if changed {
            glog::trace!("Resized to [{}, {}]", resolution[0], resolution[1]);
            self.rebuild_requested = true;
        }
        changed
    }

    pub fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        let response = self.pipeline.draw_gui(gui);
        if response.rebuild_required {
            self.rebuild_requested = true;
        }
        response
    }

    #[inline]
    pub fn request_rebuild(&mut self) {
        self.rebuild_requested = true;
    }

    #[inline]
    pub fn device(&self) -> &Rc<RenderDevice> {
        &self.device
    }

    #[inline]
    pub fn registry(&self) -> Option<&Registry> {
        self.registry.as_ref()
    }

    #[inline]
    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// Nodes can only be added before the first frame.
    #[inline]
    pub fn pipeline_mut(&mut self) -> &mut RenderPipeline {
        &mut self.pipeline
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        self.pipeline.scene()
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.pipeline.scene_mut()
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop the pipeline callbacks and the registry, then destroy everything left on the device.
    pub(crate) fn shutdown(self) {
        let EngineContext {
            device,
            registry,
            pipeline,
            frame_index,
            ..
        } = self;

        drop(pipeline);
        drop(registry);
        device.shutdown();

        glog::trace!("Engine shut down after {} frames", frame_index);
    }
}
