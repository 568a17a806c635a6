// use log macros.
#[macro_use]
extern crate log as _log;

use structopt::StructOpt;

use raven_engine::prelude::*;

mod args;
mod nodes;

use args::SandboxArgs;
use nodes::{GBufferNode, LightingNode, BloomNode, UpscaleNode, TonemapNode};

struct Sandbox {
    args: SandboxArgs,
    config: EngineConfig,
    upscaling: UpscalingTech,
    frames_left: u64,
    time: f32,
}

impl Sandbox {
    fn from_args() -> Self {
        let args = SandboxArgs::from_args();

        let (config, upscaling) = match args.engine_config().and_then(|config| Ok((config, args.upscaling_tech()?))) {
            Ok(parsed) => parsed,
            Err(err) => {
                eprintln!("Invalid arguments: {:#}", err);
                std::process::exit(2);
            }
        };

        Self {
            frames_left: args.frames,
            args,
            config,
            upscaling,
            time: 0.0,
        }
    }
}

fn build_scene(scene: &mut Scene, ray_tracing: bool) {
    scene.add_mesh(Mesh::quad("ground", 20.0));
    scene.add_mesh(Mesh::quad("wall", 4.0)
        .with_transform(Mat4::from_rotation_translation(
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 2.0, -5.0),
        )));

    scene.add_light(Light::directional(Vec3::new(-0.4, -1.0, -0.3), Vec3::new(1.0, 0.95, 0.9), 4.0));
    scene.add_light(Light::point(Vec3::new(1.0, 1.5, 0.0), 6.0, Vec3::new(1.0, 0.4, 0.1), 20.0));

    scene.camera.transform = CameraTransform {
        position: Vec3::new(0.0, 2.0, 6.0),
        rotation: Quat::IDENTITY,
    };
    scene.set_ray_tracing_enabled(ray_tracing);
}

impl App for Sandbox {
    fn config(&self) -> EngineConfig {
        self.config.clone()
    }

    fn init(&mut self, engine: &mut EngineContext) -> anyhow::Result<()> {
        build_scene(engine.scene_mut(), self.args.ray_tracing);

        let pipeline = engine.pipeline_mut();
        pipeline.add_node(GBufferNode);
        pipeline.add_node(LightingNode);
        pipeline.add_node(BloomNode { enabled: self.args.bloom });
        pipeline.add_node(UpscaleNode { tech: self.upscaling });
        pipeline.add_node(TonemapNode::new());

        info!("Sandbox pipeline: {:?}", engine.pipeline().node_names());
        Ok(())
    }

    fn tick_logic(&mut self, engine: &mut EngineContext, dt: f32) -> anyhow::Result<bool> {
        if self.frames_left == 0 {
            return Ok(false);
        }
        self.frames_left -= 1;

        if Some(engine.frame_index()) == self.args.resize_at {
            let [width, height] = engine.pipeline().output_resolution();
            engine.resize([(width / 2).max(1), (height / 2).max(1)]);
        }

        // flicker the sun a bit, so the scene is uploaded again
        self.time += dt;
        if let Some(sun) = engine.scene_mut().light_mut(0) {
            sun.intensity = 4.0 + (self.time * 0.5).sin();
        }
        Ok(true)
    }

    fn shutdown(&mut self, engine: &mut EngineContext) {
        for timing in engine.pipeline().timings() {
            info!("{:>10}: {:.3}ms", timing.name, timing.smoothed.as_secs_f32() * 1000.0);
        }

        if let Some(registry) = engine.registry() {
            debug!("Final dependencies:\n{}", registry.dependency_dot());
        }
        for violation in engine.pipeline().ordering_violations() {
            warn!("{:?} fetched {:?} before {:?} published it", violation.consumer, violation.name, violation.producer);
        }
    }
}

raven_main!(Sandbox::from_args());
