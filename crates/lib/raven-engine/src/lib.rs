extern crate log as glog;

use raven_rg::RenderDevice;
use raven_rhi::{Backend, NullBackend};
use raven_scene::Scene;

mod config;
mod context;
mod user;
pub mod prelude;

// Raven Engine exposed APIs
pub use config::EngineConfig;
pub use context::{EngineContext, FrameSummary};
pub use user::App;

/// Initialize raven engine on the null backend.
pub fn init(config: EngineConfig) -> anyhow::Result<EngineContext> {
    let backend = NullBackend::new(config.ray_tracing);
    init_with_backend(config, Box::new(backend))
}

/// Initialize raven engine on top of `backend`, the pipeline starts with an empty scene.
pub fn init_with_backend(config: EngineConfig, backend: Box<dyn Backend>) -> anyhow::Result<EngineContext> {
    if let Some(log_config) = &config.log {
        raven_log::init_log(log_config)?;
    }

    glog::debug!("Render device created on backend {} (ray tracing: {})",
        backend.name(), backend.supports_ray_tracing());
    let device = RenderDevice::new(backend, config.device);

    glog::trace!("Raven Engine initialized!");
    Ok(EngineContext::new(config, device, Scene::new()))
}

/// Tick `app` and draw frames until it asks to stop.
pub fn main_loop(engine: &mut EngineContext, app: &mut dyn App) -> anyhow::Result<()> {
    glog::trace!("Begin main loop.");

    let mut last_tick = std::time::Instant::now();
    loop {
        let now = std::time::Instant::now();
        let dt = (now - last_tick).as_secs_f32();
        last_tick = now;

        if !app.tick_logic(engine, dt)? {
            break;
        }
        engine.draw_frame()?;
    }

    glog::trace!("Exit main loop successfully!");
    Ok(())
}

/// Shutdown raven engine.
pub fn shutdown(engine: EngineContext) {
    engine.shutdown();
    glog::trace!("Raven Engine shutdown.");
}

/// Drive `app` through the whole engine lifetime.
pub fn run(app: &mut dyn App) -> anyhow::Result<()> {
    let mut engine = init(app.config())?;
    app.init(&mut engine)?;

    let result = main_loop(&mut engine, app);

    app.shutdown(&mut engine);
    shutdown(engine);
    result
}

