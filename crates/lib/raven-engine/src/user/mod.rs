use crate::{EngineConfig, EngineContext};

pub trait App {
    /// Called once before the engine is initialized.
    fn config(&self) -> EngineConfig;

    /// Fill the scene and add pipeline nodes here, the pipeline is constructed on the first frame.
    fn init(&mut self, engine: &mut EngineContext) -> anyhow::Result<()>;

    /// Returns false to leave the main loop.
    fn tick_logic(&mut self, engine: &mut EngineContext, dt: f32) -> anyhow::Result<bool>;

    fn shutdown(&mut self, engine: &mut EngineContext);
}

#[macro_export]
macro_rules! raven_main {
    ($app:expr) => {
        fn main() {
            let mut app = $app;
            raven_engine::run(&mut app).unwrap_or_else(|err| {
                eprintln!("Raven Engine failed with: {:?}", err); // use eprintln here, because log module may not be initialized successfully.
                std::process::exit(1);
            });
        }
    };
}
