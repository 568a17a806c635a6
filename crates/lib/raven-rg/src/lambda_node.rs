use raven_scene::Scene;

use crate::node::{ExecuteCallback, RenderPipelineNode};
use crate::registry::Registry;

type ConstructFn = Box<dyn FnMut(&mut Scene, &mut Registry) -> anyhow::Result<ExecuteCallback>>;

/// Node made of a single construct closure, node state lives in the closure captures.
pub struct LambdaNode {
    name: String,
    construct: ConstructFn,
}

impl LambdaNode {
    pub fn new<F>(name: &str, construct: F) -> Self
    where
        F: FnMut(&mut Scene, &mut Registry) -> anyhow::Result<ExecuteCallback> + 'static,
    {
        Self {
            name: name.to_owned(),
            construct: Box::new(construct),
        }
    }
}

impl RenderPipelineNode for LambdaNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn construct(&mut self, scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        (self.construct)(scene, registry)
    }
}
