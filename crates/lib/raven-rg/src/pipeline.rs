use anyhow::Context;

use raven_rhi::{CommandRecorder, UploadBuffer};
use raven_rhi::backend::UpscalingTech;
use raven_scene::Scene;

use crate::app_state::AppState;
use crate::error::PipelineError;
use crate::gui::{Gui, GuiResponse};
use crate::lambda_node::LambdaNode;
use crate::node::{ExecuteCallback, RenderPipelineNode};
use crate::registry::{PipelineToken, Registry, RegistryState};
use crate::resource::RegistryId;
use crate::scene_node::SceneNode;
use crate::timer::{NodeTimer, NodeTiming};

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineConfig {
    /// Treat a node fetching a resource published by a later node as fatal.
    pub strict_ordering: bool,
}

/// `consumer` asked for `name` before `producer`, declared after it, published it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderingViolation {
    pub consumer: String,
    pub producer: String,
    pub name: String,
}

struct NodeContext {
    node_index: usize,
    callback: ExecuteCallback,
}

/// Ordered list of nodes, constructed together against one registry and executed in declared order.
///
/// The first node is always the built-in scene node.
pub struct RenderPipeline {
    config: PipelineConfig,
    token: PipelineToken,

    scene: Scene,
    nodes: Vec<Box<dyn RenderPipelineNode>>,
    timers: Vec<NodeTimer>,

    contexts: Vec<NodeContext>,
    constructed_with: Option<RegistryId>,
    violations: Vec<OrderingViolation>,

    output_resolution: [u32; 2],
    render_resolution: [u32; 2],
}

impl RenderPipeline {
    pub fn new(scene: Scene, output_resolution: [u32; 2], config: PipelineConfig) -> Self {
        Self {
            config,
            token: PipelineToken::new(),
            scene,
            nodes: vec![Box::new(SceneNode)],
            timers: vec![NodeTimer::new()],
            contexts: Vec::new(),
            constructed_with: None,
            violations: Vec::new(),
            output_resolution,
            render_resolution: output_resolution,
        }
    }

    pub fn try_add_boxed_node(&mut self, node: Box<dyn RenderPipelineNode>) -> Result<usize, PipelineError> {
        let name = node.name().to_owned();

        if !self.contexts.is_empty() || self.constructed_with.is_some() {
            return Err(PipelineError::TopologyLocked { name });
        }
        if self.nodes.iter().any(|existing| existing.name() == name) {
            return Err(PipelineError::DuplicateNodeName { name });
        }

        glog::trace!("Node {:?} added to the render pipeline", name);
        self.nodes.push(node);
        self.timers.push(NodeTimer::new());

        Ok(self.nodes.len() - 1)
    }

    /// Append a node, the topology is frozen once the pipeline is constructed.
    pub fn add_boxed_node(&mut self, node: Box<dyn RenderPipelineNode>) -> usize {
        match self.try_add_boxed_node(node) {
            Ok(index) => index,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn add_node<N: RenderPipelineNode + 'static>(&mut self, node: N) -> usize {
        self.add_boxed_node(Box::new(node))
    }

    pub fn add_lambda_node<F>(&mut self, name: &str, construct: F) -> usize
    where
        F: FnMut(&mut Scene, &mut Registry) -> anyhow::Result<ExecuteCallback> + 'static,
    {
        self.add_node(LambdaNode::new(name, construct))
    }

    /// Construct every node in declared order against `registry`.
    ///
    /// Previous execute callbacks are dropped first. On failure the pipeline is left without any callback
    /// and the registry is marked [`RegistryState::Failed`], it can only serve as the previous registry of a retry.
    pub fn construct_all(&mut self, registry: &mut Registry) -> anyhow::Result<()> {
        if registry.state() != RegistryState::Fresh {
            return Err(PipelineError::RegistryNotFresh {
                id: registry.id().raw(),
                epoch: registry.epoch(),
                state: registry.state(),
            }.into());
        }

        self.contexts.clear();
        self.constructed_with = None;
        self.violations.clear();

        self.render_resolution = self.upscaling_tech().render_resolution(self.output_resolution);
        registry.set_resolution(&self.token, self.render_resolution, self.output_resolution);

        for (node_index, node) in self.nodes.iter_mut().enumerate() {
            registry.set_current_node(&self.token, Some(node.name()));
            let result = node.construct(&mut self.scene, registry);
            registry.set_current_node(&self.token, None);

            match result {
                Ok(callback) => self.contexts.push(NodeContext { node_index, callback }),
                Err(err) => {
                    self.contexts.clear();
                    registry.abort_construction(&self.token);
                    return Err(err.context(format!("Failed to construct node {:?}", node.name())));
                }
            }
        }

        registry.finish_construction(&self.token);
        self.constructed_with = Some(registry.id());

        self.violations = self.find_ordering_violations(registry);
        for violation in &self.violations {
            glog::warn!("Node {:?} requested {:?} before node {:?} published it, it received nothing",
                violation.consumer, violation.name, violation.producer);
        }

        if self.config.strict_ordering {
            if let Some(violation) = self.violations.first() {
                panic!("{}", PipelineError::OrderingViolation {
                    consumer: violation.consumer.clone(),
                    producer: violation.producer.clone(),
                    name: violation.name.clone(),
                });
            }
        }

        glog::debug!("Render pipeline constructed {} nodes at {:?} (output {:?})",
            self.contexts.len(), self.render_resolution, self.output_resolution);
        Ok(())
    }

    fn node_position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name() == name)
    }

    fn find_ordering_violations(&self, registry: &Registry) -> Vec<OrderingViolation> {
        for dep in registry.dependencies() {
            debug_assert!(self.node_position(&dep.producer) < self.node_position(&dep.consumer),
                "{:?} depends on later node {:?}", dep.consumer, dep.producer);
        }

        registry.unresolved_requests().iter()
            .filter_map(|request| {
                let producer = registry.publisher_of_kind(request.kind, &request.name)?;
                if producer == request.consumer {
                    return None;
                }

                Some(OrderingViolation {
                    consumer: request.consumer.clone(),
                    producer: producer.to_owned(),
                    name: request.name.clone(),
                })
            })
            .collect()
    }

    /// Per frame driver, hands every execute callback to `func` in declared order and times it.
    pub fn for_each_node_in_resolved_order<F>(&mut self, registry: &Registry, mut func: F) -> anyhow::Result<()>
    where
        F: FnMut(&str, &Scene, &mut NodeTimer, &mut ExecuteCallback) -> anyhow::Result<()>,
    {
        if self.constructed_with != Some(registry.id()) {
            panic!("{}", PipelineError::StaleRegistry {
                constructed: self.constructed_with.map(|id| id.raw()),
                executed: registry.id().raw(),
            });
        }

        for context in self.contexts.iter_mut() {
            let name = self.nodes[context.node_index].name();
            let timer = &mut self.timers[context.node_index];

            timer.begin();
            let result = func(name, &self.scene, &mut *timer, &mut context.callback);
            timer.end();

            result.with_context(|| format!("Node {:?} failed to execute", name))?;
        }

        Ok(())
    }

    /// Run all the execute callbacks once, each wrapped in a debug marker.
    pub fn execute(
        &mut self,
        registry: &Registry,
        app_state: &AppState,
        recorder: &mut dyn CommandRecorder,
        upload: &mut dyn UploadBuffer,
    ) -> anyhow::Result<()> {
        let app_state = app_state.with_resolution(self.render_resolution, self.output_resolution);

        self.for_each_node_in_resolved_order(registry, |name, scene, _, callback| {
            recorder.begin_marker(name);
            let result = callback(&app_state, scene, &mut *recorder, &mut *upload);
            recorder.end_marker();
            result
        })
    }

    /// Returns true if the pipeline must be rebuilt.
    pub fn set_output_resolution(&mut self, resolution: [u32; 2]) -> bool {
        if resolution == self.output_resolution {
            return false;
        }

        glog::debug!("Output resolution changed {:?} -> {:?}", self.output_resolution, resolution);
        self.output_resolution = resolution;
        true
    }

    /// Upscaling technique of the first node which reports one.
    pub fn upscaling_tech(&self) -> UpscalingTech {
        self.nodes.iter()
            .find_map(|node| node.upscaling_tech())
            .unwrap_or(UpscalingTech::None)
    }

    pub fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        let tech = self.upscaling_tech();
        let mut response = GuiResponse::default();

        for node in self.nodes.iter_mut() {
            let name = node.name().to_owned();
            gui.collapsing(&name, &mut |gui: &mut dyn Gui| {
                response = response.merge(node.draw_gui(gui));
            });
        }

        if self.upscaling_tech() != tech {
            response.rebuild_required = true;
        }
        response
    }

    pub fn timings(&self) -> Vec<NodeTiming> {
        self.nodes.iter()
            .zip(self.timers.iter())
            .map(|(node, timer)| NodeTiming {
                name: node.name().to_owned(),
                last: timer.last(),
                smoothed: timer.smoothed(),
            })
            .collect()
    }

    pub fn ordering_violations(&self) -> &[OrderingViolation] {
        &self.violations
    }

    #[inline]
    pub fn is_constructed(&self) -> bool {
        self.constructed_with.is_some()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name()).collect()
    }

    #[inline]
    pub fn render_resolution(&self) -> [u32; 2] {
        self.render_resolution
    }

    #[inline]
    pub fn output_resolution(&self) -> [u32; 2] {
        self.output_resolution
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
