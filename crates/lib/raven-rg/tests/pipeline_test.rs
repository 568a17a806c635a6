mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use raven_math::Vec3;
use raven_rg::*;
use raven_rhi::backend::{Buffer, TextureDesc, Format, UpscalingTech, UpscalingQuality};
use raven_rhi::{NullCommandRecorder, NullUploadBuffer, RecordedCommand, UploadBuffer};
use raven_scene::{Light, Mesh, Scene};

use common::{frame, null_device, ToggleGui};

fn recording_node(pipeline: &mut RenderPipeline, name: &'static str, order: Rc<RefCell<Vec<&'static str>>>) {
    pipeline.add_lambda_node(name, move |_, _| {
        let order = order.clone();
        Ok(Box::new(move |_, _, _, _| {
            order.borrow_mut().push(name);
            Ok(())
        }))
    });
}

#[test]
fn nodes_execute_in_declared_order_after_the_scene() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = RenderPipeline::new(Scene::new(), [800, 600], PipelineConfig::default());
    recording_node(&mut pipeline, "GBuffer", order.clone());
    recording_node(&mut pipeline, "Lighting", order.clone());
    recording_node(&mut pipeline, "Tonemap", order.clone());
    assert_eq!(pipeline.node_names(), vec![SCENE_NODE_NAME, "GBuffer", "Lighting", "Tonemap"]);

    pipeline.construct_all(&mut registry).unwrap();

    let mut recorder = NullCommandRecorder::new();
    let mut upload = NullUploadBuffer::new(1 << 20);
    pipeline.execute(&registry, &frame(0, true), &mut recorder, &mut upload).unwrap();

    assert_eq!(*order.borrow(), vec!["GBuffer", "Lighting", "Tonemap"]);
    assert_eq!(recorder.commands()[0], RecordedCommand::BeginMarker(SCENE_NODE_NAME.to_owned()));
    assert_eq!(pipeline.timings().len(), 4);
}

#[test]
fn for_each_node_reports_every_callback_with_its_name() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    recording_node(&mut pipeline, "Sky", order.clone());
    pipeline.construct_all(&mut registry).unwrap();

    let mut visited = Vec::new();
    pipeline.for_each_node_in_resolved_order(&registry, |name, _, timer, _| {
        timer.record(std::time::Duration::from_micros(50));
        visited.push(name.to_owned());
        Ok(())
    }).unwrap();

    assert_eq!(visited, vec![SCENE_NODE_NAME.to_owned(), "Sky".to_owned()]);
    // callbacks were handed out but not invoked
    assert!(order.borrow().is_empty());
}

#[test]
#[should_panic(expected = "after the pipeline has been constructed")]
fn adding_a_node_after_construction_panics() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.construct_all(&mut registry).unwrap();

    pipeline.add_lambda_node("Late", |_, _| Ok(noop_callback()));
}

#[test]
fn duplicate_node_names_are_rejected() {
    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.add_lambda_node("Taa", |_, _| Ok(noop_callback()));

    let result = pipeline.try_add_boxed_node(Box::new(LambdaNode::new("Taa", |_, _| Ok(noop_callback()))));
    assert!(matches!(result, Err(PipelineError::DuplicateNodeName { .. })));
}

fn add_misordered_nodes(pipeline: &mut RenderPipeline) {
    pipeline.add_lambda_node("Composite", |_, registry| {
        assert!(registry.get_texture("Bloom.Output").is_none());
        Ok(noop_callback())
    });
    pipeline.add_lambda_node("Bloom", |_, registry| {
        let tex = registry.create_texture(&TextureDesc::new_2d([64, 64], Format::Rgba16Float), "bloom")?;
        registry.publish("Bloom.Output", &tex);
        Ok(noop_callback())
    });
}

#[test]
fn fetching_from_a_later_node_is_reported() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    add_misordered_nodes(&mut pipeline);
    pipeline.construct_all(&mut registry).unwrap();

    assert_eq!(pipeline.ordering_violations(), &[OrderingViolation {
        consumer: "Composite".to_owned(),
        producer: "Bloom".to_owned(),
        name: "Bloom.Output".to_owned(),
    }]);
    assert!(registry.dependencies().is_empty());
}

#[test]
#[should_panic(expected = "declare \"Bloom\" first")]
fn strict_ordering_makes_violations_fatal() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig { strict_ordering: true });
    add_misordered_nodes(&mut pipeline);
    let _ = pipeline.construct_all(&mut registry);
}

#[test]
fn construct_failure_leaves_no_callbacks() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.add_lambda_node("Broken", |_, registry| {
        registry.create_texture(&TextureDesc::new_2d([0, 64], Format::R8Unorm), "broken")?;
        Ok(noop_callback())
    });

    let err = pipeline.construct_all(&mut registry).unwrap_err();
    assert!(format!("{:#}", err).starts_with("Failed to construct node \"Broken\""));
    assert!(!pipeline.is_constructed());

    // nothing is constructed, so the topology is still open
    pipeline.add_lambda_node("Fixed", |_, _| Ok(noop_callback()));
}

#[test]
#[should_panic(expected = "was constructed with registry")]
fn executing_against_another_registry_panics() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let other = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.construct_all(&mut registry).unwrap();

    let _ = pipeline.for_each_node_in_resolved_order(&other, |_, _, _, _| Ok(()));
}

#[test]
fn execute_errors_carry_the_node_name() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.add_lambda_node("Readback", |_, _| {
        Ok(Box::new(|_, _, _, _| anyhow::bail!("device lost")))
    });
    pipeline.construct_all(&mut registry).unwrap();

    let mut recorder = NullCommandRecorder::new();
    let mut upload = NullUploadBuffer::new(1 << 20);
    let err = pipeline.execute(&registry, &frame(0, true), &mut recorder, &mut upload).unwrap_err();

    assert_eq!(format!("{:#}", err), "Node \"Readback\" failed to execute: device lost");
}

fn demo_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add_mesh(Mesh::quad("floor", 10.0));
    scene.add_light(Light::directional(Vec3::new(0.3, -1.0, 0.2), Vec3::ONE, 5.0));
    scene
}

#[test]
fn scene_node_publishes_geometry() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let found = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = RenderPipeline::new(demo_scene(), [64, 64], PipelineConfig::default());
    {
        let found = found.clone();
        pipeline.add_lambda_node("Raster", move |_, registry| {
            for name in [SCENE_VERTICES, SCENE_INDICES, SCENE_LIGHTS] {
                found.borrow_mut().push(registry.get::<Buffer>(name).is_some());
            }
            found.borrow_mut().push(registry.get_top_level_as(SCENE_TLAS).is_some());
            Ok(noop_callback())
        });
    }
    pipeline.construct_all(&mut registry).unwrap();

    assert_eq!(*found.borrow(), vec![true, true, true, false]);
    assert_eq!(registry.dependencies().len(), 1);
}

#[test]
fn scene_node_builds_acceleration_structures_with_ray_tracing() {
    let (device, _) = null_device(true);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let has_tlas = Rc::new(Cell::new(false));

    let mut scene = demo_scene();
    scene.set_ray_tracing_enabled(true);

    let mut pipeline = RenderPipeline::new(scene, [64, 64], PipelineConfig::default());
    {
        let has_tlas = has_tlas.clone();
        pipeline.add_lambda_node("Shadows", move |_, registry| {
            has_tlas.set(registry.get_top_level_as(SCENE_TLAS).is_some());
            Ok(noop_callback())
        });
    }
    pipeline.construct_all(&mut registry).unwrap();
    assert!(has_tlas.get());

    let mut recorder = NullCommandRecorder::new();
    let mut upload = NullUploadBuffer::new(1 << 20);
    pipeline.execute(&registry, &frame(0, true), &mut recorder, &mut upload).unwrap();

    assert!(recorder.commands().iter().any(|cmd| matches!(cmd, RecordedCommand::BuildTopLevelAs(_))));
}

#[test]
fn scene_is_uploaded_on_first_frame_and_after_changes() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = RenderPipeline::new(demo_scene(), [64, 64], PipelineConfig::default());
    pipeline.construct_all(&mut registry).unwrap();

    let mut recorder = NullCommandRecorder::new();
    let mut upload = NullUploadBuffer::new(1 << 20);

    pipeline.execute(&registry, &frame(0, true), &mut recorder, &mut upload).unwrap();
    assert_eq!(upload.uploads().len(), 3);

    upload.reset();
    pipeline.execute(&registry, &frame(1, false), &mut recorder, &mut upload).unwrap();
    assert!(upload.uploads().is_empty());

    pipeline.scene_mut().light_mut(0).unwrap().intensity = 1.0;
    pipeline.execute(&registry, &frame(2, false), &mut recorder, &mut upload).unwrap();
    assert_eq!(upload.uploads().len(), 3);
}

struct UpscaledNode {
    tech: UpscalingTech,
    seen_resolution: Rc<Cell<[u32; 2]>>,
    sharpen: bool,
}

impl RenderPipelineNode for UpscaledNode {
    fn name(&self) -> &str {
        "Upscale"
    }

    fn construct(&mut self, _scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback> {
        self.seen_resolution.set(registry.render_resolution());
        Ok(noop_callback())
    }

    fn draw_gui(&mut self, gui: &mut dyn Gui) -> GuiResponse {
        GuiResponse::rebuild(gui.checkbox("sharpen", &mut self.sharpen))
    }

    fn upscaling_tech(&self) -> Option<UpscalingTech> {
        Some(self.tech)
    }
}

#[test]
fn render_resolution_follows_the_upscaler() {
    let (device, _) = null_device(false);
    let seen_resolution = Rc::new(Cell::new([0, 0]));

    let mut pipeline = RenderPipeline::new(Scene::new(), [1920, 1080], PipelineConfig::default());
    pipeline.add_node(UpscaledNode {
        tech: UpscalingTech::Fsr(UpscalingQuality::Performance),
        seen_resolution: seen_resolution.clone(),
        sharpen: false,
    });

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();
    assert_eq!(seen_resolution.get(), [960, 540]);
    assert_eq!(pipeline.render_resolution(), [960, 540]);

    assert!(!pipeline.set_output_resolution([1920, 1080]));
    assert!(pipeline.set_output_resolution([1280, 720]));

    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    pipeline.construct_all(&mut second).unwrap();
    assert_eq!(seen_resolution.get(), [640, 360]);
    assert_eq!(second.output_resolution(), [1280, 720]);
}

#[test]
fn gui_changes_request_a_rebuild() {
    let mut pipeline = RenderPipeline::new(Scene::new(), [64, 64], PipelineConfig::default());
    pipeline.add_node(UpscaledNode {
        tech: UpscalingTech::None,
        seen_resolution: Rc::new(Cell::new([0, 0])),
        sharpen: false,
    });

    let mut gui = ToggleGui { labels: Vec::new() };
    let response = pipeline.draw_gui(&mut gui);

    assert!(response.rebuild_required);
    assert_eq!(gui.labels, vec![SCENE_NODE_NAME, "Upscale", "sharpen"]);
}
