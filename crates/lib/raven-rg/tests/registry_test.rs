mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use raven_rg::*;
use raven_rhi::backend::{Texture, TextureDesc, Format, FilterMode, MipmapMode, WrapMode};
use raven_scene::Scene;

use common::null_device;

fn pipeline() -> RenderPipeline {
    RenderPipeline::new(Scene::new(), [1920, 1080], PipelineConfig::default())
}

fn color_desc() -> TextureDesc {
    TextureDesc::new_2d([1920, 1080], Format::Rgba8Unorm)
}

#[test]
fn publish_then_get_returns_the_published_resource() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let published = Rc::new(RefCell::new(None));
    let fetched = Rc::new(RefCell::new(None));

    let mut pipeline = pipeline();
    {
        let published = published.clone();
        pipeline.add_lambda_node("A", move |_, registry| {
            let tex = registry.create_texture(&color_desc(), "a color")?;
            registry.publish("Foo", &tex);
            *published.borrow_mut() = Some(tex);
            Ok(noop_callback())
        });
    }
    {
        let fetched = fetched.clone();
        pipeline.add_lambda_node("B", move |_, registry| {
            *fetched.borrow_mut() = registry.get_texture("Foo");
            Ok(noop_callback())
        });
    }
    pipeline.construct_all(&mut registry).unwrap();

    let published = published.borrow_mut().take().unwrap();
    let fetched = fetched.borrow_mut().take().unwrap();
    assert!(Rc::ptr_eq(&published, &fetched));
    assert_eq!(fetched.debug_name().as_str(), "Foo");

    let expected = NodeDependency {
        consumer: "B".to_owned(),
        producer: "A".to_owned(),
    };
    assert_eq!(registry.dependencies().iter().collect::<Vec<_>>(), vec![&expected]);
    assert_eq!(registry.publisher_of::<Texture>("Foo"), Some("A"));
    assert!(registry.dependency_dot().contains("\"A\" -> \"B\";"));
}

#[test]
fn dependency_dot_escapes_quoted_names() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = pipeline();
    pipeline.add_lambda_node("Sky \"hdr\"", |_, registry| {
        let _ = registry.get_texture("Env\"Map");
        Ok(noop_callback())
    });
    pipeline.construct_all(&mut registry).unwrap();

    let dot = registry.dependency_dot();
    assert!(dot.contains(r#"    "Sky \"hdr\"" [label="Sky \"hdr\"\nmissing Env\"Map"];"#), "{}", dot);
}

#[test]
fn publish_renames_the_backend_object() {
    let (device, stats) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let raw = Rc::new(Cell::new(None));
    let mut pipeline = pipeline();
    {
        let raw = raw.clone();
        pipeline.add_lambda_node("Tonemap", move |_, registry| {
            let tex = registry.create_texture(&color_desc(), "temporary")?;
            registry.publish("Tonemap.Output", &tex);
            raw.set(Some(tex.raw));
            Ok(noop_callback())
        });
    }
    pipeline.construct_all(&mut registry).unwrap();

    assert_eq!(stats.debug_name(raw.get().unwrap()).as_deref(), Some("Tonemap.Output"));
    assert_eq!(registry.published_names::<Texture>(), vec!["Tonemap.Output"]);
}

#[test]
#[should_panic(expected = "is already published by node")]
fn duplicate_publish_panics() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let mut pipeline = pipeline();
    pipeline.add_lambda_node("A", |_, registry| {
        let first = registry.create_texture(&color_desc(), "first")?;
        let second = registry.create_texture(&color_desc(), "second")?;

        registry.publish("Foo", &first);
        registry.publish("Foo", &second);
        Ok(noop_callback())
    });
    let _ = pipeline.construct_all(&mut registry);
}

#[test]
fn get_miss_returns_none_and_is_recorded() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let found = Rc::new(Cell::new(true));
    let mut pipeline = pipeline();
    {
        let found = found.clone();
        pipeline.add_lambda_node("Bloom", move |_, registry| {
            found.set(registry.get_texture("Optional.Output").is_some());
            Ok(noop_callback())
        });
    }
    pipeline.construct_all(&mut registry).unwrap();

    assert!(!found.get());
    assert!(registry.dependencies().is_empty());
    assert_eq!(registry.unresolved_requests(), &[UnresolvedRequest {
        consumer: "Bloom".to_owned(),
        name: "Optional.Output".to_owned(),
        kind: raven_rhi::ResourceKind::Texture,
    }]);
    assert!(pipeline.ordering_violations().is_empty());
}

#[test]
#[should_panic(expected = "called outside of node construction")]
fn get_outside_construction_panics() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let _ = registry.get_texture("Foo");
}

#[test]
fn try_publish_outside_construction_is_an_error() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let tex = registry.create_texture(&color_desc(), "color").unwrap();

    assert!(matches!(
        registry.try_publish("Foo", &tex),
        Err(RegistryError::OutsideConstruction { operation: "publish", .. })
    ));
}

#[test]
#[should_panic(expected = "owned by another registry")]
fn publishing_a_foreign_resource_panics() {
    let (device, _) = null_device(false);
    let mut other = Registry::new(&device, RegistryConfig::default(), None);
    let foreign = other.create_texture(&color_desc(), "foreign").unwrap();

    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let mut pipeline = pipeline();
    pipeline.add_lambda_node("A", move |_, registry| {
        registry.publish("Foo", &foreign);
        Ok(noop_callback())
    });
    let _ = pipeline.construct_all(&mut registry);
}

/// Node creating "SceneColor" through the reuse path, records what happened each construction.
fn add_scene_color_node(
    pipeline: &mut RenderPipeline,
    extent: Rc<Cell<[u32; 2]>>,
    log: Rc<RefCell<Vec<(ReuseStatus, RgHandle<Texture>)>>>,
) {
    pipeline.add_lambda_node("Lighting", move |_, registry| {
        let result = registry.create_or_reuse_texture_2d(
            "SceneColor",
            extent.get(),
            Format::Rgba8Unorm,
            FilterMode::Linear,
            MipmapMode::None,
            WrapMode::ClampToEdge,
        )?;

        registry.publish("SceneColor", &result.resource);
        log.borrow_mut().push((result.status, result.resource.clone()));
        Ok(noop_callback())
    });
}

#[test]
fn reusable_texture_keeps_its_identity_across_epochs() {
    let (device, stats) = null_device(false);
    let extent = Rc::new(Cell::new([1920, 1080]));
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = pipeline();
    add_scene_color_node(&mut pipeline, extent.clone(), log.clone());

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();
    let created_after_first = stats.created_count();

    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    assert_eq!(second.epoch(), 1);
    pipeline.construct_all(&mut second).unwrap();
    assert!(!second.has_previous());

    let log = log.borrow();
    assert_eq!(log[0].0, ReuseStatus::Created);
    assert_eq!(log[1].0, ReuseStatus::Reused);
    assert!(Rc::ptr_eq(&log[0].1, &log[1].1));
    assert_eq!(log[0].1.raw, log[1].1.raw);
    assert_eq!(log[1].1.owner(), second.id());
    assert_eq!(second.owned_count::<Texture>(), 1);

    // only the scene buffers are recreated
    assert_eq!(stats.created_count() - created_after_first, 3);
    assert!(stats.is_live(log[1].1.raw));
}

#[test]
#[should_panic(expected = "changed its parameters across epochs")]
fn reuse_with_different_parameters_panics() {
    let (device, _) = null_device(false);
    let extent = Rc::new(Cell::new([1920, 1080]));
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = pipeline();
    add_scene_color_node(&mut pipeline, extent.clone(), log);

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();

    extent.set([1280, 720]);
    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    let _ = pipeline.construct_all(&mut second);
}

/// Node creating the "Shadow.Cascades" array through the reuse path with `layers` layers.
fn add_cascade_node(pipeline: &mut RenderPipeline, layers: Rc<Cell<u32>>, log: Rc<RefCell<Vec<(ReuseStatus, RgHandle<Texture>)>>>) {
    pipeline.add_lambda_node("Shadows", move |_, registry| {
        let result = registry.create_or_reuse_texture_2d_array(
            "Shadow.Cascades",
            [512, 512],
            layers.get(),
            Format::D32Float,
            FilterMode::Nearest,
            MipmapMode::None,
            WrapMode::ClampToEdge,
        )?;

        log.borrow_mut().push((result.status, result.resource.clone()));
        Ok(noop_callback())
    });
}

#[test]
fn reusable_texture_array_keeps_its_identity_across_epochs() {
    let (device, _) = null_device(false);
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = pipeline();
    add_cascade_node(&mut pipeline, Rc::new(Cell::new(4)), log.clone());

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();
    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    pipeline.construct_all(&mut second).unwrap();

    let log = log.borrow();
    assert_eq!(log[0].0, ReuseStatus::Created);
    assert_eq!(log[1].0, ReuseStatus::Reused);
    assert!(Rc::ptr_eq(&log[0].1, &log[1].1));
    assert_eq!(log[1].1.desc.array_layers, 4);
}

#[test]
#[should_panic(expected = "changed its parameters across epochs")]
fn reuse_with_different_array_layers_panics() {
    let (device, _) = null_device(false);
    let layers = Rc::new(Cell::new(4));

    let mut pipeline = pipeline();
    add_cascade_node(&mut pipeline, layers.clone(), Rc::new(RefCell::new(Vec::new())));

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();

    layers.set(2);
    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    let _ = pipeline.construct_all(&mut second);
}

/// Lambda node which fails construction while `broken` is set.
fn add_gate_node(pipeline: &mut RenderPipeline, name: &str, broken: Rc<Cell<bool>>) {
    pipeline.add_lambda_node(name, move |_, _| {
        if broken.get() {
            anyhow::bail!("not ready");
        }
        Ok(noop_callback())
    });
}

#[test]
fn failed_registry_refuses_a_second_construction() {
    let (device, _) = null_device(false);
    let broken = Rc::new(Cell::new(true));

    let mut pipeline = pipeline();
    add_gate_node(&mut pipeline, "Gate", broken.clone());

    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    assert!(pipeline.construct_all(&mut registry).is_err());
    assert_eq!(registry.state(), RegistryState::Failed);

    broken.set(false);
    let err = pipeline.construct_all(&mut registry).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::RegistryNotFresh { state: RegistryState::Failed, .. })
    ));

    let mut retry = Registry::new(&device, RegistryConfig::default(), Some(registry));
    pipeline.construct_all(&mut retry).unwrap();
    assert_eq!(retry.state(), RegistryState::Constructed);
    assert_eq!(retry.published_names::<raven_rhi::backend::Buffer>().len(), 3);

    let err = pipeline.construct_all(&mut retry).unwrap_err();
    assert!(format!("{}", err).contains("only be constructed into a fresh registry"));
}

#[test]
fn reusable_resources_survive_a_failed_epoch() {
    for gate_first in [true, false] {
        let (device, stats) = null_device(false);
        let broken = Rc::new(Cell::new(false));
        let log = Rc::new(RefCell::new(Vec::new()));

        // the failure either happens before the resource is adopted or after
        let mut pipeline = pipeline();
        if gate_first {
            add_gate_node(&mut pipeline, "Gate", broken.clone());
        }
        add_scene_color_node(&mut pipeline, Rc::new(Cell::new([1920, 1080])), log.clone());
        if !gate_first {
            add_gate_node(&mut pipeline, "Gate", broken.clone());
        }

        let mut first = Registry::new(&device, RegistryConfig::default(), None);
        pipeline.construct_all(&mut first).unwrap();

        broken.set(true);
        let mut failed = Registry::new(&device, RegistryConfig::default(), Some(first));
        assert!(pipeline.construct_all(&mut failed).is_err());
        assert!(!failed.has_previous());
        assert_eq!(failed.owned_count::<Texture>(), 1);

        broken.set(false);
        let mut retry = Registry::new(&device, RegistryConfig::default(), Some(failed));
        pipeline.construct_all(&mut retry).unwrap();

        let log = log.borrow();
        let (status, resource) = log.last().unwrap();
        assert_eq!(*status, ReuseStatus::Reused);
        assert!(Rc::ptr_eq(resource, &log[0].1));
        assert_eq!(resource.owner(), retry.id());

        for _ in 0..8 {
            device.end_frame();
        }
        assert!(stats.is_live(resource.raw));
    }
}

#[test]
fn try_create_or_reuse_reports_duplicate_names() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    registry.try_create_or_reuse::<Texture>("History", &color_desc()).unwrap();
    let err = registry.try_create_or_reuse::<Texture>("History", &color_desc()).err().unwrap();

    assert!(matches!(
        err.downcast_ref::<RegistryError>(),
        Some(RegistryError::DuplicateReuseName { .. })
    ));
}

#[test]
fn backend_failures_are_returned_with_context() {
    let (device, _) = null_device(false);
    let mut registry = Registry::new(&device, RegistryConfig::default(), None);

    let err = registry.create_texture(&TextureDesc::new_2d([0, 0], Format::R8Unorm), "broken").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to create texture \"broken\""));

    let err = registry.create_or_reuse_texture_2d(
        "Broken", [0, 16], Format::R8Unorm, FilterMode::Nearest, MipmapMode::None, WrapMode::Repeat,
    ).err().unwrap();
    assert!(err.downcast_ref::<RegistryError>().is_none());
}

#[test]
fn unadopted_resources_are_destroyed_after_the_grace_window() {
    let (device, stats) = null_device(false);
    let raws = Rc::new(RefCell::new(Vec::new()));

    let mut pipeline = pipeline();
    {
        let raws = raws.clone();
        pipeline.add_lambda_node("Blur", move |_, registry| {
            let tex = registry.create_texture(&color_desc(), "blur temp")?;
            raws.borrow_mut().push(tex.raw);
            Ok(Box::new(move |_, _, recorder, _| {
                recorder.clear_texture(&tex, [0.0; 4]);
                Ok(())
            }))
        });
    }

    let mut first = Registry::new(&device, RegistryConfig::default(), None);
    pipeline.construct_all(&mut first).unwrap();

    let mut second = Registry::new(&device, RegistryConfig::default(), Some(first));
    pipeline.construct_all(&mut second).unwrap();

    let old = raws.borrow()[0];
    // three scene buffers and the blur texture of the first epoch
    assert_eq!(device.pending_delete_count(), 4);
    assert!(stats.is_live(old));

    let defer_frames = device.config().defer_frames;
    for _ in 0..=defer_frames {
        device.end_frame();
        assert!(stats.is_live(old));
    }

    assert_eq!(device.end_frame(), 4);
    assert!(!stats.is_live(old));
    assert!(stats.is_live(raws.borrow()[1]));
}

struct DropCounter(Rc<Cell<u32>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn arena_values_are_dropped_once_and_outlive_the_registry() {
    let (device, _) = null_device(false);
    let registry = Registry::new(&device, RegistryConfig::default(), None);
    let drops = Rc::new(Cell::new(0));

    let mut counter = registry.allocate((DropCounter(drops.clone()), 41u32));
    counter.1 += 1;
    assert!(registry.arena_used() > 0);

    drop(registry);
    assert_eq!(counter.1, 42);
    assert_eq!(drops.get(), 0);

    drop(counter);
    assert_eq!(drops.get(), 1);
}

#[test]
#[should_panic(expected = "Registry arena exhausted")]
fn arena_exhaustion_panics() {
    let (device, _) = null_device(false);
    let registry = Registry::new(&device, RegistryConfig { arena_capacity: 16 }, None);

    let _small = registry.allocate([0u8; 16]);
    let _ = registry.allocate(0u8);
}
