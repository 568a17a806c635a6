mod common;

use raven_rg::*;
use raven_rhi::backend::{BufferDesc, BufferUsage, Format, TextureDesc};
use raven_rhi::ResourceKind;

use common::null_device;

#[test]
fn persistent_resources_live_until_shutdown() {
    let (device, stats) = null_device(false);

    let fallback = device.create_persistent_texture(&TextureDesc::new_2d([1, 1], Format::Rgba8Unorm), "black 1x1").unwrap();
    let constants = device.create_persistent_buffer(&BufferDesc::new_cpu_to_gpu(256, BufferUsage::UNIFORM), "frame constants").unwrap();

    for _ in 0..8 {
        assert_eq!(device.end_frame(), 0);
    }
    assert!(stats.is_live(fallback.raw));
    assert!(stats.is_live(constants.raw));
    assert_eq!(device.live_resource_count(), 2);

    device.shutdown();
    assert_eq!(stats.live_count(), 0);
    assert_eq!(stats.destroyed_count(), 2);

    // a second shutdown must not destroy anything twice
    device.shutdown();
    assert_eq!(stats.destroyed_count(), 2);
}

#[test]
fn released_resources_wait_for_the_grace_window() {
    let (device, stats) = null_device(false);
    assert_eq!(device.config().defer_frames, 2);

    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let tex = registry_texture(&mut registry, "shadow map");
    let raw = tex.raw;

    device.begin_frame();
    drop(tex);
    drop(registry);
    assert_eq!(device.pending_delete_count(), 1);

    assert_eq!(device.end_frame(), 0);
    assert_eq!(device.end_frame(), 0);
    assert_eq!(device.end_frame(), 0);
    assert!(stats.is_live(raw));

    assert_eq!(device.end_frame(), 1);
    assert!(!stats.is_live(raw));
    assert_eq!(device.pending_delete_count(), 0);
    assert_eq!(device.live_resource_count(), 0);
}

fn registry_texture(registry: &mut Registry, name: &str) -> RgHandle<raven_rhi::backend::Texture> {
    registry.create_texture(&TextureDesc::new_2d([512, 512], Format::D32Float), name).unwrap()
}

#[test]
fn shutdown_destroys_pending_and_live_resources() {
    let (device, stats) = null_device(false);

    let mut registry = Registry::new(&device, RegistryConfig::default(), None);
    let kept = registry_texture(&mut registry, "kept");
    let released = registry_texture(&mut registry, "released");
    drop(released);

    assert_eq!(stats.live_of_kind(ResourceKind::Texture), 2);
    device.shutdown();
    assert_eq!(stats.live_count(), 0);

    // handles outliving the device only log
    drop(kept);
    drop(registry);
    assert_eq!(device.live_resource_count(), 0);
}
