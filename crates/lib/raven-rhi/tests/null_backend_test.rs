use raven_rhi::backend::*;
use raven_rhi::{NullBackend, NullCommandRecorder, NullUploadBuffer, RecordedCommand, CommandRecorder, UploadBuffer};

#[test]
fn create_and_destroy_tracks_live_objects() {
    let backend = NullBackend::new(false);
    let stats = backend.stats();

    let tex = backend.create_texture(&TextureDesc::new_2d([64, 32], Format::Rgba16Float), "color").unwrap();
    let buf = backend.create_buffer(&BufferDesc::new_gpu_only(256, BufferUsage::STORAGE), "data").unwrap();

    assert_ne!(tex.raw, buf.raw);
    assert_eq!(stats.live_count(), 2);
    assert_eq!(stats.debug_name(tex.raw).as_deref(), Some("color"));

    backend.set_debug_name(tex.raw, "renamed");
    assert_eq!(stats.debug_name(tex.raw).as_deref(), Some("renamed"));

    backend.destroy_resource(GpuResource::Texture(tex.clone()));
    assert!(!stats.is_live(tex.raw));
    assert_eq!(stats.live_of_kind(ResourceKind::Buffer), 1);

    backend.destroy_resource(GpuResource::Buffer(buf));
    assert_eq!(stats.created_count(), 2);
    assert_eq!(stats.destroyed_count(), 2);
}

#[test]
#[should_panic(expected = "which is not alive")]
fn destroying_twice_panics() {
    let backend = NullBackend::new(false);
    let tex = backend.create_texture(&TextureDesc::new_2d([4, 4], Format::R8Unorm), "tex").unwrap();

    backend.destroy_resource(GpuResource::Texture(tex.clone()));
    backend.destroy_resource(GpuResource::Texture(tex));
}

#[test]
fn invalid_descriptors_are_rejected() {
    let backend = NullBackend::new(false);

    let err = backend.create_texture(&TextureDesc::new_2d([0, 4], Format::R8Unorm), "empty").unwrap_err();
    assert!(matches!(err, RhiError::InvalidDescriptor { .. }));

    let too_many_mips = TextureDesc::new_2d([4, 4], Format::R8Unorm).mipmap(MipmapMode::Levels(8));
    assert!(backend.create_texture(&too_many_mips, "mips").is_err());

    let unaligned = BufferDesc::new_gpu_only(16, BufferUsage::UNIFORM).alignment(3);
    assert!(backend.create_buffer(&unaligned, "buffer").is_err());

    let duplicated = BindingSetDesc::new()
        .bind(0, BindingResource::Sampler { filter: FilterMode::Linear, wrap: WrapMode::Repeat })
        .bind(0, BindingResource::Sampler { filter: FilterMode::Nearest, wrap: WrapMode::Repeat });
    assert!(backend.create_binding_set(&duplicated, "set").is_err());

    assert_eq!(backend.stats().live_count(), 0);
}

#[test]
fn ray_tracing_requires_support() {
    let backend = NullBackend::new(false);
    let desc = TopLevelAsDesc { max_instances: 4, instances: Vec::new() };

    let err = backend.create_top_level_as(&desc, "tlas").unwrap_err();
    assert!(matches!(err, RhiError::Unsupported { feature: "ray tracing", .. }));

    let rt_backend = NullBackend::new(true);
    assert!(rt_backend.supports_ray_tracing());
    assert!(rt_backend.create_top_level_as(&desc, "tlas").is_ok());
}

#[test]
fn full_mip_chain() {
    let desc = TextureDesc::new_2d([256, 64], Format::Rgba8Unorm).mipmap(MipmapMode::Full);
    assert_eq!(desc.mip_levels(), 9);

    let single = TextureDesc::new_2d([2, 2], Format::R32Float);
    assert_eq!(single.size_in_bytes(), 16);
}

#[test]
fn upscaling_resolution() {
    assert_eq!(UpscalingTech::None.render_resolution([1920, 1080]), [1920, 1080]);
    assert_eq!(UpscalingTech::Fsr(UpscalingQuality::Performance).render_resolution([1920, 1080]), [960, 540]);
    assert_eq!(UpscalingTech::Dlss(UpscalingQuality::Quality).render_resolution([1920, 1080]), [1280, 720]);
    assert_eq!(UpscalingTech::Fsr(UpscalingQuality::UltraPerformance).render_resolution([1, 1]), [1, 1]);
}

#[test]
fn recorder_keeps_commands_in_order() {
    let backend = NullBackend::new(false);
    let tex = backend.create_texture(&TextureDesc::new_2d([8, 8], Format::Rgba8Unorm), "tex").unwrap();
    let compute = backend
        .create_compute_state(&ComputeStateDesc::new(ShaderSource::new("blur.hlsl", "main"), [8, 8, 1]), "blur")
        .unwrap();

    let mut recorder = NullCommandRecorder::new();
    recorder.begin_marker("blur");
    recorder.clear_texture(&tex, [0.0; 4]);
    recorder.dispatch(&compute, &[], compute.desc.group_count([17, 8]));
    recorder.end_marker();

    assert_eq!(recorder.commands().len(), 4);
    assert_eq!(recorder.commands()[2], RecordedCommand::Dispatch {
        state: compute.raw,
        bindings: Vec::new(),
        group_count: [3, 1, 1],
    });

    recorder.reset();
    assert!(recorder.commands().is_empty());
}

#[test]
#[should_panic(expected = "without a matching begin_marker")]
fn unbalanced_marker_panics() {
    let mut recorder = NullCommandRecorder::new();
    recorder.end_marker();
}

#[test]
fn upload_buffer_budget() {
    let backend = NullBackend::new(false);
    let buf = backend.create_buffer(&BufferDesc::new_gpu_only(64, BufferUsage::VERTEX), "vertices").unwrap();

    let mut upload = NullUploadBuffer::new(48);
    upload.upload_buffer(&buf, 0, &[0u8; 32]).unwrap();
    assert_eq!(upload.remaining(), 16);

    let err = upload.upload_buffer(&buf, 32, &[0u8; 32]).unwrap_err();
    assert!(matches!(err, RhiError::StagingOverflow { requested: 32, remaining: 16 }));

    assert!(upload.upload_buffer(&buf, 48, &[0u8; 32]).is_err());

    upload.reset();
    assert_eq!(upload.remaining(), 48);
    assert!(upload.uploads().is_empty());
}
