use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Context;

use raven_container::{ResourceList, ResourceHandle};
use raven_rhi::{Backend, GpuResource};
use raven_rhi::backend::{Buffer, BufferDesc, Texture, TextureDesc};

pub type GpuResourceHandle = ResourceHandle<GpuResource>;

#[derive(Clone, Copy, Debug)]
pub struct DeviceConfig {
    /// Number of frames a released resource must stay alive for, usually the number of frames in flight.
    pub defer_frames: u64,
    pub resource_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            defer_frames: 2,
            resource_capacity: 4096,
        }
    }
}

/// Owns the backend and the pool of every backend object created through it.
///
/// Objects are released into the pool when their last owner is gone and destroyed
/// by [`RenderDevice::end_frame`] once no in-flight frame can reference them anymore.
pub struct RenderDevice {
    backend: Box<dyn Backend>,
    pool: RefCell<ResourceList<GpuResource, GpuResourceHandle>>,
    frame_index: Cell<u64>,
    config: DeviceConfig,
    is_shutdown: Cell<bool>,
}

impl RenderDevice {
    pub fn new(backend: Box<dyn Backend>, config: DeviceConfig) -> Rc<Self> {
        glog::debug!("Render device created on backend {} (defer frames: {}, capacity: {})",
            backend.name(), config.defer_frames, config.resource_capacity);

        Rc::new(Self {
            backend,
            pool: RefCell::new(ResourceList::new(config.resource_capacity)),
            frame_index: Cell::new(0),
            config,
            is_shutdown: Cell::new(false),
        })
    }

    #[inline]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index.get()
    }

    pub fn begin_frame(&self) -> u64 {
        self.frame_index.get()
    }

    /// Destroy the released objects whose grace window has passed, then advance the frame counter.
    ///
    /// Returns the number of destroyed objects.
    pub fn end_frame(&self) -> usize {
        let frame = self.frame_index.get();
        let backend = self.backend.as_ref();

        let destroyed = self.pool.borrow_mut()
            .process_deferred_deletes(frame, self.config.defer_frames, |_, resource| {
                backend.destroy_resource(resource);
            });

        if destroyed > 0 {
            glog::trace!("Frame {}: {} deferred resources destroyed", frame, destroyed);
        }

        self.frame_index.set(frame + 1);
        destroyed
    }

    /// Track a freshly created backend object, the caller holds the only reference.
    pub(crate) fn register(&self, resource: GpuResource) -> GpuResourceHandle {
        let mut pool = self.pool.borrow_mut();

        let handle = pool.add(resource);
        pool.add_reference(handle);
        handle
    }

    pub(crate) fn release(&self, handle: GpuResourceHandle) {
        let mut pool = self.pool.borrow_mut();

        if pool.is_valid(handle) {
            pool.remove_reference(handle, self.frame_index.get());
        } else if self.is_shutdown.get() {
            glog::warn!("Resource {:?} released after the render device shut down", handle);
        } else {
            panic!("Releasing unknown resource {:?}!", handle);
        }
    }

    /// Create a 2d texture which outlives every registry, e.g. a 1x1 fallback for missing inputs.
    pub fn create_persistent_texture(&self, desc: &TextureDesc, name: &str) -> anyhow::Result<Texture> {
        let texture = self.backend.create_texture(desc, name)
            .with_context(|| format!("Failed to create persistent texture {:?}", name))?;

        self.register_persistent(GpuResource::Texture(texture.clone()));
        Ok(texture)
    }

    pub fn create_persistent_buffer(&self, desc: &BufferDesc, name: &str) -> anyhow::Result<Buffer> {
        let buffer = self.backend.create_buffer(desc, name)
            .with_context(|| format!("Failed to create persistent buffer {:?}", name))?;

        self.register_persistent(GpuResource::Buffer(buffer.clone()));
        Ok(buffer)
    }

    fn register_persistent(&self, resource: GpuResource) {
        let mut pool = self.pool.borrow_mut();

        let handle = pool.add(resource);
        pool.mark_persistent(handle);
    }

    #[inline]
    pub fn live_resource_count(&self) -> usize {
        self.pool.borrow().len()
    }

    #[inline]
    pub fn pending_delete_count(&self) -> usize {
        self.pool.borrow().pending_delete_count()
    }

    /// Destroy everything still in the pool, including persistent and pending objects.
    ///
    /// The GPU must be idle.
    pub fn shutdown(&self) {
        if self.is_shutdown.replace(true) {
            return;
        }

        let alive = self.pool.borrow_mut().drain_alive();
        glog::debug!("Render device shutting down, destroy {} resources", alive.len());

        for (_, resource) in alive {
            self.backend.destroy_resource(resource);
        }
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}
