use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

use raven_rhi::{Backend, GpuResource, RawHandle, ResourceKind, RhiError};
use raven_rhi::backend::{
    Texture, TextureDesc, Buffer, BufferDesc, BindingSet, BindingSetDesc,
    RenderState, RenderStateDesc, BottomLevelAs, BottomLevelAsDesc, TopLevelAs, TopLevelAsDesc,
    RayTracingState, RayTracingStateDesc, ComputeState, ComputeStateDesc, UpscalingState, UpscalingStateDesc,
};

use crate::device::{RenderDevice, GpuResourceHandle};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistryId(pub(crate) u64);

impl RegistryId {
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Backend object owned by exactly one registry.
///
/// Dropping the last [`RgHandle`] hands the object back to the device for deferred destruction.
pub struct RgResource<T> {
    inner: T,
    owner: Cell<RegistryId>,
    debug_name: RefCell<String>,
    reuse_name: Option<String>,
    reusable: Cell<bool>,
    pool_handle: GpuResourceHandle,
    device: Rc<RenderDevice>,
}

/// Shared reference to a registry resource.
///
/// Only the owning registry decides the resource lifetime, clones held by execute callbacks
/// are expected to be dropped with the callbacks at the next construction.
pub type RgHandle<T> = Rc<RgResource<T>>;

impl<T> RgResource<T> {
    pub(crate) fn new(
        inner: T,
        owner: RegistryId,
        name: &str,
        reuse_name: Option<String>,
        pool_handle: GpuResourceHandle,
        device: Rc<RenderDevice>,
    ) -> Self {
        Self {
            inner,
            owner: Cell::new(owner),
            debug_name: RefCell::new(name.to_owned()),
            reusable: Cell::new(reuse_name.is_some()),
            reuse_name,
            pool_handle,
            device,
        }
    }

    #[inline]
    pub fn owner(&self) -> RegistryId {
        self.owner.get()
    }

    pub(crate) fn set_owner(&self, owner: RegistryId) {
        self.owner.set(owner);
    }

    pub fn debug_name(&self) -> Ref<'_, String> {
        self.debug_name.borrow()
    }

    pub(crate) fn set_debug_name(&self, name: &str) {
        *self.debug_name.borrow_mut() = name.to_owned();
    }

    #[inline]
    pub fn is_reusable(&self) -> bool {
        self.reusable.get()
    }

    pub fn reuse_name(&self) -> Option<&str> {
        self.reuse_name.as_deref()
    }
}

impl<T> Deref for RgResource<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Drop for RgResource<T> {
    fn drop(&mut self) {
        self.device.release(self.pool_handle);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RgResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgResource")
            .field("name", &*self.debug_name.borrow())
            .field("owner", &self.owner.get())
            .field("reusable", &self.reusable.get())
            .field("inner", &self.inner)
            .finish()
    }
}

pub(crate) struct PublishedResource<T> {
    pub(crate) resource: RgHandle<T>,
    pub(crate) publisher: String,
}

/// Owned and published resources of one kind.
pub struct ResourceStore<T> {
    pub(crate) owned: Vec<RgHandle<T>>,
    pub(crate) published: HashMap<String, PublishedResource<T>>,
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self {
            owned: Vec::new(),
            published: HashMap::new(),
        }
    }
}

impl<T> ResourceStore<T> {
    pub(crate) fn publisher_of(&self, name: &str) -> Option<&str> {
        self.published.get(name).map(|published| published.publisher.as_str())
    }

    /// Take the reusable resource created under `reuse_name` out of this store.
    pub(crate) fn take_reusable(&mut self, reuse_name: &str) -> Option<RgHandle<T>> {
        let index = self.owned.iter()
            .position(|res| res.is_reusable() && res.reuse_name() == Some(reuse_name))?;

        Some(self.owned.remove(index))
    }

    pub(crate) fn find_reusable(&self, reuse_name: &str) -> Option<&RgHandle<T>> {
        self.owned.iter()
            .find(|res| res.is_reusable() && res.reuse_name() == Some(reuse_name))
    }

    /// Move every reusable resource of `other` which is not already in here, re-owned by `owner`.
    fn absorb_reusable(&mut self, other: &mut ResourceStore<T>, owner: RegistryId) -> usize {
        let mut absorbed = 0;
        let mut index = 0;

        while index < other.owned.len() {
            let candidate = &other.owned[index];
            let taken = candidate.reuse_name()
                .map_or(false, |name| candidate.is_reusable() && self.find_reusable(name).is_none());

            if taken {
                let resource = other.owned.remove(index);
                resource.set_owner(owner);
                self.owned.push(resource);
                absorbed += 1;
            } else {
                index += 1;
            }
        }
        absorbed
    }
}

#[derive(Default)]
pub struct ResourceStores {
    textures: ResourceStore<Texture>,
    buffers: ResourceStore<Buffer>,
    binding_sets: ResourceStore<BindingSet>,
    render_states: ResourceStore<RenderState>,
    bottom_level_as: ResourceStore<BottomLevelAs>,
    top_level_as: ResourceStore<TopLevelAs>,
    ray_tracing_states: ResourceStore<RayTracingState>,
    compute_states: ResourceStore<ComputeState>,
    upscaling_states: ResourceStore<UpscalingState>,
}

impl ResourceStores {
    pub(crate) fn publisher_of(&self, kind: ResourceKind, name: &str) -> Option<&str> {
        match kind {
            ResourceKind::Texture => self.textures.publisher_of(name),
            ResourceKind::Buffer => self.buffers.publisher_of(name),
            ResourceKind::BindingSet => self.binding_sets.publisher_of(name),
            ResourceKind::RenderState => self.render_states.publisher_of(name),
            ResourceKind::BottomLevelAs => self.bottom_level_as.publisher_of(name),
            ResourceKind::TopLevelAs => self.top_level_as.publisher_of(name),
            ResourceKind::RayTracingState => self.ray_tracing_states.publisher_of(name),
            ResourceKind::ComputeState => self.compute_states.publisher_of(name),
            ResourceKind::UpscalingState => self.upscaling_states.publisher_of(name),
        }
    }

    pub(crate) fn absorb_reusable(&mut self, other: &mut ResourceStores, owner: RegistryId) -> usize {
        self.textures.absorb_reusable(&mut other.textures, owner)
            + self.buffers.absorb_reusable(&mut other.buffers, owner)
            + self.binding_sets.absorb_reusable(&mut other.binding_sets, owner)
            + self.render_states.absorb_reusable(&mut other.render_states, owner)
            + self.bottom_level_as.absorb_reusable(&mut other.bottom_level_as, owner)
            + self.top_level_as.absorb_reusable(&mut other.top_level_as, owner)
            + self.ray_tracing_states.absorb_reusable(&mut other.ray_tracing_states, owner)
            + self.compute_states.absorb_reusable(&mut other.compute_states, owner)
            + self.upscaling_states.absorb_reusable(&mut other.upscaling_states, owner)
    }

    pub(crate) fn owned_total(&self) -> usize {
        self.textures.owned.len()
            + self.buffers.owned.len()
            + self.binding_sets.owned.len()
            + self.render_states.owned.len()
            + self.bottom_level_as.owned.len()
            + self.top_level_as.owned.len()
            + self.ray_tracing_states.owned.len()
            + self.compute_states.owned.len()
            + self.upscaling_states.owned.len()
    }
}

/// Any backend object a registry can create, own and publish.
pub trait RgResourceKind: Clone + Sized + 'static {
    type Desc: Clone + PartialEq + std::fmt::Debug;

    const KIND: ResourceKind;

    fn create(backend: &dyn Backend, desc: &Self::Desc, name: &str) -> anyhow::Result<Self, RhiError>;

    fn raw(&self) -> RawHandle;

    fn desc(&self) -> &Self::Desc;

    fn into_gpu_resource(self) -> GpuResource;

    #[doc(hidden)]
    fn store(stores: &ResourceStores) -> &ResourceStore<Self>;

    #[doc(hidden)]
    fn store_mut(stores: &mut ResourceStores) -> &mut ResourceStore<Self>;
}

macro_rules! impl_rg_resource_kind {
    ($res:ident, $desc:ident, $kind:ident, $create:ident, $field:ident) => {
        impl RgResourceKind for $res {
            type Desc = $desc;

            const KIND: ResourceKind = ResourceKind::$kind;

            fn create(backend: &dyn Backend, desc: &Self::Desc, name: &str) -> anyhow::Result<Self, RhiError> {
                backend.$create(desc, name)
            }

            #[inline]
            fn raw(&self) -> RawHandle {
                self.raw
            }

            #[inline]
            fn desc(&self) -> &Self::Desc {
                &self.desc
            }

            fn into_gpu_resource(self) -> GpuResource {
                GpuResource::$kind(self)
            }

            fn store(stores: &ResourceStores) -> &ResourceStore<Self> {
                &stores.$field
            }

            fn store_mut(stores: &mut ResourceStores) -> &mut ResourceStore<Self> {
                &mut stores.$field
            }
        }
    };
}

impl_rg_resource_kind!(Texture, TextureDesc, Texture, create_texture, textures);
impl_rg_resource_kind!(Buffer, BufferDesc, Buffer, create_buffer, buffers);
impl_rg_resource_kind!(BindingSet, BindingSetDesc, BindingSet, create_binding_set, binding_sets);
impl_rg_resource_kind!(RenderState, RenderStateDesc, RenderState, create_render_state, render_states);
impl_rg_resource_kind!(BottomLevelAs, BottomLevelAsDesc, BottomLevelAs, create_bottom_level_as, bottom_level_as);
impl_rg_resource_kind!(TopLevelAs, TopLevelAsDesc, TopLevelAs, create_top_level_as, top_level_as);
impl_rg_resource_kind!(RayTracingState, RayTracingStateDesc, RayTracingState, create_ray_tracing_state, ray_tracing_states);
impl_rg_resource_kind!(ComputeState, ComputeStateDesc, ComputeState, create_compute_state, compute_states);
impl_rg_resource_kind!(UpscalingState, UpscalingStateDesc, UpscalingState, create_upscaling_state, upscaling_states);
