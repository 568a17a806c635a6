use std::collections::{BTreeSet, HashSet};
use std::fmt::Write;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use raven_container::BumpAllocator;
use raven_rhi::ResourceKind;
use raven_rhi::backend::{
    Texture, TextureDesc, Buffer, BufferDesc, BindingSet, BindingSetDesc,
    RenderState, RenderStateDesc, BottomLevelAs, BottomLevelAsDesc, TopLevelAs, TopLevelAsDesc,
    RayTracingState, RayTracingStateDesc, ComputeState, ComputeStateDesc, UpscalingState, UpscalingStateDesc,
    Format, FilterMode, MipmapMode, WrapMode,
};

use crate::arena::ArenaRef;
use crate::device::RenderDevice;
use crate::error::RegistryError;
use crate::resource::{RegistryId, RgHandle, RgResource, RgResourceKind, ResourceStores, PublishedResource};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Capability held by the render pipeline to drive the construction context of a registry.
pub struct PipelineToken {
    _private: (),
}

impl PipelineToken {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RegistryConfig {
    /// Bytes of the arena backing [`Registry::allocate`].
    pub arena_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 1024 * 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReuseStatus {
    Created,
    Reused,
}

pub struct ReuseResult<T> {
    pub resource: RgHandle<T>,
    pub status: ReuseStatus,
}

/// Where a registry is in its single pipeline construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryState {
    /// Nothing has been constructed into it yet.
    Fresh,
    Constructed,
    /// A node failed, the registry only keeps its reusable resources for the next epoch.
    Failed,
}

/// `consumer` fetched a resource published by `producer`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeDependency {
    pub consumer: String,
    pub producer: String,
}

/// A `get` which found no publisher at the time it was called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedRequest {
    pub consumer: String,
    pub name: String,
    pub kind: ResourceKind,
}

/// Resource factory, name directory and dependency recorder of one pipeline construction (an epoch).
///
/// Resources created here are owned by this registry. Resources created through
/// `create_or_reuse_*` may be adopted by the next epoch's registry instead of being destroyed.
pub struct Registry {
    id: RegistryId,
    epoch: u64,
    state: RegistryState,
    device: Rc<RenderDevice>,

    stores: ResourceStores,
    /// Only alive during construction, to scavenge reusable resources from.
    previous: Option<Box<Registry>>,

    dependencies: BTreeSet<NodeDependency>,
    unresolved: Vec<UnresolvedRequest>,
    current_node: Option<String>,

    arena: Rc<BumpAllocator>,
    reuse_names: HashSet<(ResourceKind, String)>,
    reused_count: usize,

    render_resolution: [u32; 2],
    output_resolution: [u32; 2],
}

impl Registry {
    pub fn new(device: &Rc<RenderDevice>, config: RegistryConfig, previous: Option<Registry>) -> Self {
        let id = RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed));
        let epoch = previous.as_ref().map_or(0, |prev| prev.epoch + 1);

        let (render_resolution, output_resolution) = previous.as_ref()
            .map_or(([0, 0], [0, 0]), |prev| (prev.render_resolution, prev.output_resolution));

        glog::trace!("Registry {:?} created for epoch {}", id, epoch);

        Self {
            id,
            epoch,
            state: RegistryState::Fresh,
            device: device.clone(),
            stores: Default::default(),
            previous: previous.map(Box::new),
            dependencies: BTreeSet::new(),
            unresolved: Vec::new(),
            current_node: None,
            arena: Rc::new(BumpAllocator::new(config.arena_capacity)),
            reuse_names: HashSet::new(),
            reused_count: 0,
            render_resolution,
            output_resolution,
        }
    }

    #[inline]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    pub fn state(&self) -> RegistryState {
        self.state
    }

    #[inline]
    pub fn device(&self) -> &Rc<RenderDevice> {
        &self.device
    }

    #[inline]
    pub fn render_resolution(&self) -> [u32; 2] {
        self.render_resolution
    }

    #[inline]
    pub fn output_resolution(&self) -> [u32; 2] {
        self.output_resolution
    }

    #[inline]
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    #[inline]
    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    pub fn set_current_node(&mut self, _token: &PipelineToken, name: Option<&str>) {
        self.current_node = name.map(str::to_owned);
    }

    pub fn set_resolution(&mut self, _token: &PipelineToken, render_resolution: [u32; 2], output_resolution: [u32; 2]) {
        self.render_resolution = render_resolution;
        self.output_resolution = output_resolution;
    }

    /// Release the previous registry together with everything that was not adopted.
    pub fn finish_construction(&mut self, _token: &PipelineToken) {
        let released = self.previous.take()
            .map_or(0, |previous| previous.stores.owned_total());
        self.state = RegistryState::Constructed;

        glog::debug!("Registry epoch {}: {} resources owned ({} reused), {} released from previous epoch, {} dependencies",
            self.epoch, self.stores.owned_total(), self.reused_count, released, self.dependencies.len());
    }

    /// Mark a construction as failed.
    ///
    /// The reusable resources the previous epoch still holds move into this registry, so a registry
    /// built on top of it can adopt them. Everything else of the previous epoch is released.
    pub fn abort_construction(&mut self, _token: &PipelineToken) {
        let salvaged = match self.previous.take() {
            Some(mut previous) => self.stores.absorb_reusable(&mut previous.stores, self.id),
            None => 0,
        };
        self.state = RegistryState::Failed;
        self.current_node = None;

        glog::warn!("Registry epoch {}: construction failed, {} reusable resources kept from the previous epoch",
            self.epoch, salvaged);
    }

    fn create_owned<T: RgResourceKind>(
        &mut self,
        desc: &T::Desc,
        name: &str,
        reuse_name: Option<String>,
    ) -> anyhow::Result<RgHandle<T>> {
        let inner = T::create(self.device.backend(), desc, name)
            .with_context(|| format!("Failed to create {} {:?} in registry epoch {}", T::KIND, name, self.epoch))?;

        let pool_handle = self.device.register(inner.clone().into_gpu_resource());
        let resource = Rc::new(RgResource::new(inner, self.id, name, reuse_name, pool_handle, self.device.clone()));

        T::store_mut(&mut self.stores).owned.push(resource.clone());
        glog::trace!("Registry epoch {}: created {} {:?}", self.epoch, T::KIND, name);

        Ok(resource)
    }

    /// Create a resource owned by this registry.
    pub fn create<T: RgResourceKind>(&mut self, desc: &T::Desc, name: &str) -> anyhow::Result<RgHandle<T>> {
        self.create_owned::<T>(desc, name, None)
    }

    pub fn create_texture(&mut self, desc: &TextureDesc, name: &str) -> anyhow::Result<RgHandle<Texture>> {
        self.create::<Texture>(desc, name)
    }

    pub fn create_buffer(&mut self, desc: &BufferDesc, name: &str) -> anyhow::Result<RgHandle<Buffer>> {
        self.create::<Buffer>(desc, name)
    }

    pub fn create_binding_set(&mut self, desc: &BindingSetDesc, name: &str) -> anyhow::Result<RgHandle<BindingSet>> {
        self.create::<BindingSet>(desc, name)
    }

    pub fn create_render_state(&mut self, desc: &RenderStateDesc, name: &str) -> anyhow::Result<RgHandle<RenderState>> {
        self.create::<RenderState>(desc, name)
    }

    pub fn create_bottom_level_as(&mut self, desc: &BottomLevelAsDesc, name: &str) -> anyhow::Result<RgHandle<BottomLevelAs>> {
        self.create::<BottomLevelAs>(desc, name)
    }

    pub fn create_top_level_as(&mut self, desc: &TopLevelAsDesc, name: &str) -> anyhow::Result<RgHandle<TopLevelAs>> {
        self.create::<TopLevelAs>(desc, name)
    }

    pub fn create_ray_tracing_state(&mut self, desc: &RayTracingStateDesc, name: &str) -> anyhow::Result<RgHandle<RayTracingState>> {
        self.create::<RayTracingState>(desc, name)
    }

    pub fn create_compute_state(&mut self, desc: &ComputeStateDesc, name: &str) -> anyhow::Result<RgHandle<ComputeState>> {
        self.create::<ComputeState>(desc, name)
    }

    pub fn create_upscaling_state(&mut self, desc: &UpscalingStateDesc, name: &str) -> anyhow::Result<RgHandle<UpscalingState>> {
        self.create::<UpscalingState>(desc, name)
    }

    /// Adopt the resource the previous epoch created under `name`, or create a new reusable one.
    ///
    /// Adopted resources must match `desc` exactly.
    /// Errors other than backend failures are returned as [`RegistryError`] inside the `anyhow::Error`.
    pub fn try_create_or_reuse<T: RgResourceKind>(&mut self, name: &str, desc: &T::Desc) -> anyhow::Result<ReuseResult<T>> {
        let key = (T::KIND, name.to_owned());
        if self.reuse_names.contains(&key) {
            return Err(RegistryError::DuplicateReuseName {
                kind: T::KIND,
                name: name.to_owned(),
            }.into());
        }

        if let Some(previous) = self.previous.as_deref_mut() {
            if let Some(candidate) = T::store(&previous.stores).find_reusable(name) {
                if candidate.desc() != desc {
                    return Err(RegistryError::ReuseMismatch {
                        kind: T::KIND,
                        name: name.to_owned(),
                        previous: format!("{:?}", candidate.desc()),
                        requested: format!("{:?}", desc),
                    }.into());
                }
            }

            if let Some(resource) = T::store_mut(&mut previous.stores).take_reusable(name) {
                resource.set_owner(self.id);
                T::store_mut(&mut self.stores).owned.push(resource.clone());

                self.reuse_names.insert(key);
                self.reused_count += 1;
                glog::trace!("Registry epoch {}: reused {} {:?}", self.epoch, T::KIND, name);

                return Ok(ReuseResult {
                    resource,
                    status: ReuseStatus::Reused,
                });
            }
        }

        let resource = self.create_owned::<T>(desc, name, Some(name.to_owned()))?;
        self.reuse_names.insert(key);

        Ok(ReuseResult {
            resource,
            status: ReuseStatus::Created,
        })
    }

    /// Same as [`Registry::try_create_or_reuse`], but a reuse violation is fatal.
    pub fn create_or_reuse<T: RgResourceKind>(&mut self, name: &str, desc: &T::Desc) -> anyhow::Result<ReuseResult<T>> {
        match self.try_create_or_reuse::<T>(name, desc) {
            Ok(result) => Ok(result),
            Err(err) => match err.downcast::<RegistryError>() {
                Ok(violation) => panic!("{}", violation),
                Err(err) => Err(err),
            },
        }
    }

    pub fn create_or_reuse_texture_2d(
        &mut self,
        name: &str,
        extent: [u32; 2],
        format: Format,
        filter: FilterMode,
        mipmap: MipmapMode,
        wrap: WrapMode,
    ) -> anyhow::Result<ReuseResult<Texture>> {
        let desc = TextureDesc::new_2d(extent, format)
            .filter(filter)
            .mipmap(mipmap)
            .wrap(wrap);

        self.create_or_reuse::<Texture>(name, &desc)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_or_reuse_texture_2d_array(
        &mut self,
        name: &str,
        extent: [u32; 2],
        array_layers: u32,
        format: Format,
        filter: FilterMode,
        mipmap: MipmapMode,
        wrap: WrapMode,
    ) -> anyhow::Result<ReuseResult<Texture>> {
        let desc = TextureDesc::new_2d_array(extent, array_layers, format)
            .filter(filter)
            .mipmap(mipmap)
            .wrap(wrap);

        self.create_or_reuse::<Texture>(name, &desc)
    }

    pub fn try_publish<T: RgResourceKind>(&mut self, name: &str, resource: &RgHandle<T>) -> Result<(), RegistryError> {
        let publisher = self.current_node.clone()
            .ok_or_else(|| RegistryError::OutsideConstruction {
                operation: "publish",
                name: name.to_owned(),
            })?;

        if resource.owner() != self.id {
            return Err(RegistryError::ForeignResource {
                kind: T::KIND,
                name: name.to_owned(),
                publisher,
            });
        }

        let store = T::store_mut(&mut self.stores);
        if let Some(previous) = store.published.get(name) {
            return Err(RegistryError::DuplicatePublish {
                kind: T::KIND,
                name: name.to_owned(),
                publisher,
                previous_publisher: previous.publisher.clone(),
            });
        }

        resource.set_debug_name(name);
        self.device.backend().set_debug_name(resource.raw(), name);

        glog::trace!("Node {:?} published {} {:?}", publisher, T::KIND, name);
        store.published.insert(name.to_owned(), PublishedResource {
            resource: resource.clone(),
            publisher,
        });

        Ok(())
    }

    /// Expose `resource` to the other nodes under `name`.
    ///
    /// Only legal during node construction, a name can be published once per epoch and resource kind.
    pub fn publish<T: RgResourceKind>(&mut self, name: &str, resource: &RgHandle<T>) {
        if let Err(err) = self.try_publish(name, resource) {
            panic!("{}", err);
        }
    }

    pub fn try_get<T: RgResourceKind>(&mut self, name: &str) -> Result<Option<RgHandle<T>>, RegistryError> {
        let consumer = self.current_node.clone()
            .ok_or_else(|| RegistryError::OutsideConstruction {
                operation: "get",
                name: name.to_owned(),
            })?;

        match T::store(&self.stores).published.get(name) {
            Some(published) => {
                if published.publisher != consumer {
                    self.dependencies.insert(NodeDependency {
                        consumer,
                        producer: published.publisher.clone(),
                    });
                }

                Ok(Some(published.resource.clone()))
            }
            None => {
                let request = UnresolvedRequest {
                    consumer,
                    name: name.to_owned(),
                    kind: T::KIND,
                };

                glog::trace!("Node {:?} requested missing {} {:?}", request.consumer, T::KIND, name);
                if !self.unresolved.contains(&request) {
                    self.unresolved.push(request);
                }

                Ok(None)
            }
        }
    }

    /// Fetch a resource published by an earlier node.
    ///
    /// A missing publisher is not an error, the caller is expected to fall back to a default.
    /// Only legal during node construction.
    pub fn get<T: RgResourceKind>(&mut self, name: &str) -> Option<RgHandle<T>> {
        match self.try_get(name) {
            Ok(resource) => resource,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn get_texture(&mut self, name: &str) -> Option<RgHandle<Texture>> {
        self.get::<Texture>(name)
    }

    pub fn get_buffer(&mut self, name: &str) -> Option<RgHandle<Buffer>> {
        self.get::<Buffer>(name)
    }

    pub fn get_top_level_as(&mut self, name: &str) -> Option<RgHandle<TopLevelAs>> {
        self.get::<TopLevelAs>(name)
    }

    pub fn try_allocate<T>(&self, value: T) -> Result<ArenaRef<T>, RegistryError> {
        let ptr = self.arena.try_allocate(value)?;

        // freshly written into the arena and handed out exactly once
        Ok(unsafe { ArenaRef::from_raw(ptr, self.arena.clone()) })
    }

    /// Move `value` into the registry arena, for state which must be shared by construct and execute.
    pub fn allocate<T>(&self, value: T) -> ArenaRef<T> {
        match self.try_allocate(value) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    #[inline]
    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    pub fn dependencies(&self) -> &BTreeSet<NodeDependency> {
        &self.dependencies
    }

    pub fn unresolved_requests(&self) -> &[UnresolvedRequest] {
        &self.unresolved
    }

    pub fn publisher_of<T: RgResourceKind>(&self, name: &str) -> Option<&str> {
        T::store(&self.stores).publisher_of(name)
    }

    pub fn publisher_of_kind(&self, kind: ResourceKind, name: &str) -> Option<&str> {
        self.stores.publisher_of(kind, name)
    }

    pub fn published_names<T: RgResourceKind>(&self) -> Vec<&str> {
        let mut names = T::store(&self.stores).published.keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn owned_count<T: RgResourceKind>(&self) -> usize {
        T::store(&self.stores).owned.len()
    }

    /// Graphviz dump of the recorded dependencies, edges go from producer to consumer.
    pub fn dependency_dot(&self) -> String {
        let mut dot = format!("digraph \"Registry epoch {}\" {{\n", self.epoch);

        for dep in &self.dependencies {
            let _ = writeln!(dot, "    {:?} -> {:?};", dep.producer, dep.consumer);
        }
        for request in &self.unresolved {
            let label = format!("{}\nmissing {}", request.consumer, request.name);
            let _ = writeln!(dot, "    {:?} [label={:?}];", request.consumer, label);
        }

        dot.push('}');
        dot.push('\n');
        dot
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        glog::trace!("Registry epoch {} dropped, {} resources released", self.epoch, self.stores.owned_total());
    }
}
