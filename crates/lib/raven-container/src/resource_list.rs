use std::marker::PhantomData;
use std::hash::{Hash, Hasher};

use crate::error::ContainerError;

/// Handle type used to address a slot inside a [`ResourceList`].
///
/// A handle is only valid while its slot is alive AND its generation matches the slot's generation.
/// Recycled slots bump the generation, so stale handles never alias a newer resource.
pub trait PoolHandle: Copy + Eq + std::fmt::Debug {
    fn from_raw(index: u32, generation: u32) -> Self;

    fn index(&self) -> u32;

    fn generation(&self) -> u32;
}

/// Default typed handle of a [`ResourceList`].
pub struct ResourceHandle<T> {
    index: u32,
    generation: u32,
    /// Rust: use fn() -> T so that the handle is always Copy, Send and Sync no matter what T is.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceHandle<T> {}

impl<T> PartialEq for ResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for ResourceHandle<T> {}

impl<T> Hash for ResourceHandle<T> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> PoolHandle for ResourceHandle<T> {
    fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Default, Debug)]
struct ResourceMetadata {
    alive: bool,
    persistent: bool,
    reference_count: u32,
    zero_references_at_frame: u64,
    generation: u32,
    /// Whether this slot is currently sitting in the deferred delete list.
    pending_delete: bool,
}

/// Fixed-capacity pooled storage with reference counting and frame-delayed destruction.
///
/// When the reference count of an entry drops to zero, the entry is NOT destroyed right away.
/// GPU consumes resources asynchronously, so the entry must outlive every in-flight frame
/// which may still reference it. Call [`ResourceList::process_deferred_deletes`] once per frame
/// to reclaim the entries whose grace window has passed.
pub struct ResourceList<T, H: PoolHandle = ResourceHandle<T>> {
    resources: Vec<Option<T>>,
    metadata: Vec<ResourceMetadata>,
    free_list: Vec<u32>,
    deferred_delete_list: Vec<H>,
    capacity: usize,
    alive_count: usize,
}

impl<T, H: PoolHandle> ResourceList<T, H> {
    pub fn new(capacity: usize) -> Self {
        Self {
            resources: Vec::with_capacity(capacity),
            metadata: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            deferred_delete_list: Vec::new(),
            capacity,
            alive_count: 0,
        }
    }

    /// Add a new entry into this list.
    ///
    /// Exceeding the capacity is a programming error.
    pub fn add(&mut self, resource: T) -> H {
        match self.try_add(resource) {
            Ok(handle) => handle,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_add(&mut self, resource: T) -> Result<H, ContainerError> {
        let index = if let Some(index) = self.free_list.pop() {
            self.resources[index as usize] = Some(resource);
            index
        } else {
            if self.resources.len() >= self.capacity {
                return Err(ContainerError::CapacityExceeded { capacity: self.capacity });
            }

            self.resources.push(Some(resource));
            self.metadata.push(ResourceMetadata::default());
            (self.resources.len() - 1) as u32
        };

        let meta = &mut self.metadata[index as usize];
        // generation is kept, it was already bumped when this slot died
        *meta = ResourceMetadata {
            alive: true,
            generation: meta.generation,
            ..Default::default()
        };
        self.alive_count += 1;

        Ok(H::from_raw(index, meta.generation))
    }

    #[inline]
    pub fn is_valid(&self, handle: H) -> bool {
        let index = handle.index() as usize;

        index < self.metadata.len()
            && self.metadata[index].alive
            && self.metadata[index].generation == handle.generation()
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        if self.is_valid(handle) {
            self.resources[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.is_valid(handle) {
            self.resources[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Opt this entry out of the reference counted lifetime.
    /// Persistent entries are never destroyed by the deferred path.
    pub fn mark_persistent(&mut self, handle: H) {
        let index = self.checked_index(handle);

        let meta = &mut self.metadata[index];
        meta.persistent = true;
        meta.reference_count = 0;

        if meta.pending_delete {
            meta.pending_delete = false;
            self.deferred_delete_list.retain(|h| *h != handle);
        }
    }

    #[inline]
    pub fn is_persistent(&self, handle: H) -> bool {
        self.is_valid(handle) && self.metadata[handle.index() as usize].persistent
    }

    pub fn add_reference(&mut self, handle: H) {
        let index = self.checked_index(handle);

        let meta = &mut self.metadata[index];
        if meta.persistent {
            return;
        }
        meta.reference_count += 1;
    }

    /// Drop one reference of this entry.
    ///
    /// When the count reaches zero, the entry is enqueued for deferred deletion.
    /// An entry is enqueued at most once, even if it regains and loses references again before being processed.
    pub fn remove_reference(&mut self, handle: H, current_frame: u64) {
        let index = self.checked_index(handle);

        let meta = &mut self.metadata[index];
        if meta.persistent {
            return;
        }

        assert!(meta.reference_count > 0, "Reference count underflow on {:?}!", handle);
        meta.reference_count -= 1;

        if meta.reference_count == 0 {
            meta.zero_references_at_frame = current_frame;

            if !meta.pending_delete {
                meta.pending_delete = true;
                self.deferred_delete_list.push(handle);
            }
        }
    }

    pub fn reference_count(&self, handle: H) -> Option<u32> {
        if self.is_valid(handle) {
            Some(self.metadata[handle.index() as usize].reference_count)
        } else {
            None
        }
    }

    /// Destroy all the entries whose references dropped to zero more than `defer_frames` frames ago.
    ///
    /// Entries which regained references are dequeued without being destroyed.
    /// Returns the number of destroyed entries.
    pub fn process_deferred_deletes<F>(
        &mut self,
        current_frame: u64,
        defer_frames: u64,
        mut deleter: F,
    ) -> usize
    where
        F: FnMut(H, T),
    {
        let Self {
            resources,
            metadata,
            free_list,
            deferred_delete_list,
            alive_count,
            ..
        } = self;
        let mut deleted = 0;

        // entries are dequeued one by one, a panicking deleter leaves the rest in the queue
        deferred_delete_list.retain(|&handle| {
            let index = handle.index() as usize;
            let meta = match metadata.get_mut(index) {
                Some(meta) if meta.alive && meta.generation == handle.generation() => meta,
                _ => return false,
            };

            if meta.reference_count > 0 {
                // it is alive again
                meta.pending_delete = false;
                return false;
            }

            if current_frame.saturating_sub(meta.zero_references_at_frame) <= defer_frames {
                return true;
            }

            meta.alive = false;
            meta.pending_delete = false;
            meta.generation = meta.generation.wrapping_add(1);

            *alive_count -= 1;
            free_list.push(index as u32);

            if let Some(resource) = resources[index].take() {
                deleter(handle, resource);
                deleted += 1;
            }
            false
        });

        deleted
    }

    /// Remove an entry immediately, bypassing the deferred path.
    ///
    /// Caller must make sure GPU is no longer using this entry (e.g. after a device wait idle).
    pub fn remove_immediate(&mut self, handle: H) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }

        let index = handle.index() as usize;
        let meta = &mut self.metadata[index];

        if meta.pending_delete {
            self.deferred_delete_list.retain(|h| *h != handle);
        }

        meta.alive = false;
        meta.persistent = false;
        meta.pending_delete = false;
        meta.reference_count = 0;
        meta.generation = meta.generation.wrapping_add(1);

        self.alive_count -= 1;
        self.free_list.push(index as u32);

        self.resources[index].take()
    }

    /// Iterate all the alive entries, free slots are skipped.
    pub fn for_each_resource<F>(&self, mut func: F)
    where
        F: FnMut(H, &T),
    {
        for (handle, resource) in self.iter() {
            func(handle, resource);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.resources.iter()
            .zip(self.metadata.iter())
            .enumerate()
            .filter_map(|(index, (resource, meta))| {
                match resource {
                    Some(resource) if meta.alive => Some((H::from_raw(index as u32, meta.generation), resource)),
                    _ => None,
                }
            })
    }

    /// Take out all the alive entries, no matter persistent or not.
    pub fn drain_alive(&mut self) -> Vec<(H, T)> {
        let handles = self.iter()
            .map(|(handle, _)| handle)
            .collect::<Vec<_>>();

        handles.into_iter()
            .filter_map(|handle| self.remove_immediate(handle).map(|res| (handle, res)))
            .collect()
    }

    /// Number of alive entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.alive_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn pending_delete_count(&self) -> usize {
        self.deferred_delete_list.len()
    }

    fn checked_index(&self, handle: H) -> usize {
        if !self.is_valid(handle) {
            panic!("{}", ContainerError::InvalidHandle {
                index: handle.index(),
                generation: handle.generation(),
            });
        }

        handle.index() as usize
    }
}
