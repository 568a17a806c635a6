use super::{RawHandle, FilterMode, WrapMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingResource {
    SampledTexture(RawHandle),
    StorageTexture(RawHandle),
    UniformBuffer {
        raw: RawHandle,
        offset: u64,
        size: u64,
    },
    StorageBuffer {
        raw: RawHandle,
        offset: u64,
        size: u64,
    },
    AccelerationStructure(RawHandle),
    Sampler {
        filter: FilterMode,
        wrap: WrapMode,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingEntry {
    pub slot: u32,
    pub resource: BindingResource,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingSetDesc {
    pub entries: Vec<BindingEntry>,
}

impl BindingSetDesc {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn bind(mut self, slot: u32, resource: BindingResource) -> Self {
        self.entries.push(BindingEntry { slot, resource });
        self
    }

    /// Slots must be unique inside one binding set.
    pub fn has_unique_slots(&self) -> bool {
        let mut slots = self.entries.iter().map(|entry| entry.slot).collect::<Vec<_>>();
        slots.sort_unstable();
        slots.windows(2).all(|pair| pair[0] != pair[1])
    }
}

#[derive(Clone, Debug)]
pub struct BindingSet {
    pub raw: RawHandle,
    pub desc: BindingSetDesc,
}
