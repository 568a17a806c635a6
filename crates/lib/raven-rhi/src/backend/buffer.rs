use bitflags::bitflags;

use super::RawHandle;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MemoryLocation {
    GpuOnly,
    CpuToGpu,
    GpuToCpu,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
    pub struct BufferUsage: u32 {
        const VERTEX         = 1 << 0;
        const INDEX          = 1 << 1;
        const UNIFORM        = 1 << 2;
        const STORAGE        = 1 << 3;
        const INDIRECT       = 1 << 4;
        const TRANSFER_SRC   = 1 << 5;
        const TRANSFER_DST   = 1 << 6;
        const ACCEL_STRUCT_INPUT = 1 << 7;
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub alignment: Option<u64>,
    pub usage: BufferUsage,
    pub memory_location: MemoryLocation,
}

impl BufferDesc {
    pub fn new_gpu_only(size: u64, usage: BufferUsage) -> Self {
        BufferDesc {
            size,
            usage,
            memory_location: MemoryLocation::GpuOnly,
            alignment: None,
        }
    }

    pub fn new_cpu_to_gpu(size: u64, usage: BufferUsage) -> Self {
        BufferDesc {
            size,
            usage,
            memory_location: MemoryLocation::CpuToGpu,
            alignment: None,
        }
    }

    pub fn new_gpu_to_cpu(size: u64, usage: BufferUsage) -> Self {
        BufferDesc {
            size,
            usage,
            memory_location: MemoryLocation::GpuToCpu,
            alignment: None,
        }
    }

    pub fn alignment(mut self, alignment: u64) -> Self {
        self.alignment = Some(alignment);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Buffer {
    pub raw: RawHandle,
    pub desc: BufferDesc,
}
