mod bump_allocator;
mod resource_list;
mod error;

pub use bump_allocator::BumpAllocator;
pub use resource_list::{ResourceList, PoolHandle, ResourceHandle};
pub use error::ContainerError;
