use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("Resource list is full (capacity {capacity})!")]
    CapacityExceeded {
        capacity: usize,
    },

    #[error("Invalid handle (index {index}, generation {generation})!")]
    InvalidHandle {
        index: u32,
        generation: u32,
    },

    #[error("Bump allocator exhausted: requested {requested} bytes (align {alignment}), {remaining} bytes remaining!")]
    ArenaExhausted {
        requested: usize,
        alignment: usize,
        remaining: usize,
    },
}
