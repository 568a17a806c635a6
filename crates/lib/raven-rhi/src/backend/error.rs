use thiserror::Error;

#[derive(Debug, Error)]
pub enum RhiError {
    #[error("Allocation failed for {name:?}: {reason}")]
    AllocationFailure {
        name: String,
        reason: String,
    },

    #[error("Invalid descriptor for {name:?}: {reason}")]
    InvalidDescriptor {
        name: String,
        reason: String,
    },

    #[error("Feature {feature} is not supported by backend {backend}!")]
    Unsupported {
        feature: &'static str,
        backend: String,
    },

    #[error("Upload of {requested} bytes overflowed the staging buffer ({remaining} bytes remaining)!")]
    StagingOverflow {
        requested: usize,
        remaining: usize,
    },

    #[error("Device lost!")]
    DeviceLost,
}
