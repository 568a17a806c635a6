pub mod backend;
pub mod command;
pub mod upload;

pub use backend::{Backend, GpuResource, RawHandle, ResourceKind, RhiError};
pub use backend::null::{NullBackend, NullBackendStats, NullCommandRecorder, NullUploadBuffer, RecordedCommand};
pub use command::CommandRecorder;
pub use upload::UploadBuffer;

// global logger macro
extern crate log as glog;
