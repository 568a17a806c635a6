use crate::backend::{Buffer, Texture, RhiError};

/// Per frame staging memory to transfer CPU data into GPU resources.
pub trait UploadBuffer {
    fn upload_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8]) -> anyhow::Result<(), RhiError>;

    fn upload_texture(&mut self, dst: &Texture, data: &[u8]) -> anyhow::Result<(), RhiError>;

    /// Bytes still available in this frame.
    fn remaining(&self) -> usize;

    /// Recycle the staging memory, called once the frame is submitted.
    fn reset(&mut self);
}
