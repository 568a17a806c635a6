use super::RawHandle;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BottomLevelAsDesc {
    pub vertex_buffer: RawHandle,
    pub vertex_count: u32,
    pub vertex_stride: u32,
    pub index_buffer: Option<RawHandle>,
    pub index_count: u32,
    pub opaque: bool,
}

#[derive(Clone, Debug)]
pub struct BottomLevelAs {
    pub raw: RawHandle,
    pub desc: BottomLevelAsDesc,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct TopLevelAsDesc {
    pub max_instances: u32,
    pub instances: Vec<RawHandle>,
}

#[derive(Clone, Debug)]
pub struct TopLevelAs {
    pub raw: RawHandle,
    pub desc: TopLevelAsDesc,
}
