use super::{RawHandle, Format};

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ShaderSource {
    /// Path of the shader source relative to the shader root.
    pub path: String,
    pub entry: String,
    pub defines: Vec<(String, String)>,
}

impl ShaderSource {
    pub fn new(path: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entry: entry.into(),
            defines: Vec::new(),
        }
    }

    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    AlphaBlend,
    Additive,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RenderStateDesc {
    pub vertex_shader: ShaderSource,
    pub pixel_shader: ShaderSource,
    pub color_formats: Vec<Format>,
    pub depth_format: Option<Format>,
    pub cull_mode: CullMode,
    pub blend_mode: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl RenderStateDesc {
    pub fn new(vertex_shader: ShaderSource, pixel_shader: ShaderSource) -> Self {
        Self {
            vertex_shader,
            pixel_shader,
            color_formats: Vec::new(),
            depth_format: None,
            cull_mode: CullMode::Back,
            blend_mode: BlendMode::Opaque,
            depth_test: true,
            depth_write: true,
        }
    }

    pub fn color_format(mut self, format: Format) -> Self {
        self.color_formats.push(format);
        self
    }

    pub fn depth_format(mut self, format: Format) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Fullscreen pass without depth.
    pub fn no_depth(mut self) -> Self {
        self.depth_format = None;
        self.depth_test = false;
        self.depth_write = false;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RenderState {
    pub raw: RawHandle,
    pub desc: RenderStateDesc,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ComputeStateDesc {
    pub shader: ShaderSource,
    pub group_size: [u32; 3],
}

impl ComputeStateDesc {
    pub fn new(shader: ShaderSource, group_size: [u32; 3]) -> Self {
        Self {
            shader,
            group_size,
        }
    }

    /// Number of groups to cover `extent` pixels.
    pub fn group_count(&self, extent: [u32; 2]) -> [u32; 3] {
        [
            (extent[0] + self.group_size[0] - 1) / self.group_size[0],
            (extent[1] + self.group_size[1] - 1) / self.group_size[1],
            1,
        ]
    }
}

#[derive(Clone, Debug)]
pub struct ComputeState {
    pub raw: RawHandle,
    pub desc: ComputeStateDesc,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RayTracingStateDesc {
    pub raygen_shader: ShaderSource,
    pub miss_shaders: Vec<ShaderSource>,
    pub hit_shaders: Vec<ShaderSource>,
    pub max_recursion_depth: u32,
}

#[derive(Clone, Debug)]
pub struct RayTracingState {
    pub raw: RawHandle,
    pub desc: RayTracingStateDesc,
}
