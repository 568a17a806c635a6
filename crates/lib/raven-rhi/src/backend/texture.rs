use bitflags::bitflags;

use super::RawHandle;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Format {
    R8Unorm,
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Srgb,
    R16Float,
    Rg16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgba32Float,
    R11G11B10Float,
    D32Float,
    D24UnormS8Uint,
}

impl Format {
    pub fn is_depth(self) -> bool {
        matches!(self, Format::D32Float | Format::D24UnormS8Uint)
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Format::R8Unorm => 1,
            Format::R16Float => 2,
            Format::Rgba8Unorm | Format::Rgba8Srgb | Format::Bgra8Srgb
            | Format::Rg16Float | Format::R32Float | Format::R11G11B10Float
            | Format::D32Float | Format::D24UnormS8Uint => 4,
            Format::Rgba16Float | Format::Rg32Float => 8,
            Format::Rgba32Float => 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MipmapMode {
    /// Only the base level.
    None,
    /// Full mip chain down to 1x1.
    Full,
    /// Explicit level count.
    Levels(u32),
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
    pub struct TextureUsage: u32 {
        const SAMPLED       = 1 << 0;
        const STORAGE       = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const DEPTH_STENCIL = 1 << 3;
        const TRANSFER_SRC  = 1 << 4;
        const TRANSFER_DST  = 1 << 5;
    }
}

impl TextureUsage {
    /// Usage of an intermediate render target of `format`.
    pub fn render_target_of(format: Format) -> Self {
        if format.is_depth() {
            TextureUsage::DEPTH_STENCIL | TextureUsage::SAMPLED
        } else {
            TextureUsage::RENDER_TARGET | TextureUsage::STORAGE | TextureUsage::SAMPLED
                | TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TextureDesc {
    pub extent: [u32; 2],
    pub array_layers: u32,
    pub format: Format,
    pub filter: FilterMode,
    pub mipmap: MipmapMode,
    pub wrap: WrapMode,
    pub usage: TextureUsage,
}

impl TextureDesc {
    pub fn new_2d(extent: [u32; 2], format: Format) -> Self {
        Self {
            extent,
            array_layers: 1,
            format,
            filter: FilterMode::Linear,
            mipmap: MipmapMode::None,
            wrap: WrapMode::ClampToEdge,
            usage: TextureUsage::render_target_of(format),
        }
    }

    pub fn new_2d_array(extent: [u32; 2], array_layers: u32, format: Format) -> Self {
        Self {
            array_layers,
            ..Self::new_2d(extent, format)
        }
    }

    pub fn filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn mipmap(mut self, mipmap: MipmapMode) -> Self {
        self.mipmap = mipmap;
        self
    }

    pub fn wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn mip_levels(&self) -> u32 {
        match self.mipmap {
            MipmapMode::None => 1,
            MipmapMode::Full => {
                let max_side = self.extent[0].max(self.extent[1]).max(1);
                32 - max_side.leading_zeros()
            }
            MipmapMode::Levels(levels) => levels.max(1),
        }
    }

    pub fn size_in_bytes(&self) -> u64 {
        let mut size = 0u64;
        let [mut width, mut height] = self.extent;

        for _ in 0..self.mip_levels() {
            size += width as u64 * height as u64 * self.format.bytes_per_pixel() as u64;
            width = (width / 2).max(1);
            height = (height / 2).max(1);
        }

        size * self.array_layers as u64
    }
}

#[derive(Clone, Debug)]
pub struct Texture {
    pub raw: RawHandle,
    pub desc: TextureDesc,
}
