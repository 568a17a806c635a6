mod gbuffer;
mod lighting;
mod bloom;
mod upscale;
mod tonemap;

pub use gbuffer::GBufferNode;
pub use lighting::LightingNode;
pub use bloom::BloomNode;
pub use upscale::UpscaleNode;
pub use tonemap::TonemapNode;

pub const GBUFFER_ALBEDO: &str = "GBuffer.Albedo";
pub const GBUFFER_NORMAL: &str = "GBuffer.Normal";
pub const GBUFFER_DEPTH: &str = "GBuffer.Depth";
pub const LIGHTING_OUTPUT: &str = "Lighting.Output";
pub const BLOOM_OUTPUT: &str = "Bloom.Output";
pub const UPSCALE_OUTPUT: &str = "Upscale.Output";
pub const TONEMAP_OUTPUT: &str = "Tonemap.Output";
