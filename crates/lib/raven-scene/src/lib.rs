mod camera;
mod light;
mod mesh;
mod scene;

pub use camera::{Camera, CameraTransform};
pub use light::{Light, LightKind};
pub use mesh::Mesh;
pub use scene::Scene;
