use raven_math::{Mat4, Vec3};

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub transform: Mat4,
}

impl Mesh {
    pub const VERTEX_STRIDE: usize = 12;

    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            transform: Mat4::IDENTITY,
        }
    }

    /// Two triangles on the xz plane, `size` wide.
    pub fn quad(name: impl Into<String>, size: f32) -> Self {
        let half = size * 0.5;

        Self::new(
            name,
            vec![
                Vec3::new(-half, 0.0, -half),
                Vec3::new(half, 0.0, -half),
                Vec3::new(half, 0.0, half),
                Vec3::new(-half, 0.0, half),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }
}
