use raven_math::Vec3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        radius: f32,
    },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    /// Bytes taken by one light in the GPU light buffer.
    pub const GPU_SIZE: usize = 32;

    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { direction: direction.normalize() },
            color,
            intensity,
        }
    }

    pub fn point(position: Vec3, radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { position, radius },
            color,
            intensity,
        }
    }

    /// Layout: `[xyz, type_or_radius, rgb, intensity]`, a negative fourth lane marks a directional light.
    pub fn write_gpu_data(&self, out: &mut Vec<u8>) {
        let (xyz, w) = match self.kind {
            LightKind::Directional { direction } => (direction, -1.0),
            LightKind::Point { position, radius } => (position, radius),
        };

        let lanes = [xyz.x, xyz.y, xyz.z, w, self.color.x, self.color.y, self.color.z, self.intensity];
        for lane in lanes {
            out.extend_from_slice(&lane.to_le_bytes());
        }
    }
}
