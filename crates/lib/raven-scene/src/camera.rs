use raven_math::{Mat4, Quat, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub transform: CameraTransform,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Default::default(),
            fov_y: 60.0_f32.to_radians(),
            near: 0.01,
        }
    }
}

impl Camera {
    /// Bytes of the view and projection matrices packed by `write_gpu_data`.
    pub const GPU_SIZE: usize = 128;

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            transform: CameraTransform { position, rotation },
            ..Default::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.position).inverse()
    }

    /// Reversed-z infinite projection.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_infinite_reverse_rh(self.fov_y, aspect_ratio, self.near)
    }

    /// Column major view matrix followed by the projection matrix.
    pub fn write_gpu_data(&self, aspect_ratio: f32, out: &mut Vec<u8>) {
        let view = self.view_matrix().to_cols_array();
        let projection = self.projection_matrix(aspect_ratio).to_cols_array();

        for lane in view.iter().chain(projection.iter()) {
            out.extend_from_slice(&lane.to_le_bytes());
        }
    }
}
