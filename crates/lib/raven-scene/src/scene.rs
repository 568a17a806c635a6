use crate::{Camera, Light, Mesh};

/// CPU side scene data shared by all render pipeline nodes.
///
/// Every change to geometry or lights bumps the revision, GPU copies compare it against the revision they uploaded.
pub struct Scene {
    pub camera: Camera,
    /// Bias added to every texture lod lookup, upscalers lower it to keep detail.
    pub global_mip_bias: f32,

    meshes: Vec<Mesh>,
    lights: Vec<Light>,
    ray_tracing: bool,
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            camera: Default::default(),
            global_mip_bias: 0.0,
            meshes: Vec::new(),
            lights: Vec::new(),
            ray_tracing: false,
            revision: 0,
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.revision += 1;
        self.meshes.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.revision += 1;
        self.lights.len() - 1
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        let light = self.lights.get_mut(index)?;
        self.revision += 1;
        Some(light)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn set_ray_tracing_enabled(&mut self, enabled: bool) {
        self.ray_tracing = enabled;
    }

    #[inline]
    pub fn ray_tracing_enabled(&self) -> bool {
        self.ray_tracing
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_dirty(&mut self) {
        self.revision += 1;
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.positions.len()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len()).sum()
    }

    /// World space positions of all the meshes packed together.
    pub fn vertex_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.vertex_count() * Mesh::VERTEX_STRIDE);

        for mesh in &self.meshes {
            for position in &mesh.positions {
                let world = mesh.transform.transform_point3(*position);
                for lane in world.to_array() {
                    data.extend_from_slice(&lane.to_le_bytes());
                }
            }
        }
        data
    }

    /// Indices of all the meshes, rebased onto the packed vertex data.
    pub fn index_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.index_count() * 4);
        let mut base_vertex = 0u32;

        for mesh in &self.meshes {
            for index in &mesh.indices {
                data.extend_from_slice(&(base_vertex + index).to_le_bytes());
            }
            base_vertex += mesh.positions.len() as u32;
        }
        data
    }

    pub fn light_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.lights.len() * Light::GPU_SIZE);
        for light in &self.lights {
            light.write_gpu_data(&mut data);
        }
        data
    }
}
