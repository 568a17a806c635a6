use std::time::Duration;

/// Immutable per frame context handed to every execute callback.
#[derive(Clone, Copy, Debug)]
pub struct AppState {
    pub frame_index: u64,
    /// Time since the application started.
    pub elapsed: Duration,
    pub delta: Duration,
    /// First frame executed since the pipeline was (re)constructed.
    pub first_frame: bool,
    pub render_resolution: [u32; 2],
    pub output_resolution: [u32; 2],
}

impl AppState {
    pub fn new(frame_index: u64, elapsed: Duration, delta: Duration, first_frame: bool) -> Self {
        Self {
            frame_index,
            elapsed,
            delta,
            first_frame,
            render_resolution: [0, 0],
            output_resolution: [0, 0],
        }
    }

    pub fn with_resolution(mut self, render_resolution: [u32; 2], output_resolution: [u32; 2]) -> Self {
        self.render_resolution = render_resolution;
        self.output_resolution = output_resolution;
        self
    }

    #[inline]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
