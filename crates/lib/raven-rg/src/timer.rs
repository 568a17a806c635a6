use std::time::{Duration, Instant};

/// CPU time spent inside one node's execute callback.
#[derive(Debug, Default, Clone)]
pub struct NodeTimer {
    started: Option<Instant>,
    last: Duration,
    smoothed: Duration,
    sample_count: u64,
}

impl NodeTimer {
    /// Weight of the newest sample in the smoothed duration.
    const SMOOTHING: f64 = 0.1;

    pub fn new() -> Self {
        Default::default()
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.record(started.elapsed());
        }
    }

    pub fn record(&mut self, sample: Duration) {
        self.last = sample;
        self.smoothed = if self.sample_count == 0 {
            sample
        } else {
            self.smoothed.mul_f64(1.0 - Self::SMOOTHING) + sample.mul_f64(Self::SMOOTHING)
        };
        self.sample_count += 1;
    }

    #[inline]
    pub fn last(&self) -> Duration {
        self.last
    }

    #[inline]
    pub fn smoothed(&self) -> Duration {
        self.smoothed
    }

    #[inline]
    pub fn smoothed_ms(&self) -> f32 {
        self.smoothed.as_secs_f32() * 1000.0
    }

    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }
}

/// Timing of one node, as reported by the pipeline.
#[derive(Debug, Clone)]
pub struct NodeTiming {
    pub name: String,
    pub last: Duration,
    pub smoothed: Duration,
}
