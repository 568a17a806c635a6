#![allow(dead_code)]

use std::ops::RangeInclusive;
use std::rc::Rc;
use std::time::Duration;

use raven_rg::{AppState, DeviceConfig, Gui, RenderDevice};
use raven_rhi::{NullBackend, NullBackendStats};

pub fn null_device(ray_tracing: bool) -> (Rc<RenderDevice>, Rc<NullBackendStats>) {
    let backend = NullBackend::new(ray_tracing);
    let stats = backend.stats();

    (RenderDevice::new(Box::new(backend), DeviceConfig::default()), stats)
}

pub fn frame(frame_index: u64, first_frame: bool) -> AppState {
    let delta = Duration::from_millis(16);
    AppState::new(frame_index, delta * frame_index as u32, delta, first_frame)
}

/// Flips every checkbox it is shown.
pub struct ToggleGui {
    pub labels: Vec<String>,
}

impl Gui for ToggleGui {
    fn label(&mut self, text: &str) {
        self.labels.push(text.to_owned());
    }

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        self.labels.push(label.to_owned());
        *value = !*value;
        true
    }

    fn slider_f32(&mut self, _label: &str, _value: &mut f32, _range: RangeInclusive<f32>) -> bool {
        false
    }

    fn combo(&mut self, _label: &str, _selected: &mut usize, _items: &[&str]) -> bool {
        false
    }

    fn collapsing(&mut self, label: &str, add_contents: &mut dyn FnMut(&mut dyn Gui)) {
        self.labels.push(label.to_owned());
        add_contents(self);
    }
}
