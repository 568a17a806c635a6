use std::ops::RangeInclusive;

/// Minimal immediate mode widget set exposed to nodes.
pub trait Gui {
    fn label(&mut self, text: &str);

    /// Returns true if the value changed.
    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;

    fn slider_f32(&mut self, label: &str, value: &mut f32, range: RangeInclusive<f32>) -> bool;

    /// Pick one of `items`, `selected` is an index into it.
    fn combo(&mut self, label: &str, selected: &mut usize, items: &[&str]) -> bool;

    fn collapsing(&mut self, label: &str, add_contents: &mut dyn FnMut(&mut dyn Gui));
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuiResponse {
    pub rebuild_required: bool,
}

impl GuiResponse {
    pub fn rebuild(rebuild_required: bool) -> Self {
        Self { rebuild_required }
    }

    pub fn merge(self, other: GuiResponse) -> Self {
        Self {
            rebuild_required: self.rebuild_required || other.rebuild_required,
        }
    }
}
