use raven_rhi::{CommandRecorder, UploadBuffer};
use raven_rhi::backend::UpscalingTech;
use raven_scene::Scene;

use crate::app_state::AppState;
use crate::gui::{Gui, GuiResponse};
use crate::registry::Registry;

/// Per frame work of a node, built once by [`RenderPipelineNode::construct`].
///
/// It captures whatever it needs from the registry at construction, it never sees the registry itself.
pub type ExecuteCallback = Box<dyn FnMut(&AppState, &Scene, &mut dyn CommandRecorder, &mut dyn UploadBuffer) -> anyhow::Result<()>>;

/// Unit of work of a render pipeline.
///
/// A node lives across epochs, `construct` is called once per pipeline construction
/// and everything it creates lives as long as the returned callback.
pub trait RenderPipelineNode {
    fn name(&self) -> &str;

    fn construct(&mut self, scene: &mut Scene, registry: &mut Registry) -> anyhow::Result<ExecuteCallback>;

    /// Expose node settings, a changed setting may request a pipeline rebuild.
    fn draw_gui(&mut self, _gui: &mut dyn Gui) -> GuiResponse {
        GuiResponse::default()
    }

    fn upscaling_tech(&self) -> Option<UpscalingTech> {
        None
    }
}

/// Callback doing nothing, for nodes which only publish resources.
pub fn noop_callback() -> ExecuteCallback {
    Box::new(|_, _, _, _| Ok(()))
}
