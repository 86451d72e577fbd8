use tapeview_domain::repositories::render_sink::{PanelHandle, RenderSink};
use tapeview_domain::value_objects::drawing::{PanelDrawing, PanelId};

/// The sink plus the nine panel handles it draws into. Passed into every cycle.
pub struct RenderContext<S: RenderSink> {
    sink: S,
    handles: [PanelHandle; PanelId::COUNT],
}

impl<S: RenderSink> RenderContext<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            handles: PanelHandle::layout(),
        }
    }

    pub fn handles(&self) -> &[PanelHandle] {
        &self.handles
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn draw(&mut self, drawing: PanelDrawing) -> Result<(), String> {
        let handle = self.handles[drawing.id.index()];
        self.sink.draw_panel(&handle, drawing)
    }

    pub fn present(&mut self) -> Result<(), String> {
        self.sink.present()
    }
}
