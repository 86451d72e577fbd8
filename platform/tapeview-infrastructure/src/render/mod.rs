use serde::Serialize;
use tapeview_domain::repositories::render_sink::{PanelHandle, RenderSink};
use tapeview_domain::value_objects::drawing::{PanelDrawing, PanelId};

/// Keeps the latest drawing of every panel in memory. Backs headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderSink {
    panels: [Option<PanelDrawing>; PanelId::COUNT],
    draws: usize,
    frames: usize,
}

#[derive(Debug, Serialize)]
pub struct FrameDump<'a> {
    pub frames: usize,
    pub draws: usize,
    pub panels: Vec<&'a PanelDrawing>,
}

impl RecordingRenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self, id: PanelId) -> Option<&PanelDrawing> {
        self.panels[id.index()].as_ref()
    }

    /// Number of `present` calls so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn dump(&self) -> FrameDump<'_> {
        FrameDump {
            frames: self.frames,
            draws: self.draws,
            panels: self.panels.iter().flatten().collect(),
        }
    }
}

impl RenderSink for RecordingRenderSink {
    fn draw_panel(&mut self, handle: &PanelHandle, drawing: PanelDrawing) -> Result<(), String> {
        if handle.id != drawing.id {
            return Err(format!(
                "drawing for {} sent to the {} panel",
                drawing.id.title(),
                handle.id.title()
            ));
        }
        self.panels[handle.id.index()] = Some(drawing);
        self.draws += 1;
        Ok(())
    }

    fn present(&mut self) -> Result<(), String> {
        self.frames += 1;
        Ok(())
    }
}
