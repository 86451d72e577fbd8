use crate::value_objects::drawing::{PanelDrawing, PanelId};

/// Placement of a panel on the dashboard's 6×6 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpan {
    pub row: u16,
    pub rows: u16,
    pub col: u16,
    pub cols: u16,
}

pub const GRID_ROWS: u16 = 6;
pub const GRID_COLS: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelHandle {
    pub id: PanelId,
    pub span: GridSpan,
}

impl PanelHandle {
    /// The fixed dashboard layout: the primary chart takes the top-left 4×4 block, the volume
    /// and RSI panels sit below it, and the six secondary charts stack down the right edge.
    pub fn layout() -> [PanelHandle; PanelId::COUNT] {
        PanelId::all().map(|id| {
            let span = match id {
                PanelId::Primary => GridSpan {
                    row: 0,
                    rows: 4,
                    col: 0,
                    cols: 4,
                },
                PanelId::Secondary(slot) => GridSpan {
                    row: u16::from(slot) - 1,
                    rows: 1,
                    col: 4,
                    cols: 2,
                },
                PanelId::Volume => GridSpan {
                    row: 4,
                    rows: 1,
                    col: 0,
                    cols: 4,
                },
                PanelId::Rsi => GridSpan {
                    row: 5,
                    rows: 1,
                    col: 0,
                    cols: 4,
                },
            };
            PanelHandle { id, span }
        })
    }
}

/// The drawing surface. Each `draw_panel` replaces the panel's previous content; panels that
/// are not drawn in a cycle keep whatever they showed before.
pub trait RenderSink {
    fn draw_panel(&mut self, handle: &PanelHandle, drawing: PanelDrawing) -> Result<(), String>;

    /// Called once after all panels of a cycle were dispatched.
    fn present(&mut self) -> Result<(), String> {
        Ok(())
    }
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn draw_panel(&mut self, handle: &PanelHandle, drawing: PanelDrawing) -> Result<(), String> {
        (**self).draw_panel(handle, drawing)
    }

    fn present(&mut self) -> Result<(), String> {
        (**self).present()
    }
}
