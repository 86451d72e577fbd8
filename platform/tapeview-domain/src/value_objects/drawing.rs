//! Backend-neutral drawing instructions handed to a render sink.
//!
//! Coordinates inside a panel are data coordinates except for [`TextAnchor`], which is
//! panel-relative in `[0,1]×[0,1]` with the origin at the bottom-left corner.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub mod palette {
    use super::Rgb;

    pub const UP: Rgb = Rgb::new(0x18, 0xb8, 0x00);
    pub const DOWN: Rgb = Rgb::new(0xff, 0x35, 0x03);
    pub const TEXT: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const LABEL: Rgb = Rgb::new(0xff, 0xbf, 0x00);
    pub const MA5: Rgb = Rgb::new(0xff, 0xc0, 0xcb);
    pub const MA10: Rgb = Rgb::new(0xff, 0xa5, 0x00);
    pub const MA20: Rgb = Rgb::new(0x08, 0xa0, 0xe9);
    pub const RSI: Rgb = Rgb::new(0x08, 0xa0, 0xe9);
    pub const REF_LOW: Rgb = Rgb::new(0x00, 0x80, 0x00);
    pub const REF_MID: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const REF_HIGH: Rgb = Rgb::new(0xff, 0x00, 0x00);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "slot", rename_all = "lowercase")]
pub enum PanelId {
    Primary,
    /// Secondary symbol panel, 1..=6 in symbol order.
    Secondary(u8),
    Volume,
    Rsi,
}

impl PanelId {
    pub const SECONDARY_COUNT: u8 = 6;
    pub const COUNT: usize = 3 + Self::SECONDARY_COUNT as usize;

    pub fn all() -> [PanelId; Self::COUNT] {
        [
            PanelId::Primary,
            PanelId::Secondary(1),
            PanelId::Secondary(2),
            PanelId::Secondary(3),
            PanelId::Secondary(4),
            PanelId::Secondary(5),
            PanelId::Secondary(6),
            PanelId::Volume,
            PanelId::Rsi,
        ]
    }

    /// Stable slot index in `0..COUNT`, matching [`PanelId::all`].
    pub fn index(self) -> usize {
        match self {
            PanelId::Primary => 0,
            PanelId::Secondary(slot) => slot as usize,
            PanelId::Volume => 7,
            PanelId::Rsi => 8,
        }
    }

    pub fn title(self) -> String {
        match self {
            PanelId::Primary => "primary".to_string(),
            PanelId::Secondary(slot) => format!("secondary {slot}"),
            PanelId::Volume => "volume".to_string(),
            PanelId::Rsi => "rsi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub x: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DivergingBar {
    pub x: f64,
    pub value: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextAnchor {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Candles {
        candles: Vec<Candle>,
        width: f64,
        up: Rgb,
        down: Rgb,
    },
    Line {
        points: Vec<(f64, f64)>,
        color: Rgb,
        label: Option<String>,
    },
    Bars {
        bars: Vec<DivergingBar>,
        width: f64,
    },
    HLine {
        y: f64,
        color: Rgb,
    },
    Text {
        anchor: TextAnchor,
        text: String,
        color: Rgb,
        align: HAlign,
        bold: bool,
    },
    Legend {
        entries: Vec<LegendEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    pub x: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes {
    /// `None` lets the sink autoscale from the panel's data.
    pub x_limits: Option<[f64; 2]>,
    pub y_limits: Option<[f64; 2]>,
    pub x_labels: Vec<AxisLabel>,
    pub show_x: bool,
    pub show_y: bool,
    pub grid: bool,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            x_limits: None,
            y_limits: None,
            x_labels: Vec::new(),
            show_x: true,
            show_y: true,
            grid: false,
        }
    }
}

/// Everything a sink needs to redraw one panel from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelDrawing {
    pub id: PanelId,
    pub axes: Axes,
    pub primitives: Vec<Primitive>,
}

impl PanelDrawing {
    pub fn new(id: PanelId) -> Self {
        Self {
            id,
            axes: Axes::default(),
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Data extent over every data-space primitive, as `([x_min, x_max], [y_min, y_max])`.
    pub fn data_extent(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut xs = Extent::default();
        let mut ys = Extent::default();
        for primitive in &self.primitives {
            match primitive {
                Primitive::Candles { candles, .. } => {
                    for c in candles {
                        xs.add(c.x);
                        ys.add(c.low);
                        ys.add(c.high);
                    }
                }
                Primitive::Line { points, .. } => {
                    for (x, y) in points {
                        xs.add(*x);
                        ys.add(*y);
                    }
                }
                Primitive::Bars { bars, .. } => {
                    for bar in bars {
                        xs.add(bar.x);
                        ys.add(0.0);
                        ys.add(bar.value);
                    }
                }
                Primitive::HLine { y, .. } => ys.add(*y),
                Primitive::Text { .. } | Primitive::Legend { .. } => {}
            }
        }
        Some((xs.get()?, ys.get()?))
    }
}

#[derive(Default)]
struct Extent {
    bounds: Option<[f64; 2]>,
}

impl Extent {
    fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.bounds = Some(match self.bounds {
            None => [value, value],
            Some([lo, hi]) => [lo.min(value), hi.max(value)],
        });
    }

    fn get(&self) -> Option<[f64; 2]> {
        self.bounds
    }
}
