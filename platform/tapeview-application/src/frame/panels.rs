//! Builders turning derived series into panel drawings.

use crate::pipeline::SymbolSeries;
use chrono::{DateTime, NaiveDateTime};
use tapeview_domain::services::stats::{secondary_y_limits, volume_y_limits};
use tapeview_domain::value_objects::drawing::{
    palette, AxisLabel, Candle, DivergingBar, HAlign, LegendEntry, PanelDrawing, PanelId,
    Primitive, Rgb, TextAnchor,
};
use tapeview_domain::value_objects::indicator_row::IndicatorRow;
use tapeview_domain::value_objects::quote::{ChangeDirection, Quote};

pub const PLACEHOLDER: &str = "...";
pub const RSI_Y_LIMITS: [f64; 2] = [-5.0, 105.0];
pub const RSI_REFERENCE_LINES: [(f64, Rgb); 3] = [
    (30.0, palette::REF_LOW),
    (50.0, palette::REF_MID),
    (70.0, palette::REF_HIGH),
];
const CANDLE_WIDTH: f64 = 0.4;
const VOLUME_BAR_WIDTH: f64 = 1.0;

/// `[-0.5, max(N - 1, 0) + 0.5]`; the volume and RSI panels reuse these verbatim.
pub fn primary_x_limits(rows: usize) -> [f64; 2] {
    [-0.5, rows.saturating_sub(1) as f64 + 0.5]
}

pub fn change_color(direction: ChangeDirection) -> Rgb {
    match direction {
        ChangeDirection::Up => palette::UP,
        ChangeDirection::Down => palette::DOWN,
    }
}

fn text(x: f64, y: f64, text: impl Into<String>, color: Rgb, align: HAlign) -> Primitive {
    Primitive::Text {
        anchor: TextAnchor { x, y },
        text: text.into(),
        color,
        align,
        bold: true,
    }
}

/// Price and change texts, or placeholders when the symbol has no parsed tick.
fn quote_texts(quote: Option<&Quote>) -> (String, String, Rgb) {
    match quote {
        Some(q) => (q.price_text(), q.change.clone(), change_color(q.direction)),
        None => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string(), palette::TEXT),
    }
}

pub fn format_wall_clock(wall_clock: NaiveDateTime) -> String {
    wall_clock.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn hh_mm(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

pub fn primary_panel(series: &SymbolSeries, wall_clock: &str, x_limits: [f64; 2]) -> PanelDrawing {
    let mut panel = PanelDrawing::new(PanelId::Primary);
    panel.axes.x_limits = Some(x_limits);
    panel.axes.show_x = false;
    panel.axes.grid = true;

    let x = |row: &IndicatorRow| row.bar_index as f64;
    panel.push(Primitive::Candles {
        candles: series
            .rows
            .iter()
            .map(|row| Candle {
                x: x(row),
                open: row.bar.open,
                high: row.bar.high,
                low: row.bar.low,
                close: row.bar.close,
            })
            .collect(),
        width: CANDLE_WIDTH,
        up: palette::UP,
        down: palette::DOWN,
    });

    let overlays: [(&str, Rgb, Vec<(f64, f64)>); 3] = [
        ("5 bar SMA", palette::MA5, series.rows.iter().map(|r| (x(r), r.ma5)).collect()),
        ("10 bar SMA", palette::MA10, series.rows.iter().map(|r| (x(r), r.ma10)).collect()),
        ("20 bar SMA", palette::MA20, series.rows.iter().map(|r| (x(r), r.ma20)).collect()),
    ];
    let mut legend = Vec::with_capacity(overlays.len());
    for (label, color, points) in overlays {
        legend.push(LegendEntry {
            label: label.to_string(),
            color,
        });
        panel.push(Primitive::Line {
            points,
            color,
            label: Some(label.to_string()),
        });
    }
    panel.push(Primitive::Legend { entries: legend });

    let (price, change, change_rgb) = quote_texts(series.quote.as_ref());
    panel.push(text(0.005, 0.98, series.label.clone(), palette::LABEL, HAlign::Left));
    panel.push(text(0.35, 0.98, price, palette::TEXT, HAlign::Center));
    panel.push(text(0.75, 0.98, change, change_rgb, HAlign::Center));
    panel.push(text(0.995, 0.98, wall_clock, palette::TEXT, HAlign::Right));
    panel
}

pub fn secondary_panel(slot: u8, series: &SymbolSeries) -> PanelDrawing {
    let mut panel = PanelDrawing::new(PanelId::Secondary(slot));
    panel.axes.show_x = false;
    panel.axes.show_y = false;

    let closes = series.closes();
    panel.axes.y_limits = secondary_y_limits(&closes);
    panel.push(Primitive::Line {
        points: series
            .rows
            .iter()
            .map(|row| (row.bar_index as f64, row.bar.close))
            .collect(),
        color: palette::TEXT,
        label: None,
    });

    let (price, change, change_rgb) = quote_texts(series.quote.as_ref());
    panel.push(text(0.02, 0.95, series.label.clone(), palette::LABEL, HAlign::Left));
    panel.push(text(0.25, 0.95, price, palette::TEXT, HAlign::Left));
    panel.push(text(0.5, 0.95, change, change_rgb, HAlign::Left));
    panel
}

/// `volume_diff` bars of the primary symbol, coloured by candle direction.
pub fn volume_panel(series: &SymbolSeries, x_limits: [f64; 2]) -> PanelDrawing {
    let mut panel = PanelDrawing::new(PanelId::Volume);
    panel.axes.x_limits = Some(x_limits);
    panel.axes.show_x = false;
    panel.axes.show_y = false;
    panel.axes.grid = true;

    let diffs: Vec<f64> = series.rows.iter().map(|row| row.volume_diff).collect();
    panel.axes.y_limits = volume_y_limits(&diffs);
    panel.push(Primitive::Bars {
        bars: series
            .rows
            .iter()
            .map(|row| DivergingBar {
                x: row.bar_index as f64,
                value: row.volume_diff,
                color: if row.bar.is_up() {
                    palette::UP
                } else {
                    palette::DOWN
                },
            })
            .collect(),
        width: VOLUME_BAR_WIDTH,
    });

    let volume = series
        .quote
        .as_ref()
        .map_or_else(|| PLACEHOLDER.to_string(), Quote::volume_text);
    panel.push(text(0.01, 0.95, format!("Volume: {volume}"), palette::TEXT, HAlign::Left));
    panel
}

pub fn rsi_label(latest: Option<f64>) -> String {
    match latest {
        Some(rsi) => format!("RSI(14): {rsi:.2}"),
        None => format!("RSI(14): {PLACEHOLDER}"),
    }
}

pub fn rsi_panel(series: &SymbolSeries, x_limits: [f64; 2]) -> PanelDrawing {
    let mut panel = PanelDrawing::new(PanelId::Rsi);
    panel.axes.x_limits = Some(x_limits);
    panel.axes.y_limits = Some(RSI_Y_LIMITS);
    panel.axes.show_y = false;
    panel.axes.grid = true;
    panel.axes.x_labels = series
        .rows
        .iter()
        .map(|row| AxisLabel {
            x: row.bar_index as f64,
            text: hh_mm(row.bar.bucket_start),
        })
        .collect();

    for (y, color) in RSI_REFERENCE_LINES {
        panel.push(Primitive::HLine { y, color });
    }
    panel.push(Primitive::Line {
        points: series
            .rows
            .iter()
            .map(|row| (row.bar_index as f64, row.rsi14))
            .collect(),
        color: palette::RSI,
        label: None,
    });
    panel.push(text(0.01, 0.95, rsi_label(series.latest_rsi()), palette::TEXT, HAlign::Left));
    panel
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapeview_domain::value_objects::bar::OhlcBar;
    use tapeview_domain::value_objects::symbol::SymbolSlot;

    fn row(idx: usize, open: f64, close: f64, volume_diff: f64) -> IndicatorRow {
        IndicatorRow {
            bar: OhlcBar {
                bucket_start: 34_200 + idx as i64 * 60,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume_mean: 1_000.0,
            },
            ma5: close,
            ma10: close,
            ma20: close,
            rsi14: 55.5,
            volume_diff,
            bar_index: idx,
        }
    }

    fn series(rows: Vec<IndicatorRow>, change: Option<&str>) -> SymbolSeries {
        let mut series = SymbolSeries::empty(&SymbolSlot::new("AAPL", 0));
        series.quote = change.map(|c| Quote {
            timestamp: 0,
            price: 178.25,
            change: c.to_string(),
            direction: ChangeDirection::from_change(c),
            volume: 64_598_200.0,
        });
        series.rows = rows;
        series
    }

    #[test]
    fn x_limits_pad_half_a_bar() {
        assert_eq!(primary_x_limits(0), [-0.5, 0.5]);
        assert_eq!(primary_x_limits(1), [-0.5, 0.5]);
        assert_eq!(primary_x_limits(10), [-0.5, 9.5]);
    }

    #[test]
    fn primary_header_colours_change_by_sign() {
        let s = series(vec![row(0, 1.0, 2.0, 0.0)], Some("-1.25 (-0.70%)"));
        let panel = primary_panel(&s, "2022-03-01 09:30:00", primary_x_limits(1));
        let texts: Vec<&str> = panel.texts().collect();
        assert_eq!(texts, ["AAPL", "178.25", "-1.25 (-0.70%)", "2022-03-01 09:30:00"]);

        let change_color_used = panel.primitives.iter().find_map(|p| match p {
            Primitive::Text { text, color, .. } if text.starts_with('-') => Some(*color),
            _ => None,
        });
        assert_eq!(change_color_used, Some(palette::DOWN));
    }

    #[test]
    fn volume_bars_colour_by_candle_direction() {
        let s = series(
            vec![row(0, 1.0, 2.0, 5.0), row(1, 2.0, 2.0, 3.0), row(2, 3.0, 1.0, 0.0)],
            Some("+1"),
        );
        let panel = volume_panel(&s, primary_x_limits(3));
        let Primitive::Bars { bars, .. } = &panel.primitives[0] else {
            panic!("expected bars");
        };
        let colors: Vec<Rgb> = bars.iter().map(|b| b.color).collect();
        assert_eq!(colors, [palette::UP, palette::DOWN, palette::DOWN]);
        assert_eq!(panel.axes.x_limits, Some([-0.5, 2.5]));
        assert!(!panel.axes.show_y);
        assert_eq!(panel.texts().last(), Some("Volume: 64,598,200"));
    }

    #[test]
    fn rsi_panel_has_reference_lines_and_time_labels() {
        let s = series(vec![row(0, 1.0, 2.0, 0.0), row(1, 2.0, 3.0, 1.0)], Some("+1"));
        let panel = rsi_panel(&s, primary_x_limits(2));
        assert_eq!(panel.axes.y_limits, Some([-5.0, 105.0]));
        let hlines: Vec<f64> = panel
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::HLine { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(hlines, [30.0, 50.0, 70.0]);
        assert_eq!(panel.axes.x_labels[0].text, "09:30");
        assert_eq!(panel.axes.x_labels[1].text, "09:31");
        assert_eq!(panel.texts().last(), Some("RSI(14): 55.50"));
    }

    #[test]
    fn offset_timestamps_label_with_the_writers_wall_clock() {
        use tapeview_domain::services::tick_reader::parse_timestamp;

        let mut first = row(0, 1.0, 2.0, 0.0);
        first.bar.bucket_start = parse_timestamp("2022-03-01T09:30:00-05:00").expect("ts");
        let mut second = row(1, 2.0, 3.0, 1.0);
        second.bar.bucket_start = parse_timestamp("2022-03-01 09:31:00+0200").expect("ts");
        let panel = rsi_panel(&series(vec![first, second], Some("+1")), primary_x_limits(2));
        assert_eq!(panel.axes.x_labels[0].text, "09:30");
        assert_eq!(panel.axes.x_labels[1].text, "09:31");
    }

    #[test]
    fn empty_primary_falls_back_to_placeholders() {
        let s = series(Vec::new(), None);
        let rsi = rsi_panel(&s, primary_x_limits(0));
        assert_eq!(rsi.texts().last(), Some("RSI(14): ..."));

        let primary = primary_panel(&s, "now", primary_x_limits(0));
        assert!(primary.texts().any(|t| t == PLACEHOLDER));
        let volume = volume_panel(&s, primary_x_limits(0));
        assert_eq!(volume.texts().last(), Some("Volume: ..."));
        assert_eq!(volume.axes.y_limits, None);
    }

    #[test]
    fn secondary_panel_scales_to_its_own_closes() {
        let s = series(vec![row(0, 1.0, 10.0, 0.0), row(1, 1.0, 12.0, 1.0)], Some("+0.5"));
        let panel = secondary_panel(3, &s);
        assert_eq!(panel.id, PanelId::Secondary(3));
        let limits = panel.axes.y_limits.expect("two distinct closes");
        let sigma = 2.0_f64.sqrt();
        assert!((limits[0] - (10.0 - 0.5 * sigma)).abs() < 1e-9);
        assert!((limits[1] - (12.0 + 3.0 * sigma)).abs() < 1e-9);

        let flat = series(vec![row(0, 1.0, 10.0, 0.0), row(1, 1.0, 10.0, 1.0)], Some("+0.5"));
        assert_eq!(secondary_panel(3, &flat).axes.y_limits, None);
    }
}
