use crate::app::App;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tapeview_domain::repositories::render_sink::{GridSpan, GRID_COLS, GRID_ROWS};
use tapeview_domain::value_objects::drawing::{
    Axes, HAlign, PanelDrawing, PanelId, Primitive, Rgb, TextAnchor,
};

const GRID_COLOR: Color = Color::DarkGray;
const GRID_DIVISIONS: usize = 4;
/// Rough width of one x label plus spacing, in cells.
const X_LABEL_CELLS: usize = 7;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(12),
                Constraint::Length(8),
            ]
            .as_ref(),
        )
        .split(size);

    draw_top_banner(frame, outer[0], app);
    draw_grid(frame, outer[1], app);
    draw_bottom(frame, outer[2], app);
}

fn draw_top_banner(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "tapeview",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::raw(format!(
        "  {}  cycles={}",
        app.refresh_label, app.cycles
    )));
    if let Some(report) = app.last_cycle.as_ref() {
        spans.push(Span::raw(format!(
            "  panels={}/{}  {:.1}ms",
            report.rendered(),
            PanelId::COUNT,
            report.elapsed_ms
        )));
    }

    if let Some(reason) = app.halted.as_ref() {
        spans.push(Span::styled(
            format!("  HALTED: {reason} (r to resume)"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    } else if app.paused {
        spans.push(Span::styled(
            "  PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    } else if let Some(warning) = app.last_warning.as_ref() {
        spans.push(Span::styled(
            format!("  stale: {warning}"),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

/// Splits `area` into the dashboard's uniform cell grid, row-major.
fn grid_cells(area: Rect) -> Vec<Vec<Rect>> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, u32::from(GRID_ROWS)); GRID_ROWS as usize])
        .split(area);
    rows.iter()
        .map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, u32::from(GRID_COLS)); GRID_COLS as usize])
                .split(*row)
                .to_vec()
        })
        .collect()
}

fn span_rect(cells: &[Vec<Rect>], span: GridSpan) -> Option<Rect> {
    let first = cells.get(span.row as usize)?.get(span.col as usize)?;
    let last_row = (span.row + span.rows.max(1) - 1) as usize;
    let last_col = (span.col + span.cols.max(1) - 1) as usize;
    let last = cells.get(last_row)?.get(last_col)?;
    Some(first.union(*last))
}

fn draw_grid(frame: &mut Frame, area: Rect, app: &App) {
    let cells = grid_cells(area);
    for handle in app.ctx.handles() {
        let Some(rect) = span_rect(&cells, handle.span) else {
            continue;
        };
        match app.ctx.sink().panel(handle.id) {
            Some(drawing) => draw_panel(frame, rect, drawing),
            None => frame.render_widget(
                Paragraph::new("waiting for data...")
                    .style(Style::default().fg(GRID_COLOR))
                    .block(Block::default().borders(Borders::ALL)),
                rect,
            ),
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Resolved view window of a panel: explicit limits win, otherwise the data extent.
pub(crate) fn view_bounds(drawing: &PanelDrawing) -> ([f64; 2], [f64; 2]) {
    let extent = drawing.data_extent();
    let x = drawing
        .axes
        .x_limits
        .or_else(|| extent.map(|(x, _)| [x[0] - 0.5, x[1] + 0.5]))
        .unwrap_or([0.0, 1.0]);
    let y = drawing
        .axes
        .y_limits
        .unwrap_or_else(|| match extent {
            Some((_, [lo, hi])) => y_bounds(lo, hi),
            None => [0.0, 1.0],
        });
    (non_degenerate(x), non_degenerate(y))
}

fn y_bounds(min: f64, max: f64) -> [f64; 2] {
    if max <= min {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

fn non_degenerate([lo, hi]: [f64; 2]) -> [f64; 2] {
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 0.5, lo + 0.5];
    }
    [lo, hi]
}

/// Maps a panel-relative anchor to data coordinates, shifted so the text's left edge lands
/// where `align` wants it for a text `chars` cells wide.
pub(crate) fn anchor_position(
    anchor: TextAnchor,
    align: HAlign,
    chars: usize,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    inner_width: u16,
) -> (f64, f64) {
    let x_span = x_bounds[1] - x_bounds[0];
    let y_span = y_bounds[1] - y_bounds[0];
    let cell = x_span / f64::from(inner_width.max(1));
    let text_width = cell * chars as f64;
    let mut x = x_bounds[0] + anchor.x * x_span;
    x -= match align {
        HAlign::Left => 0.0,
        HAlign::Center => text_width / 2.0,
        HAlign::Right => text_width,
    };
    let x = x.clamp(x_bounds[0], (x_bounds[1] - text_width).max(x_bounds[0]));
    (x, y_bounds[0] + anchor.y * y_span)
}

/// Every `stride`-th label so they do not overlap in `inner_width` cells.
pub(crate) fn label_stride(labels: usize, inner_width: u16) -> usize {
    let slots = (inner_width as usize / X_LABEL_CELLS).max(1);
    labels.div_ceil(slots).max(1)
}

fn axis_value(value: f64) -> String {
    if value.abs() >= 10_000.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn draw_panel(frame: &mut Frame, area: Rect, drawing: &PanelDrawing) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    let (x_bounds, y_bounds) = view_bounds(drawing);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            paint_axes(ctx, &drawing.axes, x_bounds, y_bounds, inner.width);
            for primitive in &drawing.primitives {
                paint_primitive(ctx, primitive, x_bounds, y_bounds, inner.width);
            }
        });
    frame.render_widget(canvas, area);
}

fn paint_axes(ctx: &mut Context, axes: &Axes, x_bounds: [f64; 2], y_bounds: [f64; 2], width: u16) {
    if axes.grid {
        let step = (y_bounds[1] - y_bounds[0]) / GRID_DIVISIONS as f64;
        for idx in 1..GRID_DIVISIONS {
            let y = y_bounds[0] + step * idx as f64;
            ctx.draw(&CanvasLine::new(x_bounds[0], y, x_bounds[1], y, GRID_COLOR));
        }
        ctx.layer();
    }

    if axes.show_y {
        for y in [y_bounds[0], (y_bounds[0] + y_bounds[1]) / 2.0] {
            ctx.print(
                x_bounds[0],
                y,
                Span::styled(axis_value(y), Style::default().fg(GRID_COLOR)),
            );
        }
    }

    if axes.show_x && !axes.x_labels.is_empty() {
        let stride = label_stride(axes.x_labels.len(), width);
        for label in axes.x_labels.iter().step_by(stride) {
            ctx.print(
                label.x,
                y_bounds[0],
                Span::styled(label.text.clone(), Style::default().fg(GRID_COLOR)),
            );
        }
    }
}

fn paint_primitive(
    ctx: &mut Context,
    primitive: &Primitive,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    width: u16,
) {
    match primitive {
        Primitive::Candles {
            candles,
            width: body_width,
            up,
            down,
        } => {
            for candle in candles {
                let rgb = if candle.close > candle.open { up } else { down };
                let c = color(*rgb);
                ctx.draw(&CanvasLine::new(candle.x, candle.low, candle.x, candle.high, c));
                let bottom = candle.open.min(candle.close);
                ctx.draw(&Rectangle {
                    x: candle.x - body_width / 2.0,
                    y: bottom,
                    width: *body_width,
                    height: (candle.open - candle.close).abs(),
                    color: c,
                });
            }
        }
        Primitive::Line { points, color: rgb, .. } => {
            let c = color(*rgb);
            for pair in points.windows(2) {
                let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, c));
            }
        }
        Primitive::Bars { bars, .. } => {
            for bar in bars {
                ctx.draw(&CanvasLine::new(bar.x, 0.0, bar.x, bar.value, color(bar.color)));
            }
        }
        Primitive::HLine { y, color: rgb } => {
            ctx.draw(&CanvasLine::new(x_bounds[0], *y, x_bounds[1], *y, color(*rgb)));
        }
        Primitive::Text {
            anchor,
            text,
            color: rgb,
            align,
            bold,
        } => {
            let (x, y) = anchor_position(
                *anchor,
                *align,
                text.chars().count(),
                x_bounds,
                y_bounds,
                width,
            );
            let mut style = Style::default().fg(color(*rgb));
            if *bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            ctx.print(x, y, Span::styled(text.clone(), style));
        }
        Primitive::Legend { entries } => {
            let mut spans = Vec::with_capacity(entries.len() * 2);
            for entry in entries {
                spans.push(Span::styled("━ ", Style::default().fg(color(entry.color))));
                spans.push(Span::raw(format!("{}  ", entry.label)));
            }
            let y = y_bounds[0] + (y_bounds[1] - y_bounds[0]) * 0.9;
            ctx.print(x_bounds[0], y, Line::from(spans));
        }
    }
}

fn draw_bottom(frame: &mut Frame, area: Rect, app: &App) {
    let max_lines = area.height.saturating_sub(2) as usize;
    let visible = app.logs.lock().tail(app.log_scroll, max_lines);

    let title = if app.log_scroll > 0 {
        format!("Logs (-{})", app.log_scroll)
    } else {
        "Logs".to_string()
    };
    let text: Vec<Line> = visible.into_iter().map(Line::from).collect();
    frame.render_widget(
        Paragraph::new(text)
            .block(Block::default().title(title).borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapeview_domain::repositories::render_sink::PanelHandle;

    #[test]
    fn panel_spans_cover_expected_cells() {
        let cells = grid_cells(Rect::new(0, 0, 120, 60));
        let layout = PanelHandle::layout();
        let primary = span_rect(&cells, layout[PanelId::Primary.index()].span).expect("primary");
        assert_eq!(primary, Rect::new(0, 0, 80, 40));
        let last = span_rect(&cells, layout[PanelId::Secondary(6).index()].span).expect("slot 6");
        assert_eq!(last, Rect::new(80, 50, 40, 10));
    }

    #[test]
    fn explicit_limits_win_over_extent() {
        let mut drawing = PanelDrawing::new(PanelId::Rsi);
        drawing.axes.x_limits = Some([-0.5, 9.5]);
        drawing.axes.y_limits = Some([-5.0, 105.0]);
        drawing.push(Primitive::HLine {
            y: 30.0,
            color: Rgb::new(0, 128, 0),
        });
        assert_eq!(view_bounds(&drawing), ([-0.5, 9.5], [-5.0, 105.0]));
    }

    #[test]
    fn autoscaled_bounds_pad_the_extent() {
        let mut drawing = PanelDrawing::new(PanelId::Secondary(1));
        drawing.push(Primitive::Line {
            points: vec![(0.0, 10.0), (1.0, 20.0)],
            color: Rgb::new(255, 255, 255),
            label: None,
        });
        let (x, y) = view_bounds(&drawing);
        assert_eq!(x, [-0.5, 1.5]);
        assert_eq!(y, [9.5, 20.5]);

        assert_eq!(view_bounds(&PanelDrawing::new(PanelId::Volume)), ([0.0, 1.0], [0.0, 1.0]));
    }

    #[test]
    fn right_aligned_text_ends_at_anchor() {
        let anchor = TextAnchor { x: 1.0, y: 0.5 };
        let (x, y) = anchor_position(anchor, HAlign::Right, 10, [0.0, 100.0], [0.0, 10.0], 100);
        assert_eq!((x, y), (90.0, 5.0));

        let centered = TextAnchor { x: 0.5, y: 0.0 };
        let (x, _) = anchor_position(centered, HAlign::Center, 10, [0.0, 100.0], [0.0, 10.0], 100);
        assert_eq!(x, 45.0);
    }

    #[test]
    fn labels_are_thinned_to_fit() {
        assert_eq!(label_stride(10, 70), 1);
        assert_eq!(label_stride(40, 70), 4);
        assert_eq!(label_stride(5, 0), 5);
    }
}
