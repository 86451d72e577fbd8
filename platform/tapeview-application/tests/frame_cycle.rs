use chrono::NaiveDate;
use std::cell::RefCell;
use tapeview_application::config::Config;
use tapeview_application::frame::{FrameOrchestrator, PanelOutcome, RenderContext};
use tapeview_application::validation::validate;
use tapeview_domain::error::{ParseError, TickLogError};
use tapeview_domain::repositories::render_sink::{PanelHandle, RenderSink};
use tapeview_domain::repositories::tick_log::{TickLogRepository, TickLogRow, TickLogSnapshot};
use tapeview_domain::value_objects::drawing::{PanelDrawing, PanelId, Primitive};
use tapeview_domain::value_objects::timeframe::Timeframe;
use tapeview_infrastructure::render::RecordingRenderSink;

struct FakeTickLogRepo {
    result: RefCell<Result<TickLogSnapshot, TickLogError>>,
}

impl FakeTickLogRepo {
    fn new(result: Result<TickLogSnapshot, TickLogError>) -> Self {
        Self {
            result: RefCell::new(result),
        }
    }

    fn replace(&self, result: Result<TickLogSnapshot, TickLogError>) {
        *self.result.borrow_mut() = result;
    }
}

impl TickLogRepository for &FakeTickLogRepo {
    fn read_snapshot(&self) -> Result<TickLogSnapshot, TickLogError> {
        self.result.borrow().clone()
    }
}

/// Sink that refuses one panel and records the rest.
struct FlakySink {
    refuse: PanelId,
    inner: RecordingRenderSink,
}

impl RenderSink for FlakySink {
    fn draw_panel(&mut self, handle: &PanelHandle, drawing: PanelDrawing) -> Result<(), String> {
        if handle.id == self.refuse {
            return Err("surface lost".to_string());
        }
        self.inner.draw_panel(handle, drawing)
    }
}

/// `minutes` rows, one tick per minute. The last symbol only ever has nulls.
fn snapshot(minutes: usize) -> TickLogSnapshot {
    let rows = (0..minutes)
        .map(|minute| {
            let mut fields = Vec::new();
            for group in 0..6 {
                let price = 100.0 + group as f64 * 10.0 + minute as f64 * 0.25;
                fields.push(format!("{price:.2}"));
                let change = if minute % 3 == 0 {
                    "-0.10 (-0.05%)"
                } else {
                    "+0.25 (+0.12%)"
                };
                fields.push(change.to_string());
                fields.push(format!("{}", 1_000_000 + minute * 1_000));
            }
            fields.extend(["nan".to_string(), "".to_string(), "None".to_string()]);
            TickLogRow {
                line: minute as u64 + 1,
                timestamp: format!("2022-03-01 {:02}:{:02}:05", 9 + minute / 60, minute % 60),
                fields,
            }
        })
        .collect();
    TickLogSnapshot {
        symbol_groups: 7,
        rows,
        partial_trailing_rows: 0,
    }
}

fn wall_clock() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 3, 1)
        .and_then(|d| d.and_hms_opt(10, 15, 0))
        .expect("valid clock")
}

fn orchestrator(repo: &FakeTickLogRepo) -> FrameOrchestrator<&FakeTickLogRepo> {
    FrameOrchestrator::new(repo, Config::default().symbol_slots(), Timeframe::default())
        .expect("orchestrator")
}

#[test]
fn full_cycle_draws_all_panels_with_synchronized_axes() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(40)));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(RecordingRenderSink::new());

    let report = orchestrator.run_cycle(&mut ctx, wall_clock()).expect("cycle");
    assert_eq!(report.panels.len(), PanelId::COUNT);
    assert_eq!(report.wall_clock, "2022-03-01 10:15:00");
    assert_eq!(report.outcome(PanelId::Primary), Some(&PanelOutcome::Rendered));
    assert!(matches!(
        report.outcome(PanelId::Secondary(6)),
        Some(PanelOutcome::Skipped(_))
    ));
    assert_eq!(report.rendered(), 8);

    let sink = ctx.sink();
    assert_eq!(sink.frames(), 1);
    let primary = sink.panel(PanelId::Primary).expect("primary drawn");
    let volume = sink.panel(PanelId::Volume).expect("volume drawn");
    let rsi = sink.panel(PanelId::Rsi).expect("rsi drawn");
    // 40 bars, 19 without SMA20 history
    assert_eq!(primary.axes.x_limits, Some([-0.5, 20.5]));
    assert_eq!(volume.axes.x_limits, primary.axes.x_limits);
    assert_eq!(rsi.axes.x_limits, primary.axes.x_limits);
    assert_eq!(rsi.axes.y_limits, Some([-5.0, 105.0]));
    assert!(sink.panel(PanelId::Secondary(6)).is_none());

    let texts: Vec<&str> = primary.texts().collect();
    assert_eq!(texts[0], "AAPL");
    assert_eq!(texts[1], "109.75");
    assert_eq!(texts[2], "-0.10 (-0.05%)");
    assert_eq!(texts[3], "2022-03-01 10:15:00");
    assert_eq!(volume.texts().next(), Some("Volume: 1,039,000"));
    assert!(rsi.texts().any(|t| t.starts_with("RSI(14): ") && !t.ends_with("...")));

    let summary = &report.symbols[0];
    assert_eq!(summary.ticks, 40);
    assert_eq!(summary.rows, 21);
    assert_eq!(report.symbols[6].ticks, 0);
    assert_eq!(report.symbols[6].dropped_rows, 40);
}

#[test]
fn empty_primary_renders_placeholders() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(5)));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(RecordingRenderSink::new());

    let report = orchestrator.run_cycle(&mut ctx, wall_clock()).expect("cycle");
    assert!(matches!(
        report.outcome(PanelId::Rsi),
        Some(PanelOutcome::Fallback(_))
    ));
    let rsi = ctx.sink().panel(PanelId::Rsi).expect("rsi still drawn");
    assert_eq!(rsi.texts().last(), Some("RSI(14): ..."));
    assert_eq!(rsi.axes.x_limits, Some([-0.5, 0.5]));
}

#[test]
fn fatal_parse_error_aborts_before_any_draw() {
    let repo = FakeTickLogRepo::new(Err(TickLogError::from(ParseError::ColumnCount {
        row: 4,
        expected: 22,
        found: 9,
    })));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(RecordingRenderSink::new());

    let err = orchestrator
        .run_cycle(&mut ctx, wall_clock())
        .expect_err("parse error");
    assert!(err.is_fatal());
    assert_eq!(ctx.sink().draws(), 0);
    assert_eq!(ctx.sink().frames(), 0);
}

#[test]
fn transient_read_failure_keeps_previous_frame() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(30)));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(RecordingRenderSink::new());
    orchestrator.run_cycle(&mut ctx, wall_clock()).expect("first cycle");
    let before = ctx.sink().panel(PanelId::Primary).cloned();

    repo.replace(Err(TickLogError::Io {
        path: "stock_data.csv".to_string(),
        message: "locked".to_string(),
    }));
    let err = orchestrator
        .run_cycle(&mut ctx, wall_clock())
        .expect_err("io");
    assert!(!err.is_fatal());
    assert_eq!(ctx.sink().panel(PanelId::Primary).cloned(), before);
    assert_eq!(ctx.sink().frames(), 1);
}

#[test]
fn sink_error_skips_only_that_panel() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(40)));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(FlakySink {
        refuse: PanelId::Secondary(2),
        inner: RecordingRenderSink::new(),
    });

    let report = orchestrator.run_cycle(&mut ctx, wall_clock()).expect("cycle");
    assert!(matches!(
        report.outcome(PanelId::Secondary(2)),
        Some(PanelOutcome::Skipped(reason)) if reason.contains("surface lost")
    ));
    assert_eq!(report.outcome(PanelId::Rsi), Some(&PanelOutcome::Rendered));
    assert!(ctx.sink().inner.panel(PanelId::Secondary(3)).is_some());
}

#[test]
fn recompute_is_idempotent_across_cycles() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(45)));
    let orchestrator = orchestrator(&repo);
    let mut ctx = RenderContext::new(RecordingRenderSink::new());

    orchestrator.run_cycle(&mut ctx, wall_clock()).expect("first");
    let first = ctx.sink().panel(PanelId::Primary).cloned();
    orchestrator.run_cycle(&mut ctx, wall_clock()).expect("second");
    assert_eq!(ctx.sink().panel(PanelId::Primary).cloned(), first);

    let candles = first.expect("primary").primitives.into_iter().find_map(|p| match p {
        Primitive::Candles { candles, .. } => Some(candles),
        _ => None,
    });
    assert_eq!(candles.map(|c| c.len()), Some(26));
}

#[test]
fn validate_summarizes_every_symbol() {
    let repo = FakeTickLogRepo::new(Ok(snapshot(25)));
    let summary = validate(&Config::default(), &&repo).expect("validate");
    assert_eq!(summary["tick_log"]["rows"], 25);
    assert_eq!(summary["symbols"].as_array().map(Vec::len), Some(7));
    assert_eq!(summary["symbols"][0]["purge"]["rows_out"], 6);
    assert_eq!(summary["symbols"][6]["read"]["dropped_null"], 25);
}

#[test]
fn orchestrator_requires_seven_symbols() {
    let repo = FakeTickLogRepo::new(Ok(TickLogSnapshot::default()));
    let mut slots = Config::default().symbol_slots();
    slots.truncate(3);
    assert!(FrameOrchestrator::new(&repo, slots, Timeframe::default()).is_err());
}
