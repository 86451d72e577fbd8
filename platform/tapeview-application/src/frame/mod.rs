use crate::config::TRACKED_SYMBOLS;
use crate::pipeline::{derive_symbol_series, SymbolSeries};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Instant;
use tapeview_domain::error::TickLogError;
use tapeview_domain::repositories::render_sink::RenderSink;
use tapeview_domain::repositories::tick_log::{TickLogRepository, TickLogSnapshot};
use tapeview_domain::value_objects::drawing::{PanelDrawing, PanelId};
use tapeview_domain::value_objects::symbol::SymbolSlot;
use tapeview_domain::value_objects::timeframe::Timeframe;
use tracing::info_span;

pub mod context;
pub mod panels;

pub use context::RenderContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum PanelOutcome {
    Rendered,
    /// Drawn with placeholders because the series was empty.
    Fallback(String),
    /// Not drawn this cycle; the sink keeps the previous drawing.
    Skipped(String),
}

impl PanelOutcome {
    fn label(&self) -> &'static str {
        match self {
            PanelOutcome::Rendered => "rendered",
            PanelOutcome::Fallback(_) => "fallback",
            PanelOutcome::Skipped(_) => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelReport {
    pub panel: PanelId,
    pub outcome: PanelOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolSummary {
    pub label: String,
    pub ticks: usize,
    pub rows: usize,
    pub dropped_rows: usize,
    pub out_of_order: usize,
    pub purged: usize,
}

impl SymbolSummary {
    fn from_series(series: &SymbolSeries) -> Self {
        Self {
            label: series.label.clone(),
            ticks: series.read.ticks,
            rows: series.rows.len(),
            dropped_rows: series.read.dropped(),
            out_of_order: series.resample.out_of_order,
            purged: series.purge.purged(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub wall_clock: String,
    pub panels: Vec<PanelReport>,
    pub symbols: Vec<SymbolSummary>,
    pub elapsed_ms: f64,
}

impl CycleReport {
    pub fn outcome(&self, panel: PanelId) -> Option<&PanelOutcome> {
        self.panels
            .iter()
            .find(|report| report.panel == panel)
            .map(|report| &report.outcome)
    }

    pub fn rendered(&self) -> usize {
        self.panels
            .iter()
            .filter(|report| report.outcome == PanelOutcome::Rendered)
            .count()
    }
}

/// Drives one Fetch → Resample → Indicate → Render pass per call.
///
/// Holds no state between cycles: every call re-reads the whole log and rebuilds all series.
pub struct FrameOrchestrator<R: TickLogRepository> {
    repo: R,
    slots: Vec<SymbolSlot>,
    timeframe: Timeframe,
}

impl<R: TickLogRepository> FrameOrchestrator<R> {
    pub fn new(repo: R, slots: Vec<SymbolSlot>, timeframe: Timeframe) -> Result<Self, String> {
        if slots.len() != TRACKED_SYMBOLS {
            return Err(format!(
                "frame orchestrator needs {TRACKED_SYMBOLS} symbols, got {}",
                slots.len()
            ));
        }
        if timeframe.step_seconds <= 0 {
            return Err(format!("invalid bucket width: {}", timeframe.step_seconds));
        }
        Ok(Self {
            repo,
            slots,
            timeframe,
        })
    }

    /// Runs one cycle against `ctx`.
    ///
    /// A tick log error aborts the cycle before any panel is drawn; the caller decides whether
    /// it halts scheduling ([`TickLogError::is_fatal`]) or simply waits for the next tick.
    pub fn run_cycle<S: RenderSink>(
        &self,
        ctx: &mut RenderContext<S>,
        wall_clock: NaiveDateTime,
    ) -> Result<CycleReport, TickLogError> {
        let span = info_span!("frame_cycle", bucket = %self.timeframe.label);
        let _enter = span.enter();
        let started = Instant::now();

        let snapshot = match self.repo.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let kind = if err.is_fatal() { "parse" } else { "io" };
                metrics::counter!("tapeview.app.cycles_aborted_total", "kind" => kind).increment(1);
                if err.is_fatal() {
                    tracing::error!(error = %err, "tick log is structurally broken; cycle aborted");
                } else {
                    tracing::warn!(error = %err, "tick log unavailable; cycle skipped");
                }
                return Err(err);
            }
        };

        let series: Vec<Option<SymbolSeries>> = self
            .slots
            .iter()
            .map(|slot| self.series_for(&snapshot, slot))
            .collect();

        let wall_clock = panels::format_wall_clock(wall_clock);
        let mut reports = Vec::with_capacity(PanelId::COUNT);

        let primary = match series.first().and_then(Option::as_ref) {
            Some(primary) => primary.clone(),
            None => SymbolSeries::empty(&self.slots[0]),
        };
        let x_limits = panels::primary_x_limits(primary.rows.len());
        let primary_fallback = primary
            .rows
            .is_empty()
            .then(|| format!("{} has no indicator rows", primary.label));

        let primary_outcome = || match &primary_fallback {
            Some(reason) => PanelOutcome::Fallback(reason.clone()),
            None => PanelOutcome::Rendered,
        };

        reports.push(dispatch(
            ctx,
            panels::primary_panel(&primary, &wall_clock, x_limits),
            primary_outcome(),
        ));

        for (slot_no, entry) in (1..=PanelId::SECONDARY_COUNT).zip(series.iter().skip(1)) {
            let panel = PanelId::Secondary(slot_no);
            let report = match entry {
                None => skipped(panel, "series could not be derived"),
                Some(s) if s.quote.is_none() => skipped(panel, &format!("no ticks for {}", s.label)),
                Some(s) => {
                    let outcome = if s.rows.is_empty() {
                        PanelOutcome::Fallback(format!("{} has no indicator rows", s.label))
                    } else {
                        PanelOutcome::Rendered
                    };
                    dispatch(ctx, panels::secondary_panel(slot_no, s), outcome)
                }
            };
            reports.push(report);
        }

        reports.push(dispatch(
            ctx,
            panels::volume_panel(&primary, x_limits),
            primary_outcome(),
        ));
        reports.push(dispatch(
            ctx,
            panels::rsi_panel(&primary, x_limits),
            primary_outcome(),
        ));

        if let Err(err) = ctx.present() {
            tracing::warn!(error = %err, "render sink failed to present frame");
        }

        for report in &reports {
            metrics::counter!("tapeview.app.panels_total", "outcome" => report.outcome.label())
                .increment(1);
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("tapeview.app.cycle_ms").record(elapsed_ms);

        let symbols: Vec<SymbolSummary> = series
            .iter()
            .zip(&self.slots)
            .map(|(entry, slot)| match entry {
                Some(s) => SymbolSummary::from_series(s),
                None => SymbolSummary::from_series(&SymbolSeries::empty(slot)),
            })
            .collect();

        let report = CycleReport {
            wall_clock,
            panels: reports,
            symbols,
            elapsed_ms,
        };
        tracing::debug!(
            rendered = report.rendered(),
            primary_rows = primary.rows.len(),
            elapsed_ms,
            "frame cycle complete"
        );
        Ok(report)
    }

    fn series_for(&self, snapshot: &TickLogSnapshot, slot: &SymbolSlot) -> Option<SymbolSeries> {
        match derive_symbol_series(snapshot, slot, &self.timeframe) {
            Ok(series) => Some(series),
            Err(err) => {
                tracing::warn!(symbol = %slot.label, error = %err, "failed to derive series");
                None
            }
        }
    }
}

fn skipped(panel: PanelId, reason: &str) -> PanelReport {
    tracing::debug!(panel = %panel.title(), reason, "panel skipped");
    PanelReport {
        panel,
        outcome: PanelOutcome::Skipped(reason.to_string()),
    }
}

fn dispatch<S: RenderSink>(
    ctx: &mut RenderContext<S>,
    drawing: PanelDrawing,
    outcome: PanelOutcome,
) -> PanelReport {
    let panel = drawing.id;
    match ctx.draw(drawing) {
        Ok(()) => PanelReport { panel, outcome },
        Err(err) => {
            tracing::warn!(panel = %panel.title(), error = %err, "render sink rejected panel");
            PanelReport {
                panel,
                outcome: PanelOutcome::Skipped(format!("sink error: {err}")),
            }
        }
    }
}
