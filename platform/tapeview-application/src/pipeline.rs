use serde::Serialize;
use tapeview_domain::error::DomainError;
use tapeview_domain::repositories::tick_log::TickLogSnapshot;
use tapeview_domain::services::indicators::{compute_indicator_rows, PurgeReport};
use tapeview_domain::services::ohlcv::{resample_ticks, ResampleReport};
use tapeview_domain::services::tick_reader::{read_symbol_ticks, RowDropReason, TickReadReport};
use tapeview_domain::value_objects::indicator_row::IndicatorRow;
use tapeview_domain::value_objects::quote::Quote;
use tapeview_domain::value_objects::symbol::SymbolSlot;
use tapeview_domain::value_objects::timeframe::Timeframe;

/// One symbol's derived series for a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSeries {
    pub label: String,
    pub group: usize,
    /// Latest parsed tick, independent of whether any bar survived the purge.
    pub quote: Option<Quote>,
    pub rows: Vec<IndicatorRow>,
    pub read: TickReadReport,
    pub resample: ResampleReport,
    pub purge: PurgeReport,
}

impl SymbolSeries {
    pub fn empty(slot: &SymbolSlot) -> Self {
        Self {
            label: slot.label.clone(),
            group: slot.group,
            quote: None,
            rows: Vec::new(),
            read: TickReadReport::default(),
            resample: ResampleReport::default(),
            purge: PurgeReport::default(),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.bar.close).collect()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rows.last().map(|row| row.rsi14)
    }
}

/// Per-symbol drop reasons. Partial trailing rows belong to the whole log and are reported
/// by the tick log adapter.
const SYMBOL_DROP_REASONS: [RowDropReason; 3] = [
    RowDropReason::Null,
    RowDropReason::Unparsable,
    RowDropReason::BadTimestamp,
];

/// Drop counts of the current log for one symbol, published as gauges since every cycle
/// recomputes them from scratch.
fn symbol_drop_counts(read: &TickReadReport) -> [(RowDropReason, usize); 3] {
    SYMBOL_DROP_REASONS.map(|reason| (reason, read.count(reason)))
}

/// Tick reader → resampler → indicator engine for one symbol, from scratch.
pub fn derive_symbol_series(
    snapshot: &TickLogSnapshot,
    slot: &SymbolSlot,
    timeframe: &Timeframe,
) -> Result<SymbolSeries, DomainError> {
    let (ticks, read) = read_symbol_ticks(snapshot, slot)?;
    let quote = Quote::latest(&ticks);
    let (bars, resample) = resample_ticks(&ticks, timeframe)?;
    let (rows, purge) = compute_indicator_rows(&bars);

    for (reason, dropped) in symbol_drop_counts(&read) {
        metrics::gauge!(
            "tapeview.app.rows_dropped",
            "symbol" => slot.label.clone(),
            "reason" => reason.as_str()
        )
        .set(dropped as f64);
    }
    metrics::gauge!("tapeview.app.ticks_out_of_order", "symbol" => slot.label.clone())
        .set(resample.out_of_order as f64);

    tracing::debug!(
        symbol = %slot.label,
        ticks = read.ticks,
        dropped = read.dropped(),
        bars = resample.bars_out,
        out_of_order = resample.out_of_order,
        rows = purge.rows_out,
        purged_history = purge.insufficient_history,
        purged_volume = purge.negative_volume_diff,
        "symbol series derived"
    );

    Ok(SymbolSeries {
        label: slot.label.clone(),
        group: slot.group,
        quote,
        rows,
        read,
        resample,
        purge,
    })
}
