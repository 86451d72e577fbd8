use crate::config::Config;
use crate::pipeline::derive_symbol_series;
use std::time::Instant;
use tapeview_domain::repositories::tick_log::TickLogRepository;
use tracing::info_span;

/// Reads the log once and summarizes every symbol's read, resample and purge reports.
pub fn validate(
    config: &Config,
    tick_log: &dyn TickLogRepository,
) -> Result<serde_json::Value, String> {
    let _span = info_span!(
        "validate",
        path = %config.tick_log.path,
        bucket = %config.resample.bucket
    )
    .entered();

    let timeframe = config.timeframe()?;
    let stage_start = Instant::now();
    let snapshot = tick_log.read_snapshot().map_err(|err| err.to_string())?;
    metrics::histogram!("tapeview.validate.read_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let mut symbols = Vec::with_capacity(config.symbols.labels.len());
    for slot in config.symbol_slots() {
        let series =
            derive_symbol_series(&snapshot, &slot, &timeframe).map_err(|err| err.to_string())?;
        metrics::gauge!("tapeview.validate.rows", "symbol" => slot.label.clone())
            .set(series.rows.len() as f64);
        symbols.push(serde_json::json!({
            "symbol": series.label,
            "group": series.group,
            "latest": series.quote,
            "read": series.read,
            "resample": series.resample,
            "purge": series.purge,
        }));
    }

    Ok(serde_json::json!({
        "tick_log": {
            "path": config.tick_log.path,
            "rows": snapshot.rows.len(),
            "symbol_groups": snapshot.symbol_groups,
            "partial_trailing_rows": snapshot.partial_trailing_rows,
        },
        "bucket": {
            "label": timeframe.label,
            "step_seconds": timeframe.step_seconds,
        },
        "symbols": symbols,
    }))
}
