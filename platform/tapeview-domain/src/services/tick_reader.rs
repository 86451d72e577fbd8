use crate::error::DomainError;
use crate::repositories::tick_log::TickLogSnapshot;
use crate::value_objects::symbol::SymbolSlot;
use crate::value_objects::tick::TickRecord;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDropReason {
    Null,
    Unparsable,
    BadTimestamp,
    PartialTrailingRow,
}

impl RowDropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RowDropReason::Null => "null",
            RowDropReason::Unparsable => "unparsable",
            RowDropReason::BadTimestamp => "bad_timestamp",
            RowDropReason::PartialTrailingRow => "partial_trailing_row",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TickReadReport {
    pub rows_seen: usize,
    pub ticks: usize,
    pub dropped_null: usize,
    pub dropped_unparsable: usize,
    pub dropped_bad_timestamp: usize,
    pub partial_trailing_rows: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_dropped_line: Option<u64>,
}

impl TickReadReport {
    pub fn dropped(&self) -> usize {
        self.dropped_null
            + self.dropped_unparsable
            + self.dropped_bad_timestamp
            + self.partial_trailing_rows
    }

    pub fn count(&self, reason: RowDropReason) -> usize {
        match reason {
            RowDropReason::Null => self.dropped_null,
            RowDropReason::Unparsable => self.dropped_unparsable,
            RowDropReason::BadTimestamp => self.dropped_bad_timestamp,
            RowDropReason::PartialTrailingRow => self.partial_trailing_rows,
        }
    }

    fn record_drop(&mut self, reason: RowDropReason, line: u64) {
        match reason {
            RowDropReason::Null => self.dropped_null += 1,
            RowDropReason::Unparsable => self.dropped_unparsable += 1,
            RowDropReason::BadTimestamp => self.dropped_bad_timestamp += 1,
            RowDropReason::PartialTrailingRow => self.partial_trailing_rows += 1,
        }
        if self.first_dropped_line.is_none() {
            self.first_dropped_line = Some(line);
        }
    }
}

/// Extracts one symbol's ticks from a snapshot, oldest first.
///
/// Rows with any null or unparsable field in the symbol's group (or in the timestamp) are
/// dropped and counted; nothing is substituted.
pub fn read_symbol_ticks(
    snapshot: &TickLogSnapshot,
    slot: &SymbolSlot,
) -> Result<(Vec<TickRecord>, TickReadReport), DomainError> {
    if slot.group >= snapshot.symbol_groups {
        return Err(DomainError::UnknownSymbolGroup {
            requested: slot.group,
            available: snapshot.symbol_groups,
        });
    }

    let mut report = TickReadReport {
        partial_trailing_rows: snapshot.partial_trailing_rows,
        ..TickReadReport::default()
    };
    let mut ticks = Vec::with_capacity(snapshot.rows.len());

    for row in &snapshot.rows {
        report.rows_seen += 1;
        let Some(group) = row.group(slot.group) else {
            report.record_drop(RowDropReason::Null, row.line);
            continue;
        };
        match parse_tick(&row.timestamp, group) {
            Ok(tick) => {
                if report.first_timestamp.is_none() {
                    report.first_timestamp = Some(tick.timestamp);
                }
                report.last_timestamp = Some(tick.timestamp);
                ticks.push(tick);
            }
            Err(reason) => report.record_drop(reason, row.line),
        }
    }

    report.ticks = ticks.len();
    Ok((ticks, report))
}

fn parse_tick(timestamp: &str, group: &[String]) -> Result<TickRecord, RowDropReason> {
    let [price, change, volume] = group else {
        return Err(RowDropReason::Null);
    };
    if [timestamp, price.as_str(), change.as_str(), volume.as_str()]
        .iter()
        .any(|field| is_null(field))
    {
        return Err(RowDropReason::Null);
    }

    let timestamp = parse_timestamp(timestamp).ok_or(RowDropReason::BadTimestamp)?;
    if [price, change, volume]
        .iter()
        .any(|field| field.contains(char::REPLACEMENT_CHARACTER))
    {
        return Err(RowDropReason::Unparsable);
    }
    let price = parse_grouped_number(price).ok_or(RowDropReason::Unparsable)?;
    let volume = parse_grouped_number(volume).ok_or(RowDropReason::Unparsable)?;

    Ok(TickRecord {
        timestamp,
        price,
        change: change.trim().to_string(),
        volume,
    })
}

fn is_null(field: &str) -> bool {
    let trimmed = field.trim();
    trimmed.is_empty()
        || ["nan", "none", "null", "nat"]
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parses `"1,234.5"`-style numbers; only finite values are accepted.
pub fn parse_grouped_number(value: &str) -> Option<f64> {
    let normalized: String = value
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_')
        .collect();
    let parsed: f64 = normalized.parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Places the writer's wall clock on a UTC axis unchanged. An explicit offset is dropped,
/// not applied, so buckets and labels follow the local time written in the log.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(wall_clock_seconds(dt.naive_local()));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Some(wall_clock_seconds(dt.naive_local()));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(wall_clock_seconds(naive));
        }
    }
    None
}

fn wall_clock_seconds(naive: NaiveDateTime) -> i64 {
    Utc.from_utc_datetime(&naive).timestamp()
}
