use crate::error::TickLogError;

/// Number of fields each symbol occupies in a log row: price, change, volume.
pub const FIELDS_PER_SYMBOL: usize = 3;

/// One structurally valid log row: a timestamp cell plus one column group per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickLogRow {
    /// 1-based physical row number in the log, for diagnostics.
    pub line: u64,
    pub timestamp: String,
    pub fields: Vec<String>,
}

impl TickLogRow {
    /// `[price, change, volume]` of column group `group`, if the row has it.
    pub fn group(&self, group: usize) -> Option<&[String]> {
        let start = group.checked_mul(FIELDS_PER_SYMBOL)?;
        self.fields.get(start..start + FIELDS_PER_SYMBOL)
    }
}

/// Everything durably flushed to the log at read time, oldest row first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickLogSnapshot {
    pub symbol_groups: usize,
    pub rows: Vec<TickLogRow>,
    /// A short final row captured while the writer was still appending it.
    pub partial_trailing_rows: usize,
}

impl TickLogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait TickLogRepository {
    fn read_snapshot(&self) -> Result<TickLogSnapshot, TickLogError>;
}
