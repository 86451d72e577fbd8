use crate::value_objects::bar::OhlcBar;
use serde::Serialize;

/// A bar that survived the null purge, with every derived column defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: OhlcBar,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub rsi14: f64,
    pub volume_diff: f64,
    /// Dense position after purging, 0..N-1.
    pub bar_index: usize,
}
