/// One parsed observation for a single symbol, prior to resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub timestamp: i64,
    pub price: f64,
    pub change: String,
    pub volume: f64,
}
