use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcBar {
    pub bucket_start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Mean of the tick volumes in the bucket, not their sum.
    pub volume_mean: f64,
}

impl OhlcBar {
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}
