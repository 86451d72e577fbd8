use crate::value_objects::bar::OhlcBar;
use crate::value_objects::indicator_row::IndicatorRow;
use serde::Serialize;

pub mod rolling;

use rolling::{RollingRsi, RollingSma};

pub const SMA_WINDOWS: [usize; 3] = [5, 10, 20];
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub bars_in: usize,
    pub rows_out: usize,
    /// Rows where at least one indicator was not yet defined.
    pub insufficient_history: usize,
    /// Fully defined rows removed because volume fell versus the previous bar.
    pub negative_volume_diff: usize,
}

impl PurgeReport {
    pub fn purged(&self) -> usize {
        self.insufficient_history + self.negative_volume_diff
    }
}

/// Derived columns of one bar before purging; `None` means not yet defined.
#[derive(Debug, Clone, Copy, Default)]
struct DerivedColumns {
    ma5: Option<f64>,
    ma10: Option<f64>,
    ma20: Option<f64>,
    rsi14: Option<f64>,
    volume_diff: Option<f64>,
}

/// Computes SMA 5/10/20, RSI(14) and the volume delta over the full bar sequence, then purges.
///
/// Every column is computed before anything is removed, so a purged bar still feeds the
/// averages of the bars after it. Surviving rows get a dense `bar_index`.
pub fn compute_indicator_rows(bars: &[OhlcBar]) -> (Vec<IndicatorRow>, PurgeReport) {
    let [w5, w10, w20] = SMA_WINDOWS;
    let mut ma5 = RollingSma::new(w5);
    let mut ma10 = RollingSma::new(w10);
    let mut ma20 = RollingSma::new(w20);
    let mut rsi = RollingRsi::new(RSI_PERIOD);
    let mut prev_volume: Option<f64> = None;

    let derived: Vec<DerivedColumns> = bars
        .iter()
        .map(|bar| {
            let volume_diff = prev_volume.map(|prev| bar.volume_mean - prev);
            prev_volume = Some(bar.volume_mean);
            DerivedColumns {
                ma5: ma5.update(bar.close),
                ma10: ma10.update(bar.close),
                ma20: ma20.update(bar.close),
                rsi14: rsi.update(bar.close),
                volume_diff,
            }
        })
        .collect();

    let mut report = PurgeReport {
        bars_in: bars.len(),
        ..PurgeReport::default()
    };
    let mut rows = Vec::with_capacity(bars.len());

    for (bar, columns) in bars.iter().zip(derived) {
        let (Some(ma5), Some(ma10), Some(ma20), Some(rsi14), Some(volume_diff)) = (
            columns.ma5,
            columns.ma10,
            columns.ma20,
            columns.rsi14,
            columns.volume_diff,
        ) else {
            report.insufficient_history += 1;
            continue;
        };
        if volume_diff < 0.0 {
            report.negative_volume_diff += 1;
            continue;
        }

        rows.push(IndicatorRow {
            bar: bar.clone(),
            ma5,
            ma10,
            ma20,
            rsi14,
            volume_diff,
            bar_index: rows.len(),
        });
    }

    report.rows_out = rows.len();
    (rows, report)
}
