use crate::error::DomainError;
use crate::value_objects::bar::OhlcBar;
use crate::value_objects::tick::TickRecord;
use crate::value_objects::timeframe::Timeframe;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ResampleReport {
    pub ticks_in: usize,
    pub bars_out: usize,
    pub out_of_order: usize,
    pub first_out_of_order: Option<i64>,
    /// Runs of empty buckets between materialized bars. They are reported, never filled.
    pub gaps: usize,
    pub max_gap_seconds: Option<i64>,
}

struct BucketAccumulator {
    bucket_start: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume_sum: f64,
    ticks: usize,
}

impl BucketAccumulator {
    fn open_with(bucket_start: i64, tick: &TickRecord) -> Self {
        Self {
            bucket_start,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume_sum: tick.volume,
            ticks: 1,
        }
    }

    fn push(&mut self, tick: &TickRecord) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume_sum += tick.volume;
        self.ticks += 1;
    }

    fn finish(self) -> OhlcBar {
        OhlcBar {
            bucket_start: self.bucket_start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume_mean: self.volume_sum / self.ticks as f64,
        }
    }
}

/// Buckets time-ordered ticks into one bar per non-empty bucket.
///
/// Ticks older than the previously accepted tick are dropped rather than reopening an
/// earlier bucket, so `bucket_start` stays strictly increasing without re-sorting.
pub fn resample_ticks(
    ticks: &[TickRecord],
    timeframe: &Timeframe,
) -> Result<(Vec<OhlcBar>, ResampleReport), DomainError> {
    if timeframe.step_seconds <= 0 {
        return Err(DomainError::InvalidBucketWidth(timeframe.step_seconds));
    }

    let mut report = ResampleReport {
        ticks_in: ticks.len(),
        ..ResampleReport::default()
    };
    let mut output = Vec::new();
    let mut bucket: Option<BucketAccumulator> = None;
    let mut last_ts: Option<i64> = None;

    for tick in ticks {
        if let Some(prev) = last_ts {
            if tick.timestamp < prev {
                report.out_of_order += 1;
                if report.first_out_of_order.is_none() {
                    report.first_out_of_order = Some(tick.timestamp);
                }
                continue;
            }
        }
        last_ts = Some(tick.timestamp);

        let bucket_start = timeframe.bucket_start(tick.timestamp);
        bucket = match bucket.take() {
            Some(mut active) if active.bucket_start == bucket_start => {
                active.push(tick);
                Some(active)
            }
            previous => {
                if let Some(done) = previous {
                    output.push(done.finish());
                }
                Some(BucketAccumulator::open_with(bucket_start, tick))
            }
        };
    }

    if let Some(done) = bucket {
        output.push(done.finish());
    }

    let (gaps, max_gap_seconds) = bucket_gaps(&output, timeframe.step_seconds);
    report.gaps = gaps;
    report.max_gap_seconds = max_gap_seconds;
    report.bars_out = output.len();
    Ok((output, report))
}

fn bucket_gaps(bars: &[OhlcBar], step_seconds: i64) -> (usize, Option<i64>) {
    let mut gaps = 0;
    let mut max_gap: Option<i64> = None;
    for pair in bars.windows(2) {
        let diff = pair[1].bucket_start - pair[0].bucket_start;
        if diff > step_seconds {
            gaps += 1;
            max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
        }
    }
    (gaps, max_gap)
}
