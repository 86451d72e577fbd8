use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }

        if self.buf.len() == self.window {
            // Re-summed per bar: a running sum would drift over a long session.
            Some(self.buf.iter().sum::<f64>() / self.window as f64)
        } else {
            None
        }
    }
}

/// Bias-adjusted exponentially weighted mean, parameterised by center of mass.
///
/// Weights are `(1 - alpha)^i` with `alpha = 1 / (1 + com)`; the value is the weighted sum
/// divided by the sum of weights. Nothing is emitted before `min_periods` observations.
#[derive(Debug, Clone)]
pub struct EwmMean {
    decay: f64,
    numerator: f64,
    denominator: f64,
    observations: usize,
    min_periods: usize,
}

impl EwmMean {
    pub fn with_com(com: f64, min_periods: usize) -> Self {
        let alpha = 1.0 / (1.0 + com.max(0.0));
        Self {
            decay: 1.0 - alpha,
            numerator: 0.0,
            denominator: 0.0,
            observations: 0,
            min_periods: min_periods.max(1),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.numerator = value + self.decay * self.numerator;
        self.denominator = 1.0 + self.decay * self.denominator;
        self.observations += 1;

        (self.observations >= self.min_periods).then(|| self.numerator / self.denominator)
    }
}

/// RSI over close-to-close differences with Wilder smoothing (`com = period - 1`).
#[derive(Debug, Clone)]
pub struct RollingRsi {
    prev_close: Option<f64>,
    gains: EwmMean,
    losses: EwmMean,
}

impl RollingRsi {
    pub fn new(period: usize) -> Self {
        let com = period.saturating_sub(1) as f64;
        Self {
            prev_close: None,
            gains: EwmMean::with_com(com, period),
            losses: EwmMean::with_com(com, period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let diff = close - prev;

        let up = if diff > 0.0 { diff } else { 0.0 };
        let down = if diff < 0.0 { diff } else { 0.0 };

        let avg_up = self.gains.update(up);
        let avg_down = self.losses.update(down);
        rsi_from_averages(avg_up?, avg_down?)
    }
}

/// `100 - 100 / (1 + |up / down|)`, saturating at 100 when the down average is exactly zero.
pub fn rsi_from_averages(avg_up: f64, avg_down: f64) -> Option<f64> {
    if !avg_up.is_finite() || !avg_down.is_finite() {
        return None;
    }
    if avg_down == 0.0 {
        return Some(100.0);
    }
    let rs = (avg_up / avg_down).abs();
    Some(100.0 - 100.0 / (1.0 + rs))
}
