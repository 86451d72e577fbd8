use crate::value_objects::tick::TickRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
}

impl ChangeDirection {
    /// Up only when the change string carries an explicit leading `+`.
    pub fn from_change(change: &str) -> Self {
        if change.trim_start().starts_with('+') {
            ChangeDirection::Up
        } else {
            ChangeDirection::Down
        }
    }
}

/// Latest observation of a symbol, as shown in panel headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub timestamp: i64,
    pub price: f64,
    pub change: String,
    pub direction: ChangeDirection,
    pub volume: f64,
}

impl Quote {
    pub fn from_tick(tick: &TickRecord) -> Self {
        Self {
            timestamp: tick.timestamp,
            price: tick.price,
            change: tick.change.clone(),
            direction: ChangeDirection::from_change(&tick.change),
            volume: tick.volume,
        }
    }

    pub fn latest(ticks: &[TickRecord]) -> Option<Self> {
        ticks.last().map(Self::from_tick)
    }

    pub fn price_text(&self) -> String {
        format!("{:.2}", self.price)
    }

    pub fn volume_text(&self) -> String {
        group_thousands(self.volume.trunc() as i64)
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
