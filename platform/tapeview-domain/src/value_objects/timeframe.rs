use crate::error::DomainError;

/// Resampling bucket width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    pub label: String,
    pub step_seconds: i64,
}

impl Default for Timeframe {
    fn default() -> Self {
        Self {
            label: "1min".to_string(),
            step_seconds: 60,
        }
    }
}

impl Timeframe {
    pub fn from_seconds(step_seconds: i64) -> Result<Self, DomainError> {
        if step_seconds <= 0 {
            return Err(DomainError::InvalidBucketWidth(step_seconds));
        }
        Ok(Self {
            label: format!("{step_seconds}s"),
            step_seconds,
        })
    }

    /// Accepts `1min`, `5m`, `30s`, `1h`, `1hour`, `1d` or a bare number of seconds.
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        let step_seconds = parse_duration_like_seconds(trimmed)?;
        if step_seconds <= 0 {
            return Err(format!("invalid bucket width: {value}"));
        }
        Ok(Self {
            label: trimmed.to_lowercase(),
            step_seconds,
        })
    }

    /// Truncates `timestamp` down to the start of its bucket.
    pub fn bucket_start(&self, timestamp: i64) -> i64 {
        timestamp.saturating_sub(timestamp.rem_euclid(self.step_seconds))
    }
}

pub fn parse_duration_like_seconds(value: &str) -> Result<i64, String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Ok(seconds);
    }

    let split_at = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number_part, unit) = trimmed.split_at(split_at);

    let multiplier = match unit {
        "s" | "sec" => 1,
        "m" | "min" => 60,
        "h" | "hour" => 3600,
        "d" | "day" => 86400,
        _ => return Err(format!("unsupported duration unit: {unit}")),
    };

    let number: i64 = number_part
        .parse()
        .map_err(|_| format!("invalid duration: {value}"))?;
    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration too large: {value}"))
}
