//! Summary statistics used to scale panel axes.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator); needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `[min - 0.5σ, max + 3σ]`, or `None` when the series is too short, non-finite or flat.
pub fn secondary_y_limits(values: &[f64]) -> Option<[f64; 2]> {
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let sigma = sample_std(values)?;
    if !sigma.is_finite() || sigma == 0.0 {
        return None;
    }
    let (lo, hi) = min_max(values)?;
    Some([lo - 0.5 * sigma, hi + 3.0 * sigma])
}

/// `[0, max + 3σ]` for the volume delta histogram, under the same guards as
/// [`secondary_y_limits`].
pub fn volume_y_limits(values: &[f64]) -> Option<[f64; 2]> {
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let sigma = sample_std(values)?;
    if !sigma.is_finite() || sigma == 0.0 {
        return None;
    }
    let (_, hi) = min_max(values)?;
    let top = hi + 3.0 * sigma;
    (top > 0.0).then_some([0.0, top])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_uses_n_minus_one() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138_089_935_299_395).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn secondary_limits_follow_the_asymmetric_band() {
        let limits = secondary_y_limits(&[1.0, 3.0]).unwrap();
        let sigma = 2.0_f64.sqrt();
        assert!((limits[0] - (1.0 - 0.5 * sigma)).abs() < 1e-12);
        assert!((limits[1] - (3.0 + 3.0 * sigma)).abs() < 1e-12);
    }

    #[test]
    fn degenerate_series_have_no_limits() {
        assert_eq!(secondary_y_limits(&[]), None);
        assert_eq!(secondary_y_limits(&[5.0]), None);
        assert_eq!(secondary_y_limits(&[5.0, 5.0, 5.0]), None);
        assert_eq!(secondary_y_limits(&[1.0, f64::NAN]), None);
        assert_eq!(volume_y_limits(&[0.0, 0.0]), None);
    }

    #[test]
    fn volume_limits_start_at_zero() {
        let limits = volume_y_limits(&[0.0, 10.0]).unwrap();
        assert_eq!(limits[0], 0.0);
        assert!(limits[1] > 10.0);
    }
}
