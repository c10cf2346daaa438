//! Cumulative meter reading validation.

use crate::errors::BillingError;

/// Resolve the previous reading for a billing period.
///
/// Precedence is fixed: a recorded-but-unbilled `after` reading wins over the
/// period-opening `now` reading.
pub fn previous_reading(now: f64, after: Option<f64>) -> f64 {
    after.unwrap_or(now)
}

/// Validate a new cumulative reading against the previous one and return the
/// usage delta, guaranteed non-negative.
pub fn validate_reading(
    meter: &'static str,
    previous: f64,
    new: f64,
) -> Result<f64, BillingError> {
    if !new.is_finite() || new < 0.0 {
        return Err(BillingError::InvalidMeterReading);
    }
    if new < previous {
        return Err(BillingError::MeterRegression {
            meter,
            previous,
            new,
        });
    }
    Ok(new - previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_the_delta() {
        assert_eq!(validate_reading("electric", 100.0, 120.0).unwrap(), 20.0);
        assert_eq!(validate_reading("water", 50.0, 50.0).unwrap(), 0.0);
    }

    #[test]
    fn regression_is_rejected() {
        let err = validate_reading("electric", 100.0, 90.0).unwrap_err();
        assert!(matches!(err, BillingError::MeterRegression { .. }));
    }

    #[test]
    fn non_finite_readings_are_rejected() {
        assert!(matches!(
            validate_reading("electric", 0.0, f64::NAN),
            Err(BillingError::InvalidMeterReading)
        ));
        assert!(matches!(
            validate_reading("water", 0.0, f64::INFINITY),
            Err(BillingError::InvalidMeterReading)
        ));
        assert!(matches!(
            validate_reading("water", 0.0, -1.0),
            Err(BillingError::InvalidMeterReading)
        ));
    }

    #[test]
    fn after_reading_wins_over_now() {
        assert_eq!(previous_reading(100.0, Some(130.0)), 130.0);
        assert_eq!(previous_reading(100.0, None), 100.0);
    }
}
