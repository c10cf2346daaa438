//! Currency arithmetic for invoice components.
//!
//! Amounts are carried as `f64` and rounded half-away-from-zero to two
//! decimals at computation time. `CURRENCY_TOLERANCE` is the reconciliation
//! band used when cross-checking a total computed on an independent path
//! (e.g. a client-side preview) against the recomputed components.

use crate::errors::BillingError;

pub const CURRENCY_TOLERANCE: f64 = 0.01;

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cost of a metered utility: usage times the per-unit rate.
pub fn compute_utility_cost(usage: f64, unit_rate: f64) -> Result<f64, BillingError> {
    if !unit_rate.is_finite() || unit_rate < 0.0 {
        return Err(BillingError::InvalidRate);
    }
    if !usage.is_finite() || usage < 0.0 {
        return Err(BillingError::InvalidCostComponent);
    }
    Ok(round2(usage * unit_rate))
}

/// Invoice total: rent plus utility costs plus the service subtotal.
pub fn compute_total(
    room_price: f64,
    electric_cost: f64,
    water_cost: f64,
    service_cost: f64,
) -> Result<f64, BillingError> {
    for component in [room_price, electric_cost, water_cost, service_cost] {
        if !component.is_finite() || component < 0.0 {
            return Err(BillingError::InvalidCostComponent);
        }
    }
    Ok(round2(room_price + electric_cost + water_cost + service_cost))
}

/// Whether two independently computed totals agree within the tolerance.
pub fn totals_reconcile(stated: f64, recomputed: f64) -> bool {
    (stated - recomputed).abs() <= CURRENCY_TOLERANCE
}
