//! Billing domain errors.
//!
//! Preview-time problems are collected as [`ValidationIssue`] lists instead of
//! erroring; everything that gates a financial mutation fails fast with one of
//! these variants.
//!
//! [`ValidationIssue`]: crate::models::ValidationIssue

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("meter reading must be a finite, non-negative number")]
    InvalidMeterReading,

    #[error("new {meter} reading {new} is below the previous reading {previous}")]
    MeterRegression {
        meter: &'static str,
        previous: f64,
        new: f64,
    },

    #[error("utility unit rate must be a finite, non-negative number")]
    InvalidRate,

    #[error("cost components must be finite, non-negative, and sum to more than zero")]
    InvalidCostComponent,

    #[error("service '{name}' is invalid: {reason}")]
    InvalidServiceLine { name: String, reason: String },

    #[error("invoice period must be a month in 1-12 and a year of 2000 or later")]
    InvalidPeriod,

    #[error("Room has no active rental contract")]
    NoActiveTenant,

    #[error("a transfer proof image is required for QR payments")]
    ProofRequired,

    #[error("invoice is settled and can no longer be changed")]
    InvoiceLocked,

    #[error("room meters changed while the invoice was being created, please retry")]
    ConcurrentInvoiceConflict,

    #[error("gateway payments are recorded through the provider callback")]
    GatewayCallbackOnly,

    #[error("room not found")]
    RoomNotFound,

    #[error("invoice not found")]
    InvoiceNotFound,

    #[error("payment not found")]
    PaymentNotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::RoomNotFound
            | BillingError::InvoiceNotFound
            | BillingError::PaymentNotFound => AppError::NotFound(anyhow::anyhow!("{}", err)),
            BillingError::InvoiceLocked | BillingError::ConcurrentInvoiceConflict => {
                AppError::Conflict(anyhow::anyhow!("{}", err))
            }
            BillingError::Storage(inner) => AppError::DatabaseError(inner),
            _ => AppError::BadRequest(anyhow::anyhow!("{}", err)),
        }
    }
}
