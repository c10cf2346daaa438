//! Payment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a tenant settles an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    QrTransfer,
    Cash,
    Gateway,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::QrTransfer => "qr_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Gateway => "gateway",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "qr_transfer" => PaymentMethod::QrTransfer,
            "gateway" => PaymentMethod::Gateway,
            _ => PaymentMethod::Cash,
        }
    }

    /// Strict parse for user-supplied input; a payment method is never
    /// defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qr_transfer" => Some(PaymentMethod::QrTransfer),
            "cash" => Some(PaymentMethod::Cash),
            "gateway" => Some(PaymentMethod::Gateway),
            _ => None,
        }
    }
}

/// A settlement attempt against an invoice. One confirmed payment is
/// sufficient to mark the invoice paid; unconfirmed rows wait in the owner's
/// confirmation queue.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub method: String,
    pub proof_image_url: Option<String>,
    pub confirmed: bool,
    pub created_utc: DateTime<Utc>,
    pub confirmed_utc: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn method(&self) -> PaymentMethod {
        PaymentMethod::from_string(&self.method)
    }
}
