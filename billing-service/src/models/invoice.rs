//! Invoice model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice lifecycle status. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Pending,
        }
    }

    /// Strict parse for user-supplied input, unlike the lenient
    /// [`from_string`](Self::from_string) used for database round-trips.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

/// A persisted monthly invoice for a room.
///
/// The meter snapshot (`*_previous` / `*_current`) records the billing period
/// boundaries so the invoice can be displayed and re-edited after the room's
/// own counters have advanced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub room_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub room_price: f64,
    pub electric_previous: f64,
    pub electric_current: f64,
    pub electric_cost: f64,
    pub water_previous: f64,
    pub water_current: f64,
    pub water_cost: f64,
    pub service_cost: f64,
    pub total_amount: f64,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_string(&self.status)
    }
}
