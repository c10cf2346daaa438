//! Unpersisted invoice preview shown to the owner before committing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::service::ServiceLine;

/// Whether a preview issue blocks sending or is advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
}

/// A human-readable validation message collected during preview.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: IssueSeverity::Critical,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == IssueSeverity::Critical
    }
}

/// Usage and cost of one metered utility within a preview.
#[derive(Debug, Clone, Serialize)]
pub struct UtilityBreakdown {
    pub previous: f64,
    pub current: f64,
    pub usage: f64,
    pub unit_rate: f64,
    pub cost: f64,
}

/// The would-be invoice for a room, computed without persisting anything.
///
/// A preview is best-effort: validation failures are collected into `issues`
/// instead of aborting, so the owner sees the whole breakdown together with
/// every reason it cannot be sent yet. `can_send` is true only when no
/// critical issue was found.
#[derive(Debug, Clone, Serialize)]
pub struct InvoicePreview {
    pub room_id: Uuid,
    pub room_name: String,
    pub room_price: f64,
    pub electric: UtilityBreakdown,
    pub water: UtilityBreakdown,
    pub service_lines: Vec<ServiceLine>,
    pub service_cost: f64,
    pub total_amount: f64,
    pub active_tenants: i64,
    pub issues: Vec<ValidationIssue>,
    pub can_send: bool,
}
