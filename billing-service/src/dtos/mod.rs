use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::billing::NotificationOutcome;
use crate::models::{Invoice, Payment};

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub electric: Option<f64>,
    pub water: Option<f64>,
    pub expected_total: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    #[validate(range(min = 2000))]
    pub year: i32,
    pub electric_meter_after: f64,
    pub water_meter_after: f64,
    pub expected_total: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditInvoiceRequest {
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    #[validate(range(min = 2000))]
    pub year: i32,
    pub room_price: f64,
    pub electric_meter_after: f64,
    pub water_meter_after: f64,
    pub service_cost: f64,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub method: String,
    pub proof_image_base64: Option<String>,
    pub proof_content_type: Option<String>,
}

/// Wire form of a notification outcome.
#[derive(Debug, Serialize)]
pub struct NotificationStatus {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<NotificationOutcome> for NotificationStatus {
    fn from(outcome: NotificationOutcome) -> Self {
        match outcome {
            NotificationOutcome::Sent => Self {
                outcome: "sent",
                detail: None,
            },
            NotificationOutcome::Failed(reason) => Self {
                outcome: "failed",
                detail: Some(reason),
            },
            NotificationOutcome::Skipped => Self {
                outcome: "skipped",
                detail: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub invoice: Invoice,
    pub notification: NotificationStatus,
}

#[derive(Debug, Serialize)]
pub struct EditInvoiceResponse {
    pub invoice: Invoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStatus>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
}
