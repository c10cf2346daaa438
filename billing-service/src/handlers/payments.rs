//! Payment submission and confirmation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    billing::ProofUpload,
    dtos::SubmitPaymentRequest,
    models::{Payment, PaymentMethod},
    AppState,
};

/// Upload cap for proof-of-transfer images.
const MAX_PROOF_BYTES: usize = 2 * 1024 * 1024;

fn decode_proof(payload: &SubmitPaymentRequest) -> Result<Option<ProofUpload>, AppError> {
    let Some(encoded) = payload.proof_image_base64.as_deref() else {
        return Ok(None);
    };

    let content_type = payload
        .proof_content_type
        .clone()
        .unwrap_or_else(|| "image/jpeg".to_string());
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Proof must be an image, got '{}'",
            content_type
        )));
    }

    let bytes = BASE64.decode(encoded).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Proof image is not valid base64: {}", e))
    })?;
    if bytes.len() > MAX_PROOF_BYTES {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Proof image exceeds the 2 MB limit"
        )));
    }

    Ok(Some(ProofUpload {
        bytes,
        content_type,
    }))
}

/// Tenant-side payment submission from the public payment page.
pub async fn submit_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<SubmitPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let method = PaymentMethod::parse(&payload.method).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Unknown payment method '{}'",
            payload.method
        ))
    })?;
    let proof = decode_proof(&payload)?;

    tracing::info!(
        invoice_id = %invoice_id,
        method = method.as_str(),
        "Submitting payment"
    );

    let payment = state.reconciler.submit(invoice_id, method, proof).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Success callback from the external payment gateway.
pub async fn gateway_callback(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = state.reconciler.gateway_callback(invoice_id).await?;
    Ok(Json(payment))
}

/// Owner-side confirmation of a pending payment. Idempotent.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = state.reconciler.confirm(payment_id).await?;
    Ok(Json(payment))
}

/// The owner's confirmation work queue.
pub async fn list_unconfirmed_payments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = state
        .store
        .list_unconfirmed_payments()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(payments))
}
