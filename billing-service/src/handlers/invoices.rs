//! Invoice preview, creation, edit and status handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    billing::{CreateInvoiceInput, EditInvoiceInput},
    dtos::{
        CreateInvoiceRequest, CreateInvoiceResponse, EditInvoiceRequest, EditInvoiceResponse,
        InvoiceDetailResponse, MarkStatusRequest, PreviewQuery,
    },
    models::{Invoice, InvoicePreview, InvoiceStatus},
    AppState,
};

fn parse_status(s: &str) -> Result<InvoiceStatus, AppError> {
    InvoiceStatus::parse(s)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown invoice status '{}'", s)))
}

/// Compute the would-be invoice for a room without persisting anything.
pub async fn invoice_preview(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(params): Query<PreviewQuery>,
) -> Result<Json<InvoicePreview>, AppError> {
    let preview = state
        .lifecycle
        .preview(room_id, params.electric, params.water, params.expected_total)
        .await?;
    Ok(Json(preview))
}

/// Create an invoice from confirmed meter readings and notify the tenant.
pub async fn create_invoice(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), AppError> {
    payload.validate()?;

    tracing::info!(
        room_id = %room_id,
        month = payload.month,
        year = payload.year,
        "Creating invoice"
    );

    let created = state
        .lifecycle
        .create(
            room_id,
            CreateInvoiceInput {
                month: payload.month,
                year: payload.year,
                electric_meter_after: payload.electric_meter_after,
                water_meter_after: payload.water_meter_after,
                expected_total: payload.expected_total,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            invoice: created.invoice,
            notification: created.notification.into(),
        }),
    ))
}

/// Billing history for a room, newest first.
pub async fn list_room_invoices(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = state
        .store
        .list_room_invoices(room_id)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(invoices))
}

/// An invoice together with its payment attempts.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceDetailResponse>, AppError> {
    let invoice = state
        .store
        .get_invoice(invoice_id)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let payments = state
        .store
        .list_invoice_payments(invoice_id)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(InvoiceDetailResponse { invoice, payments }))
}

/// Correct an unresolved invoice; materially changed figures are re-sent to
/// the tenant.
pub async fn edit_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<EditInvoiceRequest>,
) -> Result<Json<EditInvoiceResponse>, AppError> {
    payload.validate()?;

    let status = payload
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    let edited = state
        .lifecycle
        .edit(
            invoice_id,
            EditInvoiceInput {
                month: payload.month,
                year: payload.year,
                room_price: payload.room_price,
                electric_meter_after: payload.electric_meter_after,
                water_meter_after: payload.water_meter_after,
                service_cost: payload.service_cost,
                status,
            },
        )
        .await?;

    Ok(Json(EditInvoiceResponse {
        invoice: edited.invoice,
        notification: edited.notification.map(Into::into),
    }))
}

/// Direct status transition (e.g. manual overdue marking).
pub async fn mark_invoice_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<MarkStatusRequest>,
) -> Result<Json<Invoice>, AppError> {
    let status = parse_status(&payload.status)?;
    let invoice = state.lifecycle.mark_status(invoice_id, status).await?;
    Ok(Json(invoice))
}
