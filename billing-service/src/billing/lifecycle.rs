//! The invoice state machine: PENDING -> PAID / OVERDUE, OVERDUE -> PAID,
//! with PAID terminal.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::BillingError;
use crate::models::{
    Invoice, InvoicePreview, InvoiceStatus, MeterSnapshot, Room, TenantContact,
};
use crate::services::{metrics, BillingStore, InvoiceNotifier, NotifyError};

use super::costs::{compute_total, compute_utility_cost, totals_reconcile};
use super::lines::aggregate;
use super::meter::{previous_reading, validate_reading};
use super::preview::{build_preview, PreviewInputs};

/// Confirmed readings and period for a new invoice.
#[derive(Debug, Clone, Copy)]
pub struct CreateInvoiceInput {
    pub month: i32,
    pub year: i32,
    pub electric_meter_after: f64,
    pub water_meter_after: f64,
    /// Client-side total, cross checked against the recomputed one. A
    /// mismatch within reason is logged, never fatal.
    pub expected_total: Option<f64>,
}

/// Corrections to an unresolved invoice.
#[derive(Debug, Clone, Copy)]
pub struct EditInvoiceInput {
    pub month: i32,
    pub year: i32,
    pub room_price: f64,
    pub electric_meter_after: f64,
    pub water_meter_after: f64,
    pub service_cost: f64,
    pub status: Option<InvoiceStatus>,
}

/// What happened to the tenant notification for an invoice mutation.
/// Delivery failure is a partial success, not a rollback: the financial
/// record outranks the email.
#[derive(Debug, Clone)]
pub enum NotificationOutcome {
    Sent,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub invoice: Invoice,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone)]
pub struct EditedInvoice {
    pub invoice: Invoice,
    /// `None` when nothing changed materially and no re-send was attempted.
    pub notification: Option<NotificationOutcome>,
}

fn validate_period(month: i32, year: i32) -> Result<(), BillingError> {
    if !(1..=12).contains(&month) || year < 2000 {
        return Err(BillingError::InvalidPeriod);
    }
    Ok(())
}

fn validate_amount(value: f64) -> Result<(), BillingError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BillingError::InvalidCostComponent);
    }
    Ok(())
}

enum Delivery {
    First,
    Corrected,
}

pub struct InvoiceLifecycle {
    store: Arc<dyn BillingStore>,
    notifier: Arc<dyn InvoiceNotifier>,
}

impl InvoiceLifecycle {
    pub fn new(store: Arc<dyn BillingStore>, notifier: Arc<dyn InvoiceNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Compute the would-be invoice for a room without mutating anything.
    /// Problems are collected into the preview's issue list, not returned as
    /// errors; only missing rooms and storage failures are fatal here.
    #[instrument(skip(self))]
    pub async fn preview(
        &self,
        room_id: Uuid,
        proposed_electric: Option<f64>,
        proposed_water: Option<f64>,
        expected_total: Option<f64>,
    ) -> Result<InvoicePreview, BillingError> {
        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(BillingError::RoomNotFound)?;
        let services = self.store.list_room_services(room_id).await?;
        let contacts = self.store.active_tenant_contacts(room_id).await?;

        Ok(build_preview(PreviewInputs {
            room: &room,
            services: &services,
            active_tenants: contacts.len() as i64,
            proposed_electric,
            proposed_water,
            expected_total,
        }))
    }

    /// Create a persisted invoice from confirmed meter readings.
    ///
    /// Unlike preview this is fail-fast: any validation problem aborts before
    /// anything is written. The meter advance and the invoice insert happen
    /// in one compare-and-swap step, so a concurrent creation against the
    /// same baseline loses cleanly with [`BillingError::ConcurrentInvoiceConflict`].
    #[instrument(skip(self, input), fields(room_id = %room_id))]
    pub async fn create(
        &self,
        room_id: Uuid,
        input: CreateInvoiceInput,
    ) -> Result<CreatedInvoice, BillingError> {
        validate_period(input.month, input.year)?;

        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(BillingError::RoomNotFound)?;
        let contacts = self.store.active_tenant_contacts(room_id).await?;
        if contacts.is_empty() {
            return Err(BillingError::NoActiveTenant);
        }
        let services = self.store.list_room_services(room_id).await?;

        let snapshot = room.meter_snapshot();
        let electric_previous =
            previous_reading(room.electric_meter_now, room.electric_meter_after);
        let water_previous = previous_reading(room.water_meter_now, room.water_meter_after);

        let electric_usage =
            validate_reading("electric", electric_previous, input.electric_meter_after)?;
        let water_usage = validate_reading("water", water_previous, input.water_meter_after)?;

        let electric_cost = compute_utility_cost(electric_usage, room.electric_fee)?;
        let water_cost = compute_utility_cost(water_usage, room.water_fee)?;
        let (_, service_cost) = aggregate(room.rent_price, &services)?;
        let total_amount =
            compute_total(room.rent_price, electric_cost, water_cost, service_cost)?;
        if total_amount <= 0.0 {
            return Err(BillingError::InvalidCostComponent);
        }

        if let Some(expected) = input.expected_total {
            if !totals_reconcile(expected, total_amount) {
                warn!(
                    expected,
                    recomputed = total_amount,
                    "Client total differs from recomputed total, keeping the recomputed one"
                );
            }
        }

        let now = Utc::now();
        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            room_id,
            month: input.month,
            year: input.year,
            room_price: room.rent_price,
            electric_previous,
            electric_current: input.electric_meter_after,
            electric_cost,
            water_previous,
            water_current: input.water_meter_after,
            water_cost,
            service_cost,
            total_amount,
            status: InvoiceStatus::Pending.as_str().to_string(),
            created_utc: now,
            updated_utc: now,
        };

        let recorded = self.store.record_invoice(&invoice, &snapshot).await?;
        if !recorded {
            return Err(BillingError::ConcurrentInvoiceConflict);
        }

        metrics::record_invoice(InvoiceStatus::Pending.as_str());
        tracing::info!(
            invoice_id = %invoice.invoice_id,
            total = invoice.total_amount,
            "Invoice created"
        );

        let notification = self
            .deliver(Delivery::First, &contacts[0], &room, &invoice)
            .await;

        Ok(CreatedInvoice {
            invoice,
            notification,
        })
    }

    /// Correct an unresolved invoice.
    ///
    /// Costs are recomputed against the invoice's own period baseline, not
    /// the room's current counters (those have already advanced to this
    /// invoice's confirmed readings, or further). When the corrected figures
    /// differ materially the tenant gets the email again.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub async fn edit(
        &self,
        invoice_id: Uuid,
        input: EditInvoiceInput,
    ) -> Result<EditedInvoice, BillingError> {
        let invoice = self
            .store
            .get_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)?;
        if invoice.status().is_terminal() {
            return Err(BillingError::InvoiceLocked);
        }

        validate_period(input.month, input.year)?;
        validate_amount(input.room_price)?;
        validate_amount(input.service_cost)?;

        let room = self
            .store
            .get_room(invoice.room_id)
            .await?
            .ok_or(BillingError::RoomNotFound)?;

        let electric_usage = validate_reading(
            "electric",
            invoice.electric_previous,
            input.electric_meter_after,
        )?;
        let water_usage =
            validate_reading("water", invoice.water_previous, input.water_meter_after)?;
        let electric_cost = compute_utility_cost(electric_usage, room.electric_fee)?;
        let water_cost = compute_utility_cost(water_usage, room.water_fee)?;
        let total_amount = compute_total(
            input.room_price,
            electric_cost,
            water_cost,
            input.service_cost,
        )?;
        if total_amount <= 0.0 {
            return Err(BillingError::InvalidCostComponent);
        }

        let material_change = !totals_reconcile(invoice.total_amount, total_amount)
            || invoice.electric_current != input.electric_meter_after
            || invoice.water_current != input.water_meter_after;

        let mut updated = invoice.clone();
        updated.month = input.month;
        updated.year = input.year;
        updated.room_price = input.room_price;
        updated.electric_current = input.electric_meter_after;
        updated.electric_cost = electric_cost;
        updated.water_current = input.water_meter_after;
        updated.water_cost = water_cost;
        updated.service_cost = input.service_cost;
        updated.total_amount = total_amount;
        if let Some(status) = input.status {
            updated.status = status.as_str().to_string();
        }
        updated.updated_utc = Utc::now();

        self.store.update_invoice(&updated).await?;

        // Re-sync the room counters only if they still sit at this invoice's
        // confirmed readings; a newer invoice owns them otherwise.
        let expected = MeterSnapshot {
            electric_now: invoice.electric_current,
            electric_after: None,
            water_now: invoice.water_current,
            water_after: None,
        };
        let synced = self
            .store
            .advance_meters(
                invoice.room_id,
                &expected,
                input.electric_meter_after,
                input.water_meter_after,
            )
            .await?;
        if !synced {
            debug!(room_id = %invoice.room_id, "Room meters have moved on, skipping re-sync");
        }

        let notification = if material_change {
            let contacts = self.store.active_tenant_contacts(invoice.room_id).await?;
            match contacts.first() {
                Some(contact) => Some(
                    self.deliver(Delivery::Corrected, contact, &room, &updated)
                        .await,
                ),
                None => Some(NotificationOutcome::Skipped),
            }
        } else {
            None
        };

        tracing::info!(
            invoice_id = %updated.invoice_id,
            total = updated.total_amount,
            material_change,
            "Invoice edited"
        );

        Ok(EditedInvoice {
            invoice: updated,
            notification,
        })
    }

    /// Direct status transition. Every move is allowed except out of PAID.
    #[instrument(skip(self))]
    pub async fn mark_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self
            .store
            .get_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)?;

        if invoice.status().is_terminal() && status != InvoiceStatus::Paid {
            return Err(BillingError::InvoiceLocked);
        }

        self.store.update_invoice_status(invoice_id, status).await?;
        invoice.status = status.as_str().to_string();
        invoice.updated_utc = Utc::now();

        metrics::record_invoice(status.as_str());
        tracing::info!(invoice_id = %invoice_id, status = status.as_str(), "Invoice status updated");

        Ok(invoice)
    }

    async fn deliver(
        &self,
        kind: Delivery,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> NotificationOutcome {
        let result = match kind {
            Delivery::First => self.notifier.send_invoice(to, room, invoice).await,
            Delivery::Corrected => self.notifier.resend_invoice(to, room, invoice).await,
        };
        match result {
            Ok(()) => {
                metrics::record_notification("sent");
                NotificationOutcome::Sent
            }
            Err(NotifyError::NotEnabled(reason)) => {
                debug!(reason = %reason, "Invoice email skipped");
                metrics::record_notification("skipped");
                NotificationOutcome::Skipped
            }
            Err(err) => {
                warn!(error = %err, invoice_id = %invoice.invoice_id, "Invoice email failed");
                metrics::record_notification("failed");
                NotificationOutcome::Failed(err.to_string())
            }
        }
    }
}
