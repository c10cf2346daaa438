//! Persistence collaborator interface for the billing engine.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceStatus, MeterSnapshot, Payment, Room, RoomService, TenantContact,
};

/// Outcome of a payment confirmation attempt. `AlreadyConfirmed` is the
/// idempotence point: a second confirmation observes it and changes nothing.
#[derive(Debug, Clone)]
pub enum ConfirmPayment {
    NewlyConfirmed(Payment),
    AlreadyConfirmed(Payment),
    NotFound,
}

/// Storage operations the billing engine needs.
///
/// Meter advancement is optimistic-concurrency: callers pass the
/// [`MeterSnapshot`] they computed from, and the store applies the update only
/// if the room still holds exactly that state. `record_invoice` couples the
/// swap with the invoice insert in one atomic step so a lost race can neither
/// half-advance the meters nor orphan an invoice row.
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>>;

    async fn list_room_services(&self, room_id: Uuid) -> Result<Vec<RoomService>>;

    async fn active_tenant_contacts(&self, room_id: Uuid) -> Result<Vec<TenantContact>>;

    /// Atomically advance the room's meters from `expected` to the invoice's
    /// confirmed readings and insert the invoice. Returns `false` when the
    /// room's meter state no longer matches `expected`.
    async fn record_invoice(&self, invoice: &Invoice, expected: &MeterSnapshot) -> Result<bool>;

    /// Compare-and-swap the room's meter fields without touching invoices.
    /// Used to re-sync the room after an invoice edit; returns `false` when
    /// the room has moved on.
    async fn advance_meters(
        &self,
        room_id: Uuid,
        expected: &MeterSnapshot,
        new_electric: f64,
        new_water: f64,
    ) -> Result<bool>;

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>>;

    async fn update_invoice(&self, invoice: &Invoice) -> Result<()>;

    async fn update_invoice_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()>;

    async fn list_room_invoices(&self, room_id: Uuid) -> Result<Vec<Invoice>>;

    async fn insert_payment(&self, payment: &Payment) -> Result<()>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>>;

    async fn list_invoice_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>>;

    async fn list_unconfirmed_payments(&self) -> Result<Vec<Payment>>;

    /// Flip a payment to confirmed exactly once.
    async fn confirm_payment(&self, payment_id: Uuid) -> Result<ConfirmPayment>;
}
