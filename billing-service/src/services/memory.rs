//! In-memory `BillingStore` for tests and local development.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceStatus, MeterSnapshot, Payment, Room, RoomService, TenantContact,
};

use super::store::{BillingStore, ConfirmPayment};

/// DashMap-backed store. A single write lock serializes the meter
/// compare-and-swap sections and payment confirmation, giving the same
/// atomicity the SQL implementation gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
    rooms: DashMap<Uuid, Room>,
    tenants: DashMap<Uuid, Vec<TenantContact>>,
    room_services: DashMap<Uuid, Vec<RoomService>>,
    invoices: DashMap<Uuid, Invoice>,
    payments: DashMap<Uuid, Payment>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_room(&self, room: Room) {
        self.rooms.insert(room.room_id, room);
    }

    pub fn add_tenant(&self, room_id: Uuid, contact: TenantContact) {
        self.tenants.entry(room_id).or_default().push(contact);
    }

    pub fn add_service(&self, service: RoomService) {
        self.room_services
            .entry(service.room_id)
            .or_default()
            .push(service);
    }

    /// Current room state, for assertions in tests.
    pub fn room(&self, room_id: Uuid) -> Option<Room> {
        self.rooms.get(&room_id).map(|r| r.value().clone())
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }

    fn meters_match(room: &Room, expected: &MeterSnapshot) -> bool {
        room.electric_meter_now == expected.electric_now
            && room.electric_meter_after == expected.electric_after
            && room.water_meter_now == expected.water_now
            && room.water_meter_after == expected.water_after
    }

    fn apply_advance(room: &mut Room, new_electric: f64, new_water: f64) {
        room.electric_meter_now = new_electric;
        room.electric_meter_after = None;
        room.water_meter_now = new_water;
        room.water_meter_after = None;
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>> {
        Ok(self.rooms.get(&room_id).map(|r| r.value().clone()))
    }

    async fn list_room_services(&self, room_id: Uuid) -> Result<Vec<RoomService>> {
        Ok(self
            .room_services
            .get(&room_id)
            .map(|s| s.value().clone())
            .unwrap_or_default())
    }

    async fn active_tenant_contacts(&self, room_id: Uuid) -> Result<Vec<TenantContact>> {
        Ok(self
            .tenants
            .get(&room_id)
            .map(|t| t.value().clone())
            .unwrap_or_default())
    }

    async fn record_invoice(&self, invoice: &Invoice, expected: &MeterSnapshot) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let swapped = match self.rooms.get_mut(&invoice.room_id) {
            Some(mut room) => {
                if Self::meters_match(&room, expected) {
                    Self::apply_advance(&mut room, invoice.electric_current, invoice.water_current);
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if !swapped {
            return Ok(false);
        }

        self.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(true)
    }

    async fn advance_meters(
        &self,
        room_id: Uuid,
        expected: &MeterSnapshot,
        new_electric: f64,
        new_water: f64,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        match self.rooms.get_mut(&room_id) {
            Some(mut room) if Self::meters_match(&room, expected) => {
                Self::apply_advance(&mut room, new_electric, new_water);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>> {
        Ok(self.invoices.get(&invoice_id).map(|i| i.value().clone()))
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<()> {
        anyhow::ensure!(
            self.invoices.contains_key(&invoice.invoice_id),
            "invoice {} does not exist",
            invoice.invoice_id
        );
        self.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(())
    }

    async fn update_invoice_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()> {
        let mut invoice = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| anyhow::anyhow!("invoice {} does not exist", invoice_id))?;
        invoice.status = status.as_str().to_string();
        invoice.updated_utc = Utc::now();
        Ok(())
    }

    async fn list_room_invoices(&self, room_id: Uuid) -> Result<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|entry| entry.value().room_id == room_id)
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(invoices)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        self.payments.insert(payment.payment_id, payment.clone());
        Ok(())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.get(&payment_id).map(|p| p.value().clone()))
    }

    async fn list_invoice_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|entry| entry.value().invoice_id == invoice_id)
            .map(|entry| entry.value().clone())
            .collect();
        payments.sort_by(|a, b| a.created_utc.cmp(&b.created_utc));
        Ok(payments)
    }

    async fn list_unconfirmed_payments(&self) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|entry| !entry.value().confirmed)
            .map(|entry| entry.value().clone())
            .collect();
        payments.sort_by(|a, b| a.created_utc.cmp(&b.created_utc));
        Ok(payments)
    }

    async fn confirm_payment(&self, payment_id: Uuid) -> Result<ConfirmPayment> {
        let _guard = self.write_lock.lock().await;

        match self.payments.get_mut(&payment_id) {
            None => Ok(ConfirmPayment::NotFound),
            Some(mut payment) => {
                if payment.confirmed {
                    Ok(ConfirmPayment::AlreadyConfirmed(payment.clone()))
                } else {
                    payment.confirmed = true;
                    payment.confirmed_utc = Some(Utc::now());
                    Ok(ConfirmPayment::NewlyConfirmed(payment.clone()))
                }
            }
        }
    }
}
