//! Test helpers: an engine built on the in-memory store and mock
//! collaborators, plus room seeding shortcuts.

#![allow(dead_code)]

use std::sync::Arc;

use billing_service::billing::{InvoiceLifecycle, PaymentReconciler};
use billing_service::models::{PriceType, Room, RoomService, RoomStatus, TenantContact};
use billing_service::services::{MemoryStore, MockNotifier, MockProofStore};
use billing_service::AppState;
use chrono::Utc;
use uuid::Uuid;

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MockNotifier>,
    pub proofs: Arc<MockProofStore>,
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub reconciler: Arc<PaymentReconciler>,
}

impl TestHarness {
    pub fn build() -> Self {
        Self::with_notifier(MockNotifier::new(true))
    }

    pub fn with_notifier(notifier: MockNotifier) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(notifier);
        let proofs = Arc::new(MockProofStore::new());
        let lifecycle = Arc::new(InvoiceLifecycle::new(store.clone(), notifier.clone()));
        let reconciler = Arc::new(PaymentReconciler::new(
            store.clone(),
            proofs.clone(),
            lifecycle.clone(),
        ));
        Self {
            store,
            notifier,
            proofs,
            lifecycle,
            reconciler,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            store: self.store.clone(),
            lifecycle: self.lifecycle.clone(),
            reconciler: self.reconciler.clone(),
        }
    }

    /// Seed the reference room: rent 200, electricity at 100 (fee 2/unit),
    /// water at 50 (fee 3/unit), one active tenant, no services.
    pub fn seed_scenario_room(&self) -> Uuid {
        let room = make_room(200.0, 100.0, 2.0, 50.0, 3.0);
        let room_id = room.room_id;
        self.store.insert_room(room);
        self.store.add_tenant(room_id, make_contact("An Nguyen"));
        room_id
    }
}

pub fn make_room(
    rent_price: f64,
    electric_now: f64,
    electric_fee: f64,
    water_now: f64,
    water_fee: f64,
) -> Room {
    Room {
        room_id: Uuid::new_v4(),
        name: "A-101".to_string(),
        rent_price,
        electric_meter_now: electric_now,
        electric_meter_after: None,
        water_meter_now: water_now,
        water_meter_after: None,
        electric_fee,
        water_fee,
        status: RoomStatus::Occupied.as_str().to_string(),
        qr_image_url: None,
        created_utc: Utc::now(),
    }
}

pub fn make_contact(name: &str) -> TenantContact {
    TenantContact {
        tenant_id: Uuid::new_v4(),
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
    }
}

pub fn make_service(
    room_id: Uuid,
    name: &str,
    price: f64,
    quantity: i32,
    price_type: PriceType,
) -> RoomService {
    RoomService {
        service_id: Uuid::new_v4(),
        room_id,
        name: name.to_string(),
        price,
        quantity,
        price_type: price_type.as_str().to_string(),
        unit: None,
    }
}
