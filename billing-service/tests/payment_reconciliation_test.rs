//! Payment submission, confirmation idempotence, and gateway callbacks.

mod common;

use billing_service::billing::{CreateInvoiceInput, ProofUpload};
use billing_service::errors::BillingError;
use billing_service::models::{InvoiceStatus, PaymentMethod};
use billing_service::services::BillingStore;

use common::TestHarness;

async fn seed_invoice(harness: &TestHarness) -> uuid::Uuid {
    let room_id = harness.seed_scenario_room();
    let created = harness
        .lifecycle
        .create(
            room_id,
            CreateInvoiceInput {
                month: 7,
                year: 2026,
                electric_meter_after: 120.0,
                water_meter_after: 60.0,
                expected_total: None,
            },
        )
        .await
        .unwrap();
    created.invoice.invoice_id
}

fn png_proof() -> ProofUpload {
    ProofUpload {
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
        content_type: "image/png".to_string(),
    }
}

#[tokio::test]
async fn qr_transfer_requires_a_proof_image() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;

    let err = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::QrTransfer, None)
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::ProofRequired));
    assert_eq!(harness.store.payment_count(), 0);
    assert_eq!(harness.proofs.stored(), 0);
}

#[tokio::test]
async fn qr_transfer_stores_the_proof_and_pends() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;

    let payment = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::QrTransfer, Some(png_proof()))
        .await
        .unwrap();

    assert!(!payment.confirmed);
    assert!(payment.proof_image_url.as_deref().unwrap().ends_with(".png"));
    assert_eq!(harness.proofs.stored(), 1);

    // Submission alone never settles the invoice.
    let invoice = harness
        .store
        .get_invoice(invoice_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, "pending");
}

#[tokio::test]
async fn cash_waits_for_owner_confirmation() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;

    let payment = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    assert!(!payment.confirmed);
    assert!(payment.proof_image_url.is_none());

    let unconfirmed = harness.store.list_unconfirmed_payments().await.unwrap();
    assert_eq!(unconfirmed.len(), 1);
}

#[tokio::test]
async fn confirmation_settles_the_invoice() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;
    let payment = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    let confirmed = harness
        .reconciler
        .confirm(payment.payment_id)
        .await
        .unwrap();

    assert!(confirmed.confirmed);
    assert!(confirmed.confirmed_utc.is_some());

    let invoice = harness
        .store
        .get_invoice(invoice_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, "paid");
}

#[tokio::test]
async fn confirmation_is_idempotent() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;
    let payment = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    let first = harness
        .reconciler
        .confirm(payment.payment_id)
        .await
        .unwrap();
    let second = harness
        .reconciler
        .confirm(payment.payment_id)
        .await
        .unwrap();

    assert!(first.confirmed);
    assert!(second.confirmed);
    assert_eq!(first.confirmed_utc, second.confirmed_utc);
    assert_eq!(harness.store.payment_count(), 1);

    let invoice = harness
        .store
        .get_invoice(invoice_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, "paid");
}

#[tokio::test]
async fn direct_gateway_submission_is_rejected() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;

    let err = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::Gateway, None)
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::GatewayCallbackOnly));
}

#[tokio::test]
async fn gateway_callback_settles_immediately() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;

    let payment = harness
        .reconciler
        .gateway_callback(invoice_id)
        .await
        .unwrap();

    assert!(payment.confirmed);
    assert_eq!(payment.method, "gateway");

    let invoice = harness
        .store
        .get_invoice(invoice_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, "paid");

    // A replayed callback is a no-op returning the recorded payment.
    let replay = harness
        .reconciler
        .gateway_callback(invoice_id)
        .await
        .unwrap();
    assert_eq!(replay.payment_id, payment.payment_id);
    assert_eq!(harness.store.payment_count(), 1);
}

#[tokio::test]
async fn settled_invoices_take_no_further_submissions() {
    let harness = TestHarness::build();
    let invoice_id = seed_invoice(&harness).await;
    harness
        .lifecycle
        .mark_status(invoice_id, InvoiceStatus::Paid)
        .await
        .unwrap();

    let err = harness
        .reconciler
        .submit(invoice_id, PaymentMethod::Cash, None)
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::InvoiceLocked));
}

#[tokio::test]
async fn confirming_an_unknown_payment_fails() {
    let harness = TestHarness::build();

    let err = harness
        .reconciler
        .confirm(uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::PaymentNotFound));
}
