//! Payment submission and confirmation against an invoice.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::BillingError;
use crate::models::{InvoiceStatus, Payment, PaymentMethod};
use crate::services::{metrics, BillingStore, ConfirmPayment, ProofStore};

use super::lifecycle::InvoiceLifecycle;

/// Raw proof-of-transfer bytes, already size/type checked by the HTTP layer.
pub struct ProofUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct PaymentReconciler {
    store: Arc<dyn BillingStore>,
    proofs: Arc<dyn ProofStore>,
    lifecycle: Arc<InvoiceLifecycle>,
}

impl PaymentReconciler {
    pub fn new(
        store: Arc<dyn BillingStore>,
        proofs: Arc<dyn ProofStore>,
        lifecycle: Arc<InvoiceLifecycle>,
    ) -> Self {
        Self {
            store,
            proofs,
            lifecycle,
        }
    }

    /// Record a tenant's payment submission.
    ///
    /// QR transfers must carry a proof image, which is stored before the
    /// payment row is written. Cash submissions wait for the owner's manual
    /// confirmation. Gateway payments never enter here; the provider callback
    /// records them.
    #[instrument(skip(self, proof), fields(invoice_id = %invoice_id, method = method.as_str()))]
    pub async fn submit(
        &self,
        invoice_id: Uuid,
        method: PaymentMethod,
        proof: Option<ProofUpload>,
    ) -> Result<Payment, BillingError> {
        let invoice = self
            .store
            .get_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)?;
        if invoice.status().is_terminal() {
            return Err(BillingError::InvoiceLocked);
        }

        let proof_image_url = match method {
            PaymentMethod::Gateway => return Err(BillingError::GatewayCallbackOnly),
            PaymentMethod::QrTransfer => {
                let upload = proof.ok_or(BillingError::ProofRequired)?;
                let url = self
                    .proofs
                    .store(invoice_id, &upload.bytes, &upload.content_type)
                    .await
                    .map_err(BillingError::Storage)?;
                Some(url)
            }
            PaymentMethod::Cash => None,
        };

        let payment = Payment {
            payment_id: Uuid::new_v4(),
            invoice_id,
            method: method.as_str().to_string(),
            proof_image_url,
            confirmed: false,
            created_utc: Utc::now(),
            confirmed_utc: None,
        };
        self.store.insert_payment(&payment).await?;

        metrics::record_payment(method.as_str());
        tracing::info!(payment_id = %payment.payment_id, "Payment submitted, awaiting confirmation");

        Ok(payment)
    }

    /// Record a successful charge reported by the external payment gateway.
    /// The payment arrives pre-confirmed and settles the invoice immediately.
    /// A replayed callback for an already-settled invoice is a no-op.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn gateway_callback(&self, invoice_id: Uuid) -> Result<Payment, BillingError> {
        let invoice = self
            .store
            .get_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)?;

        if invoice.status().is_terminal() {
            let payments = self.store.list_invoice_payments(invoice_id).await?;
            let existing = payments
                .iter()
                .find(|p| p.confirmed && p.method() == PaymentMethod::Gateway)
                .or_else(|| payments.iter().find(|p| p.confirmed));
            if let Some(payment) = existing {
                return Ok(payment.clone());
            }
        }

        let now = Utc::now();
        let payment = Payment {
            payment_id: Uuid::new_v4(),
            invoice_id,
            method: PaymentMethod::Gateway.as_str().to_string(),
            proof_image_url: None,
            confirmed: true,
            created_utc: now,
            confirmed_utc: Some(now),
        };
        self.store.insert_payment(&payment).await?;
        self.lifecycle
            .mark_status(invoice_id, InvoiceStatus::Paid)
            .await?;

        metrics::record_payment(PaymentMethod::Gateway.as_str());
        tracing::info!(payment_id = %payment.payment_id, "Gateway payment recorded, invoice settled");

        Ok(payment)
    }

    /// Owner-side confirmation of a pending payment. Idempotent: confirming
    /// an already-confirmed payment succeeds without re-mutating the invoice
    /// or counting anything twice.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn confirm(&self, payment_id: Uuid) -> Result<Payment, BillingError> {
        match self.store.confirm_payment(payment_id).await? {
            ConfirmPayment::NewlyConfirmed(payment) => {
                self.lifecycle
                    .mark_status(payment.invoice_id, InvoiceStatus::Paid)
                    .await?;
                metrics::record_payment("confirmed");
                tracing::info!(invoice_id = %payment.invoice_id, "Payment confirmed, invoice settled");
                Ok(payment)
            }
            ConfirmPayment::AlreadyConfirmed(payment) => {
                tracing::debug!(invoice_id = %payment.invoice_id, "Payment already confirmed");
                Ok(payment)
            }
            ConfirmPayment::NotFound => Err(BillingError::PaymentNotFound),
        }
    }
}
