//! Invoice notification collaborator: SMTP delivery plus a mock for tests.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::models::{Invoice, Room, TenantContact};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifications not enabled: {0}")]
    NotEnabled(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Notification collaborator. Delivery failure never rolls back the invoice;
/// callers report it as a partial-success outcome instead.
#[async_trait]
pub trait InvoiceNotifier: Send + Sync {
    async fn send_invoice(
        &self,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError>;

    /// Re-delivery after an invoice edit changed the figures materially.
    async fn resend_invoice(
        &self,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError>;
}

fn invoice_text_body(room: &Room, invoice: &Invoice, payment_base_url: &str) -> String {
    let mut body = format!(
        "Invoice for room {} - {:02}/{}\n\n\
         Rent: {:.2}\n\
         Electricity: {:.2} -> {:.2} ({:.2} used) = {:.2}\n\
         Water: {:.2} -> {:.2} ({:.2} used) = {:.2}\n\
         Services: {:.2}\n\
         Total due: {:.2}\n\n\
         Payment options:\n",
        room.name,
        invoice.month,
        invoice.year,
        invoice.room_price,
        invoice.electric_previous,
        invoice.electric_current,
        invoice.electric_current - invoice.electric_previous,
        invoice.electric_cost,
        invoice.water_previous,
        invoice.water_current,
        invoice.water_current - invoice.water_previous,
        invoice.water_cost,
        invoice.service_cost,
        invoice.total_amount,
    );
    match &room.qr_image_url {
        Some(url) => body.push_str(&format!("  1. Bank transfer (scan the QR): {}\n", url)),
        None => body.push_str("  1. Bank transfer (ask the owner for account details)\n"),
    }
    body.push_str(&format!(
        "  2. Pay online: {}/invoices/{}/pay\n",
        payment_base_url, invoice.invoice_id
    ));
    body.push_str("  3. Cash, handed to the owner\n");
    body
}

fn invoice_html_body(room: &Room, invoice: &Invoice, payment_base_url: &str) -> String {
    format!(
        "<h2>Invoice for room {} &mdash; {:02}/{}</h2>\
         <table>\
         <tr><td>Rent</td><td>{:.2}</td></tr>\
         <tr><td>Electricity ({:.2} &rarr; {:.2})</td><td>{:.2}</td></tr>\
         <tr><td>Water ({:.2} &rarr; {:.2})</td><td>{:.2}</td></tr>\
         <tr><td>Services</td><td>{:.2}</td></tr>\
         <tr><td><b>Total due</b></td><td><b>{:.2}</b></td></tr>\
         </table>\
         <p>Pay by bank transfer{}, <a href=\"{}/invoices/{}/pay\">online</a>, or in cash.</p>",
        room.name,
        invoice.month,
        invoice.year,
        invoice.room_price,
        invoice.electric_previous,
        invoice.electric_current,
        invoice.electric_cost,
        invoice.water_previous,
        invoice.water_current,
        invoice.water_cost,
        invoice.service_cost,
        invoice.total_amount,
        room.qr_image_url
            .as_deref()
            .map(|url| format!(" (<a href=\"{}\">QR</a>)", url))
            .unwrap_or_default(),
        payment_base_url,
        invoice.invoice_id,
    )
}

pub struct SmtpNotifier {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, NotifyError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                NotifyError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    async fn deliver(
        &self,
        subject: String,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError> {
        if !self.config.enabled {
            return Err(NotifyError::NotEnabled(
                "SMTP notifier is not enabled".to_string(),
            ));
        }

        let transport = self.transport.as_ref().ok_or_else(|| {
            NotifyError::Configuration("SMTP transport not initialized".to_string())
        })?;

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| {
                    NotifyError::Configuration(format!("Invalid from address: {}", e))
                })?;

        let to_mailbox: Mailbox = format!("{} <{}>", to.full_name, to.email)
            .parse()
            .map_err(|e| NotifyError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(invoice_text_body(
                                room,
                                invoice,
                                &self.config.payment_base_url,
                            )),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(invoice_html_body(
                                room,
                                invoice,
                                &self.config.payment_base_url,
                            )),
                    ),
            )
            .map_err(|e| NotifyError::SendFailed(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| NotifyError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            to = %to.email,
            invoice_id = %invoice.invoice_id,
            subject = %subject,
            "Invoice email sent"
        );

        Ok(())
    }
}

#[async_trait]
impl InvoiceNotifier for SmtpNotifier {
    async fn send_invoice(
        &self,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError> {
        let subject = format!(
            "Invoice {:02}/{} for room {}",
            invoice.month, invoice.year, room.name
        );
        self.deliver(subject, to, room, invoice).await
    }

    async fn resend_invoice(
        &self,
        to: &TenantContact,
        room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError> {
        let subject = format!(
            "Updated invoice {:02}/{} for room {}",
            invoice.month, invoice.year, room.name
        );
        self.deliver(subject, to, room, invoice).await
    }
}

/// Mock notifier for tests: counts deliveries instead of performing them.
pub struct MockNotifier {
    enabled: bool,
    sent: AtomicU64,
    resent: AtomicU64,
}

impl MockNotifier {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sent: AtomicU64::new(0),
            resent: AtomicU64::new(0),
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn resent(&self) -> u64 {
        self.resent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceNotifier for MockNotifier {
    async fn send_invoice(
        &self,
        to: &TenantContact,
        _room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::NotEnabled(
                "Mock notifier is not enabled".to_string(),
            ));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        tracing::info!(to = %to.email, invoice_id = %invoice.invoice_id, "[MOCK] invoice email would be sent");
        Ok(())
    }

    async fn resend_invoice(
        &self,
        to: &TenantContact,
        _room: &Room,
        invoice: &Invoice,
    ) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::NotEnabled(
                "Mock notifier is not enabled".to_string(),
            ));
        }
        self.resent.fetch_add(1, Ordering::SeqCst);
        tracing::info!(to = %to.email, invoice_id = %invoice.invoice_id, "[MOCK] invoice email would be resent");
        Ok(())
    }
}
