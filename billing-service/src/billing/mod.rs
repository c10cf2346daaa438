//! The invoice and billing lifecycle core.
//!
//! `meter`, `costs` and `lines` are pure computation; `preview` assembles them
//! into a best-effort, unpersisted breakdown; `lifecycle` and `reconcile`
//! drive the persisted state machine through the collaborator interfaces.

pub mod costs;
pub mod lifecycle;
pub mod lines;
pub mod meter;
pub mod preview;
pub mod reconcile;

pub use lifecycle::{
    CreateInvoiceInput, CreatedInvoice, EditInvoiceInput, EditedInvoice, InvoiceLifecycle,
    NotificationOutcome,
};
pub use reconcile::{PaymentReconciler, ProofUpload};
