pub mod database;
pub mod memory;
pub mod metrics;
pub mod notifier;
pub mod proof;
pub mod store;

pub use database::PgStore;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::{InvoiceNotifier, MockNotifier, NotifyError, SmtpNotifier};
pub use proof::{DiskProofStore, MockProofStore, ProofStore};
pub use store::{BillingStore, ConfirmPayment};
