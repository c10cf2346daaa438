pub mod invoice;
pub mod payment;
pub mod preview;
pub mod room;
pub mod service;
pub mod tenant;

pub use invoice::{Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentMethod};
pub use preview::{InvoicePreview, IssueSeverity, UtilityBreakdown, ValidationIssue};
pub use room::{MeterSnapshot, Room, RoomStatus};
pub use service::{PriceType, RoomService, ServiceLine};
pub use tenant::TenantContact;
