use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An active occupant of a room, as resolved by the persistence layer.
/// The billing engine only needs a name and a notification address.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TenantContact {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: String,
}
