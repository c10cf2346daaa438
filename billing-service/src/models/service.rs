//! Room service add-ons (parking, wifi, cleaning, ...) and their billed lines.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a room service is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Fixed,
    UnitBased,
    Percentage,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Fixed => "fixed",
            PriceType::UnitBased => "unit_based",
            PriceType::Percentage => "percentage",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "unit_based" => PriceType::UnitBased,
            "percentage" => PriceType::Percentage,
            _ => PriceType::Fixed,
        }
    }
}

/// A billable add-on attached to a room. The price may be overridden from the
/// catalog default, so this row is the authoritative snapshot at billing time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomService {
    pub service_id: Uuid,
    pub room_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub price_type: String,
    pub unit: Option<String>,
}

impl RoomService {
    pub fn price_type(&self) -> PriceType {
        PriceType::from_string(&self.price_type)
    }
}

/// One resolved line of an invoice's service breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
    pub price_type: PriceType,
}
