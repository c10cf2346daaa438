//! Room model with cumulative utility meter state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Occupancy state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Empty,
    Occupied,
    Locked,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Empty => "empty",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Locked => "locked",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "occupied" => RoomStatus::Occupied,
            "locked" => RoomStatus::Locked,
            _ => RoomStatus::Empty,
        }
    }
}

/// A rentable room.
///
/// `electric_meter_now` / `water_meter_now` hold the reading that opened the
/// current billing period. The `*_after` fields hold a later reading recorded
/// on the room but not yet billed; they are cleared when an invoice closes the
/// period and the confirmed readings become the new `*_now` values.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub room_id: Uuid,
    pub name: String,
    pub rent_price: f64,
    pub electric_meter_now: f64,
    pub electric_meter_after: Option<f64>,
    pub water_meter_now: f64,
    pub water_meter_after: Option<f64>,
    pub electric_fee: f64,
    pub water_fee: f64,
    pub status: String,
    pub qr_image_url: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl Room {
    pub fn status(&self) -> RoomStatus {
        RoomStatus::from_string(&self.status)
    }

    /// The meter state this room was read at, used as the expected value of
    /// the compare-and-swap that closes a billing period.
    pub fn meter_snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            electric_now: self.electric_meter_now,
            electric_after: self.electric_meter_after,
            water_now: self.water_meter_now,
            water_after: self.water_meter_after,
        }
    }
}

/// Expected meter state for the optimistic-concurrency update of a room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSnapshot {
    pub electric_now: f64,
    pub electric_after: Option<f64>,
    pub water_now: f64,
    pub water_after: Option<f64>,
}
