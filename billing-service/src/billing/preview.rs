//! Best-effort invoice preview assembly.

use crate::models::{
    InvoicePreview, Room, RoomService, UtilityBreakdown, ValidationIssue,
};

use super::costs::{compute_total, compute_utility_cost, round2, totals_reconcile};
use super::lines::build_line;
use super::meter::{previous_reading, validate_reading};

/// Inputs to a preview: a read-only snapshot of the room, its services, and
/// the owner's proposed readings. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct PreviewInputs<'a> {
    pub room: &'a Room,
    pub services: &'a [RoomService],
    pub active_tenants: i64,
    pub proposed_electric: Option<f64>,
    pub proposed_water: Option<f64>,
    /// A total computed on an independent path (e.g. by the client), cross
    /// checked against the recomputed one. Mismatch is advisory only.
    pub expected_total: Option<f64>,
}

fn utility_breakdown(
    meter: &'static str,
    previous: f64,
    proposed: Option<f64>,
    unit_rate: f64,
    issues: &mut Vec<ValidationIssue>,
) -> UtilityBreakdown {
    let current = proposed.unwrap_or(previous);
    let usage = match proposed {
        Some(new) => match validate_reading(meter, previous, new) {
            Ok(usage) => usage,
            Err(err) => {
                issues.push(ValidationIssue::critical(err.to_string()));
                0.0
            }
        },
        None => 0.0,
    };
    let cost = match compute_utility_cost(usage, unit_rate) {
        Ok(cost) => cost,
        Err(err) => {
            issues.push(ValidationIssue::critical(err.to_string()));
            0.0
        }
    };
    UtilityBreakdown {
        previous,
        current,
        usage,
        unit_rate,
        cost,
    }
}

/// Compute the would-be invoice for a room without persisting anything.
///
/// Validation failures do not abort the computation: each one is collected as
/// a critical or warning issue and the rest of the breakdown is still built,
/// so the owner sees why the invoice cannot be sent without losing the parts
/// that are fine.
pub fn build_preview(inputs: PreviewInputs<'_>) -> InvoicePreview {
    let room = inputs.room;
    let mut issues = Vec::new();

    let electric = utility_breakdown(
        "electric",
        previous_reading(room.electric_meter_now, room.electric_meter_after),
        inputs.proposed_electric,
        room.electric_fee,
        &mut issues,
    );
    let water = utility_breakdown(
        "water",
        previous_reading(room.water_meter_now, room.water_meter_after),
        inputs.proposed_water,
        room.water_fee,
        &mut issues,
    );

    let mut service_lines = Vec::with_capacity(inputs.services.len());
    let mut service_cost = 0.0;
    for service in inputs.services {
        match build_line(room.rent_price, service) {
            Ok(line) => {
                service_cost += line.line_total;
                service_lines.push(line);
            }
            Err(err) => issues.push(ValidationIssue::critical(err.to_string())),
        }
    }
    let service_cost = round2(service_cost);

    let total_amount =
        match compute_total(room.rent_price, electric.cost, water.cost, service_cost) {
            Ok(total) => total,
            Err(err) => {
                issues.push(ValidationIssue::critical(err.to_string()));
                0.0
            }
        };

    if !total_amount.is_finite() || total_amount <= 0.0 {
        issues.push(ValidationIssue::critical(
            "invoice total must be greater than zero",
        ));
    }

    if inputs.active_tenants <= 0 {
        issues.push(ValidationIssue::critical(
            "Room has no active rental contract",
        ));
    }

    if let Some(expected) = inputs.expected_total {
        if !totals_reconcile(expected, total_amount) {
            issues.push(ValidationIssue::warning(format!(
                "provided total {expected:.2} differs from the recomputed total {total_amount:.2}"
            )));
        }
    }

    let can_send = !issues.iter().any(ValidationIssue::is_critical);

    InvoicePreview {
        room_id: room.room_id,
        room_name: room.name.clone(),
        room_price: room.rent_price,
        electric,
        water,
        service_lines,
        service_cost,
        total_amount,
        active_tenants: inputs.active_tenants,
        issues,
        can_send,
    }
}
