//! Service line aggregation.

use crate::errors::BillingError;
use crate::models::{PriceType, RoomService, ServiceLine};

use super::costs::round2;

/// Resolve one room service into a billed line.
///
/// Percentage-priced services charge `price`% of the room rent per unit of
/// quantity; fixed and unit-based services charge `price` per unit.
pub fn build_line(rent_price: f64, service: &RoomService) -> Result<ServiceLine, BillingError> {
    if service.quantity < 1 {
        return Err(BillingError::InvalidServiceLine {
            name: service.name.clone(),
            reason: "quantity must be at least 1".to_string(),
        });
    }
    if !service.price.is_finite() || service.price < 0.0 {
        return Err(BillingError::InvalidServiceLine {
            name: service.name.clone(),
            reason: "price must be a finite, non-negative number".to_string(),
        });
    }

    let price_type = service.price_type();
    let quantity = f64::from(service.quantity);
    let line_total = match price_type {
        PriceType::Fixed | PriceType::UnitBased => service.price * quantity,
        PriceType::Percentage => rent_price * service.price / 100.0 * quantity,
    };
    let line_total = round2(line_total);

    if !line_total.is_finite() || line_total < 0.0 {
        return Err(BillingError::InvalidServiceLine {
            name: service.name.clone(),
            reason: "line total is not a valid amount".to_string(),
        });
    }

    Ok(ServiceLine {
        name: service.name.clone(),
        quantity: service.quantity,
        unit_price: service.price,
        line_total,
        price_type,
    })
}

/// Resolve every service attached to a room into lines plus a subtotal.
/// Fails on the first malformed line, naming the offending service; preview
/// callers that want all problems at once use [`build_line`] directly.
pub fn aggregate(
    rent_price: f64,
    services: &[RoomService],
) -> Result<(Vec<ServiceLine>, f64), BillingError> {
    let mut lines = Vec::with_capacity(services.len());
    let mut subtotal = 0.0;
    for service in services {
        let line = build_line(rent_price, service)?;
        subtotal += line.line_total;
        lines.push(line);
    }
    Ok((lines, round2(subtotal)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn service(name: &str, price: f64, quantity: i32, price_type: PriceType) -> RoomService {
        RoomService {
            service_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            quantity,
            price_type: price_type.as_str().to_string(),
            unit: None,
        }
    }

    #[test]
    fn fixed_and_unit_based_lines_multiply_price_by_quantity() {
        let (lines, subtotal) = aggregate(
            200.0,
            &[
                service("wifi", 10.0, 1, PriceType::Fixed),
                service("parking", 5.0, 2, PriceType::UnitBased),
            ],
        )
        .unwrap();
        assert_eq!(lines[0].line_total, 10.0);
        assert_eq!(lines[1].line_total, 10.0);
        assert_eq!(subtotal, 20.0);
    }

    #[test]
    fn percentage_lines_charge_a_share_of_rent() {
        let (lines, subtotal) = aggregate(
            200.0,
            &[service("cleaning", 5.0, 1, PriceType::Percentage)],
        )
        .unwrap();
        assert_eq!(lines[0].line_total, 10.0);
        assert_eq!(subtotal, 10.0);
    }

    #[test]
    fn malformed_lines_name_the_service() {
        let err = aggregate(200.0, &[service("wifi", 10.0, 0, PriceType::Fixed)]).unwrap_err();
        match err {
            BillingError::InvalidServiceLine { name, .. } => assert_eq!(name, "wifi"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = aggregate(200.0, &[service("wifi", f64::NAN, 1, PriceType::Fixed)]).unwrap_err();
        assert!(matches!(err, BillingError::InvalidServiceLine { .. }));
    }

    #[test]
    fn empty_service_list_is_a_zero_subtotal() {
        let (lines, subtotal) = aggregate(200.0, &[]).unwrap();
        assert!(lines.is_empty());
        assert_eq!(subtotal, 0.0);
    }
}
