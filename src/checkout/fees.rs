use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::order::DeliveryMethod;

/// The four independently configurable delivery amounts. Loaded from the
/// settings table by `services::delivery`; defaults apply for unset keys.
/// A zero `free_delivery_threshold` disables the threshold entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeliverySettings {
    pub rider_fee: Decimal,
    pub pickup_fee: Decimal,
    pub self_pickup_fee: Decimal,
    pub free_delivery_threshold: Decimal,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            rider_fee: dec!(200),
            pickup_fee: dec!(300),
            self_pickup_fee: Decimal::ZERO,
            free_delivery_threshold: Decimal::ZERO,
        }
    }
}

/// Resolves the delivery fee for a checkout selection. First match wins:
///
/// 1. Pickup-point and self-pickup use their flat fees; the free-delivery
///    threshold never applies to them.
/// 2. Rider delivery is free once the subtotal reaches a non-zero threshold,
///    regardless of area.
/// 3. Otherwise an authoritative area fee applies when one was looked up.
/// 4. Otherwise the generic rider flat fee (area not yet chosen, or the area
///    lookup came back empty).
///
/// `area_fee` must come from the delivery-area table, never from the request
/// body. The result is never negative.
pub fn resolve_delivery_fee(
    method: DeliveryMethod,
    area_fee: Option<Decimal>,
    subtotal: Decimal,
    settings: &DeliverySettings,
) -> Decimal {
    let fee = match method {
        DeliveryMethod::PickupPoint => settings.pickup_fee,
        DeliveryMethod::SelfPickup => settings.self_pickup_fee,
        DeliveryMethod::Rider => {
            if settings.free_delivery_threshold > Decimal::ZERO
                && subtotal >= settings.free_delivery_threshold
            {
                Decimal::ZERO
            } else if let Some(fee) = area_fee {
                fee
            } else {
                settings.rider_fee
            }
        }
    };

    fee.max(Decimal::ZERO)
}
