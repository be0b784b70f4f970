use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::fees::{resolve_delivery_fee, DeliverySettings};
use crate::entities::order::DeliveryMethod;

/// A selectable rider-delivery area as the form presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AreaOption {
    pub id: Uuid,
    pub zone: String,
    pub name: String,
    pub fee: Decimal,
}

/// How much the buyer pays now. Delivery-fee-only is offered only when the
/// cart contains at least one item from an eligible category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    PayFull,
    PayDeliveryFeeOnly,
}

/// Amounts the form must keep in sync with every input change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormTotals {
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub amount_due_now: Decimal,
    pub balance_on_delivery: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please choose a delivery area before placing your order")]
    AreaRequired,
}

/// The buyer's checkout decision tree: delivery method, delivery area (rider
/// only), payment option, and the derived amounts. Selections are not a
/// linear sequence; any input may change at any time and the derived totals
/// follow.
///
/// One idempotency key is minted per form; a failed submission discards it
/// (nothing was persisted for it) and mints a fresh one before the retry.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    subtotal: Decimal,
    settings: DeliverySettings,
    areas: Vec<AreaOption>,
    partial_payment_eligible: bool,
    delivery_method: DeliveryMethod,
    delivery_area_id: Option<Uuid>,
    payment_option: PaymentOption,
    idempotency_key: String,
}

impl CheckoutForm {
    pub fn new(
        subtotal: Decimal,
        settings: DeliverySettings,
        areas: Vec<AreaOption>,
        partial_payment_eligible: bool,
    ) -> Self {
        Self {
            subtotal,
            settings,
            areas,
            partial_payment_eligible,
            delivery_method: DeliveryMethod::Rider,
            delivery_area_id: None,
            payment_option: PaymentOption::PayFull,
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    pub fn delivery_method(&self) -> DeliveryMethod {
        self.delivery_method
    }

    pub fn delivery_area_id(&self) -> Option<Uuid> {
        self.delivery_area_id
    }

    pub fn payment_option(&self) -> PaymentOption {
        self.payment_option
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    /// Whether the delivery-fee-only option may be offered at all.
    pub fn partial_payment_available(&self) -> bool {
        self.partial_payment_eligible
    }

    /// Selects the delivery method. Moving away from rider delivery clears
    /// any chosen area; a stale area must never price a pickup order.
    pub fn set_delivery_method(&mut self, method: DeliveryMethod) {
        self.delivery_method = method;
        if method != DeliveryMethod::Rider {
            self.delivery_area_id = None;
        }
    }

    /// Selects (or clears) the delivery area. Only meaningful under rider
    /// delivery; unknown ids are kept out.
    pub fn set_delivery_area(&mut self, area_id: Option<Uuid>) {
        self.delivery_area_id =
            area_id.filter(|id| self.areas.iter().any(|a| a.id == *id));
    }

    pub fn set_payment_option(&mut self, option: PaymentOption) {
        self.payment_option = option;
    }

    fn selected_area_fee(&self) -> Option<Decimal> {
        self.delivery_area_id
            .and_then(|id| self.areas.iter().find(|a| a.id == id))
            .map(|a| a.fee)
    }

    /// Recomputes every derived amount from the current selections.
    pub fn totals(&self) -> FormTotals {
        let delivery_fee = resolve_delivery_fee(
            self.delivery_method,
            self.selected_area_fee(),
            self.subtotal,
            &self.settings,
        );
        let total = self.subtotal + delivery_fee;

        // The eligibility gate wins over the stored option: an ineligible
        // cart always pays in full, whatever the option field says.
        let amount_due_now = if self.partial_payment_eligible
            && self.payment_option == PaymentOption::PayDeliveryFeeOnly
        {
            delivery_fee
        } else {
            total
        };

        FormTotals {
            delivery_fee,
            total,
            amount_due_now,
            balance_on_delivery: total - amount_due_now,
        }
    }

    /// Submission guard: rider delivery with a configured area list requires
    /// a chosen area. The fee resolver would fall back to the generic fee,
    /// but a submission must not reach it through this path.
    pub fn validate_for_submit(&self) -> Result<(), FormError> {
        if self.delivery_method == DeliveryMethod::Rider
            && !self.areas.is_empty()
            && self.delivery_area_id.is_none()
        {
            return Err(FormError::AreaRequired);
        }
        Ok(())
    }

    /// Called after a failed submission: nothing was persisted under the old
    /// key, so a fresh one keeps the retry from being mistaken for a replay.
    pub fn reset_idempotency_key(&mut self) -> &str {
        self.idempotency_key = Uuid::new_v4().to_string();
        &self.idempotency_key
    }
}
