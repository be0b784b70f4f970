use crate::{
    entities::{product, Product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-line quantity bounds; out-of-range requests are clamped, not rejected.
pub const MIN_LINE_QUANTITY: i32 = 1;
pub const MAX_LINE_QUANTITY: i32 = 20;

/// A client-supplied cart line: product reference, requested quantity and the
/// unit price the buyer saw when the item went into the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A cart line after validation, carrying the authoritative product snapshot.
#[derive(Debug, Clone)]
pub struct ValidatedLine {
    pub product_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Outcome of a successful validation pass: authoritative per-line prices and
/// the subtotal computed from them.
#[derive(Debug, Clone)]
pub struct ValidatedCart {
    pub lines: Vec<ValidatedLine>,
    pub subtotal: Decimal,
}

impl ValidatedCart {
    /// True when any line's category is in `categories` (lowercased set).
    pub fn contains_category(&self, categories: &[String]) -> bool {
        self.lines
            .iter()
            .any(|l| categories.iter().any(|c| l.category.eq_ignore_ascii_case(c)))
    }
}

pub(crate) fn clamp_quantity(quantity: i32) -> i32 {
    quantity.clamp(MIN_LINE_QUANTITY, MAX_LINE_QUANTITY)
}

/// Fetches the active product records for exactly the referenced ids.
pub(crate) async fn fetch_active_products<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
    let products = Product::find()
        .filter(product::Column::Id.is_in(ids))
        .filter(product::Column::Active.eq(true))
        .all(conn)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Validates a cart against the authoritative product records.
///
/// Read-only: fails fast on the first offending line (in input order) with a
/// user-actionable error, or returns the validated lines and subtotal. Any
/// price drift, in either direction, is a hard stop — the buyer re-confirms
/// rather than being silently repriced.
///
/// The stock check here does not reserve anything; the later conditional
/// decrement re-checks stock at write time.
pub async fn validate_cart<C: ConnectionTrait>(
    conn: &C,
    lines: &[CartLine],
) -> Result<ValidatedCart, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::EmptyCart);
    }

    let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products = fetch_active_products(conn, ids).await?;

    let mut validated = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            // Covers deletion and deactivation races; the id is all we have
            // left to name the product by.
            ServiceError::ProductUnavailable {
                name: line.product_id.to_string(),
            }
        })?;

        let quantity = clamp_quantity(line.quantity);

        if quantity > product.stock {
            return Err(ServiceError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
            });
        }

        if product.price != line.unit_price {
            return Err(ServiceError::PriceChanged {
                name: product.name.clone(),
            });
        }

        subtotal += product.price * Decimal::from(quantity);
        validated.push(ValidatedLine {
            product_id: product.id,
            name: product.name.clone(),
            icon: product.icon.clone(),
            category: product.category.clone(),
            unit_price: product.price,
            quantity,
        });
    }

    Ok(ValidatedCart {
        lines: validated,
        subtotal,
    })
}
