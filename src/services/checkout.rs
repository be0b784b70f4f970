use crate::{
    checkout::fees::resolve_delivery_fee,
    checkout::form::{CheckoutForm, FormError, FormTotals, PaymentOption},
    entities::{cart_item, order, order_item, product, CartItem, Order, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::delivery::DeliveryService,
    services::validation::{self, validate_cart, CartLine, ValidatedCart},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Shipping and payment details accompanying a checkout submission.
/// Delivery decisions arrive structured; nothing is parsed back out of notes.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    /// Claimed payment method label (e.g. "mpesa", "mpesa-partial").
    /// Recorded, not verified.
    pub payment_method: String,
    pub delivery_method: order::DeliveryMethod,
    pub delivery_area_id: Option<Uuid>,
    pub payment_option: PaymentOption,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Result of a checkout attempt. `duplicate` is true when the idempotency
/// key matched an existing order and no new side effects ran.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutOutcome {
    pub order_id: Uuid,
    pub duplicate: bool,
}

/// Server-side recomputation of what the checkout form displays.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub totals: FormTotals,
    pub partial_payment_available: bool,
    pub area_required: bool,
}

/// Orchestrates a checkout attempt: idempotency guard, cart validation, fee
/// resolution, then persistence. Order header, line items and the stock
/// decrements commit in one transaction; only the cart clear stays
/// best-effort afterwards.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    delivery: Arc<DeliveryService>,
    event_sender: Arc<EventSender>,
    partial_payment_categories: Vec<String>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        delivery: Arc<DeliveryService>,
        event_sender: Arc<EventSender>,
        partial_payment_categories: Vec<String>,
    ) -> Self {
        Self {
            db,
            delivery,
            event_sender,
            partial_payment_categories,
        }
    }

    /// Creates an order for the authenticated buyer.
    ///
    /// Sequence: idempotency guard → stock & price validation → shipping
    /// field check → fee resolution → transactional persistence (header,
    /// items, conditional stock decrements) → best-effort cart clear.
    /// Everything before the transaction commits is fully recoverable;
    /// a cart-clear failure after it is logged, never surfaced.
    #[instrument(skip(self, lines, details), fields(buyer_id = %buyer_id))]
    pub async fn create_order(
        &self,
        buyer_id: Uuid,
        lines: &[CartLine],
        details: CheckoutDetails,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let idempotency_key = normalize_key(details.idempotency_key.as_deref());

        // Replays of an already-persisted submission return the original
        // order and skip every later side effect.
        if let Some(key) = idempotency_key.as_deref() {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                self.event_sender
                    .send_or_log(Event::DuplicateCheckoutReplayed { order_id: existing })
                    .await;
                return Ok(CheckoutOutcome {
                    order_id: existing,
                    duplicate: true,
                });
            }
        }

        let validated = validate_cart(&*self.db, lines).await?;

        require_shipping_fields(&details)?;

        // Fee-determining inputs are re-read from the store here; the area
        // fee in particular never comes from the request body. An inactive
        // or unknown area falls back to the generic rider fee.
        let settings = self.delivery.settings().await?;
        let area_fee = match details.delivery_method {
            order::DeliveryMethod::Rider => {
                self.delivery.area_fee(details.delivery_area_id).await?
            }
            _ => None,
        };
        let shipping_fee = resolve_delivery_fee(
            details.delivery_method,
            area_fee,
            validated.subtotal,
            &settings,
        );
        let total = validated.subtotal + shipping_fee;

        // Eligibility is recomputed from authoritative categories; a claimed
        // partial payment on an ineligible cart collects the full amount.
        let partial = details.payment_option == PaymentOption::PayDeliveryFeeOnly
            && validated.contains_category(&self.partial_payment_categories);
        let balance_on_delivery = if partial {
            total - shipping_fee
        } else {
            Decimal::ZERO
        };

        let order_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        let header = order::ActiveModel {
            id: Set(order_id),
            buyer_id: Set(buyer_id),
            status: Set("pending".to_string()),
            subtotal: Set(validated.subtotal),
            shipping_fee: Set(shipping_fee),
            total: Set(total),
            payment_method: Set(details.payment_method.clone()),
            delivery_method: Set(details.delivery_method),
            delivery_area_id: Set(match details.delivery_method {
                order::DeliveryMethod::Rider => details.delivery_area_id,
                _ => None,
            }),
            balance_on_delivery: Set(balance_on_delivery),
            shipping_name: Set(details.shipping_name.trim().to_string()),
            shipping_email: Set(details.shipping_email.trim().to_string()),
            shipping_phone: Set(details.shipping_phone.trim().to_string()),
            shipping_address: Set(details.shipping_address.trim().to_string()),
            shipping_city: Set(details.shipping_city.trim().to_string()),
            notes: Set(details.notes.clone()),
            idempotency_key: Set(idempotency_key.clone()),
            created_at: Set(Utc::now()),
        };

        if let Err(err) = header.insert(&txn).await {
            // A concurrent retry of the same submission may have won the
            // unique-key race between our guard lookup and this insert.
            if let (Some(SqlErr::UniqueConstraintViolation(_)), Some(key)) =
                (err.sql_err(), idempotency_key.as_deref())
            {
                drop(txn);
                if let Some(existing) = self.find_by_idempotency_key(key).await? {
                    self.event_sender
                        .send_or_log(Event::DuplicateCheckoutReplayed { order_id: existing })
                        .await;
                    return Ok(CheckoutOutcome {
                        order_id: existing,
                        duplicate: true,
                    });
                }
                return Err(ServiceError::DatabaseError(err));
            }
            return Err(ServiceError::DatabaseError(err));
        }

        for line in &validated.lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(Some(line.product_id)),
                name: Set(line.name.clone()),
                icon: Set(line.icon.clone()),
                unit_price: Set(line.unit_price),
                quantity: Set(line.quantity),
                created_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;
        }

        self.decrement_stock(&txn, &validated).await?;

        txn.commit().await?;

        for line in &validated.lines {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        self.clear_cart(buyer_id, order_id).await;

        info!(order_id = %order_id, total = %total, "Checkout completed");
        Ok(CheckoutOutcome {
            order_id,
            duplicate: false,
        })
    }

    /// Recomputes the amounts the checkout form displays, entirely from
    /// authoritative data. With `enforce_submission_guard` the missing-area
    /// rule rejects instead of merely flagging.
    #[instrument(skip(self, lines))]
    pub async fn quote(
        &self,
        lines: &[CartLine],
        delivery_method: order::DeliveryMethod,
        delivery_area_id: Option<Uuid>,
        payment_option: PaymentOption,
        enforce_submission_guard: bool,
    ) -> Result<CheckoutQuote, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products = validation::fetch_active_products(&*self.db, ids).await?;

        let mut subtotal = Decimal::ZERO;
        let mut eligible = false;
        for line in lines {
            let product =
                products
                    .get(&line.product_id)
                    .ok_or_else(|| ServiceError::ProductUnavailable {
                        name: line.product_id.to_string(),
                    })?;
            subtotal += product.price * Decimal::from(validation::clamp_quantity(line.quantity));
            eligible = eligible
                || self
                    .partial_payment_categories
                    .iter()
                    .any(|c| product.category.eq_ignore_ascii_case(c));
        }

        let settings = self.delivery.settings().await?;
        let areas = self.delivery.area_options().await?;

        let mut form = CheckoutForm::new(subtotal, settings, areas, eligible);
        form.set_delivery_method(delivery_method);
        form.set_delivery_area(delivery_area_id);
        form.set_payment_option(payment_option);

        let area_required = form.validate_for_submit().is_err();
        if enforce_submission_guard {
            form.validate_for_submit().map_err(ServiceError::from)?;
        }

        Ok(CheckoutQuote {
            subtotal,
            totals: form.totals(),
            partial_payment_available: form.partial_payment_available(),
            area_required,
        })
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Uuid>, ServiceError> {
        let existing = Order::find()
            .filter(order::Column::IdempotencyKey.eq(key))
            .one(&*self.db)
            .await?;
        Ok(existing.map(|o| o.id))
    }

    /// Decrements stock for every purchased line as a conditional single
    /// statement per product: the row is only touched while enough stock
    /// remains, closing the validate-then-write oversell race. Zero rows
    /// affected fails the whole order and rolls the transaction back.
    async fn decrement_stock(
        &self,
        txn: &DatabaseTransaction,
        validated: &ValidatedCart,
    ) -> Result<(), ServiceError> {
        for line in &validated.lines {
            let result = Product::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::Stock.gte(line.quantity))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                let available = Product::find_by_id(line.product_id)
                    .one(txn)
                    .await?
                    .map(|p| p.stock)
                    .unwrap_or(0);
                return Err(ServiceError::InsufficientStock {
                    name: line.name.clone(),
                    available,
                });
            }
        }

        Ok(())
    }

    /// Removes the buyer's cart rows after a committed order. Best-effort:
    /// the order already succeeded from the buyer's point of view, so a
    /// failure here is logged and flagged, never reported as a checkout
    /// failure.
    async fn clear_cart(&self, buyer_id: Uuid, order_id: Uuid) {
        match CartItem::delete_many()
            .filter(cart_item::Column::BuyerId.eq(buyer_id))
            .exec(&*self.db)
            .await
        {
            Ok(result) => {
                self.event_sender
                    .send_or_log(Event::CartCleared {
                        buyer_id,
                        items_removed: result.rows_affected,
                    })
                    .await;
            }
            Err(err) => {
                warn!(
                    buyer_id = %buyer_id,
                    order_id = %order_id,
                    error = %err,
                    "Failed to clear cart after successful order"
                );
                self.event_sender
                    .send_or_log(Event::CartClearFailed { buyer_id, order_id })
                    .await;
            }
        }
    }
}

fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

fn require_shipping_fields(details: &CheckoutDetails) -> Result<(), ServiceError> {
    let mut missing = Vec::new();
    for (value, label) in [
        (&details.shipping_name, "name"),
        (&details.shipping_email, "email"),
        (&details.shipping_phone, "phone"),
        (&details.shipping_address, "address"),
        (&details.shipping_city, "city"),
    ] {
        if value.trim().is_empty() {
            missing.push(label);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::MissingShippingFields(missing.join(", ")))
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::AreaRequired => ServiceError::MissingDeliveryArea,
        }
    }
}
