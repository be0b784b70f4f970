use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    checkout::form::PaymentOption,
    entities::order::DeliveryMethod,
    errors::{ApiError, ServiceError},
    services::{CartLine, CheckoutDetails},
    AppState,
};
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One cart line as submitted by the storefront. The unit price is the one
/// the buyer saw; the server re-validates it against the product record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl From<&CartLineRequest> for CartLine {
    fn from(req: &CartLineRequest) -> Self {
        CartLine {
            product_id: req.product_id,
            quantity: req.quantity,
            unit_price: req.unit_price,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CartLineRequest>,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    /// Claimed payment method label, e.g. "mpesa" or "mpesa-partial"
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub delivery_method: DeliveryMethod,
    pub delivery_area_id: Option<Uuid>,
    #[serde(default = "default_payment_option")]
    pub payment_option: PaymentOption,
    pub notes: Option<String>,
    /// Client-generated unique token identifying this logical submission
    pub idempotency_key: Option<String>,
}

fn default_payment_option() -> PaymentOption {
    PaymentOption::PayFull
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub duplicate: bool,
}

/// Create an order from the submitted cart and checkout details.
///
/// Replays of the same idempotency key return the original order with
/// `duplicate: true` and a 200 instead of a 201.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 200, description = "Duplicate submission collapsed onto the existing order", body = CreateOrderResponse),
        (status = 400, description = "Empty cart or missing shipping fields", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock or price validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "checkout"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Extension(user)) = user else {
        return Err(map_service_error(ServiceError::NotAuthenticated));
    };

    validate_input(&payload)?;

    let lines: Vec<CartLine> = payload.items.iter().map(CartLine::from).collect();
    let details = CheckoutDetails {
        shipping_name: payload.shipping_name,
        shipping_email: payload.shipping_email,
        shipping_phone: payload.shipping_phone,
        shipping_address: payload.shipping_address,
        shipping_city: payload.shipping_city,
        payment_method: payload.payment_method,
        delivery_method: payload.delivery_method,
        delivery_area_id: payload.delivery_area_id,
        payment_option: payload.payment_option,
        notes: payload.notes,
        idempotency_key: payload.idempotency_key,
    };

    let outcome = state
        .services
        .checkout
        .create_order(user.buyer_id, &lines, details)
        .await
        .map_err(map_service_error)?;

    let status = if outcome.duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(CreateOrderResponse {
            order_id: outcome.order_id,
            duplicate: outcome.duplicate,
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<CartLineRequest>,
    pub delivery_method: DeliveryMethod,
    pub delivery_area_id: Option<Uuid>,
    #[serde(default = "default_payment_option")]
    pub payment_option: PaymentOption,
    /// When true, a missing-but-required delivery area rejects with the
    /// submission-guard message instead of just flagging `area_required`.
    #[serde(default)]
    pub enforce_submission_guard: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub amount_due_now: Decimal,
    pub balance_on_delivery: Decimal,
    pub partial_payment_available: bool,
    pub area_required: bool,
}

/// Recompute the checkout form's derived amounts server-side.
///
/// Prices, area fees and settings are all re-read from the store so the
/// displayed amounts can never drift from what order creation will charge.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = QuoteResponse),
        (status = 400, description = "Empty cart or missing required delivery area", body = crate::errors::ErrorResponse),
        (status = 422, description = "A product is no longer available", body = crate::errors::ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lines: Vec<CartLine> = payload.items.iter().map(CartLine::from).collect();

    let quote = state
        .services
        .checkout
        .quote(
            &lines,
            payload.delivery_method,
            payload.delivery_area_id,
            payload.payment_option,
            payload.enforce_submission_guard,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(QuoteResponse {
        subtotal: quote.subtotal,
        delivery_fee: quote.totals.delivery_fee,
        total: quote.totals.total,
        amount_due_now: quote.totals.amount_due_now,
        balance_on_delivery: quote.totals.balance_on_delivery,
        partial_payment_available: quote.partial_payment_available,
        area_required: quote.area_required,
    }))
}
