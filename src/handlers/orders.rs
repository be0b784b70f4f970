use crate::handlers::common::{map_service_error, success_response, PaginationMeta, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::{order, order_item},
    errors::{ApiError, ServiceError},
    AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for buyer order-history endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/items", get(get_order_items))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: String,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub delivery_method: order::DeliveryMethod,
    pub delivery_area_id: Option<Uuid>,
    pub balance_on_delivery: Decimal,
    pub shipping_name: String,
    pub shipping_city: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            subtotal: model.subtotal,
            shipping_fee: model.shipping_fee,
            total: model.total,
            payment_method: model.payment_method,
            delivery_method: model.delivery_method,
            delivery_area_id: model.delivery_area_id,
            balance_on_delivery: model.balance_on_delivery,
            shipping_name: model.shipping_name,
            shipping_city: model.shipping_city,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub icon: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            icon: model.icon,
            unit_price: model.unit_price,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: PaginationMeta,
}

fn require_user(user: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    user.map(|Extension(u)| u)
        .ok_or(ApiError::ServiceError(ServiceError::NotAuthenticated))
}

/// List the authenticated buyer's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Orders for the buyer", body = OrderListResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(user)?;

    let page = pagination.page.max(1);
    let per_page = pagination.per_page.clamp(1, 100);

    let (orders, total) = state
        .services
        .orders
        .list_for_buyer(user.buyer_id, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderListResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
        pagination: PaginationMeta::new(page, per_page, total),
    }))
}

/// Fetch one of the buyer's orders.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = OrderResponse),
        (status = 404, description = "No such order for this buyer"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(user)?;

    let order = state
        .services
        .orders
        .get_for_buyer(user.buyer_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderResponse::from(order)))
}

/// Fetch the line items of one of the buyer's orders.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order line items", body = [OrderItemResponse]),
        (status = 404, description = "No such order for this buyer"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "orders"
)]
pub async fn get_order_items(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(user)?;

    let items = state
        .services
        .orders
        .items_for_buyer(user.buyer_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        items
            .into_iter()
            .map(OrderItemResponse::from)
            .collect::<Vec<_>>(),
    ))
}
