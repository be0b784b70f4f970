use crate::handlers::common::{map_service_error, success_response};
use crate::{
    checkout::fees::DeliverySettings, checkout::form::AreaOption, errors::ApiError, AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Creates the router for delivery configuration endpoints
pub fn delivery_routes() -> Router<AppState> {
    Router::new().route("/options", get(delivery_options))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryOptionsResponse {
    pub areas: Vec<AreaOption>,
    pub settings: DeliverySettings,
    /// Categories whose presence unlocks the delivery-fee-only option
    pub partial_payment_categories: Vec<String>,
    pub currency: String,
}

/// Everything the checkout form needs to render its delivery step: active
/// areas (zone-grouped), the configured fee amounts and the partial-payment
/// category gate.
#[utoipa::path(
    get,
    path = "/api/v1/delivery/options",
    responses(
        (status = 200, description = "Delivery configuration", body = DeliveryOptionsResponse)
    ),
    tag = "delivery"
)]
pub async fn delivery_options(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let areas = state
        .services
        .delivery
        .area_options()
        .await
        .map_err(map_service_error)?;
    let settings = state
        .services
        .delivery
        .settings()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DeliveryOptionsResponse {
        areas,
        settings,
        partial_payment_categories: state.config.partial_payment_category_set(),
        currency: state.config.currency.clone(),
    }))
}
