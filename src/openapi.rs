use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the storefront checkout API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::checkout::create_order,
        crate::handlers::checkout::quote,
        crate::handlers::delivery::delivery_options,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_items,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::checkout::CartLineRequest,
        crate::handlers::checkout::CreateOrderRequest,
        crate::handlers::checkout::CreateOrderResponse,
        crate::handlers::checkout::QuoteRequest,
        crate::handlers::checkout::QuoteResponse,
        crate::handlers::delivery::DeliveryOptionsResponse,
        crate::handlers::orders::OrderResponse,
        crate::handlers::orders::OrderItemResponse,
        crate::handlers::orders::OrderListResponse,
        crate::checkout::fees::DeliverySettings,
        crate::checkout::form::AreaOption,
        crate::checkout::form::PaymentOption,
        crate::entities::order::DeliveryMethod,
    )),
    tags(
        (name = "checkout", description = "Order creation and quotes"),
        (name = "delivery", description = "Delivery configuration"),
        (name = "orders", description = "Buyer order history")
    ),
    info(
        title = "duka-api",
        description = "Checkout, stock and order API for the Duka storefront"
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
