pub mod checkout;
pub mod common;
pub mod delivery;
pub mod orders;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{CheckoutService, DeliveryService, OrderService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub delivery: Arc<DeliveryService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let delivery = Arc::new(DeliveryService::new(db.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            delivery.clone(),
            event_sender,
            config.partial_payment_category_set(),
        ));
        let orders = Arc::new(OrderService::new(db));

        Self {
            delivery,
            checkout,
            orders,
        }
    }
}
