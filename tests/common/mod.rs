#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use duka_api::{
    auth::{AuthConfig, AuthService},
    checkout::form::PaymentOption,
    config::AppConfig,
    entities::{cart_item, delivery_area, delivery_setting, order, product},
    events::{self, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    services::{CartLine, CheckoutDetails, CheckoutService, DeliveryService, OrderService},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "a_test_secret_key_that_is_long_enough_for_validation";

/// Helper harness wiring the service stack to a fresh in-memory SQLite
/// database, one per test.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: AppServices,
    pub auth_service: Arc<AuthService>,
    pub event_sender: EventSender,
    pub buyer_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
        // A single connection keeps every query on the same in-memory database.
        opts.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opts)
            .await
            .expect("failed to create test database");
        Migrator::up(&db, None)
            .await
            .expect("failed to run migrations");
        let db = Arc::new(db);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let config = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "test".to_string(),
        );

        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), &config);

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            TEST_JWT_SECRET.to_string(),
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            Duration::from_secs(3600),
        )));

        Self {
            db,
            config,
            services,
            auth_service,
            event_sender,
            buyer_id: Uuid::new_v4(),
            _event_task: event_task,
        }
    }

    pub fn checkout(&self) -> &CheckoutService {
        &self.services.checkout
    }

    pub fn delivery(&self) -> &DeliveryService {
        &self.services.delivery
    }

    pub fn orders(&self) -> &OrderService {
        &self.services.orders
    }

    /// Axum app as served, for HTTP round trips.
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        };
        axum::Router::new()
            .nest("/api/v1", duka_api::api_v1_routes(self.auth_service.clone()))
            .with_state(state)
    }

    /// Bearer token for the harness buyer.
    pub fn token(&self) -> String {
        self.auth_service
            .issue_token(self.buyer_id, Some("buyer@test.local".to_string()))
            .expect("failed to issue test token")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        category: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category: Set(category.to_string()),
            icon: Set(None),
            price: Set(price),
            stock: Set(stock),
            active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed product")
    }

    pub async fn deactivate_product(&self, id: Uuid) {
        let model = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .expect("product fetch")
            .expect("product exists");
        let mut am: product::ActiveModel = model.into();
        am.active = Set(false);
        am.update(&*self.db).await.expect("failed to deactivate");
    }

    pub async fn seed_area(&self, zone: &str, name: &str, fee: Decimal) -> delivery_area::Model {
        delivery_area::ActiveModel {
            id: Set(Uuid::new_v4()),
            zone: Set(zone.to_string()),
            name: Set(name.to_string()),
            fee: Set(fee),
            active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed delivery area")
    }

    pub async fn set_setting(&self, key: &str, amount: Decimal) {
        delivery_setting::ActiveModel {
            key: Set(key.to_string()),
            amount: Set(amount),
            updated_at: Set(Some(Utc::now())),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed delivery setting");
    }

    pub async fn seed_cart_item(&self, product: &product::Model, quantity: i32) {
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(self.buyer_id),
            product_id: Set(product.id),
            quantity: Set(quantity),
            unit_price: Set(product.price),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed cart item");
    }

    pub async fn cart_item_count(&self) -> u64 {
        cart_item::Entity::find()
            .filter(cart_item::Column::BuyerId.eq(self.buyer_id))
            .count(&*self.db)
            .await
            .expect("failed to count cart items")
    }

    pub async fn order_count(&self) -> u64 {
        order::Entity::find()
            .count(&*self.db)
            .await
            .expect("failed to count orders")
    }

    pub async fn product_stock(&self, id: Uuid) -> i32 {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .expect("product fetch")
            .expect("product exists")
            .stock
    }
}

/// A cart line exactly as the storefront would capture it.
pub fn line(product: &product::Model, quantity: i32) -> CartLine {
    CartLine {
        product_id: product.id,
        quantity,
        unit_price: product.price,
    }
}

/// Checkout details with sane defaults: self-pickup, full payment.
pub fn checkout_details(idempotency_key: &str) -> CheckoutDetails {
    CheckoutDetails {
        shipping_name: "Asha Mwangi".to_string(),
        shipping_email: "asha@example.com".to_string(),
        shipping_phone: "+254700000001".to_string(),
        shipping_address: "Moi Avenue 12".to_string(),
        shipping_city: "Nairobi".to_string(),
        payment_method: "mpesa".to_string(),
        delivery_method: order::DeliveryMethod::SelfPickup,
        delivery_area_id: None,
        payment_option: PaymentOption::PayFull,
        notes: None,
        idempotency_key: Some(idempotency_key.to_string()),
    }
}
