use crate::{
    entities::{order, order_item, Order, OrderItem},
    errors::ServiceError,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read side for the buyer's order history. Every query is scoped to the
/// requesting buyer; another buyer's order id behaves like a missing one.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the buyer's orders, newest first.
    #[instrument(skip(self), fields(buyer_id = %buyer_id))]
    pub async fn list_for_buyer(
        &self,
        buyer_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = Order::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    /// Fetches one of the buyer's orders.
    #[instrument(skip(self), fields(buyer_id = %buyer_id, order_id = %order_id))]
    pub async fn get_for_buyer(
        &self,
        buyer_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        Order::find_by_id(order_id)
            .filter(order::Column::BuyerId.eq(buyer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Fetches the line items of one of the buyer's orders.
    #[instrument(skip(self), fields(buyer_id = %buyer_id, order_id = %order_id))]
    pub async fn items_for_buyer(
        &self,
        buyer_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        // Ownership check first so a foreign order id reads as missing
        self.get_for_buyer(buyer_id, order_id).await?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(items)
    }
}
