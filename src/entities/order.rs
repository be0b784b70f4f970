use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order of record, created exactly once per successful checkout submission.
/// The delivery decision is stored structured (`delivery_method`,
/// `delivery_area_id`, `balance_on_delivery`) rather than encoded into the
/// notes text; `notes` is plain free text from the buyer.
///
/// `idempotency_key` is unique: retries of the same submission collapse onto
/// the original row. `status` belongs to the admin workflow after creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub status: String,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub delivery_method: DeliveryMethod,
    pub delivery_area_id: Option<Uuid>,
    pub balance_on_delivery: Decimal,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub notes: Option<String>,
    #[sea_orm(unique)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(self)
    }
}

/// How the order reaches the buyer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Own-fleet doorstep delivery, fee by area or generic flat fee
    #[sea_orm(string_value = "rider")]
    Rider,
    /// Third-party courier to a fixed collection point, flat fee
    #[sea_orm(string_value = "pickup_point")]
    PickupPoint,
    /// Buyer collects from the shop, flat fee (usually zero)
    #[sea_orm(string_value = "self_pickup")]
    SelfPickup,
}
