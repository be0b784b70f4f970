use crate::{
    checkout::fees::DeliverySettings,
    checkout::form::AreaOption,
    entities::{delivery_area, delivery_setting, DeliveryArea, DeliverySetting},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Known settings keys. Rows under other keys are ignored.
pub const SETTING_RIDER_FEE: &str = "rider_fee";
pub const SETTING_PICKUP_FEE: &str = "pickup_fee";
pub const SETTING_SELF_PICKUP_FEE: &str = "self_pickup_fee";
pub const SETTING_FREE_DELIVERY_THRESHOLD: &str = "free_delivery_threshold";

/// Authoritative reads over delivery configuration. Fee-determining inputs
/// are always fetched fresh here, never taken from a request body.
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads the four delivery amounts, falling back to defaults for keys
    /// that have no row.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> Result<DeliverySettings, ServiceError> {
        let rows = DeliverySetting::find().all(&*self.db).await?;

        let mut settings = DeliverySettings::default();
        for row in rows {
            match row.key.as_str() {
                SETTING_RIDER_FEE => settings.rider_fee = row.amount,
                SETTING_PICKUP_FEE => settings.pickup_fee = row.amount,
                SETTING_SELF_PICKUP_FEE => settings.self_pickup_fee = row.amount,
                SETTING_FREE_DELIVERY_THRESHOLD => settings.free_delivery_threshold = row.amount,
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Fetches one area, filtered to active. Inactive or unknown ids come
    /// back as `None` so callers fall through to the generic rider fee.
    #[instrument(skip(self))]
    pub async fn active_area(
        &self,
        area_id: Uuid,
    ) -> Result<Option<delivery_area::Model>, ServiceError> {
        let area = DeliveryArea::find_by_id(area_id)
            .filter(delivery_area::Column::Active.eq(true))
            .one(&*self.db)
            .await?;
        Ok(area)
    }

    /// The authoritative fee for a chosen area, if the area is live.
    pub async fn area_fee(&self, area_id: Option<Uuid>) -> Result<Option<Decimal>, ServiceError> {
        match area_id {
            Some(id) => Ok(self.active_area(id).await?.map(|a| a.fee)),
            None => Ok(None),
        }
    }

    /// All active areas, grouped for display by zone then name.
    #[instrument(skip(self))]
    pub async fn active_areas(&self) -> Result<Vec<delivery_area::Model>, ServiceError> {
        let areas = DeliveryArea::find()
            .filter(delivery_area::Column::Active.eq(true))
            .order_by_asc(delivery_area::Column::Zone)
            .order_by_asc(delivery_area::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(areas)
    }

    /// Active areas shaped for the checkout form.
    pub async fn area_options(&self) -> Result<Vec<AreaOption>, ServiceError> {
        let options = self
            .active_areas()
            .await?
            .into_iter()
            .map(|a| AreaOption {
                id: a.id,
                zone: a.zone,
                name: a.name,
                fee: a.fee,
            })
            .collect();
        Ok(options)
    }
}
