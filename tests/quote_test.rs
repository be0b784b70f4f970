//! Tests for server-side quote computation and delivery configuration reads.

mod common;

use assert_matches::assert_matches;
use common::{line, TestApp};
use duka_api::{
    checkout::form::PaymentOption,
    entities::order::DeliveryMethod,
    errors::ServiceError,
    services::delivery::{
        SETTING_FREE_DELIVERY_THRESHOLD, SETTING_PICKUP_FEE, SETTING_RIDER_FEE,
        SETTING_SELF_PICKUP_FEE,
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn quote_prices_from_the_product_table_not_the_client() {
    let app = TestApp::new().await;
    app.set_setting(SETTING_RIDER_FEE, dec!(200)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    // Client claims a stale price; the quote ignores it.
    let mut stale = line(&watch, 2);
    stale.unit_price = dec!(1);

    let quote = app
        .checkout()
        .quote(&[stale], DeliveryMethod::Rider, None, PaymentOption::PayFull, false)
        .await
        .unwrap();

    assert_eq!(quote.subtotal, dec!(2000));
    assert_eq!(quote.totals.delivery_fee, dec!(200));
    assert_eq!(quote.totals.total, dec!(2200));
}

#[tokio::test]
async fn quote_flags_a_missing_required_area() {
    let app = TestApp::new().await;
    let area = app.seed_area("Westlands", "Parklands", dec!(350)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    let quote = app
        .checkout()
        .quote(
            &[line(&watch, 1)],
            DeliveryMethod::Rider,
            None,
            PaymentOption::PayFull,
            false,
        )
        .await
        .unwrap();
    assert!(quote.area_required);

    let quote = app
        .checkout()
        .quote(
            &[line(&watch, 1)],
            DeliveryMethod::Rider,
            Some(area.id),
            PaymentOption::PayFull,
            false,
        )
        .await
        .unwrap();
    assert!(!quote.area_required);
    assert_eq!(quote.totals.delivery_fee, dec!(350));
}

#[tokio::test]
async fn submission_guard_rejects_instead_of_defaulting() {
    let app = TestApp::new().await;
    app.seed_area("Westlands", "Parklands", dec!(350)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    let err = app
        .checkout()
        .quote(
            &[line(&watch, 1)],
            DeliveryMethod::Rider,
            None,
            PaymentOption::PayFull,
            true,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::MissingDeliveryArea);
}

#[tokio::test]
async fn guard_does_not_fire_when_no_areas_are_configured() {
    let app = TestApp::new().await;
    app.set_setting(SETTING_RIDER_FEE, dec!(200)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    let quote = app
        .checkout()
        .quote(
            &[line(&watch, 1)],
            DeliveryMethod::Rider,
            None,
            PaymentOption::PayFull,
            true,
        )
        .await
        .unwrap();

    assert!(!quote.area_required);
    assert_eq!(quote.totals.delivery_fee, dec!(200));
}

#[tokio::test]
async fn quote_splits_amounts_for_an_eligible_partial_payment() {
    let app = TestApp::new().await;
    app.set_setting(SETTING_PICKUP_FEE, dec!(300)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(5000), 5).await;

    let quote = app
        .checkout()
        .quote(
            &[line(&watch, 1)],
            DeliveryMethod::PickupPoint,
            None,
            PaymentOption::PayDeliveryFeeOnly,
            false,
        )
        .await
        .unwrap();

    assert!(quote.partial_payment_available);
    assert_eq!(quote.totals.amount_due_now, dec!(300));
    assert_eq!(quote.totals.balance_on_delivery, dec!(5000));
}

#[tokio::test]
async fn quote_never_splits_for_an_ineligible_cart() {
    let app = TestApp::new().await;
    let gift = app.seed_product("Gift Hamper", "gifts", dec!(3000), 5).await;

    let quote = app
        .checkout()
        .quote(
            &[line(&gift, 1)],
            DeliveryMethod::SelfPickup,
            None,
            PaymentOption::PayDeliveryFeeOnly,
            false,
        )
        .await
        .unwrap();

    assert!(!quote.partial_payment_available);
    assert_eq!(quote.totals.amount_due_now, quote.totals.total);
    assert_eq!(quote.totals.balance_on_delivery, Decimal::ZERO);
}

#[tokio::test]
async fn quote_applies_the_free_delivery_threshold() {
    let app = TestApp::new().await;
    app.set_setting(SETTING_RIDER_FEE, dec!(200)).await;
    app.set_setting(SETTING_FREE_DELIVERY_THRESHOLD, dec!(10000)).await;
    let area = app.seed_area("Westlands", "Parklands", dec!(350)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(6000), 5).await;

    let quote = app
        .checkout()
        .quote(
            &[line(&watch, 2)],
            DeliveryMethod::Rider,
            Some(area.id),
            PaymentOption::PayFull,
            false,
        )
        .await
        .unwrap();

    assert_eq!(quote.subtotal, dec!(12000));
    assert_eq!(quote.totals.delivery_fee, Decimal::ZERO);
}

// ==================== Delivery configuration reads ====================

#[tokio::test]
async fn settings_fall_back_to_defaults_for_missing_keys() {
    let app = TestApp::new().await;
    app.set_setting(SETTING_SELF_PICKUP_FEE, dec!(50)).await;

    let settings = app.delivery().settings().await.unwrap();
    assert_eq!(settings.self_pickup_fee, dec!(50));
    // Unset keys keep their defaults
    assert_eq!(settings.rider_fee, dec!(200));
    assert_eq!(settings.free_delivery_threshold, Decimal::ZERO);
}

#[tokio::test]
async fn area_options_exclude_inactive_areas_and_sort_by_zone() {
    let app = TestApp::new().await;
    app.seed_area("Westlands", "Parklands", dec!(350)).await;
    app.seed_area("CBD", "Moi Avenue", dec!(150)).await;
    let inactive = app.seed_area("CBD", "Closed Area", dec!(100)).await;
    {
        use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
        let mut am = inactive.into_active_model();
        am.active = Set(false);
        am.update(&*app.db).await.unwrap();
    }

    let options = app.delivery().area_options().await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].zone, "CBD");
    assert_eq!(options[0].name, "Moi Avenue");
    assert_eq!(options[1].zone, "Westlands");
}

#[tokio::test]
async fn inactive_area_yields_no_authoritative_fee() {
    let app = TestApp::new().await;
    let area = app.seed_area("CBD", "Moi Avenue", dec!(150)).await;
    {
        use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
        let mut am = area.clone().into_active_model();
        am.active = Set(false);
        am.update(&*app.db).await.unwrap();
    }

    let fee = app.delivery().area_fee(Some(area.id)).await.unwrap();
    assert_eq!(fee, None);
}
