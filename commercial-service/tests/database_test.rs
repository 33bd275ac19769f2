//! Database integration tests for commercial-service.
//!
//! These exercise every CRUD operation against a live PostgreSQL
//! instance. Set TEST_DATABASE_URL to run them; without it each test
//! returns early so the rest of the suite stays runnable anywhere.

use commercial_service::models::{
    AdjustmentKind, CreateCommercialRecord, ListCommercialRecordsFilter, UpdateCommercialRecord,
};
use commercial_service::services::Database;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS commercial_records (
    commercial_id UUID PRIMARY KEY,
    booking_id UUID,
    buying_currency TEXT NOT NULL,
    buying_amount NUMERIC NOT NULL,
    buying_vat_included BOOLEAN NOT NULL,
    buying_vat_percent NUMERIC NOT NULL,
    commissionable BOOLEAN NOT NULL,
    commission_kind TEXT NOT NULL,
    commission_value NUMERIC,
    selling_currency TEXT NOT NULL,
    selling_price NUMERIC NOT NULL,
    selling_vat_included BOOLEAN NOT NULL,
    selling_vat_percent NUMERIC NOT NULL,
    incentive BOOLEAN NOT NULL,
    incentive_kind TEXT NOT NULL,
    incentive_value NUMERIC,
    exchange_rate NUMERIC,
    auto_exchange BOOLEAN NOT NULL,
    net_buying NUMERIC NOT NULL,
    gross_buying NUMERIC NOT NULL,
    net_selling NUMERIC NOT NULL,
    gross_selling NUMERIC NOT NULL,
    profit NUMERIC NOT NULL,
    profit_margin_percent NUMERIC NOT NULL,
    markup_percent NUMERIC NOT NULL,
    created_utc TIMESTAMPTZ NOT NULL,
    updated_utc TIMESTAMPTZ NOT NULL
)
"#;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Connect to the test database and make sure the table exists. Returns
/// None when TEST_DATABASE_URL is not set.
async fn test_database() -> Option<Database> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let db = Database::new(&url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    sqlx::query(CREATE_TABLE)
        .execute(db.pool())
        .await
        .expect("Failed to create commercial_records table");
    Some(db)
}

fn base_create(booking_id: Option<Uuid>) -> CreateCommercialRecord {
    CreateCommercialRecord {
        booking_id,
        buying_currency: "EUR".to_string(),
        buying_amount: dec("1000"),
        buying_vat_included: false,
        buying_vat_percent: Decimal::ZERO,
        commissionable: false,
        commission_kind: AdjustmentKind::Fixed,
        commission_value: None,
        selling_currency: "EUR".to_string(),
        selling_price: dec("1500"),
        selling_vat_included: false,
        selling_vat_percent: Decimal::ZERO,
        incentive: false,
        incentive_kind: AdjustmentKind::Fixed,
        incentive_value: None,
        exchange_rate: None,
        auto_exchange: false,
    }
}

#[tokio::test]
async fn health_check_works() {
    let Some(db) = test_database().await else {
        return;
    };

    db.health_check().await.expect("Health check should pass");
}

#[tokio::test]
async fn create_commercial_record_works() {
    let Some(db) = test_database().await else {
        return;
    };

    let mut input = base_create(None);
    input.buying_vat_included = true;
    input.buying_vat_percent = dec("18");
    input.commissionable = true;
    input.commission_kind = AdjustmentKind::Percentage;
    input.commission_value = Some(dec("10"));
    input.exchange_rate = Some(Decimal::ONE);

    let record = db
        .create_commercial_record(&input)
        .await
        .expect("Failed to create commercial record");

    assert_eq!(record.commission_kind, "percentage");
    assert_eq!(record.net_buying.round_dp(4), dec("932.2034"));
    assert_eq!(record.net_selling, dec("1500"));
    assert_eq!(record.profit.round_dp(4), dec("567.7966"));
    assert_eq!(record.profit_margin_percent.round_dp(4), dec("37.8531"));
    assert_eq!(record.markup_percent.round_dp(4), dec("60.9091"));
    assert_eq!(record.created_utc, record.updated_utc);
}

#[tokio::test]
async fn create_rejects_malformed_currency() {
    let Some(db) = test_database().await else {
        return;
    };

    let mut input = base_create(None);
    input.buying_currency = "EURO".to_string();

    let err = db.create_commercial_record(&input).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn create_rejects_negative_amounts() {
    let Some(db) = test_database().await else {
        return;
    };

    let mut input = base_create(None);
    input.buying_amount = dec("-1");

    let err = db.create_commercial_record(&input).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn get_commercial_record_works() {
    let Some(db) = test_database().await else {
        return;
    };

    let created = db
        .create_commercial_record(&base_create(None))
        .await
        .expect("Failed to create commercial record");

    let fetched = db
        .get_commercial_record(created.commercial_id)
        .await
        .expect("Failed to get commercial record")
        .expect("Record should exist");
    assert_eq!(fetched.commercial_id, created.commercial_id);
    assert_eq!(fetched.profit, created.profit);

    let missing = db
        .get_commercial_record(Uuid::new_v4())
        .await
        .expect("Lookup should not error");
    assert!(missing.is_none());
}

#[tokio::test]
async fn get_by_booking_returns_newest_record() {
    let Some(db) = test_database().await else {
        return;
    };

    let booking_id = Uuid::new_v4();
    db.create_commercial_record(&base_create(Some(booking_id)))
        .await
        .expect("Failed to create first record");

    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut second = base_create(Some(booking_id));
    second.selling_price = dec("1700");
    let newest = db
        .create_commercial_record(&second)
        .await
        .expect("Failed to create second record");

    let fetched = db
        .get_commercial_record_by_booking(booking_id)
        .await
        .expect("Failed to get record by booking")
        .expect("Record should exist");
    assert_eq!(fetched.commercial_id, newest.commercial_id);
    assert_eq!(fetched.selling_price, dec("1700"));
}

#[tokio::test]
async fn list_filters_by_booking_and_paginates() {
    let Some(db) = test_database().await else {
        return;
    };

    let booking_id = Uuid::new_v4();
    for _ in 0..3 {
        db.create_commercial_record(&base_create(Some(booking_id)))
            .await
            .expect("Failed to create record");
    }
    db.create_commercial_record(&base_create(Some(Uuid::new_v4())))
        .await
        .expect("Failed to create unrelated record");

    let all = db
        .list_commercial_records(&ListCommercialRecordsFilter {
            booking_id: Some(booking_id),
            page_size: 10,
            ..Default::default()
        })
        .await
        .expect("Failed to list records");
    assert_eq!(all.len(), 3);

    // Keyset pagination: two pages covering all three rows, no overlap.
    let first_page = db
        .list_commercial_records(&ListCommercialRecordsFilter {
            booking_id: Some(booking_id),
            page_size: 2,
            ..Default::default()
        })
        .await
        .expect("Failed to list first page");
    assert_eq!(first_page.len(), 2);

    let second_page = db
        .list_commercial_records(&ListCommercialRecordsFilter {
            booking_id: Some(booking_id),
            page_size: 2,
            page_token: Some(first_page[1].commercial_id),
            ..Default::default()
        })
        .await
        .expect("Failed to list second page");
    assert_eq!(second_page.len(), 1);
    assert!(first_page
        .iter()
        .all(|r| r.commercial_id != second_page[0].commercial_id));
}

#[tokio::test]
async fn update_commercial_record_works() {
    let Some(db) = test_database().await else {
        return;
    };

    let created = db
        .create_commercial_record(&base_create(None))
        .await
        .expect("Failed to create commercial record");

    tokio::time::sleep(Duration::from_millis(10)).await;

    let update = UpdateCommercialRecord {
        selling_price: Some(dec("1800")),
        commissionable: Some(true),
        commission_kind: Some(AdjustmentKind::Percentage),
        commission_value: Some(dec("10")),
        ..Default::default()
    };
    let updated = db
        .update_commercial_record(created.commercial_id, &update)
        .await
        .expect("Failed to update commercial record");

    assert_eq!(updated.net_buying, dec("1100"));
    assert_eq!(updated.net_selling, dec("1800"));
    assert_eq!(updated.profit, dec("700"));
    assert_eq!(updated.created_utc, created.created_utc);
    assert!(updated.updated_utc > created.updated_utc);
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let Some(db) = test_database().await else {
        return;
    };

    let err = db
        .update_commercial_record(Uuid::new_v4(), &UpdateCommercialRecord::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_commercial_record_works() {
    let Some(db) = test_database().await else {
        return;
    };

    let created = db
        .create_commercial_record(&base_create(None))
        .await
        .expect("Failed to create commercial record");

    db.delete_commercial_record(created.commercial_id)
        .await
        .expect("Failed to delete commercial record");

    let missing = db
        .get_commercial_record(created.commercial_id)
        .await
        .expect("Lookup should not error");
    assert!(missing.is_none());

    let err = db
        .delete_commercial_record(created.commercial_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
