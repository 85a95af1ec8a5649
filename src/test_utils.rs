//! Shared test utilities for `Threadline`.
//!
//! Helpers for setting up an in-memory database and creating shops, clients, orders,
//! garments, services and payments with sensible defaults.

use crate::{
    cache::TtlCache,
    config::{database, shop::ShopConfig},
    entities::{PaymentRecordStatus, client, garment, garment_service, order, payment, shop},
    errors::Result,
    repository::{
        ClientRepository, GarmentRepository, NewClient, NewGarment, NewOrder, NewPayment,
        NewService, OrderRepository, PaymentRepository, SeaOrmRepository, ShopRepository,
    },
    service::{ShopService, StaffContext},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a shop with a custom timezone and tax rate.
pub async fn create_custom_shop(
    db: &DatabaseConnection,
    name: &str,
    timezone: &str,
    tax_rate_bps: i32,
) -> Result<shop::Model> {
    let config = ShopConfig {
        name: name.to_string(),
        timezone: timezone.to_string(),
        tax_rate_bps,
    };
    database::seed_shop(db, &config).await
}

/// Creates a test shop with sensible defaults.
///
/// # Defaults
/// * `timezone`: "America/Chicago"
/// * `tax_rate_bps`: 0
pub async fn create_test_shop(db: &DatabaseConnection, name: &str) -> Result<shop::Model> {
    create_custom_shop(db, name, "America/Chicago", 0).await
}

/// Creates a client named "Test Client" in `shop_id`.
pub async fn create_test_client(repo: &SeaOrmRepository, shop_id: i64) -> Result<client::Model> {
    repo.insert_client(
        shop_id,
        NewClient {
            first_name: "Test".to_string(),
            last_name: "Client".to_string(),
            email: Some("client@example.com".to_string()),
            phone: None,
        },
    )
    .await
}

/// Creates an order for `client_id`.
pub async fn create_test_order(
    repo: &SeaOrmRepository,
    shop_id: i64,
    client_id: i64,
    order_number: &str,
) -> Result<order::Model> {
    repo.insert_order(
        shop_id,
        NewOrder {
            client_id,
            order_number: order_number.to_string(),
        },
    )
    .await
}

/// Adds a garment in the `New` stage to an order.
pub async fn create_test_garment(
    repo: &SeaOrmRepository,
    shop_id: i64,
    order_id: i64,
    name: &str,
    due_date: Option<NaiveDate>,
) -> Result<garment::Model> {
    repo.insert_garment(
        shop_id,
        NewGarment {
            order_id,
            name: name.to_string(),
            due_date,
        },
    )
    .await
}

/// Adds a service line item to a garment.
pub async fn add_test_service(
    repo: &SeaOrmRepository,
    shop_id: i64,
    garment_id: i64,
    name: &str,
    quantity: i32,
    unit_price_cents: i64,
) -> Result<garment_service::Model> {
    repo.insert_service(
        shop_id,
        NewService {
            garment_id,
            name: name.to_string(),
            quantity,
            unit_price_cents,
        },
    )
    .await
}

/// Records a card payment with the given status.
pub async fn create_test_payment(
    repo: &SeaOrmRepository,
    shop_id: i64,
    order_id: i64,
    amount_cents: i64,
    status: PaymentRecordStatus,
) -> Result<payment::Model> {
    repo.insert_payment(
        shop_id,
        NewPayment {
            order_id,
            amount_cents,
            status,
            method: "card".to_string(),
            external_id: None,
        },
    )
    .await
}

/// A shop with one client and one empty order.
pub struct OrderFixture {
    /// Repository over the test database
    pub repo: SeaOrmRepository,
    /// The shop
    pub shop: shop::Model,
    /// Its client
    pub client: client::Model,
    /// The client's order, number "T-0001"
    pub order: order::Model,
}

/// Sets up a complete test environment with a shop, client and order.
pub async fn setup_with_order() -> Result<OrderFixture> {
    let db = setup_test_db().await?;
    let shop = create_test_shop(&db, "Test Shop").await?;
    let repo = SeaOrmRepository::new(db);
    let client = create_test_client(&repo, shop.id).await?;
    let order = create_test_order(&repo, shop.id, client.id, "T-0001").await?;
    Ok(OrderFixture {
        repo,
        shop,
        client,
        order,
    })
}

/// Staff id allowed by [`test_service`].
pub const TEST_STAFF_ID: &str = "1001";

/// A `ShopService` over the fixture's shop, plus a context for an allowed staff member.
pub fn test_service(fx: &OrderFixture) -> Result<(ShopService, StaffContext)> {
    let repo: Arc<dyn ShopRepository> = Arc::new(fx.repo.clone());
    let service = ShopService::new(
        repo,
        TtlCache::new(Duration::from_secs(60)),
        &fx.shop,
        HashSet::from([TEST_STAFF_ID.to_string()]),
    )?;
    Ok((service, StaffContext::new(fx.shop.id, TEST_STAFF_ID)))
}
