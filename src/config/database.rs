//! Database configuration module for Threadline.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{Client, Garment, GarmentService, Order, Payment, Shop, shop};
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Schema, Set,
};
use tracing::{debug, info, instrument};

use super::shop::ShopConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/threadline.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions, skipping ones that already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents before children so foreign keys resolve
    let mut statements = [
        schema.create_table_from_entity(Shop),
        schema.create_table_from_entity(Client),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(Garment),
        schema.create_table_from_entity(GarmentService),
        schema.create_table_from_entity(Payment),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}

/// Makes sure the configured shop exists, creating it by name if missing.
///
/// An existing shop keeps its id; its timezone and tax rate are refreshed from config.
#[instrument(skip(db, config), fields(shop = %config.name))]
pub async fn seed_shop(db: &DatabaseConnection, config: &ShopConfig) -> Result<shop::Model> {
    let existing = Shop::find()
        .filter(shop::Column::Name.eq(config.name.as_str()))
        .one(db)
        .await?;

    if let Some(found) = existing {
        debug!("Shop '{}' already exists with id {}", found.name, found.id);
        let mut active: shop::ActiveModel = found.into();
        active.timezone = Set(config.timezone.clone());
        active.tax_rate_bps = Set(config.tax_rate_bps);
        return active.update(db).await.map_err(Into::into);
    }

    info!("Creating shop '{}'", config.name);
    let model = shop::ActiveModel {
        name: Set(config.name.clone()),
        timezone: Set(config.timezone.clone()),
        tax_rate_bps: Set(config.tax_rate_bps),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}
