use dotenvy::dotenv;
use std::{env, sync::Arc};
use threadline::{
    bot::{self, BotData},
    cache::TtlCache,
    config::{database, shop, staff},
    errors::{Error, Result},
    repository::{SeaOrmRepository, ShopRepository},
    service::ShopService,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the shop configuration
    let config = shop::load_default_config()
        .inspect_err(|e| error!("Critical error loading configuration: {}", e))?;
    info!(
        "Loaded configuration for '{}' ({})",
        config.shop.name,
        config.shop.tz()?
    );

    // 4. Connect, create tables and seed the configured shop
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let shop = database::seed_shop(&db, &config.shop)
        .await
        .inspect_err(|e| error!("Failed to seed shop: {}", e))?;

    // 5. Build the service the bot commands run through
    let repo: Arc<dyn ShopRepository> = Arc::new(SeaOrmRepository::new(db));
    let cache = TtlCache::new(config.cache.ttl());
    let staff_ids = staff::get_staff_ids();
    info!("{} staff member(s) allowed to act on shop {}", staff_ids.len(), shop.id);
    let service = ShopService::new(repo, cache, &shop, staff_ids)?;
    let data = BotData::new(service, staff::get_staff_nicknames());

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in the config
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, data).await
}
