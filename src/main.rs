use card_buddy::{
    bot::{self, BotData},
    config::{admin, database, game},
    core::{catalog, store::Store},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
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

    // 3. Game configuration (rarities, drop tuning, seed catalog)
    let game_config = game::load_default_config()
        .inspect_err(|e| error!("Failed to load game configuration: {}", e))?;

    // 4. Open the database and make sure the schema exists
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog on first start
    let seeded = catalog::seed_catalog(&db, &game_config, bot::now())
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    info!(
        "Catalog seeded: {} rarities, {} cards, {} shop items added",
        seeded.rarities, seeded.cards, seeded.shop_items
    );

    let admin_id = admin::get_admin_id();
    if admin_id.is_none() {
        warn!("ADMIN_USER_ID is not set; admin commands are disabled");
    }

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded directly before use, never stored
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(Store::new(db), game_config.drop, admin_id);
    bot::run_bot(token, data).await
}
