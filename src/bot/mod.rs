//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `CardBuddy` application,
//! including all slash commands, the trade dialog and button handlers, and bot context management.

/// Discord command implementations (cards, trade, shop, admin, general)
pub mod commands;
/// Plain-text rendering of engine results
pub mod format;
/// Discord interaction handlers (dialog messages, buttons, ban gate)
pub mod handlers;
/// Direct-message delivery of notices
pub mod notifier;

use crate::{
    config::game::DropSettings,
    core::{session::TradeSessions, store::Store},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the store and the other global state that commands need to access.
pub struct BotData {
    /// Serialized access to the database
    pub store: Store,
    /// Open trade dialogs
    pub sessions: TradeSessions,
    /// Drop tuning from config.toml
    pub drop_settings: DropSettings,
    /// Administrator's user id, if configured
    pub admin_id: Option<i64>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    /// This is typically called during bot initialization to set up the
    /// shared context for all commands.
    #[must_use]
    pub fn new(store: Store, drop_settings: DropSettings, admin_id: Option<i64>) -> Self {
        Self {
            store,
            sessions: TradeSessions::new(),
            drop_settings,
            admin_id,
        }
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Current time in epoch seconds, as the engine expects it.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Replies with `text`, split over as many messages as Discord's length limit needs.
pub async fn say_long(ctx: Context<'_>, text: &str) -> Result<()> {
    for chunk in format::split_message(text, format::MESSAGE_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Sends `text` to a channel, split like [`say_long`]. Components go on the last message.
pub async fn send_long(
    cache_http: impl serenity::CacheHttp,
    channel_id: serenity::ChannelId,
    text: &str,
    components: Vec<serenity::CreateActionRow>,
) -> Result<()> {
    let mut chunks = format::split_message(text, format::MESSAGE_LIMIT);
    let last = chunks.pop().unwrap_or_default();
    for chunk in chunks {
        channel_id
            .send_message(&cache_http, serenity::CreateMessage::new().content(chunk))
            .await?;
    }
    channel_id
        .send_message(
            &cache_http,
            serenity::CreateMessage::new().content(last).components(components),
        )
        .await?;
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                warn!("Command `{}` refused: {}", ctx.command().name, error);
            } else {
                error!("Error in command `{}`: {:?}", ctx.command().name, error);
            }
            if let Err(e) = ctx.say(format::error(&error)).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, .. } => {
            if let Err(e) = ctx.say("❌ You are banned from this bot.").await {
                error!("Failed to send ban message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Builds the framework and runs the Discord client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            command_check: Some(|ctx| Box::pin(handlers::gate::command_allowed(ctx))),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
