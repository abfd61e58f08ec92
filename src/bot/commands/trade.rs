//! Trade Discord commands - `trade` and `trade_cancel`.
//!
//! `/trade` only opens the dialog. The three answers arrive as direct messages and are handled by
//! [`crate::bot::handlers::dialog`]; confirmation and the partner's answer are buttons handled by
//! [`crate::bot::handlers::buttons`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, notifier::user_key, say_long, send_long},
        core::{catalog::SeaOrmCatalog, collection, trade},
        errors::{Error, Result},
    };
    use tracing::warn;

    /// Starts a card trade. The bot continues the conversation in your direct messages.
    #[poise::command(slash_command, prefix_command)]
    pub async fn trade(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        let data = ctx.data();

        trade::start_trade(&data.store, &data.sessions, user_id).await?;

        let db = data.store.connection();
        let summary = collection::collection_summary(
            db,
            &SeaOrmCatalog::new(db),
            &data.drop_settings.weights,
            user_id,
        )
        .await?;
        let prompt = format!(
            "{}\n\n🔄 Enter the ID of the card you want to trade away:",
            format::collection(&summary)
        );

        let delivered = if ctx.guild_id().is_none() {
            say_long(ctx, &prompt).await
        } else {
            match ctx.author().create_dm_channel(ctx.serenity_context()).await {
                Ok(dm) => send_long(ctx.serenity_context(), dm.id, &prompt, Vec::new()).await,
                Err(e) => Err(e.into()),
            }
        };
        if let Err(e) = delivered {
            warn!("Could not deliver the trade prompt to user {}: {}", user_id, e);
            data.sessions.cancel(user_id).await;
            return Err(e);
        }
        if ctx.guild_id().is_none() {
            return Ok(());
        }

        ctx.send(
            poise::CreateReply::default()
                .content("📩 I sent you a direct message to set up the trade.")
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Abandons the trade you are currently setting up.
    #[poise::command(slash_command, prefix_command)]
    pub async fn trade_cancel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        trade::cancel_session(&ctx.data().sessions, user_id).await?;
        ctx.say("❌ Trade cancelled").await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
