//! Administrator Discord commands - card grants, timer resets, coin adjustments, and bans.
//!
//! Every command here checks the caller against `ADMIN_USER_ID` first and refuses everyone else.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, format,
            handlers::autocomplete,
            notifier::{DiscordNotifier, user_key},
            now, say_long,
        },
        config::admin::is_admin,
        core::{
            catalog::{self, SeaOrmCatalog},
            moderation,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::warn;

    /// Replies with a refusal and returns `false` for anyone but the administrator.
    async fn ensure_admin(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
        let caller = user_key(ctx.author().id)?;
        if is_admin(ctx.data().admin_id, caller) {
            return Ok(true);
        }
        warn!("User {} tried to use admin command `{}`", caller, ctx.command().name);
        ctx.say("❌ This command is for administrators only.").await?;
        Ok(false)
    }

    fn notifier(ctx: poise::Context<'_, BotData, Error>) -> DiscordNotifier {
        DiscordNotifier::new(ctx.serenity_context().http.clone())
    }

    /// Gives a card to a user.
    #[poise::command(slash_command, prefix_command)]
    pub async fn admin_givecard(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User who receives the card"] user: serenity::User,
        #[description = "ID of the card"]
        #[autocomplete = "autocomplete::autocomplete_card"]
        card_id: i64,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        let user_id = user_key(user.id)?;
        let data = ctx.data();
        let catalog = SeaOrmCatalog::new(data.store.connection());

        let (card, copies) =
            moderation::grant_card(&data.store, &catalog, &notifier(ctx), user_id, card_id, now())
                .await?;

        ctx.say(format!(
            "✅ Gave {} to {} (they now have x{copies}).",
            format::card_label(&card),
            user.name
        ))
        .await?;
        Ok(())
    }

    /// Resets a user's card timer.
    #[poise::command(slash_command, prefix_command)]
    pub async fn admin_resettimer(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User whose timer to reset"] user: serenity::User,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        let user_id = user_key(user.id)?;

        moderation::reset_cooldown(&ctx.data().store, &notifier(ctx), user_id).await?;

        ctx.say(format!("✅ Card timer of {} reset.", user.name))
            .await?;
        Ok(())
    }

    /// Adds coins to (positive) or takes coins from (negative) a user. Balances never go below 0.
    #[poise::command(slash_command, prefix_command)]
    pub async fn admin_coins(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User whose balance to change"] user: serenity::User,
        #[description = "Amount to add, negative to take"] amount: i64,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        let user_id = user_key(user.id)?;

        let balance = moderation::adjust_coins(&ctx.data().store, user_id, amount).await?;

        ctx.say(format!("✅ {} now has {balance} coins.", user.name))
            .await?;
        Ok(())
    }

    /// Lists every card in the catalog.
    #[poise::command(slash_command, prefix_command)]
    pub async fn admin_listcards(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }

        let cards = catalog::list_cards(ctx.data().store.connection()).await?;
        if cards.is_empty() {
            ctx.say("📭 The catalog is empty.").await?;
            return Ok(());
        }

        let mut text = String::from("📋 **All cards**\n");
        for card in &cards {
            text.push_str(&format!("\n`{}` {} ({})", card.id, card.name, card.rarity));
        }
        say_long(ctx, &text).await
    }

    /// Sends a message to every user who is not banned.
    #[poise::command(slash_command, prefix_command)]
    pub async fn admin_broadcast(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Message to send"]
        #[rest]
        message: String,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        ctx.defer().await?;

        let report = moderation::broadcast(&ctx.data().store, &notifier(ctx), &message).await?;

        ctx.say(format!(
            "✅ Broadcast finished!\nSent: {} users\nFailed: {}",
            report.sent, report.failed
        ))
        .await?;
        Ok(())
    }

    /// Bans a user from the bot.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ban(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to ban"] user: serenity::User,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        let user_id = user_key(user.id)?;
        let data = ctx.data();

        moderation::ban(&data.store, &notifier(ctx), data.admin_id, user_id, now()).await?;

        ctx.say(format!("⛔ {} is banned.", user.name)).await?;
        Ok(())
    }

    /// Lifts a ban.
    #[poise::command(slash_command, prefix_command)]
    pub async fn unban(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to unban"] user: serenity::User,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }
        let user_id = user_key(user.id)?;

        moderation::unban(&ctx.data().store, &notifier(ctx), user_id).await?;

        ctx.say(format!("✅ {} is unbanned.", user.name)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
