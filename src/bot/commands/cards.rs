//! Card Discord commands - `get_card`, `my_cards`, and `balance`.
//!
//! These commands run the drop engine and show what a user owns.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, notifier::user_key, now, say_long},
        core::{
            catalog::{Catalog, SeaOrmCatalog},
            collection, drop, inventory,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use rand::{SeedableRng, rngs::StdRng};

    /// Receives a random card and some coins, once per cooldown.
    #[poise::command(slash_command, prefix_command)]
    pub async fn get_card(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        let data = ctx.data();
        let catalog = SeaOrmCatalog::new(data.store.connection());
        let mut rng = StdRng::from_entropy();

        let reward = drop::request_drop(
            &data.store,
            &catalog,
            &data.drop_settings,
            &mut rng,
            user_id,
            now(),
        )
        .await?;

        let glyph = catalog
            .rarities()
            .await?
            .into_iter()
            .find(|rarity| rarity.name == reward.card.rarity)
            .map(|rarity| rarity.glyph)
            .unwrap_or_default();

        let mut description = format!("{glyph} **{}** ({})", reward.card.name, reward.card.rarity);
        if !reward.card.description.is_empty() {
            description.push_str("\n\n");
            description.push_str(&reward.card.description);
        }

        let embed = serenity::CreateEmbed::new()
            .title("🎉 You got a new card!")
            .description(description)
            .field("Card ID", reward.card.id.to_string(), true)
            .field("Copies", format!("x{}", reward.copies), true)
            .field("Collection", format!("{} cards", reward.collection_size), true)
            .field(
                "Coins",
                format!("+{} (balance {})", reward.coins_earned, reward.balance),
                false,
            )
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Next card in {}",
                format::duration(data.drop_settings.cooldown_secs)
            )))
            .color(0x00F1_C40F);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows your collection grouped by rarity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn my_cards(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        let data = ctx.data();
        let db = data.store.connection();

        let summary = collection::collection_summary(
            db,
            &SeaOrmCatalog::new(db),
            &data.drop_settings.weights,
            user_id,
        )
        .await?;

        say_long(
            ctx,
            &format!("🃏 **Your collection**\n\n{}", format::collection(&summary)),
        )
        .await
    }

    /// Shows your coin balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn balance(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        let coins = inventory::balance(ctx.data().store.connection(), user_id).await?;
        ctx.say(format!("💰 Your balance: {coins} coins")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
