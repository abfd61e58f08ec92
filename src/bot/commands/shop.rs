//! Shop Discord commands - `shop` and `buy`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, handlers::autocomplete, notifier::user_key, now},
        core::{catalog::SeaOrmCatalog, shop},
        errors::{Error, Result},
    };
    use rand::{SeedableRng, rngs::StdRng};

    /// Lists the items on sale.
    #[poise::command(slash_command, prefix_command)]
    pub async fn shop(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let listings = shop::list_active(&ctx.data().store, now()).await?;
        ctx.say(format::shop(&listings)).await?;
        Ok(())
    }

    /// Buys an item from the shop.
    #[poise::command(slash_command, prefix_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "ID of the item, as shown by /shop"]
        #[autocomplete = "autocomplete::autocomplete_shop_item"]
        item_id: i64,
    ) -> Result<()> {
        let user_id = user_key(ctx.author().id)?;
        let data = ctx.data();
        let catalog = SeaOrmCatalog::new(data.store.connection());
        let mut rng = StdRng::from_entropy();

        let receipt =
            shop::purchase(&data.store, &catalog, &mut rng, user_id, item_id, now()).await?;

        let effect = match &receipt.effect {
            shop::PurchaseEffect::CooldownReset => {
                "⏰ Your card timer was reset. Use `/get_card` now!".to_string()
            }
            shop::PurchaseEffect::CardGranted { card, copies } => format!(
                "🎁 You got **{}** ({}), you now have x{copies}.",
                format::card_label(card),
                card.rarity
            ),
        };
        ctx.say(format!(
            "✅ Bought **{}** for {} coins.\n{effect}\n💰 Balance: {}",
            receipt.item.name, receipt.item.price, receipt.balance
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
