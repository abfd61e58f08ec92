//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests shop items for `/buy` and catalog cards for `/admin_givecard`, so users can pick an
//! entry by name instead of remembering its numeric ID.

use crate::{
    bot::{BotData, now},
    core::{catalog, shop},
    errors::Error,
};
use poise::serenity_prelude as serenity;

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Provides autocomplete suggestions for shop items on sale.
///
/// Matches the partial input against the item name (case-insensitive) or its ID.
pub async fn autocomplete_shop_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(items) = shop::active_items(ctx.data().store.connection(), now()).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&partial_lower) || item.id.to_string() == partial
        })
        .take(MAX_CHOICES)
        .map(|item| {
            serenity::AutocompleteChoice::new(
                format!("{} ({} coins)", item.name, item.price),
                item.id,
            )
        })
        .collect()
}

/// Provides autocomplete suggestions for catalog cards.
pub async fn autocomplete_card(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(cards) = catalog::list_cards(ctx.data().store.connection()).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    cards
        .into_iter()
        .filter(|card| {
            card.name.to_lowercase().contains(&partial_lower) || card.id.to_string() == partial
        })
        .take(MAX_CHOICES)
        .map(|card| {
            serenity::AutocompleteChoice::new(format!("{} ({})", card.name, card.rarity), card.id)
        })
        .collect()
}
