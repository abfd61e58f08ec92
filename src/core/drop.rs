//! Timed random card drops.
//!
//! A drop samples a rarity from the weight table, falls back to the first rarity (in table order)
//! that actually has droppable cards, picks one of its cards uniformly and credits a random coin
//! reward. The cooldown timestamp only moves on a successful grant, so a drop that fails because
//! the catalog is empty can be retried immediately.

use crate::{
    config::game::{DropSettings, RarityWeight},
    core::{
        catalog::{Catalog, droppable_cards},
        inventory,
        store::Store,
    },
    entities::card,
    errors::{Error, Result},
};
use rand::{
    Rng,
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
};
use tracing::{error, info, instrument, warn};

/// What a successful drop awarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropReward {
    /// The granted card
    pub card: card::Model,
    /// Units of this card the user now holds
    pub copies: u64,
    /// Total units in the user's collection
    pub collection_size: u64,
    /// Coins credited by this drop
    pub coins_earned: i64,
    /// Balance after the credit
    pub balance: i64,
}

/// Seconds left until the next drop, or `None` if a drop is allowed at `now`.
///
/// A `last_drop` in the future (clock moved backwards) counts as a full cooldown.
#[must_use]
pub const fn cooldown_remaining(last_drop: i64, now: i64, cooldown_secs: i64) -> Option<i64> {
    let elapsed = now.saturating_sub(last_drop);
    if elapsed >= cooldown_secs {
        return None;
    }
    if elapsed < 0 {
        Some(cooldown_secs)
    } else {
        Some(cooldown_secs - elapsed)
    }
}

/// Resolves the rarity to drop from.
///
/// The table is sampled proportionally to its weights. If the sampled rarity has no cards
/// (or the weights cannot be sampled at all), the table is scanned in declared order and the
/// first rarity with cards wins. `None` means no rarity in the table has any card.
pub fn choose_rarity<'a, R, F>(weights: &'a [RarityWeight], has_cards: F, rng: &mut R) -> Option<&'a str>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    if let Ok(distribution) = WeightedIndex::new(weights.iter().map(|entry| entry.weight)) {
        let sampled = &weights[distribution.sample(rng)];
        if has_cards(&sampled.rarity) {
            return Some(&sampled.rarity);
        }
        warn!(
            "No cards for sampled rarity '{}', falling back to the next available one",
            sampled.rarity
        );
    }

    weights
        .iter()
        .find(|entry| has_cards(&entry.rarity))
        .map(|entry| entry.rarity.as_str())
}

/// Picks the card to award from the droppable pool.
pub fn choose_card<'a, R>(
    pool: &'a [card::Model],
    weights: &[RarityWeight],
    rng: &mut R,
) -> Option<&'a card::Model>
where
    R: Rng + ?Sized,
{
    let rarity = choose_rarity(
        weights,
        |name| pool.iter().any(|card| card.rarity == name),
        rng,
    )?;

    let candidates: Vec<&card::Model> = pool.iter().filter(|card| card.rarity == rarity).collect();
    candidates.choose(rng).copied()
}

/// Awards a random card and coins to `user_id` if the cooldown allows it.
///
/// # Errors
/// - [`Error::CooldownActive`] with the remaining seconds; nothing changes
/// - [`Error::CatalogEmpty`] if no rarity in the weight table has droppable cards; nothing
///   changes and the cooldown is not started
#[instrument(skip(store, catalog, settings, rng))]
pub async fn request_drop<K, R>(
    store: &Store,
    catalog: &K,
    settings: &DropSettings,
    rng: &mut R,
    user_id: i64,
    now: i64,
) -> Result<DropReward>
where
    K: Catalog,
    R: Rng + Send,
{
    let pool = droppable_cards(catalog).await?;

    let write = store.begin_write().await?;
    let last_drop = inventory::find_user(write.conn(), user_id)
        .await?
        .map_or(0, |user| user.last_drop);

    if let Some(remaining_secs) = cooldown_remaining(last_drop, now, settings.cooldown_secs) {
        return Err(Error::CooldownActive { remaining_secs });
    }

    let Some(card) = choose_card(&pool, &settings.weights, rng).cloned() else {
        error!("No rarity in the weight table has droppable cards; add cards to the catalog");
        return Err(Error::CatalogEmpty);
    };
    let coins_earned = rng.gen_range(settings.min_coins..=settings.max_coins);

    let copies = inventory::grant_card(write.conn(), user_id, card.id, now).await?;
    inventory::set_last_drop(write.conn(), user_id, now).await?;
    let balance = inventory::adjust_balance(write.conn(), user_id, coins_earned).await?;
    let collection_size = inventory::collection_size(write.conn(), user_id).await?;
    write.commit().await?;

    info!(
        "User {} received card {} ('{}', {}) and {} coins",
        user_id, card.id, card.name, card.rarity, coins_earned
    );

    Ok(DropReward {
        card,
        copies,
        collection_size,
        coins_earned,
        balance,
    })
}
