//! Read-only view of a user's collection, grouped by rarity.

use crate::{
    config::game::RarityWeight,
    core::{catalog::Catalog, inventory},
    errors::Result,
};
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

/// Name used for cards whose catalog entry or rarity no longer exists.
pub const UNKNOWN_RARITY: &str = "Unknown";

/// One distinct card in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    /// Card id
    pub card_id: i64,
    /// Card name
    pub name: String,
    /// Units held
    pub count: u64,
}

/// All owned cards of one rarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityGroup {
    /// Rarity name
    pub rarity: String,
    /// Display glyph, empty if the rarity is not in the catalog
    pub glyph: String,
    /// Entries ordered by card id
    pub entries: Vec<CollectionEntry>,
}

/// A user's collection for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Groups in weight-table order, then the remaining rarities by name
    pub groups: Vec<RarityGroup>,
    /// Total units owned
    pub total: u64,
}

impl CollectionSummary {
    /// Whether the user owns nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Builds the grouped collection of `user_id`.
pub async fn collection_summary<C, K>(
    db: &C,
    catalog: &K,
    weights: &[RarityWeight],
    user_id: i64,
) -> Result<CollectionSummary>
where
    C: ConnectionTrait,
    K: Catalog,
{
    let owned = inventory::collection(db, user_id).await?;
    if owned.is_empty() {
        return Ok(CollectionSummary::default());
    }

    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for card_id in &owned {
        *counts.entry(*card_id).or_default() += 1;
    }

    let rarities = catalog.rarities().await?;
    let mut by_rarity: BTreeMap<String, Vec<CollectionEntry>> = BTreeMap::new();
    for (card_id, count) in counts {
        let (name, rarity) = match catalog.card(card_id).await? {
            Some(card) => (card.name, card.rarity),
            None => (format!("Card #{card_id}"), UNKNOWN_RARITY.to_string()),
        };
        by_rarity.entry(rarity).or_default().push(CollectionEntry {
            card_id,
            name,
            count,
        });
    }

    let mut ordered: Vec<String> = weights
        .iter()
        .map(|w| w.rarity.clone())
        .filter(|name| by_rarity.contains_key(name))
        .collect();
    ordered.extend(
        by_rarity
            .keys()
            .filter(|name| !weights.iter().any(|w| &w.rarity == *name))
            .cloned(),
    );

    let groups = ordered
        .into_iter()
        .filter_map(|rarity| {
            let entries = by_rarity.remove(&rarity)?;
            let glyph = rarities
                .iter()
                .find(|r| r.name == rarity)
                .map(|r| r.glyph.clone())
                .unwrap_or_default();
            Some(RarityGroup {
                rarity,
                glyph,
                entries,
            })
        })
        .collect();

    Ok(CollectionSummary {
        groups,
        total: owned.len() as u64,
    })
}
