//! Coin shop: timer resets and card packs.
//!
//! Expired items are pruned when the shop is listed rather than on a timer. A purchase checks the
//! balance and debits it inside one write, so concurrent purchases can never overdraw a balance.

use crate::{
    core::{catalog::Catalog, inventory, store::Store},
    entities::{ShopItem, ShopItemKind, ShopPackCard, card, shop_item, shop_pack_card},
    errors::{Error, Result},
};
use rand::{Rng, seq::SliceRandom};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// An item on sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopListing {
    /// The item
    pub item: shop_item::Model,
    /// Candidate card ids of a pack, in order, duplicates included; empty for other kinds
    pub pack_cards: Vec<i64>,
}

/// What buying an item did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEffect {
    /// The buyer's drop cooldown was cleared
    CooldownReset,
    /// A card was drawn from the pack and added to the collection
    CardGranted {
        /// The drawn card
        card: card::Model,
        /// Units of it the buyer holds now
        copies: u64,
    },
}

/// Receipt returned by [`purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The bought item
    pub item: shop_item::Model,
    /// Balance after the debit
    pub balance: i64,
    /// The applied effect
    pub effect: PurchaseEffect,
}

/// Candidate card ids of a pack, in insertion order.
pub async fn pack_cards<C>(db: &C, item_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let entries = ShopPackCard::find()
        .filter(shop_pack_card::Column::ShopItemId.eq(item_id))
        .order_by_asc(shop_pack_card::Column::Id)
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|entry| entry.card_id).collect())
}

/// Items on sale at `now`, without pruning anything.
pub async fn active_items<C>(db: &C, now: i64) -> Result<Vec<shop_item::Model>>
where
    C: ConnectionTrait,
{
    let items = ShopItem::find()
        .order_by_asc(shop_item::Column::Id)
        .all(db)
        .await?;
    Ok(items.into_iter().filter(|item| item.is_active(now)).collect())
}

/// Lists the items on sale at `now` and deletes the expired ones.
#[instrument(skip(store))]
pub async fn list_active(store: &Store, now: i64) -> Result<Vec<ShopListing>> {
    let write = store.begin_write().await?;
    let items = ShopItem::find()
        .order_by_asc(shop_item::Column::Id)
        .all(write.conn())
        .await?;

    let mut listings = Vec::with_capacity(items.len());
    let mut pruned = 0;
    for item in items {
        if item.is_active(now) {
            let pack_cards = pack_cards(write.conn(), item.id).await?;
            listings.push(ShopListing { item, pack_cards });
            continue;
        }

        ShopPackCard::delete_many()
            .filter(shop_pack_card::Column::ShopItemId.eq(item.id))
            .exec(write.conn())
            .await?;
        debug!(item_id = item.id, "Pruning expired shop item '{}'", item.name);
        item.delete(write.conn()).await?;
        pruned += 1;
    }
    write.commit().await?;

    if pruned > 0 {
        info!("Pruned {} expired shop items", pruned);
    }
    Ok(listings)
}

/// Buys `item_id` for `user_id`.
///
/// # Errors
/// - [`Error::NotFound`] if the item is not in the shop (any more)
/// - [`Error::Expired`] if it expired since it was listed
/// - [`Error::InsufficientFunds`] if the balance is below the price; nothing is debited
/// - [`Error::CatalogEmpty`] if a pack has no candidate cards; nothing is debited
#[instrument(skip(store, catalog, rng))]
pub async fn purchase<K, R>(
    store: &Store,
    catalog: &K,
    rng: &mut R,
    user_id: i64,
    item_id: i64,
    now: i64,
) -> Result<PurchaseReceipt>
where
    K: Catalog,
    R: Rng + Send,
{
    let candidates = resolve_pack(store, catalog, item_id).await?;

    let write = store.begin_write().await?;
    let item = ShopItem::find_by_id(item_id)
        .one(write.conn())
        .await?
        .ok_or_else(|| Error::not_found("shop item", item_id))?;
    if !item.is_active(now) {
        return Err(Error::Expired { item_id });
    }

    let balance = inventory::balance(write.conn(), user_id).await?;
    if balance < item.price {
        return Err(Error::InsufficientFunds {
            balance,
            price: item.price,
        });
    }

    let drawn = match item.kind {
        ShopItemKind::CooldownReset => None,
        ShopItemKind::CardPack => {
            let entries = pack_cards(write.conn(), item_id).await?;
            let card_id = *entries.choose(rng).ok_or(Error::CatalogEmpty)?;
            let card = candidates
                .get(&card_id)
                .cloned()
                .ok_or_else(|| Error::not_found("card", card_id))?;
            Some(card)
        }
    };

    let balance = inventory::adjust_balance(write.conn(), user_id, -item.price).await?;
    let effect = match drawn {
        None => {
            inventory::ensure_user(write.conn(), user_id, now).await?;
            inventory::set_last_drop(write.conn(), user_id, 0).await?;
            PurchaseEffect::CooldownReset
        }
        Some(card) => {
            let copies = inventory::grant_card(write.conn(), user_id, card.id, now).await?;
            PurchaseEffect::CardGranted { card, copies }
        }
    };
    write.commit().await?;

    info!(
        "User {} bought '{}' for {} coins, balance now {}",
        user_id, item.name, item.price, balance
    );
    Ok(PurchaseReceipt {
        item,
        balance,
        effect,
    })
}

/// Looks up the catalog entries of every pack candidate before the write lock is taken.
async fn resolve_pack<K>(
    store: &Store,
    catalog: &K,
    item_id: i64,
) -> Result<HashMap<i64, card::Model>>
where
    K: Catalog,
{
    let mut resolved = HashMap::new();
    for card_id in pack_cards(store.connection(), item_id).await? {
        if resolved.contains_key(&card_id) {
            continue;
        }
        if let Some(card) = catalog.card(card_id).await? {
            resolved.insert(card_id, card);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::core::catalog::{SeaOrmCatalog, create_shop_item};
    use crate::test_utils::{seed_cards, setup_test_store};
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000;

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance() -> Result<()> {
        let store = setup_test_store().await?;
        let catalog = SeaOrmCatalog::new(store.connection());
        let mut rng = StdRng::seed_from_u64(1);
        let reset =
            create_shop_item(store.connection(), "reset", 100, ShopItemKind::CooldownReset, &[], 0, NOW)
                .await?;
        inventory::adjust_balance(store.connection(), 1, 50).await?;

        let result = purchase(&store, &catalog, &mut rng, 1, reset.id, NOW).await;

        assert!(matches!(
            result,
            Err(Error::InsufficientFunds {
                balance: 50,
                price: 100
            })
        ));
        assert_eq!(inventory::balance(store.connection(), 1).await?, 50);
        Ok(())
    }

    #[tokio::test]
    async fn test_cooldown_reset_purchase() -> Result<()> {
        let store = setup_test_store().await?;
        let catalog = SeaOrmCatalog::new(store.connection());
        let mut rng = StdRng::seed_from_u64(1);
        let reset =
            create_shop_item(store.connection(), "reset", 100, ShopItemKind::CooldownReset, &[], 0, NOW)
                .await?;
        inventory::ensure_user(store.connection(), 1, NOW - 100).await?;
        inventory::set_last_drop(store.connection(), 1, NOW - 10).await?;
        inventory::adjust_balance(store.connection(), 1, 130).await?;

        let receipt = purchase(&store, &catalog, &mut rng, 1, reset.id, NOW).await?;

        assert_eq!(receipt.balance, 30);
        assert_eq!(receipt.effect, PurchaseEffect::CooldownReset);
        let user = inventory::find_user(store.connection(), 1).await?.unwrap();
        assert_eq!(user.last_drop, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_pack_draws_from_its_list() -> Result<()> {
        let store = setup_test_store().await?;
        seed_cards(store.connection(), 8).await?;
        let catalog = SeaOrmCatalog::new(store.connection());
        let mut rng = StdRng::seed_from_u64(42);
        let pack =
            create_shop_item(store.connection(), "pack", 1, ShopItemKind::CardPack, &[3, 3, 8], 0, NOW)
                .await?;
        inventory::adjust_balance(store.connection(), 1, 1_500).await?;

        let mut threes = 0;
        let mut eights = 0;
        for _ in 0..1_500 {
            match purchase(&store, &catalog, &mut rng, 1, pack.id, NOW).await?.effect {
                PurchaseEffect::CardGranted { card, .. } if card.id == 3 => threes += 1,
                PurchaseEffect::CardGranted { card, .. } if card.id == 8 => eights += 1,
                other => panic!("unexpected effect {other:?}"),
            }
        }

        assert_eq!(threes + eights, 1_500);
        assert!((900..1_100).contains(&threes), "got {threes} draws of card 3");
        assert_eq!(inventory::balance(store.connection(), 1).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_prunes_expired_items() -> Result<()> {
        let store = setup_test_store().await?;
        let catalog = SeaOrmCatalog::new(store.connection());
        let mut rng = StdRng::seed_from_u64(1);
        let forever =
            create_shop_item(store.connection(), "reset", 10, ShopItemKind::CooldownReset, &[], 0, NOW)
                .await?;
        let limited =
            create_shop_item(store.connection(), "summer pack", 10, ShopItemKind::CardPack, &[1], NOW + 60, NOW)
                .await?;

        let listed = list_active(&store, NOW).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(active_items(store.connection(), NOW + 60).await?, vec![forever.clone()]);
        assert_eq!(listed[1].pack_cards, vec![1]);

        inventory::adjust_balance(store.connection(), 1, 100).await?;
        let expired = purchase(&store, &catalog, &mut rng, 1, limited.id, NOW + 60).await;
        assert!(matches!(expired, Err(Error::Expired { .. })));

        let listed = list_active(&store, NOW + 60).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].item.id, forever.id);
        assert!(pack_cards(store.connection(), limited.id).await?.is_empty());

        let gone = purchase(&store, &catalog, &mut rng, 1, limited.id, NOW + 60).await;
        assert!(matches!(gone, Err(Error::NotFound { .. })));
        assert_eq!(inventory::balance(store.connection(), 1).await?, 100);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_never_overdraw() -> Result<()> {
        let store = Arc::new(setup_test_store().await?);
        let reset =
            create_shop_item(store.connection(), "reset", 100, ShopItemKind::CooldownReset, &[], 0, NOW)
                .await?;
        inventory::adjust_balance(store.connection(), 1, 250).await?;
        let item_id = reset.id;

        let mut handles = Vec::new();
        for seed in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let catalog = SeaOrmCatalog::new(store.connection());
                let mut rng = StdRng::seed_from_u64(seed);
                purchase(&store, &catalog, &mut rng, 1, item_id, NOW).await
            }));
        }

        let mut bought = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(receipt) => {
                    assert!(receipt.balance >= 0);
                    bought += 1;
                }
                Err(Error::InsufficientFunds { .. }) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }

        assert_eq!(bought, 2);
        assert_eq!(inventory::balance(store.connection(), 1).await?, 50);
        Ok(())
    }
}
