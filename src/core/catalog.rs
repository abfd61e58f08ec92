//! Card, rarity and shop catalogs.
//!
//! The drop, trade and shop engines read cards and rarities through the [`Catalog`] trait rather
//! than a concrete table, so tests can swap in a [`StaticCatalog`]. Admin content writes and the
//! seeding of an empty database from `config.toml` live here as well; they are plain validated
//! inserts with no concurrency hazard.

use crate::{
    config::game::GameConfig,
    entities::{
        Card, Rarity, ShopItem, ShopItemKind, card, rarity, shop_item, shop_pack_card,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use std::future::Future;
use tracing::{info, instrument};

/// Read-only view of the card and rarity catalogs.
pub trait Catalog: Sync {
    /// All rarities, ordered by name.
    fn rarities(&self) -> impl Future<Output = Result<Vec<rarity::Model>>> + Send;

    /// All cards, ordered by id.
    fn cards(&self) -> impl Future<Output = Result<Vec<card::Model>>> + Send;

    /// A single card by id.
    fn card(&self, card_id: i64) -> impl Future<Output = Result<Option<card::Model>>> + Send;
}

/// Cards whose rarity exists and is marked droppable.
///
/// Cards pointing at a rarity that is no longer in the catalog are left out of the pool but stay
/// ownable.
pub async fn droppable_cards<K>(catalog: &K) -> Result<Vec<card::Model>>
where
    K: Catalog,
{
    let rarities = catalog.rarities().await?;
    let cards = catalog.cards().await?;

    Ok(cards
        .into_iter()
        .filter(|card| {
            rarities
                .iter()
                .any(|rarity| rarity.name == card.rarity && rarity.droppable)
        })
        .collect())
}

/// [`Catalog`] backed by the database.
pub struct SeaOrmCatalog<'a, C> {
    conn: &'a C,
}

impl<'a, C> SeaOrmCatalog<'a, C>
where
    C: ConnectionTrait,
{
    /// Reads through `conn`, which may be a plain connection or an open transaction.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

impl<C> Catalog for SeaOrmCatalog<'_, C>
where
    C: ConnectionTrait,
{
    async fn rarities(&self) -> Result<Vec<rarity::Model>> {
        Rarity::find()
            .order_by_asc(rarity::Column::Name)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    async fn cards(&self) -> Result<Vec<card::Model>> {
        Card::find()
            .order_by_asc(card::Column::Id)
            .all(self.conn)
            .await
            .map_err(Into::into)
    }

    async fn card(&self, card_id: i64) -> Result<Option<card::Model>> {
        Card::find_by_id(card_id)
            .one(self.conn)
            .await
            .map_err(Into::into)
    }
}

/// In-memory [`Catalog`], used where a fixed catalog is enough.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    rarities: Vec<rarity::Model>,
    cards: Vec<card::Model>,
}

impl StaticCatalog {
    /// Adds a rarity.
    #[must_use]
    pub fn with_rarity(mut self, name: &str, droppable: bool) -> Self {
        self.rarities.push(rarity::Model {
            name: name.to_string(),
            glyph: String::new(),
            droppable,
        });
        self
    }

    /// Adds a card; its id is `existing cards + 1`.
    #[must_use]
    pub fn with_card(mut self, name: &str, rarity: &str) -> Self {
        let id = i64::try_from(self.cards.len()).unwrap_or(i64::MAX - 1) + 1;
        self.cards.push(card::Model {
            id,
            name: name.to_string(),
            rarity: rarity.to_string(),
            description: String::new(),
            image: String::new(),
        });
        self
    }
}

impl Catalog for StaticCatalog {
    async fn rarities(&self) -> Result<Vec<rarity::Model>> {
        Ok(self.rarities.clone())
    }

    async fn cards(&self) -> Result<Vec<card::Model>> {
        Ok(self.cards.clone())
    }

    async fn card(&self, card_id: i64) -> Result<Option<card::Model>> {
        Ok(self.cards.iter().find(|card| card.id == card_id).cloned())
    }
}

/// Creates a rarity.
///
/// # Errors
/// [`Error::Validation`] if the name is empty or already taken.
pub async fn create_rarity<C>(
    db: &C,
    name: &str,
    glyph: &str,
    droppable: bool,
) -> Result<rarity::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Rarity name cannot be empty"));
    }
    if Rarity::find_by_id(name.to_string()).one(db).await?.is_some() {
        return Err(Error::validation(format!("Rarity '{name}' already exists")));
    }

    rarity::ActiveModel {
        name: Set(name.to_string()),
        glyph: Set(glyph.to_string()),
        droppable: Set(droppable),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a card and assigns it the next id.
///
/// # Errors
/// [`Error::Validation`] if the name is empty.
pub async fn create_card<C>(
    db: &C,
    name: &str,
    rarity: &str,
    description: &str,
    image: &str,
) -> Result<card::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Card name cannot be empty"));
    }

    card::ActiveModel {
        name: Set(name.to_string()),
        rarity: Set(rarity.trim().to_string()),
        description: Set(description.to_string()),
        image: Set(image.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a shop item; card packs store their candidate list in order.
///
/// # Errors
/// [`Error::Validation`] if the name is empty, the price is not positive, or a card pack has no
/// candidate cards.
#[allow(clippy::too_many_arguments)]
pub async fn create_shop_item<C>(
    db: &C,
    name: &str,
    price: i64,
    kind: ShopItemKind,
    pack_cards: &[i64],
    expires_at: i64,
    now: i64,
) -> Result<shop_item::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Shop item name cannot be empty"));
    }
    if price <= 0 {
        return Err(Error::validation(format!("Price must be positive, got {price}")));
    }
    if kind == ShopItemKind::CardPack && pack_cards.is_empty() {
        return Err(Error::validation("A card pack needs at least one card"));
    }

    let item = shop_item::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        kind: Set(kind),
        expires_at: Set(expires_at),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if kind == ShopItemKind::CardPack {
        for &card_id in pack_cards {
            shop_pack_card::ActiveModel {
                shop_item_id: Set(item.id),
                card_id: Set(card_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(item)
}

/// Every card in the catalog, ordered by id.
pub async fn list_cards<C>(db: &C) -> Result<Vec<card::Model>>
where
    C: ConnectionTrait,
{
    SeaOrmCatalog::new(db).cards().await
}

/// What [`seed_catalog`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Newly created rarities
    pub rarities: usize,
    /// Newly created cards
    pub cards: usize,
    /// Newly created shop items
    pub shop_items: usize,
}

/// Seeds the catalog from the game configuration.
///
/// Rarities are added when missing. Cards and shop items are only inserted into an empty table,
/// so edits made at runtime are never overwritten on restart.
#[instrument(skip(db, config))]
pub async fn seed_catalog<C>(db: &C, config: &GameConfig, now: i64) -> Result<SeedSummary>
where
    C: ConnectionTrait,
{
    let mut summary = SeedSummary::default();

    for cfg_rarity in &config.rarities {
        if Rarity::find_by_id(cfg_rarity.name.clone())
            .one(db)
            .await?
            .is_some()
        {
            continue;
        }
        create_rarity(db, &cfg_rarity.name, &cfg_rarity.glyph, cfg_rarity.droppable).await?;
        summary.rarities += 1;
    }

    if Card::find().count(db).await? == 0 {
        for cfg_card in &config.cards {
            create_card(
                db,
                &cfg_card.name,
                &cfg_card.rarity,
                &cfg_card.description,
                &cfg_card.image,
            )
            .await?;
            summary.cards += 1;
        }
    }

    if ShopItem::find().count(db).await? == 0 {
        for cfg_item in &config.shop_items {
            create_shop_item(
                db,
                &cfg_item.name,
                cfg_item.price,
                cfg_item.kind,
                &cfg_item.cards,
                cfg_item.expires_at,
                now,
            )
            .await?;
            summary.shop_items += 1;
        }
    }

    info!(
        "Catalog seeded: {} rarities, {} cards, {} shop items",
        summary.rarities, summary.cards, summary.shop_items
    );
    Ok(summary)
}
