//! Shop item entity - Something users can buy with coins.
//!
//! Items with `expires_at` in the past are pruned from the catalog the next time it is listed.
//! Card packs keep their candidate list in `shop_pack_cards`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a purchase does
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ShopItemKind {
    /// Clears the buyer's drop cooldown
    #[sea_orm(string_value = "cooldown_reset")]
    CooldownReset,
    /// Grants one card drawn uniformly from the pack's candidate list
    #[sea_orm(string_value = "card_pack")]
    CardPack,
}

/// Shop item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Price in coins, always positive
    pub price: i64,
    /// Effect of buying the item
    pub kind: ShopItemKind,
    /// Epoch seconds after which the item is gone, 0 = never expires
    pub expires_at: i64,
    /// Epoch seconds of creation
    pub created_at: i64,
}

impl Model {
    /// Whether the item is still on sale at `now`
    #[must_use]
    pub const fn is_active(&self, now: i64) -> bool {
        self.expires_at == 0 || self.expires_at > now
    }
}

/// Defines relationships between `ShopItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A card pack has many candidate entries
    #[sea_orm(has_many = "super::shop_pack_card::Entity")]
    PackCards,
}

impl Related<super::shop_pack_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
