//! Shop pack card entity - One candidate entry of a card pack.
//!
//! A card listed twice has twice the chance of being drawn.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Card pack candidate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_pack_cards")]
pub struct Model {
    /// Insertion-ordered row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Pack this entry belongs to
    pub shop_item_id: i64,
    /// Candidate card id
    pub card_id: i64,
}

/// Defines relationships between `ShopPackCard` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one shop item
    #[sea_orm(
        belongs_to = "super::shop_item::Entity",
        from = "Column::ShopItemId",
        to = "super::shop_item::Column::Id"
    )]
    ShopItem,
}

impl Related<super::shop_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
