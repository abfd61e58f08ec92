//! Card entity - Catalog entry for a collectible card.
//!
//! Cards are immutable once created. Ids come from an autoincrement column, so they are
//! assigned monotonically and never reused.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Card catalog database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    /// Unique, monotonically assigned card id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Name of the rarity this card belongs to (looked up in `rarities` at use time)
    pub rarity: String,
    /// Flavour text
    pub description: String,
    /// Image file reference
    pub image: String,
}

/// Cards have no enforced relationships; the rarity is resolved by name when needed
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
