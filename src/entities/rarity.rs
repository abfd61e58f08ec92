//! Rarity entity - A tier governing drop eligibility and display.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rarity database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rarities")]
pub struct Model {
    /// Unique rarity name (e.g. "Legendary")
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Display glyph shown next to the rarity
    pub glyph: String,
    /// Whether cards of this rarity take part in random drops
    pub droppable: bool,
}

/// `Rarity` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
