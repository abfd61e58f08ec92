//! User card entity - One row per owned unit of a card.
//!
//! Duplicates are meaningful: three rows with the same `card_id` mean the user holds three copies.
//! The autoincrement `id` preserves the order in which cards entered the collection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Owned card unit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_cards")]
pub struct Model {
    /// Insertion-ordered row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this unit
    pub user_id: i64,
    /// Catalog card id
    pub card_id: i64,
}

/// Defines relationships between `UserCard` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each unit belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
