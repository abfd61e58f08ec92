//! User entity - One record per player, created on first interaction and never deleted.
//!
//! The owned cards live in `user_cards`; this record only carries the identity, the optional
//! display handle and the drop cooldown timestamp.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External (chat platform) user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Display handle, refreshed whenever the user interacts
    pub username: Option<String>,
    /// Epoch seconds of the last successful drop, 0 = never
    pub last_drop: i64,
    /// Epoch seconds of the first interaction
    pub created_at: i64,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many card units
    #[sea_orm(has_many = "super::user_card::Entity")]
    UserCards,
}

impl Related<super::user_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
