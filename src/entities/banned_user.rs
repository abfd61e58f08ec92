//! Banned user entity - Set-valued ban list. Banning never deletes the user record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ban list database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banned_users")]
pub struct Model {
    /// Banned user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Epoch seconds when the ban was issued
    pub banned_at: i64,
}

/// `BannedUser` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
