//! Balance entity - Coin balance per user. A missing row means a balance of 0.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Balance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    /// Owner of the balance
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Coins, never negative
    pub coins: i64,
}

/// `Balance` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
