//! Trade entity - A persisted one-for-one card swap proposal between two users.
//!
//! A trade is created `pending` by the proposer's final dialog step and moves to `completed` or
//! `rejected` exactly once. Terminal trades are never revisited.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a trade
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TradeStatus {
    /// Waiting for the proposer's confirmation and the counterparty's answer
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Declined, withdrawn, or closed because a card left its holder
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Cards were swapped
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl TradeStatus {
    /// Whether the trade can no longer change
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Trade database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trades")]
pub struct Model {
    /// `"{proposer_id}_{created_at}"`, with a `_{n}` suffix on collision
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User who proposed the trade
    pub proposer_id: i64,
    /// Card the proposer gives away
    pub offered_card_id: i64,
    /// Counterparty
    pub partner_id: i64,
    /// Card the proposer wants from the counterparty
    pub requested_card_id: i64,
    /// Current status
    pub status: TradeStatus,
    /// Whether the proposer confirmed and the offer went out to the counterparty
    pub proposer_confirmed: bool,
    /// Epoch seconds of creation
    pub created_at: i64,
    /// Epoch seconds of the terminal transition
    pub resolved_at: Option<i64>,
}

/// `Trade` has no enforced relationships; participants and cards are looked up by id
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
