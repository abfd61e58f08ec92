//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Administrator commands
pub mod admin;

/// Drop, collection, and balance commands
pub mod cards;

/// General utility commands
pub mod general;

/// Shop commands
pub mod shop;

/// Trade dialog commands
pub mod trade;

// Export commands
pub use admin::*;
pub use cards::*;
pub use general::*;
pub use shop::*;
pub use trade::*;

use crate::{bot::BotData, errors::Error};

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        start(),
        help(),
        ping(),
        get_card(),
        my_cards(),
        balance(),
        trade(),
        trade_cancel(),
        shop(),
        buy(),
        admin_givecard(),
        admin_resettimer(),
        admin_coins(),
        admin_listcards(),
        admin_broadcast(),
        ban(),
        unban(),
    ]
}
