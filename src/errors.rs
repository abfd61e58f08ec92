//! Unified error type for `CardBuddy`.
//!
//! Most variants are local, recoverable outcomes of a single command (a card the user does not own,
//! a cooldown that has not elapsed, a trade that was already answered). They are reported back to
//! the caller and never crash the bot. Only storage and framework failures are operational.

use thiserror::Error;

/// All errors that can occur in the card engine and the bot layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed user input, e.g. a non-numeric id typed into the trade dialog
    #[error("Invalid input: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A referenced record does not exist
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of record ("card", "user", "trade", "shop item")
        entity: &'static str,
        /// The key that was looked up
        key: String,
    },

    /// The user does not hold at least one unit of the card
    #[error("User {user_id} does not own card {card_id}")]
    NotOwned {
        /// User whose collection was checked
        user_id: i64,
        /// Card that was expected in the collection
        card_id: i64,
    },

    /// The drop cooldown has not elapsed yet
    #[error("Next card available in {remaining_secs} seconds")]
    CooldownActive {
        /// Seconds until the next drop is allowed
        remaining_secs: i64,
    },

    /// The balance does not cover the price
    #[error("Insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds {
        /// Balance at the time of the check
        balance: i64,
        /// Price that was requested
        price: i64,
    },

    /// The shop item expired between listing and purchase
    #[error("Shop item {item_id} has expired")]
    Expired {
        /// Expired shop item
        item_id: i64,
    },

    /// One of the traded cards left its holder before the counterparty accepted
    #[error("Trade {trade_id} can no longer be executed: the cards are no longer available")]
    StaleTrade {
        /// Trade that was closed
        trade_id: String,
    },

    /// The trade already reached a terminal status
    #[error("Trade {trade_id} was already resolved")]
    AlreadyResolved {
        /// Trade that was already closed
        trade_id: String,
    },

    /// No droppable rarity in the weight table has any card
    #[error("No droppable cards in the catalog")]
    CatalogEmpty,

    /// The user has no cards to offer or to trade for
    #[error("User {user_id} has no cards")]
    EmptyCollection {
        /// User with the empty collection
        user_id: i64,
    },

    /// A user tried to trade with themselves
    #[error("Cannot trade with yourself")]
    SelfTrade,

    /// The requested counterparty is on the ban list
    #[error("User {user_id} is banned")]
    UserBanned {
        /// Banned user
        user_id: i64,
    },

    /// The caller is not allowed to act on this trade in this role
    #[error("User {user_id} cannot act on trade {trade_id}")]
    NotParticipant {
        /// Trade that was addressed
        trade_id: String,
        /// User who tried to act
        user_id: i64,
    },

    /// The counterparty answered before the proposer confirmed
    #[error("Trade {trade_id} has not been confirmed by its proposer yet")]
    AwaitingConfirmation {
        /// Trade that is still unconfirmed
        trade_id: String,
    },

    /// Dialog input arrived without an open trade session
    #[error("No trade in progress")]
    NoSession,

    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Durable storage failed; the in-flight operation was rolled back
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with a displayable key.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error is an expected outcome the user should see verbatim.
    ///
    /// Everything else is an operational failure: it gets logged and the user only sees a
    /// generic message.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::CatalogEmpty
                | Self::Config { .. }
                | Self::Database(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::FrameworkError(_)
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::CooldownActive { remaining_secs: 60 }.to_string(),
            "Next card available in 60 seconds"
        );
        assert_eq!(
            Error::not_found("card", 7).to_string(),
            "card '7' not found"
        );
        assert_eq!(
            Error::InsufficientFunds {
                balance: 50,
                price: 100
            }
            .to_string(),
            "Insufficient funds: balance 50, price 100"
        );
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(Error::validation("abc").is_user_facing());
        assert!(Error::SelfTrade.is_user_facing());
        assert!(!Error::CatalogEmpty.is_user_facing());
        assert!(!Error::Database(sea_orm::DbErr::Custom("down".to_string())).is_user_facing());
    }
}
