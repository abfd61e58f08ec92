//! Outbound notifications to users.
//!
//! Engines take a [`Notifier`] and call [`notify_best_effort`] themselves once their write has been
//! committed and the write lock released. Delivery is best effort: a notice that cannot be
//! delivered is logged and dropped, the mutation that caused it stays committed.

use crate::{entities::card, errors::Result};
use std::future::Future;
use tracing::{debug, warn};

/// Something a user should hear about without having asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A confirmed trade offer awaiting the counterparty's answer
    TradeOffer {
        /// Trade to accept or reject
        trade_id: String,
        /// Who proposes the trade
        proposer_id: i64,
        /// Proposer's display handle, if known
        proposer_name: Option<String>,
        /// Card the counterparty would receive
        offered_card: card::Model,
        /// Card the counterparty would give away
        requested_card: card::Model,
    },
    /// The counterparty rejected the offer
    TradeRejected {
        /// Rejected trade
        trade_id: String,
        /// Counterparty's display handle, if known
        partner_name: Option<String>,
    },
    /// The counterparty accepted and the cards were swapped
    TradeCompleted {
        /// Completed trade
        trade_id: String,
        /// Counterparty's display handle, if known
        partner_name: Option<String>,
        /// Card the recipient received
        received_card: card::Model,
    },
    /// The counterparty accepted, but one of the cards had already left its holder
    TradeStale {
        /// Closed trade
        trade_id: String,
    },
    /// The proposer withdrew an offer the recipient had already seen
    TradeWithdrawn {
        /// Withdrawn trade
        trade_id: String,
    },
    /// An administrator cleared the drop cooldown
    CooldownReset,
    /// An administrator added a card to the collection
    CardGranted {
        /// Granted card
        card: card::Model,
    },
    /// The user was banned
    Banned,
    /// The user was unbanned
    Unbanned,
    /// Announcement the administrator sent to every user
    Broadcast {
        /// Announcement text
        text: String,
    },
    /// A user interacted with the bot for the first time (sent to the administrator)
    NewUser {
        /// The new user
        user_id: i64,
        /// Their display handle, if known
        username: Option<String>,
    },
}

/// A notice together with its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Recipient
    pub user_id: i64,
    /// What to tell them
    pub notice: Notice,
}

impl Outgoing {
    /// Addresses `notice` to `user_id`.
    #[must_use]
    pub const fn new(user_id: i64, notice: Notice) -> Self {
        Self { user_id, notice }
    }
}

/// Delivery channel for notices.
pub trait Notifier: Sync {
    /// Delivers one notice. Failures are not retried.
    fn notify(&self, user_id: i64, notice: &Notice) -> impl Future<Output = Result<()>> + Send;
}

/// Sends every notice, logging and swallowing delivery failures.
pub async fn notify_best_effort<N>(notifier: &N, outgoing: &[Outgoing])
where
    N: Notifier,
{
    for item in outgoing {
        match notifier.notify(item.user_id, &item.notice).await {
            Ok(()) => debug!(user_id = item.user_id, "Notice delivered"),
            Err(e) => warn!(
                "Failed to deliver notice to user {}: {} ({:?})",
                item.user_id, e, item.notice
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::RecordingNotifier;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn notify(&self, user_id: i64, _notice: &Notice) -> Result<()> {
            Err(Error::not_found("chat", user_id))
        }
    }

    #[tokio::test]
    async fn test_best_effort_delivers_in_order() {
        let notifier = RecordingNotifier::default();
        notify_best_effort(
            &notifier,
            &[
                Outgoing::new(1, Notice::Banned),
                Outgoing::new(2, Notice::CooldownReset),
            ],
        )
        .await;

        assert_eq!(
            notifier.sent(),
            vec![
                Outgoing::new(1, Notice::Banned),
                Outgoing::new(2, Notice::CooldownReset),
            ]
        );
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        notify_best_effort(&FailingNotifier, &[Outgoing::new(1, Notice::Unbanned)]).await;
    }
}
