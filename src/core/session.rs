//! Ephemeral trade dialog sessions.
//!
//! Each user has at most one open dialog. Opening a new one replaces whatever was there, and every
//! session carries a generation number: a dialog step that validated input against an older
//! generation cannot write its result over a session that was replaced in the meantime.
//! Sessions are never persisted; a restart simply abandons open dialogs.

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::trace;

/// Where a user is in the three-step proposal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSession {
    /// Waiting for the id of a card the proposer owns
    AwaitingYourCard,
    /// Waiting for the counterparty's user id
    AwaitingPartner {
        /// Card the proposer offers
        offered_card: i64,
    },
    /// Waiting for the id of a card the counterparty owns
    AwaitingTheirCard {
        /// Card the proposer offers
        offered_card: i64,
        /// Resolved counterparty
        partner_id: i64,
    },
}

/// A session as read at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Generation of the session when it was read
    pub generation: u64,
    /// Dialog state
    pub state: TradeSession,
}

#[derive(Debug, Default)]
struct Sessions {
    by_user: HashMap<i64, SessionSnapshot>,
    next_generation: u64,
}

/// Open dialog sessions keyed by user id.
#[derive(Debug, Default)]
pub struct TradeSessions {
    inner: Mutex<Sessions>,
}

impl TradeSessions {
    /// Creates an empty session table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh dialog at [`TradeSession::AwaitingYourCard`], discarding any earlier one.
    pub async fn open(&self, user_id: i64) -> SessionSnapshot {
        let mut sessions = self.inner.lock().await;
        sessions.next_generation += 1;
        let snapshot = SessionSnapshot {
            generation: sessions.next_generation,
            state: TradeSession::AwaitingYourCard,
        };
        if sessions.by_user.insert(user_id, snapshot).is_some() {
            trace!(user_id, "Replaced an unfinished trade dialog");
        }
        snapshot
    }

    /// Current session of the user, if any.
    pub async fn get(&self, user_id: i64) -> Option<SessionSnapshot> {
        self.inner.lock().await.by_user.get(&user_id).copied()
    }

    /// Moves the session to `next` if it is still at `generation`.
    ///
    /// Returns `false` when the session was replaced or closed since it was read.
    pub async fn advance(&self, user_id: i64, generation: u64, next: TradeSession) -> bool {
        let mut sessions = self.inner.lock().await;
        match sessions.by_user.get_mut(&user_id) {
            Some(current) if current.generation == generation => {
                current.state = next;
                true
            }
            _ => false,
        }
    }

    /// Whether the user's session is still at `generation`.
    pub async fn is_current(&self, user_id: i64, generation: u64) -> bool {
        self.inner
            .lock()
            .await
            .by_user
            .get(&user_id)
            .is_some_and(|current| current.generation == generation)
    }

    /// Closes the session if it is still at `generation`.
    pub async fn finish(&self, user_id: i64, generation: u64) -> bool {
        let mut sessions = self.inner.lock().await;
        if sessions
            .by_user
            .get(&user_id)
            .is_some_and(|current| current.generation == generation)
        {
            sessions.by_user.remove(&user_id);
            return true;
        }
        false
    }

    /// Closes whatever session the user has. Returns whether there was one.
    pub async fn cancel(&self, user_id: i64) -> bool {
        self.inner.lock().await.by_user.remove(&user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_open_replaces_previous_session() {
        let sessions = TradeSessions::new();

        let first = sessions.open(1).await;
        assert!(
            sessions
                .advance(1, first.generation, TradeSession::AwaitingPartner { offered_card: 7 })
                .await
        );

        let second = sessions.open(1).await;
        assert_ne!(first.generation, second.generation);
        assert_eq!(
            sessions.get(1).await.unwrap().state,
            TradeSession::AwaitingYourCard
        );
    }

    #[tokio::test]
    async fn test_stale_generation_cannot_advance() {
        let sessions = TradeSessions::new();

        let stale = sessions.open(1).await;
        let fresh = sessions.open(1).await;

        assert!(
            !sessions
                .advance(1, stale.generation, TradeSession::AwaitingPartner { offered_card: 7 })
                .await
        );
        assert!(!sessions.finish(1, stale.generation).await);
        assert_eq!(sessions.get(1).await, Some(fresh));
    }

    #[tokio::test]
    async fn test_finish_and_cancel() {
        let sessions = TradeSessions::new();

        let snapshot = sessions.open(1).await;
        assert!(sessions.is_current(1, snapshot.generation).await);
        assert!(sessions.finish(1, snapshot.generation).await);
        assert!(!sessions.is_current(1, snapshot.generation).await);
        assert!(sessions.get(1).await.is_none());

        sessions.open(2).await;
        assert!(sessions.cancel(2).await);
        assert!(!sessions.cancel(2).await);
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let sessions = TradeSessions::new();

        let a = sessions.open(1).await;
        sessions.open(2).await;
        assert!(
            sessions
                .advance(1, a.generation, TradeSession::AwaitingPartner { offered_card: 3 })
                .await
        );
        assert_eq!(
            sessions.get(2).await.unwrap().state,
            TradeSession::AwaitingYourCard
        );
    }
}
