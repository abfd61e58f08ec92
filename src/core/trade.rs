//! Trade negotiation: the proposal dialog and the confirmation handshake.
//!
//! The dialog collects three ids (own card, partner, partner's card) through a [`TradeSessions`]
//! entry and persists a `pending` trade at the end. The handshake then works on the persisted
//! trade only:
//!
//! 1. the proposer confirms, which sends the offer to the counterparty;
//! 2. the counterparty accepts or rejects;
//! 3. on accept, ownership of both cards is checked again under the write lock and the swap happens
//!    in the same transaction, or the trade is closed as stale.
//!
//! A terminal trade never changes again; any later call on it returns [`Error::AlreadyResolved`].

use crate::{
    core::{
        catalog::Catalog,
        inventory, moderation,
        notify::{Notice, Notifier, Outgoing, notify_best_effort},
        session::{SessionSnapshot, TradeSession, TradeSessions},
        store::Store,
    },
    entities::{Trade, TradeStatus, card, trade},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument, warn};

/// A trade together with the two cards it moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDetails {
    /// The persisted trade
    pub trade: trade::Model,
    /// Card the proposer gives away
    pub offered_card: card::Model,
    /// Card the proposer receives
    pub requested_card: card::Model,
}

/// Result of one accepted dialog input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogStep {
    /// The offered card was accepted; the partner's id is next
    PartnerRequested {
        /// Card the proposer offers
        offered_card: card::Model,
    },
    /// The partner was accepted; one of their card ids is next
    TheirCardRequested {
        /// Resolved counterparty
        partner_id: i64,
    },
    /// The trade was persisted as `pending` and the session closed
    Proposed(TradeDetails),
}

/// Parses a numeric id typed by the user.
///
/// # Errors
/// [`Error::Validation`] if the input is not an integer.
pub fn parse_id(input: &str) -> Result<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::validation(format!("'{}' is not a valid ID, use digits only", input.trim())))
}

/// Opens a trade dialog for `user_id`, replacing any unfinished one.
///
/// # Errors
/// [`Error::EmptyCollection`] if the user has nothing to offer.
#[instrument(skip(store, sessions))]
pub async fn start_trade(
    store: &Store,
    sessions: &TradeSessions,
    user_id: i64,
) -> Result<SessionSnapshot> {
    if inventory::collection_size(store.connection(), user_id).await? == 0 {
        return Err(Error::EmptyCollection { user_id });
    }
    Ok(sessions.open(user_id).await)
}

/// Abandons the user's open dialog. Nothing was persisted yet, so there is nothing to undo.
pub async fn cancel_session(sessions: &TradeSessions, user_id: i64) -> Result<()> {
    if sessions.cancel(user_id).await {
        Ok(())
    } else {
        Err(Error::NoSession)
    }
}

/// Feeds one line of user input into the open dialog.
///
/// A rejected input leaves the session where it was, so the user can simply try again.
///
/// # Errors
/// - [`Error::NoSession`] if no dialog is open, or it was replaced while this input was checked
/// - [`Error::Validation`] for non-numeric input
/// - [`Error::NotOwned`] if the named card is not held by the proposer (step 1) or partner (step 3)
/// - [`Error::SelfTrade`], [`Error::UserBanned`], [`Error::NotFound`] or [`Error::EmptyCollection`]
///   for an unusable partner
#[instrument(skip(store, catalog, sessions))]
pub async fn submit_dialog_input<K>(
    store: &Store,
    catalog: &K,
    sessions: &TradeSessions,
    user_id: i64,
    input: &str,
    now: i64,
) -> Result<DialogStep>
where
    K: Catalog,
{
    let snapshot = sessions.get(user_id).await.ok_or(Error::NoSession)?;
    let id = parse_id(input)?;
    let db = store.connection();

    match snapshot.state {
        TradeSession::AwaitingYourCard => {
            if !inventory::owns_card(db, user_id, id).await? {
                return Err(Error::NotOwned {
                    user_id,
                    card_id: id,
                });
            }
            let offered_card = lookup_card(catalog, id).await?;
            let next = TradeSession::AwaitingPartner { offered_card: id };
            if !sessions.advance(user_id, snapshot.generation, next).await {
                return Err(Error::NoSession);
            }
            Ok(DialogStep::PartnerRequested { offered_card })
        }
        TradeSession::AwaitingPartner { offered_card } => {
            if id == user_id {
                return Err(Error::SelfTrade);
            }
            if moderation::is_banned(db, id).await? {
                return Err(Error::UserBanned { user_id: id });
            }
            if inventory::find_user(db, id).await?.is_none() {
                return Err(Error::not_found("user", id));
            }
            if inventory::collection_size(db, id).await? == 0 {
                return Err(Error::EmptyCollection { user_id: id });
            }
            let next = TradeSession::AwaitingTheirCard {
                offered_card,
                partner_id: id,
            };
            if !sessions.advance(user_id, snapshot.generation, next).await {
                return Err(Error::NoSession);
            }
            Ok(DialogStep::TheirCardRequested { partner_id: id })
        }
        TradeSession::AwaitingTheirCard {
            offered_card,
            partner_id,
        } => {
            if !inventory::owns_card(db, partner_id, id).await? {
                return Err(Error::NotOwned {
                    user_id: partner_id,
                    card_id: id,
                });
            }
            let offered = lookup_card(catalog, offered_card).await?;
            let requested = lookup_card(catalog, id).await?;

            let write = store.begin_write().await?;
            if !sessions.is_current(user_id, snapshot.generation).await {
                return Err(Error::NoSession);
            }
            let trade_id = unused_trade_id(write.conn(), user_id, now).await?;
            let trade = trade::ActiveModel {
                id: Set(trade_id),
                proposer_id: Set(user_id),
                offered_card_id: Set(offered_card),
                partner_id: Set(partner_id),
                requested_card_id: Set(id),
                status: Set(TradeStatus::Pending),
                proposer_confirmed: Set(false),
                created_at: Set(now),
                resolved_at: Set(None),
            }
            .insert(write.conn())
            .await?;

            // Session closes only after the trade is durable, still under the write lock.
            let guard = write.commit_holding_lock().await?;
            sessions.finish(user_id, snapshot.generation).await;
            drop(guard);

            info!(
                "Trade {} proposed: user {} offers card {} for card {} of user {}",
                trade.id, user_id, offered_card, id, partner_id
            );
            Ok(DialogStep::Proposed(TradeDetails {
                trade,
                offered_card: offered,
                requested_card: requested,
            }))
        }
    }
}

/// Finds a trade by id.
pub async fn find_trade<C>(db: &C, trade_id: &str) -> Result<Option<trade::Model>>
where
    C: ConnectionTrait,
{
    Trade::find_by_id(trade_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Proposer confirms a pending trade; the counterparty receives the offer.
///
/// Confirming again re-sends the offer.
///
/// # Errors
/// [`Error::NotFound`], [`Error::AlreadyResolved`], or [`Error::NotParticipant`] if the caller is
/// not the proposer.
#[instrument(skip(store, catalog, notifier))]
pub async fn confirm_trade<K, N>(
    store: &Store,
    catalog: &K,
    notifier: &N,
    trade_id: &str,
    caller: i64,
) -> Result<TradeDetails>
where
    K: Catalog,
    N: Notifier,
{
    let details = load_details(store, catalog, trade_id).await?;

    let write = store.begin_write().await?;
    let current = lock_pending(write.conn(), trade_id).await?;
    if current.proposer_id != caller {
        return Err(not_participant(trade_id, caller));
    }
    let mut active: trade::ActiveModel = current.into();
    active.proposer_confirmed = Set(true);
    let trade = active.update(write.conn()).await?;
    write.commit().await?;

    info!("Trade {} confirmed by its proposer", trade_id);
    let proposer_name = username(store, caller).await;
    let offer = Notice::TradeOffer {
        trade_id: trade.id.clone(),
        proposer_id: caller,
        proposer_name,
        offered_card: details.offered_card.clone(),
        requested_card: details.requested_card.clone(),
    };
    notify_best_effort(notifier, &[Outgoing::new(trade.partner_id, offer)]).await;

    Ok(TradeDetails { trade, ..details })
}

/// Counterparty accepts: both cards change hands, or the trade is closed as stale.
///
/// # Errors
/// - [`Error::NotFound`], [`Error::AlreadyResolved`]
/// - [`Error::NotParticipant`] if the caller is not the counterparty
/// - [`Error::AwaitingConfirmation`] if the proposer has not confirmed yet
/// - [`Error::StaleTrade`] if either card left its holder; the trade is now `rejected`
#[instrument(skip(store, catalog, notifier))]
pub async fn accept_trade<K, N>(
    store: &Store,
    catalog: &K,
    notifier: &N,
    trade_id: &str,
    caller: i64,
    now: i64,
) -> Result<TradeDetails>
where
    K: Catalog,
    N: Notifier,
{
    let details = load_details(store, catalog, trade_id).await?;

    let write = store.begin_write().await?;
    let current = lock_answerable(write.conn(), trade_id, caller).await?;

    let proposer_holds =
        inventory::owns_card(write.conn(), current.proposer_id, current.offered_card_id).await?;
    let partner_holds =
        inventory::owns_card(write.conn(), current.partner_id, current.requested_card_id).await?;

    if !(proposer_holds && partner_holds) {
        let proposer_id = current.proposer_id;
        close(write.conn(), current, TradeStatus::Rejected, now).await?;
        write.commit().await?;

        warn!(
            "Trade {} closed as stale (proposer holds card: {}, partner holds card: {})",
            trade_id, proposer_holds, partner_holds
        );
        notify_best_effort(
            notifier,
            &[Outgoing::new(
                proposer_id,
                Notice::TradeStale {
                    trade_id: trade_id.to_string(),
                },
            )],
        )
        .await;
        return Err(Error::StaleTrade {
            trade_id: trade_id.to_string(),
        });
    }

    inventory::remove_card(write.conn(), current.proposer_id, current.offered_card_id).await?;
    inventory::remove_card(write.conn(), current.partner_id, current.requested_card_id).await?;
    inventory::grant_card(write.conn(), current.proposer_id, current.requested_card_id, now).await?;
    inventory::grant_card(write.conn(), current.partner_id, current.offered_card_id, now).await?;
    let trade = close(write.conn(), current, TradeStatus::Completed, now).await?;
    write.commit().await?;

    info!(
        "Trade {} completed: card {} to user {}, card {} to user {}",
        trade.id, trade.offered_card_id, trade.partner_id, trade.requested_card_id, trade.proposer_id
    );
    let partner_name = username(store, caller).await;
    let done = Notice::TradeCompleted {
        trade_id: trade.id.clone(),
        partner_name,
        received_card: details.requested_card.clone(),
    };
    notify_best_effort(notifier, &[Outgoing::new(trade.proposer_id, done)]).await;

    Ok(TradeDetails { trade, ..details })
}

/// Counterparty declines the offer. No card moves.
///
/// # Errors
/// Same as [`accept_trade`] except [`Error::StaleTrade`].
#[instrument(skip(store, catalog, notifier))]
pub async fn reject_trade<K, N>(
    store: &Store,
    catalog: &K,
    notifier: &N,
    trade_id: &str,
    caller: i64,
    now: i64,
) -> Result<TradeDetails>
where
    K: Catalog,
    N: Notifier,
{
    let details = load_details(store, catalog, trade_id).await?;

    let write = store.begin_write().await?;
    let current = lock_answerable(write.conn(), trade_id, caller).await?;
    let trade = close(write.conn(), current, TradeStatus::Rejected, now).await?;
    write.commit().await?;

    info!("Trade {} rejected by user {}", trade_id, caller);
    let partner_name = username(store, caller).await;
    let rejected = Notice::TradeRejected {
        trade_id: trade.id.clone(),
        partner_name,
    };
    notify_best_effort(notifier, &[Outgoing::new(trade.proposer_id, rejected)]).await;

    Ok(TradeDetails { trade, ..details })
}

/// Proposer takes back a pending trade. The counterparty hears about it only if the offer had
/// already been sent.
///
/// # Errors
/// [`Error::NotFound`], [`Error::AlreadyResolved`], or [`Error::NotParticipant`] if the caller is
/// not the proposer.
#[instrument(skip(store, catalog, notifier))]
pub async fn withdraw_trade<K, N>(
    store: &Store,
    catalog: &K,
    notifier: &N,
    trade_id: &str,
    caller: i64,
    now: i64,
) -> Result<TradeDetails>
where
    K: Catalog,
    N: Notifier,
{
    let details = load_details(store, catalog, trade_id).await?;

    let write = store.begin_write().await?;
    let current = lock_pending(write.conn(), trade_id).await?;
    if current.proposer_id != caller {
        return Err(not_participant(trade_id, caller));
    }
    let trade = close(write.conn(), current, TradeStatus::Rejected, now).await?;
    write.commit().await?;

    info!("Trade {} withdrawn by its proposer", trade_id);
    if trade.proposer_confirmed {
        let withdrawn = Notice::TradeWithdrawn {
            trade_id: trade.id.clone(),
        };
        notify_best_effort(notifier, &[Outgoing::new(trade.partner_id, withdrawn)]).await;
    }

    Ok(TradeDetails { trade, ..details })
}

async fn lookup_card<K>(catalog: &K, card_id: i64) -> Result<card::Model>
where
    K: Catalog,
{
    catalog
        .card(card_id)
        .await?
        .ok_or_else(|| Error::not_found("card", card_id))
}

/// Reads the trade and its cards outside the write lock.
async fn load_details<K>(store: &Store, catalog: &K, trade_id: &str) -> Result<TradeDetails>
where
    K: Catalog,
{
    let trade = find_trade(store.connection(), trade_id)
        .await?
        .ok_or_else(|| Error::not_found("trade", trade_id))?;
    let offered_card = lookup_card(catalog, trade.offered_card_id).await?;
    let requested_card = lookup_card(catalog, trade.requested_card_id).await?;
    Ok(TradeDetails {
        trade,
        offered_card,
        requested_card,
    })
}

/// Re-reads the trade inside the write and refuses terminal ones.
async fn lock_pending<C>(db: &C, trade_id: &str) -> Result<trade::Model>
where
    C: ConnectionTrait,
{
    let current = find_trade(db, trade_id)
        .await?
        .ok_or_else(|| Error::not_found("trade", trade_id))?;
    if current.status.is_terminal() {
        return Err(Error::AlreadyResolved {
            trade_id: trade_id.to_string(),
        });
    }
    Ok(current)
}

/// Like [`lock_pending`], and the caller must be the counterparty of a confirmed trade.
async fn lock_answerable<C>(db: &C, trade_id: &str, caller: i64) -> Result<trade::Model>
where
    C: ConnectionTrait,
{
    let current = lock_pending(db, trade_id).await?;
    if current.partner_id != caller {
        return Err(not_participant(trade_id, caller));
    }
    if !current.proposer_confirmed {
        return Err(Error::AwaitingConfirmation {
            trade_id: trade_id.to_string(),
        });
    }
    Ok(current)
}

async fn close<C>(
    db: &C,
    current: trade::Model,
    status: TradeStatus,
    now: i64,
) -> Result<trade::Model>
where
    C: ConnectionTrait,
{
    let mut active: trade::ActiveModel = current.into();
    active.status = Set(status);
    active.resolved_at = Set(Some(now));
    active.update(db).await.map_err(Into::into)
}

/// `"{proposer}_{now}"`, or the first free `"{proposer}_{now}_{n}"`.
async fn unused_trade_id<C>(db: &C, proposer_id: i64, now: i64) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = format!("{proposer_id}_{now}");
    let mut candidate = base.clone();
    let mut suffix = 1;
    while find_trade(db, &candidate).await?.is_some() {
        suffix += 1;
        candidate = format!("{base}_{suffix}");
    }
    Ok(candidate)
}

fn not_participant(trade_id: &str, user_id: i64) -> Error {
    Error::NotParticipant {
        trade_id: trade_id.to_string(),
        user_id,
    }
}

async fn username(store: &Store, user_id: i64) -> Option<String> {
    inventory::find_user(store.connection(), user_id)
        .await
        .ok()
        .flatten()
        .and_then(|user| user.username)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::core::catalog::SeaOrmCatalog;
    use crate::test_utils::{RecordingNotifier, seed_cards, setup_test_store};
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000;
    const ALICE: i64 = 100;
    const BOB: i64 = 200;
    const CAROL: i64 = 300;

    /// Runs the whole dialog and returns the proposed trade.
    async fn propose(
        store: &Store,
        sessions: &TradeSessions,
        proposer: i64,
        offered: i64,
        partner: i64,
        requested: i64,
        now: i64,
    ) -> Result<TradeDetails> {
        let catalog = SeaOrmCatalog::new(store.connection());
        start_trade(store, sessions, proposer).await?;
        submit_dialog_input(store, &catalog, sessions, proposer, &offered.to_string(), now).await?;
        submit_dialog_input(store, &catalog, sessions, proposer, &partner.to_string(), now).await?;
        match submit_dialog_input(store, &catalog, sessions, proposer, &requested.to_string(), now)
            .await?
        {
            DialogStep::Proposed(details) => Ok(details),
            other => panic!("unexpected dialog step {other:?}"),
        }
    }

    async fn setup_alice_and_bob() -> Result<Store> {
        let store = setup_test_store().await?;
        seed_cards(store.connection(), 9).await?;
        inventory::grant_card(store.connection(), ALICE, 7, NOW).await?;
        inventory::grant_card(store.connection(), BOB, 9, NOW).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_full_trade_swaps_cards() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let notifier = RecordingNotifier::default();
        let catalog = SeaOrmCatalog::new(store.connection());

        let proposed = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?;
        assert_eq!(proposed.trade.status, TradeStatus::Pending);
        assert_eq!(proposed.trade.id, format!("{ALICE}_{NOW}"));
        assert!(sessions.get(ALICE).await.is_none());

        confirm_trade(&store, &catalog, &notifier, &proposed.trade.id, ALICE).await?;
        let done = accept_trade(&store, &catalog, &notifier, &proposed.trade.id, BOB, NOW + 5).await?;

        assert_eq!(done.trade.status, TradeStatus::Completed);
        assert_eq!(done.trade.resolved_at, Some(NOW + 5));
        assert_eq!(inventory::collection(store.connection(), ALICE).await?, vec![9]);
        assert_eq!(inventory::collection(store.connection(), BOB).await?, vec![7]);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0].notice, Notice::TradeOffer { .. }) && sent[0].user_id == BOB);
        assert!(
            matches!(sent[1].notice, Notice::TradeCompleted { ref received_card, .. } if received_card.id == 9)
                && sent[1].user_id == ALICE
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_dialog_rejections_keep_session() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let catalog = SeaOrmCatalog::new(store.connection());
        inventory::register_user(store.connection(), CAROL, None, NOW).await?;

        start_trade(&store, &sessions, ALICE).await?;
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, "abc", NOW).await;
        assert!(matches!(step, Err(Error::Validation { .. })));
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, "9", NOW).await;
        assert!(matches!(step, Err(Error::NotOwned { card_id: 9, .. })));
        assert_eq!(
            sessions.get(ALICE).await.unwrap().state,
            TradeSession::AwaitingYourCard
        );

        submit_dialog_input(&store, &catalog, &sessions, ALICE, "7", NOW).await?;

        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, &ALICE.to_string(), NOW).await;
        assert!(matches!(step, Err(Error::SelfTrade)));
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, "999", NOW).await;
        assert!(matches!(step, Err(Error::NotFound { entity: "user", .. })));
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, &CAROL.to_string(), NOW).await;
        assert!(matches!(step, Err(Error::EmptyCollection { user_id: CAROL })));
        assert_eq!(
            sessions.get(ALICE).await.unwrap().state,
            TradeSession::AwaitingPartner { offered_card: 7 }
        );

        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, &BOB.to_string(), NOW).await?;
        assert_eq!(step, DialogStep::TheirCardRequested { partner_id: BOB });
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, "7", NOW).await;
        assert!(matches!(step, Err(Error::NotOwned { user_id: BOB, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_banned_partner_refused() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let catalog = SeaOrmCatalog::new(store.connection());
        moderation::ban(&store, &RecordingNotifier::default(), None, BOB, NOW).await?;

        start_trade(&store, &sessions, ALICE).await?;
        submit_dialog_input(&store, &catalog, &sessions, ALICE, "7", NOW).await?;
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, &BOB.to_string(), NOW).await;
        assert!(matches!(step, Err(Error::UserBanned { user_id: BOB })));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_trade_needs_cards() -> Result<()> {
        let store = setup_test_store().await?;
        let sessions = TradeSessions::new();

        let result = start_trade(&store, &sessions, ALICE).await;
        assert!(matches!(result, Err(Error::EmptyCollection { user_id: ALICE })));

        let catalog = SeaOrmCatalog::new(store.connection());
        let input = submit_dialog_input(&store, &catalog, &sessions, ALICE, "1", NOW).await;
        assert!(matches!(input, Err(Error::NoSession)));
        assert!(matches!(cancel_session(&sessions, ALICE).await, Err(Error::NoSession)));
        Ok(())
    }

    #[tokio::test]
    async fn test_trade_ids_get_suffix_on_collision() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();

        let first = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?;
        let second = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?;
        assert_eq!(first.trade.id, format!("{ALICE}_{NOW}"));
        assert_eq!(second.trade.id, format!("{ALICE}_{NOW}_2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_handshake_roles_and_order() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let notifier = RecordingNotifier::default();
        let catalog = SeaOrmCatalog::new(store.connection());
        let id = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;

        let early = accept_trade(&store, &catalog, &notifier, &id, BOB, NOW).await;
        assert!(matches!(early, Err(Error::AwaitingConfirmation { .. })));

        let stranger = confirm_trade(&store, &catalog, &notifier, &id, BOB).await;
        assert!(matches!(stranger, Err(Error::NotParticipant { user_id: BOB, .. })));

        confirm_trade(&store, &catalog, &notifier, &id, ALICE).await?;
        let own = accept_trade(&store, &catalog, &notifier, &id, ALICE, NOW).await;
        assert!(matches!(own, Err(Error::NotParticipant { user_id: ALICE, .. })));

        let missing = accept_trade(&store, &catalog, &notifier, "nope", BOB, NOW).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "trade", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_trade_is_final() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let notifier = RecordingNotifier::default();
        let catalog = SeaOrmCatalog::new(store.connection());
        let id = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;

        confirm_trade(&store, &catalog, &notifier, &id, ALICE).await?;
        let rejected = reject_trade(&store, &catalog, &notifier, &id, BOB, NOW).await?;
        assert_eq!(rejected.trade.status, TradeStatus::Rejected);

        for result in [
            accept_trade(&store, &catalog, &notifier, &id, BOB, NOW).await,
            reject_trade(&store, &catalog, &notifier, &id, BOB, NOW).await,
            confirm_trade(&store, &catalog, &notifier, &id, ALICE).await,
            withdraw_trade(&store, &catalog, &notifier, &id, ALICE, NOW).await,
        ] {
            assert!(matches!(result, Err(Error::AlreadyResolved { .. })));
        }

        assert_eq!(inventory::collection(store.connection(), ALICE).await?, vec![7]);
        assert_eq!(inventory::collection(store.connection(), BOB).await?, vec![9]);
        assert!(matches!(
            notifier.sent().last().unwrap().notice,
            Notice::TradeRejected { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_trade_is_closed() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let notifier = RecordingNotifier::default();
        let catalog = SeaOrmCatalog::new(store.connection());
        let id = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;
        confirm_trade(&store, &catalog, &notifier, &id, ALICE).await?;

        inventory::remove_card(store.connection(), ALICE, 7).await?;

        let result = accept_trade(&store, &catalog, &notifier, &id, BOB, NOW).await;
        assert!(matches!(result, Err(Error::StaleTrade { .. })));
        let trade = find_trade(store.connection(), &id).await?.unwrap();
        assert_eq!(trade.status, TradeStatus::Rejected);
        assert_eq!(inventory::collection(store.connection(), BOB).await?, vec![9]);
        assert!(inventory::collection(store.connection(), ALICE).await?.is_empty());

        let again = accept_trade(&store, &catalog, &notifier, &id, BOB, NOW).await;
        assert!(matches!(again, Err(Error::AlreadyResolved { .. })));
        assert_eq!(
            notifier.sent().last().unwrap(),
            &Outgoing::new(ALICE, Notice::TradeStale { trade_id: id })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_withdraw_notifies_only_after_offer() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let notifier = RecordingNotifier::default();
        let catalog = SeaOrmCatalog::new(store.connection());

        let quiet = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;
        let result = withdraw_trade(&store, &catalog, &notifier, &quiet, BOB, NOW).await;
        assert!(matches!(result, Err(Error::NotParticipant { .. })));
        withdraw_trade(&store, &catalog, &notifier, &quiet, ALICE, NOW).await?;
        assert!(notifier.sent().is_empty());

        let offered = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW + 1).await?.trade.id;
        confirm_trade(&store, &catalog, &notifier, &offered, ALICE).await?;
        withdraw_trade(&store, &catalog, &notifier, &offered, ALICE, NOW + 2).await?;
        assert_eq!(
            notifier.sent().last().unwrap(),
            &Outgoing::new(BOB, Notice::TradeWithdrawn { trade_id: offered })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_proposal_keeps_last_question() -> Result<()> {
        let store = setup_alice_and_bob().await?;
        let sessions = TradeSessions::new();
        let catalog = SeaOrmCatalog::new(store.connection());

        start_trade(&store, &sessions, ALICE).await?;
        submit_dialog_input(&store, &catalog, &sessions, ALICE, "7", NOW).await?;
        submit_dialog_input(&store, &catalog, &sessions, ALICE, &BOB.to_string(), NOW).await?;

        store.connection().execute_unprepared("DROP TABLE trades").await?;
        let step = submit_dialog_input(&store, &catalog, &sessions, ALICE, "9", NOW).await;

        assert!(matches!(step, Err(Error::Database(_))));
        assert_eq!(
            sessions.get(ALICE).await.unwrap().state,
            TradeSession::AwaitingTheirCard {
                offered_card: 7,
                partner_id: BOB
            }
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_duplicate_final_answers_propose_once() -> Result<()> {
        let store = Arc::new(setup_alice_and_bob().await?);
        let sessions = Arc::new(TradeSessions::new());
        {
            let catalog = SeaOrmCatalog::new(store.connection());
            start_trade(&store, &sessions, ALICE).await?;
            submit_dialog_input(&store, &catalog, &sessions, ALICE, "7", NOW).await?;
            submit_dialog_input(&store, &catalog, &sessions, ALICE, &BOB.to_string(), NOW).await?;
        }

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = Arc::clone(&store);
            let sessions = Arc::clone(&sessions);
            handles.push(tokio::spawn(async move {
                let catalog = SeaOrmCatalog::new(store.connection());
                submit_dialog_input(&store, &catalog, &sessions, ALICE, "9", NOW).await
            }));
        }

        let mut proposed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(DialogStep::Proposed(_)) => proposed += 1,
                Err(Error::NoSession) => {}
                other => panic!("unexpected result {other:?}"),
            }
        }

        assert_eq!(proposed, 1);
        assert_eq!(Trade::find().all(store.connection()).await?.len(), 1);
        assert!(sessions.get(ALICE).await.is_none());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_complete_once() -> Result<()> {
        let store = Arc::new(setup_alice_and_bob().await?);
        let sessions = TradeSessions::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let id = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;
        {
            let catalog = SeaOrmCatalog::new(store.connection());
            confirm_trade(&store, &catalog, notifier.as_ref(), &id, ALICE).await?;
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let notifier = Arc::clone(&notifier);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let catalog = SeaOrmCatalog::new(store.connection());
                accept_trade(&store, &catalog, notifier.as_ref(), &id, BOB, NOW).await
            }));
        }

        let mut completed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => completed += 1,
                Err(Error::AlreadyResolved { .. }) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(inventory::collection(store.connection(), ALICE).await?, vec![9]);
        assert_eq!(inventory::collection(store.connection(), BOB).await?, vec![7]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_card_in_two_trades_moves_once() -> Result<()> {
        let store = Arc::new(setup_alice_and_bob().await?);
        inventory::grant_card(store.connection(), CAROL, 5, NOW).await?;
        let sessions = TradeSessions::new();
        let notifier = Arc::new(RecordingNotifier::default());

        let to_bob = propose(&store, &sessions, ALICE, 7, BOB, 9, NOW).await?.trade.id;
        let to_carol = propose(&store, &sessions, ALICE, 7, CAROL, 5, NOW + 1).await?.trade.id;
        {
            let catalog = SeaOrmCatalog::new(store.connection());
            confirm_trade(&store, &catalog, notifier.as_ref(), &to_bob, ALICE).await?;
            confirm_trade(&store, &catalog, notifier.as_ref(), &to_carol, ALICE).await?;
        }

        let mut handles = Vec::new();
        for (id, partner) in [(to_bob, BOB), (to_carol, CAROL)] {
            let store = Arc::clone(&store);
            let notifier = Arc::clone(&notifier);
            handles.push(tokio::spawn(async move {
                let catalog = SeaOrmCatalog::new(store.connection());
                accept_trade(&store, &catalog, notifier.as_ref(), &id, partner, NOW + 2).await
            }));
        }

        let mut completed = 0;
        let mut stale = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => completed += 1,
                Err(Error::StaleTrade { .. }) => stale += 1,
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!((completed, stale), (1, 1));

        let db = store.connection();
        assert_eq!(inventory::collection_size(db, ALICE).await?, 1);
        assert_eq!(inventory::collection_size(db, BOB).await?, 1);
        assert_eq!(inventory::collection_size(db, CAROL).await?, 1);
        assert_eq!(
            inventory::card_count(db, BOB, 7).await? + inventory::card_count(db, CAROL, 7).await?,
            1
        );
        Ok(())
    }
}
