//! Ban list and administrator tools.
//!
//! The transport consults [`is_allowed`] before invoking any engine operation; engines themselves
//! never re-check the ban list (except the trade dialog, which refuses banned counterparties).
//! Only the administrator may call the mutating functions here; that check belongs to the transport.

use crate::{
    core::{
        catalog::Catalog,
        inventory,
        notify::{Notice, Notifier, Outgoing, notify_best_effort},
        store::Store,
    },
    entities::{BannedUser, User, banned_user, card, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashSet;
use tracing::{error, info, instrument};

/// Outcome of [`broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Users the announcement reached
    pub sent: usize,
    /// Users whose delivery failed
    pub failed: usize,
}

/// Whether the user is on the ban list.
pub async fn is_banned<C>(db: &C, user_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(BannedUser::find_by_id(user_id).one(db).await?.is_some())
}

/// Gate checked before any command: everyone not banned is allowed.
pub async fn is_allowed<C>(db: &C, user_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(!is_banned(db, user_id).await?)
}

/// Lets a caller through the gate: refuses banned users, registers everyone else on first contact.
///
/// Returns `false` for a banned user. A newly registered user is announced to the administrator.
#[instrument(skip(store, notifier))]
pub async fn admit<N>(
    store: &Store,
    notifier: &N,
    admin_id: Option<i64>,
    user_id: i64,
    username: Option<String>,
    now: i64,
) -> Result<bool>
where
    N: Notifier,
{
    if is_banned(store.connection(), user_id).await? {
        return Ok(false);
    }

    let write = store.begin_write().await?;
    let (user, created) = inventory::register_user(write.conn(), user_id, username, now).await?;
    write.commit().await?;

    if created {
        info!("Registered new user {}", user_id);
        if let Some(admin_id) = admin_id.filter(|id| *id != user_id) {
            let notice = Notice::NewUser {
                user_id,
                username: user.username,
            };
            notify_best_effort(notifier, &[Outgoing::new(admin_id, notice)]).await;
        }
    }
    Ok(true)
}

/// Puts `user_id` on the ban list and tells them.
///
/// # Errors
/// [`Error::Validation`] if the target is the administrator or already banned.
#[instrument(skip(store, notifier))]
pub async fn ban<N>(
    store: &Store,
    notifier: &N,
    admin_id: Option<i64>,
    user_id: i64,
    now: i64,
) -> Result<()>
where
    N: Notifier,
{
    if admin_id == Some(user_id) {
        return Err(Error::validation("The administrator cannot be banned"));
    }

    let write = store.begin_write().await?;
    if is_banned(write.conn(), user_id).await? {
        return Err(Error::validation(format!("User {user_id} is already banned")));
    }
    banned_user::ActiveModel {
        user_id: Set(user_id),
        banned_at: Set(now),
    }
    .insert(write.conn())
    .await?;
    write.commit().await?;

    info!("User {} banned", user_id);
    notify_best_effort(notifier, &[Outgoing::new(user_id, Notice::Banned)]).await;
    Ok(())
}

/// Removes `user_id` from the ban list and tells them.
///
/// # Errors
/// [`Error::Validation`] if the user is not banned.
#[instrument(skip(store, notifier))]
pub async fn unban<N>(store: &Store, notifier: &N, user_id: i64) -> Result<()>
where
    N: Notifier,
{
    let write = store.begin_write().await?;
    let result = BannedUser::delete_by_id(user_id).exec(write.conn()).await?;
    if result.rows_affected == 0 {
        return Err(Error::validation(format!("User {user_id} is not banned")));
    }
    write.commit().await?;

    info!("User {} unbanned", user_id);
    notify_best_effort(notifier, &[Outgoing::new(user_id, Notice::Unbanned)]).await;
    Ok(())
}

/// Adds one unit of a catalog card to a user's collection, creating the user if needed.
///
/// Returns the card and how many units the user holds now.
///
/// # Errors
/// [`Error::NotFound`] if the card is not in the catalog.
#[instrument(skip(store, catalog, notifier))]
pub async fn grant_card<K, N>(
    store: &Store,
    catalog: &K,
    notifier: &N,
    user_id: i64,
    card_id: i64,
    now: i64,
) -> Result<(card::Model, u64)>
where
    K: Catalog,
    N: Notifier,
{
    let card = catalog
        .card(card_id)
        .await?
        .ok_or_else(|| Error::not_found("card", card_id))?;

    let write = store.begin_write().await?;
    let copies = inventory::grant_card(write.conn(), user_id, card_id, now).await?;
    write.commit().await?;

    info!("Admin granted card {} to user {}", card_id, user_id);
    notify_best_effort(
        notifier,
        &[Outgoing::new(
            user_id,
            Notice::CardGranted { card: card.clone() },
        )],
    )
    .await;
    Ok((card, copies))
}

/// Sends an announcement to every registered user who is not banned.
///
/// Nothing is written, so no lock is taken. Each failed delivery is logged and counted.
///
/// # Errors
/// [`Error::Validation`] for an empty message.
#[instrument(skip(store, notifier, text))]
pub async fn broadcast<N>(store: &Store, notifier: &N, text: &str) -> Result<BroadcastReport>
where
    N: Notifier,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::validation("Enter a message to broadcast"));
    }

    let db = store.connection();
    let banned: HashSet<i64> = BannedUser::find()
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.user_id)
        .collect();
    let users = User::find().order_by_asc(user::Column::Id).all(db).await?;

    let notice = Notice::Broadcast {
        text: text.to_string(),
    };
    let mut report = BroadcastReport::default();
    for user in users.iter().filter(|user| !banned.contains(&user.id)) {
        match notifier.notify(user.id, &notice).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                error!("Broadcast to user {} failed: {}", user.id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Broadcast finished: {} sent, {} failed, {} banned skipped",
        report.sent,
        report.failed,
        banned.len()
    );
    Ok(report)
}

/// Clears a user's drop cooldown.
///
/// # Errors
/// [`Error::NotFound`] if the user never interacted with the bot.
#[instrument(skip(store, notifier))]
pub async fn reset_cooldown<N>(store: &Store, notifier: &N, user_id: i64) -> Result<()>
where
    N: Notifier,
{
    let write = store.begin_write().await?;
    if inventory::find_user(write.conn(), user_id).await?.is_none() {
        return Err(Error::not_found("user", user_id));
    }
    inventory::set_last_drop(write.conn(), user_id, 0).await?;
    write.commit().await?;

    info!("Admin reset the drop cooldown of user {}", user_id);
    notify_best_effort(notifier, &[Outgoing::new(user_id, Notice::CooldownReset)]).await;
    Ok(())
}

/// Grants (positive) or revokes (negative) coins. Revocations clamp at zero instead of failing.
#[instrument(skip(store))]
pub async fn adjust_coins(store: &Store, user_id: i64, delta: i64) -> Result<i64> {
    let write = store.begin_write().await?;
    let balance = inventory::adjust_balance(write.conn(), user_id, delta).await?;
    write.commit().await?;

    info!("Admin adjusted coins of user {} by {}: now {}", user_id, delta, balance);
    Ok(balance)
}
