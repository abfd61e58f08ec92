//! Inventory ledger - the only code that mutates collections, balances and drop timestamps.
//!
//! Functions are generic over the connection so callers can run them inside the transaction of a
//! [`WriteTxn`](crate::core::store::WriteTxn) together with their own validation. Nothing here
//! caches state: each call reads what the store has committed (or what the enclosing transaction
//! has written so far).

use crate::{
    entities::{Balance, User, UserCard, balance, user, user_card},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::debug;

/// Finds a user record.
pub async fn find_user<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Returns the user record, creating an empty one stamped with `now` if the user is new.
pub async fn ensure_user<C>(db: &C, user_id: i64, now: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_user(db, user_id).await? {
        return Ok(existing);
    }

    debug!(user_id, "Creating user record");
    let model = user::ActiveModel {
        id: Set(user_id),
        username: Set(None),
        last_drop: Set(0),
        created_at: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates the user on first interaction and keeps the display handle current.
///
/// Returns the record and whether it was created by this call.
pub async fn register_user<C>(
    db: &C,
    user_id: i64,
    username: Option<String>,
    now: i64,
) -> Result<(user::Model, bool)>
where
    C: ConnectionTrait,
{
    let created = find_user(db, user_id).await?.is_none();
    let existing = ensure_user(db, user_id, now).await?;

    if existing.username == username {
        return Ok((existing, created));
    }

    let mut active: user::ActiveModel = existing.into();
    active.username = Set(username);
    let updated = active.update(db).await?;
    Ok((updated, created))
}

/// Records the time of the last drop (0 clears the cooldown).
///
/// # Errors
/// [`Error::NotFound`] if the user has no record yet.
pub async fn set_last_drop<C>(db: &C, user_id: i64, timestamp: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let existing = find_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;
    let mut active: user::ActiveModel = existing.into();
    active.last_drop = Set(timestamp);
    active.update(db).await.map_err(Into::into)
}

/// Appends one unit of `card_id` to the user's collection, creating the user if needed.
///
/// Returns how many units of this card the user holds afterwards.
pub async fn grant_card<C>(db: &C, user_id: i64, card_id: i64, now: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    ensure_user(db, user_id, now).await?;

    user_card::ActiveModel {
        user_id: Set(user_id),
        card_id: Set(card_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(user_id, card_id, "Card granted");
    card_count(db, user_id, card_id).await
}

/// Removes exactly one unit of `card_id` (the oldest) from the user's collection.
///
/// # Errors
/// [`Error::NotOwned`] if the user holds no unit of the card.
pub async fn remove_card<C>(db: &C, user_id: i64, card_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let unit = UserCard::find()
        .filter(user_card::Column::UserId.eq(user_id))
        .filter(user_card::Column::CardId.eq(card_id))
        .order_by_asc(user_card::Column::Id)
        .one(db)
        .await?
        .ok_or(Error::NotOwned { user_id, card_id })?;

    unit.delete(db).await?;
    debug!(user_id, card_id, "Card removed");
    Ok(())
}

/// Number of units of `card_id` in the user's collection.
pub async fn card_count<C>(db: &C, user_id: i64, card_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    UserCard::find()
        .filter(user_card::Column::UserId.eq(user_id))
        .filter(user_card::Column::CardId.eq(card_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Whether the user holds at least one unit of `card_id`.
pub async fn owns_card<C>(db: &C, user_id: i64, card_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(card_count(db, user_id, card_id).await? > 0)
}

/// All owned card ids in the order they entered the collection, duplicates included.
pub async fn collection<C>(db: &C, user_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let units = UserCard::find()
        .filter(user_card::Column::UserId.eq(user_id))
        .order_by_asc(user_card::Column::Id)
        .all(db)
        .await?;
    Ok(units.into_iter().map(|unit| unit.card_id).collect())
}

/// Total number of card units the user owns.
pub async fn collection_size<C>(db: &C, user_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    UserCard::find()
        .filter(user_card::Column::UserId.eq(user_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Coin balance, 0 for users that never earned anything.
pub async fn balance<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(Balance::find_by_id(user_id)
        .one(db)
        .await?
        .map_or(0, |row| row.coins))
}

/// Adds `delta` to the balance, clamping the result at 0.
///
/// Over-debits are not rejected here: callers that must refuse insufficient funds check
/// `balance >= cost` themselves before calling. Returns the new balance.
pub async fn adjust_balance<C>(db: &C, user_id: i64, delta: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let existing = Balance::find_by_id(user_id).one(db).await?;
    let current = existing.as_ref().map_or(0, |row| row.coins);
    let new_balance = current.saturating_add(delta).max(0);

    match existing {
        Some(row) => {
            let mut active: balance::ActiveModel = row.into();
            active.coins = Set(new_balance);
            active.update(db).await?;
        }
        None => {
            balance::ActiveModel {
                user_id: Set(user_id),
                coins: Set(new_balance),
            }
            .insert(db)
            .await?;
        }
    }

    debug!(user_id, delta, new_balance, "Balance adjusted");
    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    const NOW: i64 = 1_700_000_000;

    #[tokio::test]
    async fn test_grant_creates_user_and_counts_duplicates() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(find_user(&db, 42).await?.is_none());
        assert_eq!(grant_card(&db, 42, 7, NOW).await?, 1);
        assert_eq!(grant_card(&db, 42, 7, NOW).await?, 2);
        assert_eq!(grant_card(&db, 42, 3, NOW).await?, 1);

        let user = find_user(&db, 42).await?;
        assert!(user.is_some_and(|u| u.last_drop == 0 && u.created_at == NOW));
        assert_eq!(collection(&db, 42).await?, vec![7, 7, 3]);
        assert_eq!(collection_size(&db, 42).await?, 3);
        assert_eq!(card_count(&db, 42, 7).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_card_takes_exactly_one_unit() -> Result<()> {
        let db = setup_test_db().await?;
        grant_card(&db, 1, 7, NOW).await?;
        grant_card(&db, 1, 9, NOW).await?;
        grant_card(&db, 1, 7, NOW).await?;

        remove_card(&db, 1, 7).await?;

        assert_eq!(collection(&db, 1).await?, vec![9, 7]);
        assert!(owns_card(&db, 1, 7).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_card_not_owned() -> Result<()> {
        let db = setup_test_db().await?;
        grant_card(&db, 1, 7, NOW).await?;

        let result = remove_card(&db, 1, 8).await;
        assert!(matches!(
            result,
            Err(Error::NotOwned {
                user_id: 1,
                card_id: 8
            })
        ));
        assert_eq!(collection(&db, 1).await?, vec![7]);
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_balance_clamps_at_zero() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(balance(&db, 5).await?, 0);
        assert_eq!(adjust_balance(&db, 5, 30).await?, 30);
        assert_eq!(adjust_balance(&db, 5, -10).await?, 20);
        assert_eq!(adjust_balance(&db, 5, -100).await?, 0);
        assert_eq!(balance(&db, 5).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_user_refreshes_handle() -> Result<()> {
        let db = setup_test_db().await?;

        let (user, created) = register_user(&db, 9, Some("alice".to_string()), NOW).await?;
        assert!(created);
        assert_eq!(user.username.as_deref(), Some("alice"));

        let (user, created) = register_user(&db, 9, Some("alice_b".to_string()), NOW + 60).await?;
        assert!(!created);
        assert_eq!(user.created_at, NOW);
        assert_eq!(user.username.as_deref(), Some("alice_b"));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_last_drop() -> Result<()> {
        let db = setup_test_db().await?;

        let missing = set_last_drop(&db, 3, 1_000).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "user", .. })));

        ensure_user(&db, 3, NOW).await?;
        let user = set_last_drop(&db, 3, 1_000).await?;
        assert_eq!(user.last_drop, 1_000);
        let user = set_last_drop(&db, 3, 0).await?;
        assert_eq!(user.last_drop, 0);
        Ok(())
    }
}
