//! Shared test utilities for `CardBuddy`.
//!
//! This module provides helpers for setting up in-memory databases, a recording notifier, and
//! catalog content with sensible defaults.

use crate::{
    core::{
        catalog,
        notify::{Notice, Notifier, Outgoing},
        store::Store,
    },
    entities,
    errors::Result,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::{Mutex, PoisonError};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
///
/// The pool is pinned to one connection: every connection to `sqlite::memory:` would otherwise
/// open its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Same as [`setup_test_db`], wrapped in a [`Store`].
pub async fn setup_test_store() -> Result<Store> {
    Ok(Store::new(setup_test_db().await?))
}

/// Creates `count` Common cards named `"Card {id}"`, so ids run from 1 to `count`.
///
/// The Common rarity is created as well.
pub async fn seed_cards(db: &DatabaseConnection, count: usize) -> Result<Vec<entities::card::Model>> {
    catalog::create_rarity(db, "Common", "🃏", true).await?;
    let mut cards = Vec::with_capacity(count);
    for n in 1..=count {
        cards.push(catalog::create_card(db, &format!("Card {n}"), "Common", "", "").await?);
    }
    Ok(cards)
}

/// [`Notifier`] that remembers every notice instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Outgoing>>,
}

impl RecordingNotifier {
    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<Outgoing> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: i64, notice: &Notice) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Outgoing::new(user_id, notice.clone()));
        Ok(())
    }
}
