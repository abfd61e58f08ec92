//! Framework-agnostic game engine.
//!
//! Nothing in here knows about Discord. Mutating operations go through [`store::Store`] so they are
//! serialized and atomic; notifications are handed to a [`notify::Notifier`] only after the write
//! has been committed.

pub mod catalog;
pub mod collection;
pub mod drop;
pub mod inventory;
pub mod moderation;
pub mod notify;
pub mod session;
pub mod shop;
pub mod store;
pub mod trade;
