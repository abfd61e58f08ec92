//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete,
//! button clicks, trade dialog messages, and the gate every command passes through.

/// Autocomplete handlers for shop items and catalog cards
pub mod autocomplete;
/// Trade handshake buttons (confirm, withdraw, accept, reject)
pub mod buttons;
/// Direct-message answers to the trade dialog
pub mod dialog;
/// Raw gateway events routed to the handlers above
pub mod events;
/// Ban check and first-contact registration before every command
pub mod gate;
