//! Discord delivery of notices as direct messages.

use crate::{
    bot::format,
    core::notify::{Notice, Notifier},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Custom id prefix of the button that confirms a proposed trade
pub const CONFIRM_PREFIX: &str = "trade_confirm:";
/// Custom id prefix of the button that withdraws a proposed trade
pub const WITHDRAW_PREFIX: &str = "trade_withdraw:";
/// Custom id prefix of the button that accepts an offer
pub const ACCEPT_PREFIX: &str = "trade_accept:";
/// Custom id prefix of the button that rejects an offer
pub const REJECT_PREFIX: &str = "trade_reject:";

/// Converts a Discord user id to the key used by the store.
pub fn user_key(id: serenity::UserId) -> Result<i64> {
    i64::try_from(id.get()).map_err(|_| Error::validation(format!("User id {id} is out of range")))
}

/// Converts a store key back to a Discord user id.
pub fn discord_user(user_id: i64) -> Result<serenity::UserId> {
    u64::try_from(user_id)
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::UserId::new)
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Confirm / withdraw buttons shown to the proposer.
#[must_use]
pub fn proposer_buttons(trade_id: &str) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("{CONFIRM_PREFIX}{trade_id}"))
            .label("✅ Confirm trade")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(format!("{WITHDRAW_PREFIX}{trade_id}"))
            .label("❌ Cancel")
            .style(serenity::ButtonStyle::Danger),
    ])]
}

/// Accept / reject buttons shown to the counterparty.
#[must_use]
pub fn partner_buttons(trade_id: &str) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("{ACCEPT_PREFIX}{trade_id}"))
            .label("✅ Accept trade")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(format!("{REJECT_PREFIX}{trade_id}"))
            .label("❌ Reject")
            .style(serenity::ButtonStyle::Danger),
    ])]
}

/// Sends notices through the bot's HTTP client.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
}

impl DiscordNotifier {
    /// Wraps the HTTP client of the running bot.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl Notifier for DiscordNotifier {
    async fn notify(&self, user_id: i64, notice: &Notice) -> Result<()> {
        let recipient = discord_user(user_id)?;
        let mut message = serenity::CreateMessage::new().content(format::notice(notice));
        if let Notice::TradeOffer { trade_id, .. } = notice {
            message = message.components(partner_buttons(trade_id));
        }
        recipient.direct_message(&*self.http, message).await?;
        Ok(())
    }
}
