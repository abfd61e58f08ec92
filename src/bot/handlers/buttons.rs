//! Button handlers for the trade handshake.
//!
//! Custom ids carry the trade id after one of the prefixes in [`crate::bot::notifier`]. A button on
//! a trade that can no longer change gets its components removed; other refusals are answered
//! privately and leave the message as it was.

use crate::{
    bot::{
        BotData, format,
        notifier::{
            ACCEPT_PREFIX, CONFIRM_PREFIX, DiscordNotifier, REJECT_PREFIX, WITHDRAW_PREFIX,
            user_key,
        },
        now,
    },
    core::{catalog::SeaOrmCatalog, moderation, trade},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// What a handshake button asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Proposer sends the offer
    Confirm,
    /// Proposer takes the trade back
    Withdraw,
    /// Counterparty swaps the cards
    Accept,
    /// Counterparty declines
    Reject,
}

impl ButtonAction {
    /// Splits a custom id into the action and the trade id. Unknown ids yield `None`.
    #[must_use]
    pub fn parse(custom_id: &str) -> Option<(Self, &str)> {
        [
            (CONFIRM_PREFIX, Self::Confirm),
            (WITHDRAW_PREFIX, Self::Withdraw),
            (ACCEPT_PREFIX, Self::Accept),
            (REJECT_PREFIX, Self::Reject),
        ]
        .into_iter()
        .find_map(|(prefix, action)| {
            custom_id
                .strip_prefix(prefix)
                .filter(|trade_id| !trade_id.is_empty())
                .map(|trade_id| (action, trade_id))
        })
    }
}

/// How the clicked message should be answered.
enum Reply {
    /// Replace the message text and its buttons
    Update(String, Vec<serenity::CreateActionRow>),
    /// Answer only the clicking user
    Private(String),
}

/// Handles one button click. Components that are not handshake buttons are ignored.
pub async fn handle_component(
    ctx: &serenity::Context,
    data: &BotData,
    component: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some((action, trade_id)) = ButtonAction::parse(&component.data.custom_id) else {
        debug!("Ignoring unknown component {}", component.data.custom_id);
        return Ok(());
    };
    let caller = user_key(component.user.id)?;

    let reply = if moderation::is_allowed(data.store.connection(), caller).await? {
        match run(ctx, data, action, trade_id, caller).await {
            Ok(reply) => reply,
            Err(e) => refusal(&e, trade_id, caller),
        }
    } else {
        Reply::Private("❌ You are banned from this bot.".to_string())
    };

    let response = match reply {
        Reply::Update(text, components) => serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .components(components),
        ),
        Reply::Private(text) => serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .ephemeral(true),
        ),
    };
    component.create_response(ctx, response).await?;
    Ok(())
}

async fn run(
    ctx: &serenity::Context,
    data: &BotData,
    action: ButtonAction,
    trade_id: &str,
    caller: i64,
) -> Result<Reply> {
    let store = &data.store;
    let catalog = SeaOrmCatalog::new(store.connection());
    let notifier = DiscordNotifier::new(ctx.http.clone());

    let reply = match action {
        ButtonAction::Confirm => {
            let details =
                trade::confirm_trade(store, &catalog, &notifier, trade_id, caller).await?;
            Reply::Update(
                format!(
                    "📨 Offer sent: {} for {}. Waiting for the answer.",
                    format::card_label(&details.offered_card),
                    format::card_label(&details.requested_card)
                ),
                vec![serenity::CreateActionRow::Buttons(vec![
                    serenity::CreateButton::new(format!("{WITHDRAW_PREFIX}{trade_id}"))
                        .label("❌ Cancel")
                        .style(serenity::ButtonStyle::Danger),
                ])],
            )
        }
        ButtonAction::Withdraw => {
            trade::withdraw_trade(store, &catalog, &notifier, trade_id, caller, now()).await?;
            Reply::Update("❌ Trade cancelled".to_string(), Vec::new())
        }
        ButtonAction::Accept => {
            let details =
                trade::accept_trade(store, &catalog, &notifier, trade_id, caller, now()).await?;
            Reply::Update(
                format!(
                    "🎉 Trade completed! You received {}.",
                    format::card_label(&details.offered_card)
                ),
                Vec::new(),
            )
        }
        ButtonAction::Reject => {
            trade::reject_trade(store, &catalog, &notifier, trade_id, caller, now()).await?;
            Reply::Update("❌ Trade rejected".to_string(), Vec::new())
        }
    };
    Ok(reply)
}

fn refusal(error: &Error, trade_id: &str, caller: i64) -> Reply {
    warn!("Button on trade {} refused for user {}: {}", trade_id, caller, error);
    match error {
        Error::AlreadyResolved { .. } | Error::StaleTrade { .. } | Error::NotFound { .. } => {
            Reply::Update(format::error(error), Vec::new())
        }
        _ => Reply::Private(format::error(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_ids() {
        assert_eq!(
            ButtonAction::parse("trade_accept:42_1700000000"),
            Some((ButtonAction::Accept, "42_1700000000"))
        );
        assert_eq!(
            ButtonAction::parse("trade_withdraw:42_1700000000_2"),
            Some((ButtonAction::Withdraw, "42_1700000000_2"))
        );
        assert_eq!(ButtonAction::parse("trade_reject:"), None);
        assert_eq!(ButtonAction::parse("shop_buy:42"), None);
    }
}
