//! Trade dialog answers typed in direct messages.
//!
//! Only users with an open dialog are handled; any other DM is ignored. A rejected answer is
//! reported and the same question stays open.

use crate::{
    bot::{
        BotData, format,
        notifier::{proposer_buttons, user_key},
        now, send_long,
    },
    core::{
        catalog::SeaOrmCatalog,
        collection, inventory, moderation,
        trade::{self, DialogStep, TradeDetails},
    },
    errors::Result,
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Handles one incoming message, ignoring everything that is not a dialog answer.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    if message.author.bot || message.guild_id.is_some() || message.content.starts_with('!') {
        return Ok(());
    }
    let user_id = user_key(message.author.id)?;
    if data.sessions.get(user_id).await.is_none() {
        return Ok(());
    }

    let db = data.store.connection();
    if !moderation::is_allowed(db, user_id).await? {
        data.sessions.cancel(user_id).await;
        debug!("Dropped trade dialog of banned user {}", user_id);
        return Ok(());
    }

    let catalog = SeaOrmCatalog::new(db);
    let step = match trade::submit_dialog_input(
        &data.store,
        &catalog,
        &data.sessions,
        user_id,
        &message.content,
        now(),
    )
    .await
    {
        Ok(step) => step,
        Err(e) => {
            warn!("Dialog input of user {} refused: {}", user_id, e);
            message.channel_id.say(ctx, format::error(&e)).await?;
            return Ok(());
        }
    };

    let (text, components) = match step {
        DialogStep::PartnerRequested { offered_card } => (
            format!(
                "✅ You offer {}.\n\n👤 Enter the ID of the user you want to trade with:",
                format::card_label(&offered_card)
            ),
            Vec::new(),
        ),
        DialogStep::TheirCardRequested { partner_id } => {
            let summary = collection::collection_summary(
                db,
                &catalog,
                &data.drop_settings.weights,
                partner_id,
            )
            .await?;
            let partner = inventory::find_user(db, partner_id)
                .await?
                .and_then(|user| user.username);
            let text = format!(
                "Collection of {}:\n\n{}\n\n🔄 Enter the ID of the card you want in return:",
                format::user_label(partner_id, partner.as_deref()),
                format::collection(&summary)
            );
            (text, Vec::new())
        }
        DialogStep::Proposed(details) => {
            let partner = inventory::find_user(db, details.trade.partner_id)
                .await?
                .and_then(|user| user.username);
            (
                proposal(&details, partner.as_deref()),
                proposer_buttons(&details.trade.id),
            )
        }
    };
    send_long(ctx, message.channel_id, &text, components).await
}

fn proposal(details: &TradeDetails, partner: Option<&str>) -> String {
    format!(
        "📋 **Trade proposal**\n\nYou give: {}\nYou receive: {}\nPartner: {}\n\nConfirm the trade?",
        format::card_label(&details.offered_card),
        format::card_label(&details.requested_card),
        format::user_label(details.trade.partner_id, partner)
    )
}
