//! Plain-text rendering of engine results for Discord messages.

use crate::{
    core::{collection::CollectionSummary, notify::Notice, shop::ShopListing},
    entities::{ShopItemKind, card},
    errors::Error,
};

/// Longest message Discord accepts, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Splits `text` into messages of at most `limit` characters.
///
/// Breaks fall between lines where possible; a single line longer than `limit` is cut.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let mut rest = line;
        while !rest.is_empty() {
            let rest_len = rest.chars().count();
            if current_len + rest_len <= limit {
                current.push_str(rest);
                current_len += rest_len;
                break;
            }
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            let cut = rest
                .char_indices()
                .nth(limit)
                .map_or(rest.len(), |(index, _)| index);
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// `"Tumba (ID: 3)"`
#[must_use]
pub fn card_label(card: &card::Model) -> String {
    format!("{} (ID: {})", card.name, card.id)
}

/// `"5h 12m 3s"`, leaving out leading zero units.
#[must_use]
pub fn duration(total_secs: i64) -> String {
    let total = total_secs.max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// `"@name"` if the handle is known, `"user 123"` otherwise.
#[must_use]
pub fn user_label(user_id: i64, name: Option<&str>) -> String {
    name.map_or_else(|| format!("user {user_id}"), |name| format!("@{name}"))
}

/// A collection grouped by rarity, with counts for duplicates.
#[must_use]
pub fn collection(summary: &CollectionSummary) -> String {
    if summary.is_empty() {
        return "📭 No cards yet. Use `/get_card` to receive your first one!".to_string();
    }

    let mut out = String::new();
    for group in &summary.groups {
        out.push_str(&format!("{} **{}**\n", group.glyph, group.rarity));
        for entry in &group.entries {
            out.push_str(&format!("• {} (ID: {})", entry.name, entry.card_id));
            if entry.count > 1 {
                out.push_str(&format!(" x{}", entry.count));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&format!("Total cards: {}", summary.total));
    out
}

/// The shop listing.
#[must_use]
pub fn shop(listings: &[ShopListing]) -> String {
    if listings.is_empty() {
        return "🛒 The shop is empty right now.".to_string();
    }

    let mut out = String::from("🛒 **Shop**\n");
    for listing in listings {
        let item = &listing.item;
        let what = match item.kind {
            ShopItemKind::CooldownReset => "resets your card timer".to_string(),
            ShopItemKind::CardPack => format!("one random card out of {:?}", listing.pack_cards),
        };
        out.push_str(&format!(
            "\n`{}` **{}** - {} coins, {}",
            item.id, item.name, item.price, what
        ));
        if item.expires_at > 0 {
            out.push_str(&format!(" (until <t:{}:f>)", item.expires_at));
        }
    }
    out.push_str("\n\nBuy with `/buy <id>`.");
    out
}

/// Message text for a notice.
#[must_use]
pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::TradeOffer {
            proposer_id,
            proposer_name,
            offered_card,
            requested_card,
            ..
        } => format!(
            "🔄 {} offers you a trade:\n\nYou give: {}\nYou get: {}",
            user_label(*proposer_id, proposer_name.as_deref()),
            card_label(requested_card),
            card_label(offered_card)
        ),
        Notice::TradeRejected {
            trade_id,
            partner_name,
        } => format!(
            "❌ {} rejected your trade `{trade_id}`.",
            partner_name
                .as_deref()
                .map_or_else(|| "Your partner".to_string(), |name| format!("@{name}"))
        ),
        Notice::TradeCompleted {
            partner_name,
            received_card,
            ..
        } => format!(
            "✅ {} accepted your trade! You received {}.",
            partner_name
                .as_deref()
                .map_or_else(|| "Your partner".to_string(), |name| format!("@{name}")),
            card_label(received_card)
        ),
        Notice::TradeStale { trade_id } => format!(
            "⚠️ Trade `{trade_id}` was closed: one of the cards is no longer available."
        ),
        Notice::TradeWithdrawn { trade_id } => {
            format!("↩️ The offer `{trade_id}` was withdrawn by its proposer.")
        }
        Notice::CooldownReset => {
            "⏰ The administrator reset your card timer. You can get a new card now!".to_string()
        }
        Notice::CardGranted { card } => {
            format!("🎁 The administrator gave you a card: {}", card_label(card))
        }
        Notice::Banned => "⛔ You have been banned from this bot.".to_string(),
        Notice::Unbanned => "✅ Your ban has been lifted.".to_string(),
        Notice::Broadcast { text } => format!("📢 Message from the administrator:\n\n{text}"),
        Notice::NewUser { user_id, username } => format!(
            "👤 New user: {} (ID: {user_id})",
            user_label(*user_id, username.as_deref())
        ),
    }
}

/// What the user sees for a failed command.
///
/// Operational failures get a generic message; the details only go to the log.
#[must_use]
pub fn error(error: &Error) -> String {
    match error {
        Error::Validation { message } => format!("❌ {message}"),
        Error::NotOwned { card_id, .. } => format!("❌ Card {card_id} is not in that collection!"),
        Error::NotFound { entity, key } => format!("❌ No {entity} with ID {key}."),
        Error::CooldownActive { remaining_secs } => {
            format!("⏳ Next card available in {}.", duration(*remaining_secs))
        }
        Error::InsufficientFunds { balance, price } => {
            format!("❌ Not enough coins: it costs {price}, you have {balance}.")
        }
        Error::Expired { .. } => "❌ This item is no longer on sale.".to_string(),
        Error::StaleTrade { .. } => {
            "❌ Trade impossible: the cards are no longer available!".to_string()
        }
        Error::AlreadyResolved { .. } => {
            "❌ This trade offer was not found or is outdated!".to_string()
        }
        Error::EmptyCollection { .. } => "📭 There are no cards to trade!".to_string(),
        Error::SelfTrade => "❌ You cannot trade with yourself!".to_string(),
        Error::UserBanned { .. } => "❌ This user is banned!".to_string(),
        Error::NotParticipant { .. } => "❌ This trade is not yours to answer.".to_string(),
        Error::AwaitingConfirmation { .. } => {
            "❌ The proposer has not confirmed this trade yet.".to_string()
        }
        Error::NoSession => "❌ No trade in progress. Start one with `/trade`.".to_string(),
        _ => "⚠️ Something went wrong, please try again later.".to_string(),
    }
}
