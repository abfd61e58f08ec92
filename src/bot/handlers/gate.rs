//! Command gate: banned users are refused, everyone else is registered on first contact.

use crate::{
    bot::{
        Context,
        notifier::{DiscordNotifier, user_key},
        now,
    },
    core::moderation,
    errors::Result,
};
use tracing::warn;

/// Poise `command_check`. Returning `false` makes poise report `CommandCheckFailed`.
pub async fn command_allowed(ctx: Context<'_>) -> Result<bool> {
    let user_id = user_key(ctx.author().id)?;
    let data = ctx.data();
    let notifier = DiscordNotifier::new(ctx.serenity_context().http.clone());

    let allowed = moderation::admit(
        &data.store,
        &notifier,
        data.admin_id,
        user_id,
        Some(ctx.author().name.clone()),
        now(),
    )
    .await?;

    if !allowed {
        warn!("Banned user {} tried to use `{}`", user_id, ctx.command().name);
    }
    Ok(allowed)
}
