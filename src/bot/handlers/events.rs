//! Routes gateway events that are not commands.

use crate::{
    bot::{
        BotData,
        handlers::{buttons, dialog},
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::error;

/// Poise `event_handler`: DM text goes to the trade dialog, button clicks to the handshake.
///
/// Handler failures are logged here; poise would otherwise only report them generically.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = dialog::handle_message(ctx, data, new_message).await {
                error!("Failed to handle dialog message: {:?}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Some(component) = interaction.as_message_component() {
                if let Err(e) = buttons::handle_component(ctx, data, component).await {
                    error!("Failed to handle button {}: {:?}", component.data.custom_id, e);
                }
            }
        }
        _ => {}
    }
    Ok(())
}
