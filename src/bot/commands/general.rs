//! General Discord commands - start, ping, and help.
//! These commands don't touch the game state beyond the registration done by the command gate.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Greets the user and lists what the bot can do.
    ///
    /// The command gate registers the user on their first command, so after `/start` other
    /// players can name them as a trade partner.
    #[poise::command(slash_command, prefix_command)]
    pub async fn start(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let welcome = format!(
            "👋 Welcome, {}!\n\n\
            Collect cards, earn coins and trade with other players.\n\
            • `/get_card` - receive a card (once every few hours)\n\
            • `/my_cards` - your collection\n\
            • `/trade` - trade cards\n\
            • `/shop` - spend your coins\n\n\
            Your user ID is `{}`. Share it so others can trade with you.",
            ctx.author().name,
            ctx.author().id
        );
        ctx.say(welcome).await?;
        Ok(())
    }

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**CardBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Cards**\n\
        • `/get_card` - Receive a random card and some coins. Available again after the cooldown.\n\
        • `/my_cards` - Shows your collection grouped by rarity.\n\
        • `/balance` - Shows your coins.\n\n\
        **Trading**\n\
        • `/trade` - Starts a trade. Answer the bot's questions in a direct message: \
        your card ID, your partner's user ID, then the ID of the card you want.\n\
        • `/trade_cancel` - Abandons the trade you are setting up.\n\n\
        **Shop**\n\
        • `/shop` - Lists the items on sale.\n\
        • `/buy <id>` - Buys an item.\n\n\
        **Utility Commands**\n\
        • `/start` - Registers you and shows your user ID.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
