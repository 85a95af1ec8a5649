//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't touch the shop's data.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Threadline Help**\n\
        Amounts are typed in dollars, e.g. `45` or `12.50`.\n\n\
        **Garments**\n\
        • `/garments [limit]` - Active garments, most urgent first.\n\
        • `/pipeline` - How many garments are in each stage.\n\
        • `/checkin <order> <name> [due]` - Check a garment in on an order.\n\
        • `/add_service <garment> <name> <price> [quantity]` - Book a service.\n\
        • `/advance <garment>` - Move a garment to its next stage.\n\
        • `/set_stage <garment> <stage>` - Put a garment in any stage.\n\
        • `/service_done <service> [done]` - Mark a service done or not done.\n\
        • `/remove_service <service>` - Remove a service from the bill.\n\n\
        **Orders**\n\
        • `/balance <order>` - Totals and what is still owed.\n\
        • `/discount <order> <amount>` - Set the order discount.\n\
        • `/pay <order> <amount> [method]` - Record a payment.\n\
        • `/refund <payment> <amount>` - Refund part of a payment.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
