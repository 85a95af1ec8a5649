//! Bot layer - Discord-specific interface and command handlers
//!
//! Staff use slash commands to run the shop's actions. Every command builds a
//! [`StaffContext`] from the invoking Discord user and hands it to the
//! [`ShopService`], which does the authorization.

/// Discord command implementations (garments, orders, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::validation::FieldErrors,
    errors::{Error, Result},
    service::{ShopService, StaffContext},
};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Actions for the configured shop
    pub service: ShopService,
    /// Display names keyed by Discord user id
    pub nicknames: HashMap<String, String>,
}

impl BotData {
    /// Creates a new `BotData` instance for a shop service.
    #[must_use]
    pub const fn new(service: ShopService, nicknames: HashMap<String, String>) -> Self {
        Self { service, nicknames }
    }

    /// Nickname for a staff member, falling back to their id.
    #[must_use]
    pub fn display_name<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.nicknames.get(user_id).map_or(user_id, String::as_str)
    }
}

/// The caller of a command as a [`StaffContext`] for the configured shop.
#[must_use]
pub fn staff_context(ctx: poise::Context<'_, BotData, Error>) -> StaffContext {
    StaffContext::new(ctx.data().service.shop_id(), ctx.author().id.to_string())
}

/// One line per field error, for a chat reply.
#[must_use]
pub fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(_, message)| format!("❌ {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let reply = match &error {
                Error::Forbidden { .. } => "❌ You are not on this shop's staff list.".to_string(),
                Error::NotFound { .. }
                | Error::InvalidStageTransition { .. }
                | Error::InvalidInput { .. }
                | Error::AmountOutOfRange { .. } => {
                    format!("❌ {error}")
                }
                _ => format!("An error occurred: {error}"),
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::garments(),
                commands::pipeline(),
                commands::checkin(),
                commands::add_service(),
                commands::advance(),
                commands::set_stage(),
                commands::service_done(),
                commands::remove_service(),
                commands::balance(),
                commands::discount(),
                commands::pay(),
                commands::refund(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_errors_one_line_each() {
        let mut errors = FieldErrors::single("discountCents", "Discount cannot be negative");
        errors.add("amountCents", "Payment amount must be greater than zero");
        assert_eq!(
            format_field_errors(&errors),
            "❌ Payment amount must be greater than zero\n❌ Discount cannot be negative"
        );
    }
}
