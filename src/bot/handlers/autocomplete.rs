//! Autocomplete handlers for Discord slash command parameters.
//!
//! Commands take numeric ids; these handlers let staff pick a garment or order by
//! name instead, while the value sent back is still the id.

use crate::{
    bot::{BotData, staff_context},
    errors::Error,
    repository::{OrderQuery, SortDirection},
    service::ActiveGarment,
};
use poise::serenity_prelude as serenity;

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// `(label, id)` pairs for active garments whose name contains `partial`, in
/// priority order.
#[must_use]
pub fn garment_choices(garments: &[ActiveGarment], partial: &str) -> Vec<(String, i64)> {
    let partial_lower = partial.to_lowercase();
    garments
        .iter()
        .filter(|g| g.garment.name.to_lowercase().contains(&partial_lower))
        .map(|g| {
            (
                format!("#{} {} ({})", g.garment.id, g.garment.name, g.due_label),
                g.garment.id,
            )
        })
        .take(MAX_CHOICES)
        .collect()
}

/// Suggests active garments by name.
///
/// Callers that are not staff get no suggestions.
pub async fn autocomplete_active_garment(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let staff = staff_context(ctx);
    let Ok(garments) = ctx.data().service.active_garments(&staff).await else {
        return Vec::new();
    };

    garment_choices(&garments, partial)
        .into_iter()
        .map(|(label, id)| serenity::AutocompleteChoice::new(label, id))
        .collect()
}

/// Suggests open orders whose number contains `partial`, newest first.
pub async fn autocomplete_open_order(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let staff = staff_context(ctx);
    let query = OrderQuery {
        search: Some(partial.to_string()),
        direction: SortDirection::Desc,
        limit: Some(MAX_CHOICES as u64),
        ..OrderQuery::default()
    };
    let Ok(page) = ctx.data().service.list_orders(&staff, &query).await else {
        return Vec::new();
    };

    page.items
        .into_iter()
        .map(|order| {
            serenity::AutocompleteChoice::new(
                format!("{} ({})", order.order_number, order.payment_status),
                order.id,
            )
        })
        .collect()
}
