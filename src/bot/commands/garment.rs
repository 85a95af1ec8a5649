//! Garment Discord commands - the work list, check-in, stage changes and services.

use crate::{core::priority::StagePipeline, entities::GarmentStage, service::ActiveGarment};

/// Most garments `/garments` will list in one message.
pub const MAX_LISTED: usize = 25;

/// Stage picker for `/set_stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum StageChoice {
    /// `New`
    #[name = "New"]
    New,
    /// `In Progress`
    #[name = "In Progress"]
    InProgress,
    /// `Ready For Pickup`
    #[name = "Ready For Pickup"]
    ReadyForPickup,
    /// `Done`
    #[name = "Done"]
    Done,
}

impl From<StageChoice> for GarmentStage {
    fn from(choice: StageChoice) -> Self {
        match choice {
            StageChoice::New => Self::New,
            StageChoice::InProgress => Self::InProgress,
            StageChoice::ReadyForPickup => Self::ReadyForPickup,
            StageChoice::Done => Self::Done,
        }
    }
}

/// One work-list line, e.g. `` `#12` **Navy suit** · In Progress · 50% · ⚠️ 2 days overdue ``.
#[must_use]
pub fn format_garment_line(item: &ActiveGarment) -> String {
    let garment = &item.garment;
    let progress = garment
        .progress
        .map_or_else(String::new, |p| format!(" · {p}%"));
    let marker = if item.is_overdue { "⚠️ " } else { "" };
    format!(
        "`#{}` **{}** · {}{} · {}{}",
        garment.id, garment.name, garment.stage, progress, marker, item.due_label
    )
}

/// Stage counts as a short multi-line summary.
#[must_use]
pub fn format_pipeline(pipeline: &StagePipeline) -> String {
    let mut lines = vec!["**Garment pipeline**".to_string()];
    lines.extend(
        GarmentStage::ALL
            .iter()
            .map(|stage| format!("• {}: {}", stage, pipeline.count(*stage))),
    );
    lines.push(format!("Active: {}", pipeline.active()));
    lines.join("\n")
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{MAX_LISTED, StageChoice, format_garment_line, format_pipeline};
    use crate::{
        bot::{BotData, format_field_errors, handlers::autocomplete, staff_context},
        core::{
            money::{format_cents, parse_dollars_to_cents},
            validation::ActionResult,
        },
        errors::{Error, Result},
        repository::NewService,
    };

    /// Lists active garments, most urgent first.
    ///
    /// Overdue garments come first, then those due today, then later dates, then
    /// garments without a due date.
    #[poise::command(slash_command, prefix_command)]
    pub async fn garments(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How many garments to show (default 15)"] limit: Option<u32>,
    ) -> Result<()> {
        let limit = usize::try_from(limit.unwrap_or(15))?.clamp(1, MAX_LISTED);
        let staff = staff_context(ctx);
        let active = ctx.data().service.active_garments(&staff).await?;

        if active.is_empty() {
            ctx.say("🧵 No active garments. Nice work!").await?;
            return Ok(());
        }

        let mut lines: Vec<String> = active.iter().take(limit).map(format_garment_line).collect();
        if active.len() > limit {
            lines.push(format!("…and {} more", active.len() - limit));
        }
        ctx.say(lines.join("\n")).await?;
        Ok(())
    }

    /// Shows how many garments are in each workflow stage.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pipeline(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let staff = staff_context(ctx);
        let pipeline = ctx.data().service.garment_pipeline(&staff).await?;
        ctx.say(format_pipeline(&pipeline)).await?;
        Ok(())
    }

    /// Checks a garment in on an order.
    #[poise::command(slash_command, prefix_command)]
    pub async fn checkin(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order the garment belongs to"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        order: i64,
        #[description = "Short description, e.g. Navy suit jacket"] name: String,
        #[description = "Promised pickup date (YYYY-MM-DD)"] due: Option<String>,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let result = ctx
            .data()
            .service
            .add_garment(&staff, order, &name, due.as_deref())
            .await?;

        match result {
            ActionResult::Success(garment) => {
                ctx.say(format!(
                    "✅ Checked in `#{}` **{}** on order {}",
                    garment.id, garment.name, garment.order_id
                ))
                .await?;
            }
            ActionResult::Invalid(errors) => {
                ctx.say(format_field_errors(&errors)).await?;
            }
        }
        Ok(())
    }

    /// Books a service on a garment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn add_service(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garment to work on"]
        #[autocomplete = "autocomplete::autocomplete_active_garment"]
        garment: i64,
        #[description = "Service name, e.g. Hem"] name: String,
        #[description = "Price per unit in dollars"] price: String,
        #[description = "Number of units (default 1)"] quantity: Option<i32>,
    ) -> Result<()> {
        let Ok(unit_price_cents) = parse_dollars_to_cents(&price) else {
            ctx.say(format!("❌ Invalid price '{price}': use dollars like 12.50"))
                .await?;
            return Ok(());
        };

        let staff = staff_context(ctx);
        let result = ctx
            .data()
            .service
            .add_service(
                &staff,
                NewService {
                    garment_id: garment,
                    name,
                    quantity: quantity.unwrap_or(1),
                    unit_price_cents,
                },
            )
            .await?;

        match result {
            ActionResult::Success(service) => {
                ctx.say(format!(
                    "✅ Added `#{}` {} × {} ({})",
                    service.id,
                    service.quantity,
                    service.name,
                    service
                        .line_total_cents()
                        .map_or_else(|| "out of range".to_string(), format_cents)
                ))
                .await?;
            }
            ActionResult::Invalid(errors) => {
                ctx.say(format_field_errors(&errors)).await?;
            }
        }
        Ok(())
    }

    /// Moves a garment to its next stage.
    #[poise::command(slash_command, prefix_command)]
    pub async fn advance(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garment to advance"]
        #[autocomplete = "autocomplete::autocomplete_active_garment"]
        garment: i64,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let updated = ctx
            .data()
            .service
            .advance_garment_stage(&staff, garment)
            .await?;

        ctx.say(format!(
            "✅ **{}** is now {} (by {})",
            updated.name,
            updated.stage,
            ctx.data().display_name(&staff.user_id)
        ))
        .await?;
        Ok(())
    }

    /// Puts a garment in any stage.
    #[poise::command(slash_command, prefix_command)]
    pub async fn set_stage(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garment to move"]
        #[autocomplete = "autocomplete::autocomplete_active_garment"]
        garment: i64,
        #[description = "New stage"] stage: StageChoice,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let updated = ctx
            .data()
            .service
            .set_garment_stage(&staff, garment, stage.into())
            .await?;

        ctx.say(format!("✅ **{}** is now {}", updated.name, updated.stage))
            .await?;
        Ok(())
    }

    /// Marks a service done, or not done again.
    #[poise::command(slash_command, prefix_command)]
    pub async fn service_done(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Service id"] service: i64,
        #[description = "Done (default true)"] done: Option<bool>,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let garment = ctx
            .data()
            .service
            .mark_service_done(&staff, service, done.unwrap_or(true))
            .await?;

        let progress = garment
            .progress
            .map_or_else(|| "no active services".to_string(), |p| format!("{p}% done"));
        ctx.say(format!("✅ **{}** is {}", garment.name, progress))
            .await?;
        Ok(())
    }

    /// Removes a service from the bill.
    ///
    /// The order total is recomputed; if the client already paid more than the new
    /// total, the credit owed is shown.
    #[poise::command(slash_command, prefix_command)]
    pub async fn remove_service(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Service id"] service: i64,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let removal = ctx.data().service.remove_service(&staff, service).await?;

        let mut reply = format!(
            "🗑️ Removed service from **{}**. Order total is now {}.",
            removal.garment.name,
            format_cents(removal.balance.totals.total_cents)
        );
        if let Some(credit) = removal.balance.payments.credit_owed() {
            reply.push_str(&format!(
                "\n⚠️ The client has overpaid; {} credit owed.",
                format_cents(credit)
            ));
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::garment;
    use chrono::{NaiveDate, Utc};

    fn item(progress: Option<i32>, due_label: &str, is_overdue: bool) -> ActiveGarment {
        ActiveGarment {
            garment: garment::Model {
                id: 12,
                shop_id: 1,
                order_id: 3,
                name: "Navy suit".to_string(),
                stage: GarmentStage::InProgress,
                due_date: NaiveDate::from_ymd_opt(2026, 5, 18),
                progress,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            due_label: due_label.to_string(),
            is_overdue,
        }
    }

    #[test]
    fn test_format_garment_line() {
        assert_eq!(
            format_garment_line(&item(Some(50), "2 days overdue", true)),
            "`#12` **Navy suit** · In Progress · 50% · ⚠️ 2 days overdue"
        );
        assert_eq!(
            format_garment_line(&item(None, "Due today", false)),
            "`#12` **Navy suit** · In Progress · Due today"
        );
    }

    #[test]
    fn test_format_pipeline_lists_every_stage() {
        let pipeline = StagePipeline {
            new: 2,
            in_progress: 1,
            ready_for_pickup: 0,
            done: 5,
        };
        let text = format_pipeline(&pipeline);
        assert!(text.contains("• Ready For Pickup: 0"));
        assert!(text.contains("• Done: 5"));
        assert!(text.ends_with("Active: 3"));
    }

    #[test]
    fn test_stage_choice_maps_to_stage() {
        assert_eq!(
            GarmentStage::from(StageChoice::ReadyForPickup),
            GarmentStage::ReadyForPickup
        );
    }
}
