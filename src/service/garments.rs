//! Garment actions: the prioritized work list, stage changes and service completion.

use super::orders::{balance_after_write, cancelled};
use super::{OrderBalance, ShopService, StaffContext, garments_tag};
use crate::{
    core::{
        dates::{due_date_label, is_overdue, parse_due_date},
        money::{MAX_AMOUNT_CENTS, format_cents},
        priority::{StagePipeline, count_by_stage, sort_active_garments},
        validation::{ActionResult, FieldErrors},
    },
    entities::{GarmentStage, garment, garment_service},
    errors::{Error, Result},
    repository::{
        GarmentQuery, GarmentRepository, NewGarment, NewService, Page, ServiceChange,
        ServiceUpdate,
    },
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

/// A garment on the active work list, with its due label for the shop's today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGarment {
    /// The stored garment
    #[serde(flatten)]
    pub garment: garment::Model,
    /// "3 days overdue", "Due today", "No due date", ...
    pub due_label: String,
    /// Due date is before today
    pub is_overdue: bool,
}

/// Result of removing a service: the garment's new progress and the order's new balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRemoval {
    /// Garment with recomputed progress
    pub garment: garment::Model,
    /// Order totals and payment status after the removal
    pub balance: OrderBalance,
}

impl ShopService {
    /// Active garments, most urgent first, labelled for the shop's current day.
    pub async fn active_garments(&self, ctx: &StaffContext) -> Result<Vec<ActiveGarment>> {
        self.active_garments_on(ctx, self.today()).await
    }

    /// Same as [`Self::active_garments`] for an explicit `today`.
    ///
    /// The unsorted list is cached per shop; sorting and labels are always recomputed
    /// so a cached list never carries yesterday's labels.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn active_garments_on(
        &self,
        ctx: &StaffContext,
        today: NaiveDate,
    ) -> Result<Vec<ActiveGarment>> {
        let shop_id = self.authorize(ctx)?;
        let tag = garments_tag(shop_id);
        let garments = self
            .cache
            .get_or_try_insert_with(&tag, &[tag.as_str()], || {
                self.repo.find_active_garments(shop_id)
            })
            .await?;

        Ok(sort_active_garments(garments, today)
            .into_iter()
            .map(|garment| {
                let due_label = due_date_label(garment.due_date, today);
                let is_overdue = is_overdue(garment.due_date, today);
                ActiveGarment {
                    garment,
                    due_label,
                    is_overdue,
                }
            })
            .collect())
    }

    /// Garment counts per stage, excluding cancelled orders.
    pub async fn garment_pipeline(&self, ctx: &StaffContext) -> Result<StagePipeline> {
        let shop_id = self.authorize(ctx)?;
        let garments = self.repo.find_all_garments(shop_id).await?;
        Ok(count_by_stage(&garments))
    }

    /// Filtered, paginated garment listing.
    pub async fn list_garments(
        &self,
        ctx: &StaffContext,
        query: &GarmentQuery,
    ) -> Result<Page<garment::Model>> {
        let shop_id = self.authorize(ctx)?;
        self.repo.find_garments(shop_id, query).await
    }

    /// Checks a garment in on an order. `due_date` is `YYYY-MM-DD` or RFC 3339.
    #[instrument(skip(self, ctx, name, due_date), fields(shop_id = ctx.shop_id))]
    pub async fn add_garment(
        &self,
        ctx: &StaffContext,
        order_id: i64,
        name: &str,
        due_date: Option<&str>,
    ) -> Result<ActionResult<garment::Model>> {
        let shop_id = self.authorize(ctx)?;

        let mut errors = FieldErrors::new();
        if name.trim().is_empty() {
            errors.add("name", "Garment name is required");
        }
        let due_date = match parse_due_date(due_date, self.tz) {
            Ok(date) => date,
            Err(Error::InvalidDate { .. }) => {
                errors.add("dueDate", "Due date must be a date like 2026-05-20");
                None
            }
            Err(e) => return Err(e),
        };
        if let Err(errors) = errors.into_result() {
            return Ok(ActionResult::Invalid(errors));
        }
        let order = self.require_order(shop_id, order_id).await?;
        if let Some(errors) = cancelled(&order) {
            return Ok(ActionResult::Invalid(errors));
        }

        let garment = self
            .repo
            .insert_garment(
                shop_id,
                NewGarment {
                    order_id,
                    name: name.to_string(),
                    due_date,
                },
            )
            .await?;
        self.invalidate_garments(shop_id).await;
        Ok(ActionResult::Success(garment))
    }

    /// Books a service on a garment. The garment's progress and the order totals are
    /// stored in the same transaction.
    #[instrument(skip(self, ctx, new), fields(shop_id = ctx.shop_id, garment_id = new.garment_id))]
    pub async fn add_service(
        &self,
        ctx: &StaffContext,
        new: NewService,
    ) -> Result<ActionResult<garment_service::Model>> {
        let shop_id = self.authorize(ctx)?;

        let mut errors = FieldErrors::new();
        if new.name.trim().is_empty() {
            errors.add("name", "Service name is required");
        }
        if new.quantity <= 0 {
            errors.add("quantity", "Quantity must be at least 1");
        }
        if new.unit_price_cents < 0 {
            errors.add("unitPriceCents", "Price cannot be negative");
        } else if new.unit_price_cents > MAX_AMOUNT_CENTS {
            errors.add(
                "unitPriceCents",
                format!("Price cannot exceed {}", format_cents(MAX_AMOUNT_CENTS)),
            );
        } else if new.quantity > 0
            && i64::from(new.quantity)
                .checked_mul(new.unit_price_cents)
                .is_none_or(|total| total > MAX_AMOUNT_CENTS)
        {
            errors.add(
                "quantity",
                format!(
                    "Quantity times price cannot exceed {}",
                    format_cents(MAX_AMOUNT_CENTS)
                ),
            );
        }
        if let Err(errors) = errors.into_result() {
            return Ok(ActionResult::Invalid(errors));
        }
        let garment = self.require_garment(shop_id, new.garment_id).await?;
        let order = self.require_order(shop_id, garment.order_id).await?;
        if let Some(errors) = cancelled(&order) {
            return Ok(ActionResult::Invalid(errors));
        }

        let write = self
            .repo
            .apply_service_change(shop_id, ServiceChange::Add(new), self.tax_rate_bps)
            .await?;
        self.invalidate_garments(shop_id).await;
        Ok(ActionResult::Success(write.service))
    }

    /// Moves a garment to the next stage of the workflow.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn advance_garment_stage(
        &self,
        ctx: &StaffContext,
        garment_id: i64,
    ) -> Result<garment::Model> {
        let shop_id = self.authorize(ctx)?;
        let garment = self.require_garment(shop_id, garment_id).await?;
        let next = garment
            .stage
            .next()
            .ok_or(Error::InvalidStageTransition { id: garment_id })?;

        let updated = self
            .repo
            .update_garment_stage(shop_id, garment_id, next)
            .await?;
        info!(
            "Garment {} moved from {} to {}",
            garment_id, garment.stage, updated.stage
        );
        self.invalidate_garments(shop_id).await;
        Ok(updated)
    }

    /// Puts a garment in any stage, including back to an earlier one.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn set_garment_stage(
        &self,
        ctx: &StaffContext,
        garment_id: i64,
        stage: GarmentStage,
    ) -> Result<garment::Model> {
        let shop_id = self.authorize(ctx)?;
        let updated = self
            .repo
            .update_garment_stage(shop_id, garment_id, stage)
            .await?;
        self.invalidate_garments(shop_id).await;
        Ok(updated)
    }

    /// Marks a service done (or not done) and returns the garment with new progress.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn mark_service_done(
        &self,
        ctx: &StaffContext,
        service_id: i64,
        done: bool,
    ) -> Result<garment::Model> {
        let shop_id = self.authorize(ctx)?;
        let change = ServiceChange::Update {
            service_id,
            update: ServiceUpdate {
                is_done: Some(done),
                is_removed: None,
            },
        };
        let write = self
            .repo
            .apply_service_change(shop_id, change, self.tax_rate_bps)
            .await?;
        self.invalidate_garments(shop_id).await;
        Ok(write.garment)
    }

    /// Soft-deletes a service and stores the recomputed progress, order totals and payment
    /// status in one transaction.
    ///
    /// Removing a service from a paid order can leave it overpaid.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn remove_service(
        &self,
        ctx: &StaffContext,
        service_id: i64,
    ) -> Result<ServiceRemoval> {
        let shop_id = self.authorize(ctx)?;
        let change = ServiceChange::Update {
            service_id,
            update: ServiceUpdate {
                is_done: None,
                is_removed: Some(true),
            },
        };
        let write = self
            .repo
            .apply_service_change(shop_id, change, self.tax_rate_bps)
            .await?;
        self.invalidate_garments(shop_id).await;
        Ok(ServiceRemoval {
            garment: write.garment,
            balance: balance_after_write(&write.order),
        })
    }

    async fn require_garment(&self, shop_id: i64, garment_id: i64) -> Result<garment::Model> {
        self.repo
            .find_garment(shop_id, garment_id)
            .await?
            .ok_or_else(|| Error::not_found("garment", garment_id))
    }
}
