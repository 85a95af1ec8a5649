//! Order actions: clients, discounts, payments and refunds.

use super::{ShopService, StaffContext};
use crate::{
    core::{
        discount::{OrderTotals, calculate_order_subtotal, validate_discount},
        money::{MAX_AMOUNT_CENTS, format_cents},
        payments::{PaymentSummary, apply_refund, calculate_payment_status, countable_payments},
        validation::{ActionResult, FieldErrors},
    },
    entities::{OrderStatus, PaymentRecordStatus, client, order},
    errors::{Error, Result},
    repository::{
        ClientRepository, NewClient, NewOrder, NewPayment, OrderQuery, OrderRepository,
        OrderWrite, Page, PaymentRepository,
    },
};
use serde::Serialize;
use tracing::{info, instrument, warn};

const ORDER_FIELD: &str = "orderId";
const AMOUNT_FIELD: &str = "amountCents";
const REFUND_FIELD: &str = "refundCents";

/// Stored totals of an order together with its settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBalance {
    /// Subtotal, discount, tax and total
    pub totals: OrderTotals,
    /// Paid, refunded and due amounts
    pub payments: PaymentSummary,
}

const fn stored_totals(order: &order::Model) -> OrderTotals {
    OrderTotals {
        subtotal_cents: order.subtotal_cents,
        discount_cents: order.discount_cents,
        tax_cents: order.tax_cents,
        total_cents: order.total_cents,
    }
}

pub(super) fn cancelled(order: &order::Model) -> Option<FieldErrors> {
    (order.status == OrderStatus::Cancelled)
        .then(|| FieldErrors::single(ORDER_FIELD, "Order is cancelled"))
}

impl ShopService {
    /// Registers a client.
    pub async fn create_client(
        &self,
        ctx: &StaffContext,
        new: NewClient,
    ) -> Result<ActionResult<client::Model>> {
        let shop_id = self.authorize(ctx)?;

        let mut errors = FieldErrors::new();
        if new.first_name.trim().is_empty() {
            errors.add("firstName", "First name is required");
        }
        if new.last_name.trim().is_empty() {
            errors.add("lastName", "Last name is required");
        }
        if let Err(errors) = errors.into_result() {
            return Ok(ActionResult::Invalid(errors));
        }

        self.repo
            .insert_client(shop_id, new)
            .await
            .map(ActionResult::Success)
    }

    /// Clients whose first or last name contains `search`.
    pub async fn find_clients(
        &self,
        ctx: &StaffContext,
        search: Option<&str>,
    ) -> Result<Vec<client::Model>> {
        let shop_id = self.authorize(ctx)?;
        self.repo.find_clients(shop_id, search).await
    }

    /// Opens an empty order for a client.
    #[instrument(skip(self, ctx, new), fields(shop_id = ctx.shop_id))]
    pub async fn create_order(&self, ctx: &StaffContext, new: NewOrder) -> Result<order::Model> {
        let shop_id = self.authorize(ctx)?;
        self.repo.insert_order(shop_id, new).await
    }

    /// Filtered, paginated order listing.
    pub async fn list_orders(
        &self,
        ctx: &StaffContext,
        query: &OrderQuery,
    ) -> Result<Page<order::Model>> {
        let shop_id = self.authorize(ctx)?;
        self.repo.find_orders(shop_id, query).await
    }

    /// Moves an order through its lifecycle. Cancelling hides its garments.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn set_order_status(
        &self,
        ctx: &StaffContext,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<order::Model> {
        let shop_id = self.authorize(ctx)?;
        let updated = self.repo.set_order_status(shop_id, order_id, status).await?;
        info!("Order {} is now {:?}", order_id, status);
        self.invalidate_garments(shop_id).await;
        Ok(updated)
    }

    /// Stored totals and current payment summary of an order.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn order_balance(&self, ctx: &StaffContext, order_id: i64) -> Result<OrderBalance> {
        let shop_id = self.authorize(ctx)?;
        let order = self.require_order(shop_id, order_id).await?;
        let payments = self.repo.find_payments(shop_id, order_id).await?;

        Ok(OrderBalance {
            totals: stored_totals(&order),
            payments: calculate_payment_status(order.total_cents, countable_payments(&payments))?,
        })
    }

    /// Validates a discount against the subtotal recomputed from line items, then
    /// stores the new totals and payment status.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn apply_discount(
        &self,
        ctx: &StaffContext,
        order_id: i64,
        discount_cents: i64,
    ) -> Result<ActionResult<OrderBalance>> {
        let shop_id = self.authorize(ctx)?;
        let order = self.require_order(shop_id, order_id).await?;
        if let Some(errors) = cancelled(&order) {
            return Ok(ActionResult::Invalid(errors));
        }

        let line_items = self.repo.find_order_line_items(shop_id, order_id).await?;
        let subtotal = calculate_order_subtotal(&line_items)?;
        if let Err(errors) = validate_discount(discount_cents, subtotal) {
            warn!("Rejected discount on order {}: {}", order_id, errors);
            return Ok(ActionResult::Invalid(errors));
        }

        let write = self
            .repo
            .recalculate_order(shop_id, order_id, discount_cents, self.tax_rate_bps)
            .await?;
        Ok(ActionResult::Success(balance_after_write(&write)))
    }

    /// Records a completed payment and the order's new payment status in one transaction.
    #[instrument(skip(self, ctx, method), fields(shop_id = ctx.shop_id))]
    pub async fn record_payment(
        &self,
        ctx: &StaffContext,
        order_id: i64,
        amount_cents: i64,
        method: &str,
    ) -> Result<ActionResult<OrderBalance>> {
        let shop_id = self.authorize(ctx)?;
        if amount_cents <= 0 {
            return Ok(ActionResult::Invalid(FieldErrors::single(
                AMOUNT_FIELD,
                "Payment amount must be greater than zero",
            )));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            return Ok(ActionResult::Invalid(FieldErrors::single(
                AMOUNT_FIELD,
                format!(
                    "Payment amount cannot exceed {}",
                    format_cents(MAX_AMOUNT_CENTS)
                ),
            )));
        }
        let order = self.require_order(shop_id, order_id).await?;
        if let Some(errors) = cancelled(&order) {
            return Ok(ActionResult::Invalid(errors));
        }

        let (_, write) = self
            .repo
            .record_payment(
                shop_id,
                NewPayment {
                    order_id,
                    amount_cents,
                    status: PaymentRecordStatus::Completed,
                    method: method.to_string(),
                    external_id: None,
                },
            )
            .await?;
        info!(
            "Recorded {} payment of {} on order {}",
            method,
            format_cents(amount_cents),
            order_id
        );
        Ok(ActionResult::Success(balance_after_write(&write)))
    }

    /// Refunds part or all of a captured payment.
    #[instrument(skip(self, ctx), fields(shop_id = ctx.shop_id))]
    pub async fn refund_payment(
        &self,
        ctx: &StaffContext,
        payment_id: i64,
        refund_cents: i64,
    ) -> Result<ActionResult<OrderBalance>> {
        let shop_id = self.authorize(ctx)?;
        let payment = self
            .repo
            .find_payment(shop_id, payment_id)
            .await?
            .ok_or_else(|| Error::not_found("payment", payment_id))?;

        let outcome = match apply_refund(&payment, refund_cents) {
            Ok(outcome) => outcome,
            Err(Error::InvalidAmount { .. }) => {
                let remaining = payment.amount_cents - payment.refunded_amount_cents;
                return Ok(ActionResult::Invalid(FieldErrors::single(
                    REFUND_FIELD,
                    format!(
                        "Refund must be between $0.01 and {} for this payment",
                        format_cents(remaining.max(0))
                    ),
                )));
            }
            Err(e) => return Err(e),
        };

        let (_, write) = self
            .repo
            .record_refund(shop_id, payment_id, outcome)
            .await?;
        info!(
            "Refunded {} of payment {} (now {:?})",
            format_cents(refund_cents),
            payment_id,
            outcome.status
        );
        Ok(ActionResult::Success(balance_after_write(&write)))
    }

    pub(super) async fn require_order(&self, shop_id: i64, order_id: i64) -> Result<order::Model> {
        self.repo
            .find_order(shop_id, order_id)
            .await?
            .ok_or_else(|| Error::not_found("order", order_id))
    }
}

/// Balance of an order as stored by a transactional write. Warns when the client is owed credit.
pub(super) fn balance_after_write(write: &OrderWrite) -> OrderBalance {
    if let Some(credit) = write.payments.credit_owed() {
        warn!(
            "Order {} is overpaid; {} credit owed to the client",
            write.order.id,
            format_cents(credit)
        );
    }
    OrderBalance {
        totals: stored_totals(&write.order),
        payments: write.payments,
    }
}
