//! Order Discord commands - balance, discounts, payments and refunds.
//!
//! Amounts are typed as dollar strings and converted to cents before they reach the
//! service; nothing here does arithmetic on money.

use crate::{core::money::format_cents, service::OrderBalance};

/// Multi-line balance summary for an order.
#[must_use]
pub fn format_balance(order_id: i64, balance: &OrderBalance) -> String {
    let totals = &balance.totals;
    let payments = &balance.payments;

    let mut lines = vec![
        format!("**Order {order_id}**"),
        format!("Subtotal: {}", format_cents(totals.subtotal_cents)),
    ];
    if totals.discount_cents > 0 {
        lines.push(format!("Discount: -{}", format_cents(totals.discount_cents)));
    }
    if totals.tax_cents > 0 {
        lines.push(format!("Tax: {}", format_cents(totals.tax_cents)));
    }
    lines.push(format!("Total: {}", format_cents(totals.total_cents)));

    let mut paid = format!("Paid: {}", format_cents(payments.total_paid));
    if payments.total_refunded > 0 {
        paid.push_str(&format!(
            " (refunded {})",
            format_cents(payments.total_refunded)
        ));
    }
    lines.push(paid);

    lines.push(match payments.credit_owed() {
        Some(credit) => format!(
            "Status: {} · {} credit owed",
            payments.payment_status,
            format_cents(credit)
        ),
        None => format!(
            "Status: {} · {} due",
            payments.payment_status,
            format_cents(payments.amount_due)
        ),
    });
    lines.join("\n")
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::format_balance;
    use crate::{
        bot::{BotData, format_field_errors, handlers::autocomplete, staff_context},
        core::{
            money::{format_cents, parse_dollars_to_cents},
            validation::ActionResult,
        },
        errors::{Error, Result},
    };

    const DEFAULT_METHOD: &str = "cash";

    /// Shows an order's totals and what is still owed.
    #[poise::command(slash_command, prefix_command)]
    pub async fn balance(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order to show"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        order: i64,
    ) -> Result<()> {
        let staff = staff_context(ctx);
        let balance = ctx.data().service.order_balance(&staff, order).await?;
        ctx.say(format_balance(order, &balance)).await?;
        Ok(())
    }

    /// Sets the discount on an order.
    ///
    /// The discount may not exceed the order subtotal.
    #[poise::command(slash_command, prefix_command)]
    pub async fn discount(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order to discount"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        order: i64,
        #[description = "Discount in dollars, e.g. 20 or 12.50"] amount: String,
    ) -> Result<()> {
        let Ok(discount_cents) = parse_dollars_to_cents(&amount) else {
            ctx.say(format!("❌ Invalid amount '{amount}': use dollars like 12.50"))
                .await?;
            return Ok(());
        };

        let staff = staff_context(ctx);
        let result = ctx
            .data()
            .service
            .apply_discount(&staff, order, discount_cents)
            .await?;

        match result {
            ActionResult::Success(balance) => {
                ctx.say(format!(
                    "✅ Discount of {} applied.\n{}",
                    format_cents(discount_cents),
                    format_balance(order, &balance)
                ))
                .await?;
            }
            ActionResult::Invalid(errors) => {
                ctx.say(format_field_errors(&errors)).await?;
            }
        }
        Ok(())
    }

    /// Records a payment against an order.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order being paid"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        order: i64,
        #[description = "Amount in dollars"] amount: String,
        #[description = "Payment method (default cash)"] method: Option<String>,
    ) -> Result<()> {
        let Ok(amount_cents) = parse_dollars_to_cents(&amount) else {
            ctx.say(format!("❌ Invalid amount '{amount}': use dollars like 12.50"))
                .await?;
            return Ok(());
        };

        let staff = staff_context(ctx);
        let method = method.as_deref().unwrap_or(DEFAULT_METHOD);
        let result = ctx
            .data()
            .service
            .record_payment(&staff, order, amount_cents, method)
            .await?;

        match result {
            ActionResult::Success(balance) => {
                ctx.say(format!(
                    "✅ {} {} payment recorded by {}.\n{}",
                    format_cents(amount_cents),
                    method,
                    ctx.data().display_name(&staff.user_id),
                    format_balance(order, &balance)
                ))
                .await?;
            }
            ActionResult::Invalid(errors) => {
                ctx.say(format_field_errors(&errors)).await?;
            }
        }
        Ok(())
    }

    /// Refunds part or all of a payment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn refund(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment id"] payment: i64,
        #[description = "Amount to refund in dollars"] amount: String,
    ) -> Result<()> {
        let Ok(refund_cents) = parse_dollars_to_cents(&amount) else {
            ctx.say(format!("❌ Invalid amount '{amount}': use dollars like 12.50"))
                .await?;
            return Ok(());
        };

        let staff = staff_context(ctx);
        let result = ctx
            .data()
            .service
            .refund_payment(&staff, payment, refund_cents)
            .await?;

        match result {
            ActionResult::Success(balance) => {
                ctx.say(format!(
                    "↩️ Refunded {} of payment {}. Order is now {} with {} due.",
                    format_cents(refund_cents),
                    payment,
                    balance.payments.payment_status,
                    format_cents(balance.payments.amount_due.max(0))
                ))
                .await?;
            }
            ActionResult::Invalid(errors) => {
                ctx.say(format_field_errors(&errors)).await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
