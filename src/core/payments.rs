//! Payment status calculation.
//!
//! Pure arithmetic over already-fetched payment records. The caller decides which
//! payments to pass in; [`countable_payments`] applies the default policy.

use crate::{
    entities::{PaymentRecordStatus, payment},
    errors::{Error, Result},
};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Settlement state of an order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing received yet
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Some money received, some still due
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Settled exactly
    #[sea_orm(string_value = "paid")]
    Paid,
    /// More received than the order now costs; the shop owes a credit
    #[sea_orm(string_value = "overpaid")]
    Overpaid,
}

impl PaymentStatus {
    /// Wire name (`"unpaid"`, `"partial"`, `"paid"`, `"overpaid"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Overpaid => "overpaid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two amounts of a payment that matter for a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentAmounts {
    /// Amount received in cents
    pub amount_cents: i64,
    /// Amount refunded in cents
    pub refunded_amount_cents: i64,
}

impl From<&payment::Model> for PaymentAmounts {
    fn from(p: &payment::Model) -> Self {
        Self {
            amount_cents: p.amount_cents,
            refunded_amount_cents: p.refunded_amount_cents,
        }
    }
}

/// Result of [`calculate_payment_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    /// Sum of all payment amounts
    pub total_paid: i64,
    /// Sum of all refunds
    pub total_refunded: i64,
    /// `total_paid - total_refunded`
    pub net_paid: i64,
    /// `order_total - net_paid`; negative is a credit owed to the client
    pub amount_due: i64,
    /// Settlement state
    pub payment_status: PaymentStatus,
}

impl PaymentSummary {
    /// Credit owed back to the client, if the order is overpaid.
    #[must_use]
    pub const fn credit_owed(&self) -> Option<i64> {
        if self.amount_due < 0 {
            self.amount_due.checked_neg()
        } else {
            None
        }
    }
}

/// Computes paid, refunded, net and due amounts for an order and classifies it.
///
/// An order total of zero is valid (every service removed after payment); any money
/// still held then shows up as `overpaid` with a negative `amount_due`. Sums that do
/// not fit in an `i64` fail with [`Error::AmountOutOfRange`].
pub fn calculate_payment_status<I>(order_total_cents: i64, payments: I) -> Result<PaymentSummary>
where
    I: IntoIterator,
    I::Item: Into<PaymentAmounts>,
{
    let (total_paid, total_refunded) = payments
        .into_iter()
        .map(Into::<PaymentAmounts>::into)
        .try_fold((0_i64, 0_i64), |(paid, refunded), p| {
            Some((
                paid.checked_add(p.amount_cents)?,
                refunded.checked_add(p.refunded_amount_cents)?,
            ))
        })
        .ok_or_else(|| Error::out_of_range("payments"))?;

    let net_paid = total_paid
        .checked_sub(total_refunded)
        .ok_or_else(|| Error::out_of_range("net paid"))?;
    let amount_due = order_total_cents
        .checked_sub(net_paid)
        .ok_or_else(|| Error::out_of_range("amount due"))?;

    let payment_status = if net_paid <= 0 {
        PaymentStatus::Unpaid
    } else if net_paid > order_total_cents {
        PaymentStatus::Overpaid
    } else if net_paid == order_total_cents {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };

    Ok(PaymentSummary {
        total_paid,
        total_refunded,
        net_paid,
        amount_due,
        payment_status,
    })
}

/// Default counting policy: completed and (partially) refunded payments only.
pub fn countable_payments(payments: &[payment::Model]) -> impl Iterator<Item = &payment::Model> {
    payments
        .iter()
        .filter(|p| p.status.counts_toward_balance())
}

/// Refund bookkeeping computed by [`apply_refund`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundOutcome {
    /// New cumulative refunded amount
    pub refunded_amount_cents: i64,
    /// New payment status
    pub status: PaymentRecordStatus,
}

/// Validates a refund against a payment and returns its new refund state.
///
/// The refund must be positive, the payment must have been captured, and the
/// cumulative refund may not exceed the original amount.
pub fn apply_refund(payment: &payment::Model, refund_cents: i64) -> Result<RefundOutcome> {
    if refund_cents <= 0 || !payment.status.counts_toward_balance() {
        return Err(Error::InvalidAmount {
            cents: refund_cents,
        });
    }

    let refunded_amount_cents = payment
        .refunded_amount_cents
        .checked_add(refund_cents)
        .filter(|total| *total <= payment.amount_cents)
        .ok_or(Error::InvalidAmount {
            cents: refund_cents,
        })?;

    let status = if refunded_amount_cents == payment.amount_cents {
        PaymentRecordStatus::Refunded
    } else {
        PaymentRecordStatus::PartiallyRefunded
    };

    Ok(RefundOutcome {
        refunded_amount_cents,
        status,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Utc;

    const fn paid(amount_cents: i64, refunded_amount_cents: i64) -> PaymentAmounts {
        PaymentAmounts {
            amount_cents,
            refunded_amount_cents,
        }
    }

    fn payment_model(amount: i64, refunded: i64, status: PaymentRecordStatus) -> payment::Model {
        payment::Model {
            id: 1,
            shop_id: 1,
            order_id: 1,
            amount_cents: amount,
            refunded_amount_cents: refunded,
            status,
            method: "card".to_string(),
            external_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_total_no_payments_is_unpaid() {
        let summary = calculate_payment_status(0, Vec::<PaymentAmounts>::new()).unwrap();
        assert_eq!(summary.total_paid, 0);
        assert_eq!(summary.total_refunded, 0);
        assert_eq!(summary.net_paid, 0);
        assert_eq!(summary.amount_due, 0);
        assert_eq!(summary.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_zero_total_with_payment_is_overpaid() {
        let summary = calculate_payment_status(0, [paid(100, 0)]).unwrap();
        assert_eq!(summary.net_paid, 100);
        assert_eq!(summary.amount_due, -100);
        assert_eq!(summary.payment_status, PaymentStatus::Overpaid);
        assert_eq!(summary.credit_owed(), Some(100));
    }

    #[test]
    fn test_partial_paid_and_overpaid() {
        let partial = calculate_payment_status(5000, [paid(2000, 0)]).unwrap();
        assert_eq!(partial.payment_status, PaymentStatus::Partial);
        assert_eq!(partial.amount_due, 3000);
        assert_eq!(partial.credit_owed(), None);

        let exact = calculate_payment_status(5000, [paid(2000, 0), paid(3000, 0)]).unwrap();
        assert_eq!(exact.payment_status, PaymentStatus::Paid);
        assert_eq!(exact.amount_due, 0);

        let over = calculate_payment_status(5000, [paid(6000, 0)]).unwrap();
        assert_eq!(over.payment_status, PaymentStatus::Overpaid);
        assert_eq!(over.amount_due, -1000);
    }

    #[test]
    fn test_refunds_reduce_net_paid() {
        let summary =
            calculate_payment_status(5000, [paid(5000, 1500), paid(1000, 1000)]).unwrap();
        assert_eq!(summary.total_paid, 6000);
        assert_eq!(summary.total_refunded, 2500);
        assert_eq!(summary.net_paid, 3500);
        assert_eq!(summary.amount_due, 1500);
        assert_eq!(summary.payment_status, PaymentStatus::Partial);

        let fully_refunded = calculate_payment_status(5000, [paid(5000, 5000)]).unwrap();
        assert_eq!(fully_refunded.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_amount_due_identity_holds() {
        let cases: [(i64, &[(i64, i64)]); 5] = [
            (0, &[]),
            (10_000, &[(2_500, 0), (2_500, 500)]),
            (999, &[(1_000, 0)]),
            (0, &[(700, 200), (300, 300)]),
            (12_345, &[(12_345, 0), (1, 1)]),
        ];
        for (total, rows) in cases {
            let payments: Vec<PaymentAmounts> = rows.iter().map(|&(a, r)| paid(a, r)).collect();
            let summary = calculate_payment_status(total, payments.iter().copied()).unwrap();
            let amounts: i64 = rows.iter().map(|(a, _)| a).sum();
            let refunds: i64 = rows.iter().map(|(_, r)| r).sum();
            assert_eq!(summary.amount_due, total - (amounts - refunds));
        }
    }

    #[test]
    fn test_accepts_models_and_counting_policy() {
        let payments = vec![
            payment_model(4000, 0, PaymentRecordStatus::Completed),
            payment_model(1000, 0, PaymentRecordStatus::Pending),
            payment_model(2000, 0, PaymentRecordStatus::Failed),
            payment_model(1000, 1000, PaymentRecordStatus::Refunded),
        ];
        let summary = calculate_payment_status(4000, countable_payments(&payments)).unwrap();
        assert_eq!(summary.total_paid, 5000);
        assert_eq!(summary.net_paid, 4000);
        assert_eq!(summary.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_apply_refund_transitions() {
        let p = payment_model(5000, 0, PaymentRecordStatus::Completed);
        let partial = apply_refund(&p, 2000).unwrap();
        assert_eq!(partial.refunded_amount_cents, 2000);
        assert_eq!(partial.status, PaymentRecordStatus::PartiallyRefunded);

        let p = payment_model(5000, 2000, PaymentRecordStatus::PartiallyRefunded);
        let full = apply_refund(&p, 3000).unwrap();
        assert_eq!(full.status, PaymentRecordStatus::Refunded);

        assert!(apply_refund(&p, 3001).is_err());
        assert!(apply_refund(&p, 0).is_err());
        let pending = payment_model(5000, 0, PaymentRecordStatus::Pending);
        assert!(matches!(
            apply_refund(&pending, 100),
            Err(Error::InvalidAmount { cents: 100 })
        ));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(PaymentStatus::Overpaid.to_string(), "overpaid");
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Partial).unwrap(),
            "\"partial\""
        );
    }

    #[test]
    fn test_sums_that_overflow_are_errors() {
        let result = calculate_payment_status(0, [paid(i64::MAX, 0), paid(1, 0)]);
        assert!(matches!(
            result,
            Err(Error::AmountOutOfRange { what: "payments" })
        ));

        let result = calculate_payment_status(i64::MIN, [paid(1, 0)]);
        assert!(matches!(
            result,
            Err(Error::AmountOutOfRange { what: "amount due" })
        ));

        let p = payment_model(5000, i64::MAX, PaymentRecordStatus::PartiallyRefunded);
        assert!(matches!(
            apply_refund(&p, 1),
            Err(Error::InvalidAmount { cents: 1 })
        ));
    }
}
