//! Order subtotal, discount validation and order totals.
//!
//! The subtotal is always recomputed from line items rather than trusted from the
//! stored order row, so a discount can never exceed what the client actually owes.

use crate::core::money::format_cents;
use crate::core::validation::FieldErrors;
use crate::entities::garment_service;
use crate::errors::{self, Error};
use serde::Serialize;

/// Form field a discount error is attached to.
pub const DISCOUNT_FIELD: &str = "discountCents";

/// A billable line item: `quantity * unit_price_cents`, unless removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    /// Number of units
    pub quantity: i64,
    /// Price per unit in cents
    pub unit_price_cents: i64,
    /// Soft-deleted items are excluded from the subtotal
    pub is_removed: bool,
}

impl LineItem {
    /// `quantity * unit_price_cents`, or `None` when it does not fit in an `i64`.
    #[must_use]
    pub const fn total_cents(&self) -> Option<i64> {
        self.quantity.checked_mul(self.unit_price_cents)
    }
}

impl From<&garment_service::Model> for LineItem {
    fn from(s: &garment_service::Model) -> Self {
        Self {
            quantity: i64::from(s.quantity),
            unit_price_cents: s.unit_price_cents,
            is_removed: s.is_removed,
        }
    }
}

/// Sum of `quantity * unit_price_cents` over every non-removed line item of every garment.
///
/// `garments` yields one collection of line items per garment. Fails with
/// [`Error::AmountOutOfRange`] instead of overflowing.
pub fn calculate_order_subtotal<G, I>(garments: G) -> errors::Result<i64>
where
    G: IntoIterator<Item = I>,
    I: IntoIterator,
    I::Item: Into<LineItem>,
{
    garments
        .into_iter()
        .flat_map(IntoIterator::into_iter)
        .map(Into::<LineItem>::into)
        .filter(|item| !item.is_removed)
        .try_fold(0_i64, |subtotal, item| {
            item.total_cents()
                .and_then(|line| subtotal.checked_add(line))
                .ok_or_else(|| Error::out_of_range("subtotal"))
        })
}

/// Checks a proposed discount against the subtotal.
///
/// A discount equal to the subtotal is allowed; one cent more is rejected with the
/// amounts formatted for display.
pub fn validate_discount(discount_cents: i64, subtotal_cents: i64) -> Result<(), FieldErrors> {
    if discount_cents < 0 {
        return Err(FieldErrors::single(
            DISCOUNT_FIELD,
            "Discount cannot be negative",
        ));
    }
    if discount_cents > subtotal_cents {
        return Err(FieldErrors::single(
            DISCOUNT_FIELD,
            format!(
                "Discount ({}) cannot exceed subtotal ({})",
                format_cents(discount_cents),
                format_cents(subtotal_cents)
            ),
        ));
    }
    Ok(())
}

/// Money totals stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    /// Sum of active line items
    pub subtotal_cents: i64,
    /// Discount, never above the subtotal
    pub discount_cents: i64,
    /// Tax on the discounted subtotal
    pub tax_cents: i64,
    /// `subtotal - discount + tax`
    pub total_cents: i64,
}

/// Computes tax and total for a validated discount.
///
/// Tax is `tax_rate_bps` basis points of `subtotal - discount`, rounded half-up to the cent.
/// A discount larger than the subtotal (possible after services are removed) is capped
/// at the subtotal so the total never goes negative.
pub fn calculate_order_totals(
    subtotal_cents: i64,
    discount_cents: i64,
    tax_rate_bps: i32,
) -> errors::Result<OrderTotals> {
    let discount_cents = discount_cents.clamp(0, subtotal_cents.max(0));
    // 0 <= discount <= subtotal whenever subtotal is positive, else discount is 0
    let taxable = subtotal_cents - discount_cents;
    let tax = (i128::from(taxable) * i128::from(tax_rate_bps) + 5_000).div_euclid(10_000);
    let tax_cents = i64::try_from(tax).map_err(|_| Error::out_of_range("tax"))?;
    let total_cents = taxable
        .checked_add(tax_cents)
        .ok_or_else(|| Error::out_of_range("total"))?;

    Ok(OrderTotals {
        subtotal_cents,
        discount_cents,
        tax_cents,
        total_cents,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::money::parse_dollars_to_cents;

    const fn item(quantity: i64, unit_price_cents: i64) -> LineItem {
        LineItem {
            quantity,
            unit_price_cents,
            is_removed: false,
        }
    }

    fn two_garments() -> Vec<Vec<LineItem>> {
        vec![
            // Suit jacket: 2 x $45 sleeves + $30 take in = $120
            vec![item(2, 4500), item(1, 3000)],
            // Trousers: $80 hem, plus a removed $25 service
            vec![
                item(1, 8000),
                LineItem {
                    quantity: 1,
                    unit_price_cents: 2500,
                    is_removed: true,
                },
            ],
        ]
    }

    #[test]
    fn test_subtotal_skips_removed_items() {
        assert_eq!(calculate_order_subtotal(two_garments()).unwrap(), 20000);
        assert_eq!(calculate_order_subtotal(Vec::<Vec<LineItem>>::new()).unwrap(), 0);
    }

    #[test]
    fn test_discount_equal_to_subtotal_is_accepted() {
        let subtotal = calculate_order_subtotal(two_garments()).unwrap();
        assert!(validate_discount(20000, subtotal).is_ok());
        assert!(validate_discount(0, subtotal).is_ok());
    }

    #[test]
    fn test_discount_one_cent_over_is_rejected() {
        let subtotal = calculate_order_subtotal(two_garments()).unwrap();
        let errors = validate_discount(20001, subtotal).unwrap_err();
        assert_eq!(
            errors.get(DISCOUNT_FIELD),
            ["Discount ($200.01) cannot exceed subtotal ($200.00)".to_string()]
        );
    }

    #[test]
    fn test_negative_discount_is_rejected() {
        let errors = validate_discount(-1, 500).unwrap_err();
        assert_eq!(errors.get(DISCOUNT_FIELD), ["Discount cannot be negative".to_string()]);
    }

    #[test]
    fn test_order_totals_with_tax() {
        // $200 - $20 = $180 taxable at 8.25% = $14.85
        let totals = calculate_order_totals(20000, 2000, 825).unwrap();
        assert_eq!(totals.tax_cents, 1485);
        assert_eq!(totals.total_cents, 19485);

        // Half-cent rounds up: $1.00 at 0.5% = 0.5 cents -> 1 cent
        assert_eq!(calculate_order_totals(100, 0, 50).unwrap().tax_cents, 1);

        let untaxed = calculate_order_totals(5000, 5000, 0).unwrap();
        assert_eq!(untaxed.total_cents, 0);
    }

    #[test]
    fn test_order_totals_cap_stale_discount() {
        // Services removed after a $50 discount left only $30 of work
        let totals = calculate_order_totals(3000, 5000, 0).unwrap();
        assert_eq!(totals.discount_cents, 3000);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let huge = parse_dollars_to_cents("92233720368547758").unwrap();
        let result = calculate_order_subtotal([[item(2, huge)]]);
        assert!(matches!(
            result,
            Err(Error::AmountOutOfRange { what: "subtotal" })
        ));

        // Each line fits, their sum does not
        let result = calculate_order_subtotal([[item(1, i64::MAX), item(1, 1)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_totals_handle_large_amounts_without_overflow() {
        let subtotal = parse_dollars_to_cents("200000000000000").unwrap();
        let totals = calculate_order_totals(subtotal, 0, 825).unwrap();
        assert_eq!(totals.tax_cents, 1_650_000_000_000_000);
        assert_eq!(totals.total_cents, 21_650_000_000_000_000);

        assert!(matches!(
            calculate_order_totals(i64::MAX, 0, 825),
            Err(Error::AmountOutOfRange { what: "total" })
        ));
        assert!(matches!(
            calculate_order_totals(i64::MAX, 0, i32::MAX),
            Err(Error::AmountOutOfRange { what: "tax" })
        ));
    }
}
