//! Local checkout checks: card fields, coupon codes and the delivery fee.
//!
//! Nothing here talks to a payment processor. These are the checks a form
//! runs before submitting, and every failure is a [`ValidationError`].

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
}

/// Validates every card field, reporting the first failure.
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first invalid field.
pub fn validate_card(card: &CardDetails, today: NaiveDate) -> Result<(), ValidationError> {
    validate_card_number(&card.number)?;
    validate_expiry(&card.expiry, today)?;
    validate_cvv(&card.cvv)
}

/// Checks length and Luhn checksum. Spaces and dashes are ignored; the
/// bare digit string is returned.
///
/// # Errors
///
/// - [`ValidationError::CardNumberCharacters`] for anything but digits, spaces, dashes.
/// - [`ValidationError::CardNumberLength`] outside 13..=19 digits.
/// - [`ValidationError::CardNumberChecksum`] when the Luhn sum is off.
pub fn validate_card_number(number: &str) -> Result<String, ValidationError> {
    let mut digits = String::with_capacity(number.len());
    for c in number.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' => {}
            _ => return Err(ValidationError::CardNumberCharacters),
        }
    }
    if !(13..=19).contains(&digits.len()) {
        return Err(ValidationError::CardNumberLength);
    }
    if !luhn_valid(&digits) {
        return Err(ValidationError::CardNumberChecksum);
    }
    Ok(digits)
}

/// Luhn mod-10 over an all-digit string.
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Parses `MM/YY` and rejects cards whose expiry month is before `today`'s.
/// A card is good through the last day of its expiry month.
///
/// # Errors
///
/// [`ValidationError::ExpiryFormat`] or [`ValidationError::CardExpired`].
pub fn validate_expiry(expiry: &str, today: NaiveDate) -> Result<(u32, i32), ValidationError> {
    let (mm, yy) = expiry
        .trim()
        .split_once('/')
        .ok_or(ValidationError::ExpiryFormat)?;
    let (mm, yy) = (mm.trim(), yy.trim());
    if mm.len() != 2 || yy.len() != 2 {
        return Err(ValidationError::ExpiryFormat);
    }
    let month: u32 = mm.parse().map_err(|_| ValidationError::ExpiryFormat)?;
    let short_year: i32 = yy.parse().map_err(|_| ValidationError::ExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(ValidationError::ExpiryFormat);
    }
    let year = 2000 + short_year;
    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::CardExpired);
    }
    Ok((month, year))
}

/// # Errors
///
/// [`ValidationError::Cvv`] unless `cvv` is 3 or 4 ASCII digits.
pub fn validate_cvv(cvv: &str) -> Result<(), ValidationError> {
    let cvv = cvv.trim();
    if (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::Cvv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponDiscount {
    /// Percentage of the subtotal, 0-100.
    PercentOff(Decimal),
    FlatOff(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount: CouponDiscount,
    #[serde(default)]
    pub min_subtotal: Decimal,
}

impl Coupon {
    pub fn percent_off(code: impl Into<String>, percent: Decimal) -> Self {
        Self {
            code: code.into(),
            discount: CouponDiscount::PercentOff(percent),
            min_subtotal: Decimal::ZERO,
        }
    }

    pub fn flat_off(code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount: CouponDiscount::FlatOff(amount),
            min_subtotal: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_min_subtotal(mut self, min: Decimal) -> Self {
        self.min_subtotal = min;
        self
    }

    /// Discount on `subtotal`, rounded to paise and never above `subtotal`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::CouponMinimumNotMet`] below the coupon's minimum.
    pub fn discount_for(&self, subtotal: Decimal) -> Result<Decimal, ValidationError> {
        if subtotal < self.min_subtotal {
            return Err(ValidationError::CouponMinimumNotMet {
                code: self.code.clone(),
                minimum: self.min_subtotal.to_string(),
            });
        }
        let raw = match self.discount {
            CouponDiscount::PercentOff(pct) => {
                let pct = pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let scaled = subtotal
                    .checked_mul(pct)
                    .ok_or(ValidationError::AmountOutOfRange)?;
                (scaled / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            }
            CouponDiscount::FlatOff(amount) => amount.max(Decimal::ZERO),
        };
        Ok(raw.min(subtotal))
    }
}

/// The codes the storefront currently honours.
#[must_use]
pub fn default_coupons() -> Vec<Coupon> {
    vec![
        Coupon::percent_off("FIRST20", Decimal::new(20, 0)).with_min_subtotal(Decimal::new(199, 0)),
        Coupon::flat_off("SAVE50", Decimal::new(50, 0)).with_min_subtotal(Decimal::new(499, 0)),
        Coupon::percent_off("HEALTH10", Decimal::new(10, 0)),
    ]
}

/// Case-insensitive lookup of `code` in `coupons`.
///
/// # Errors
///
/// [`ValidationError::UnknownCoupon`] when nothing matches.
pub fn find_coupon<'a>(coupons: &'a [Coupon], code: &str) -> Result<&'a Coupon, ValidationError> {
    let wanted = code.trim();
    coupons
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ValidationError::UnknownCoupon(wanted.to_owned()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub fee: Decimal,
    /// Orders at or above this subtotal ship free.
    pub free_above: Decimal,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            fee: Decimal::new(40, 0),
            free_above: Decimal::new(500, 0),
        }
    }
}

impl DeliveryPolicy {
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_above {
            Decimal::ZERO
        } else {
            self.fee
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<String>,
}

/// Prices an order. The delivery fee is judged on the pre-discount subtotal.
///
/// # Errors
///
/// [`ValidationError::EmptyCart`] for a zero subtotal, or the coupon's error.
pub fn summarize(
    subtotal: Decimal,
    coupon: Option<&Coupon>,
    delivery: &DeliveryPolicy,
) -> Result<CheckoutSummary, ValidationError> {
    if subtotal <= Decimal::ZERO {
        return Err(ValidationError::EmptyCart);
    }
    let discount = match coupon {
        Some(c) => c.discount_for(subtotal)?,
        None => Decimal::ZERO,
    };
    let delivery_fee = delivery.fee_for(subtotal);
    Ok(CheckoutSummary {
        subtotal,
        discount,
        delivery_fee,
        total: (subtotal - discount)
            .checked_add(delivery_fee)
            .ok_or(ValidationError::AmountOutOfRange)?,
        coupon_code: coupon.map(|c| c.code.clone()),
    })
}

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;
