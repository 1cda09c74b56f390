//! # Coupons
//!
//! Validation and pricing of discount codes.
//!
//! Validating a coupon never consumes it. The store increments `used_count`
//! only once an order has been durably accepted.

use crate::error::CouponError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the discount value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Flat amount off the subtotal
    Fixed,
    /// Percentage of the subtotal, rounded down
    Percentage,
}

/// A discount code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Stored upper-case
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Canonical form of a coupon code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    pub fn fixed(code: &str, amount: i64) -> Self {
        Self::new(code, DiscountKind::Fixed, amount)
    }

    pub fn percentage(code: &str, percent: i64) -> Self {
        Self::new(code, DiscountKind::Percentage, percent)
    }

    fn new(code: &str, discount_kind: DiscountKind, discount_value: i64) -> Self {
        Self {
            code: normalize_code(code),
            discount_kind,
            discount_value,
            min_order_amount: 0,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
        }
    }

    pub fn with_min_order(mut self, amount: i64) -> Self {
        self.min_order_amount = amount;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    /// True while the usage limit (if any) still has room
    pub fn has_uses_left(&self) -> bool {
        self.usage_limit.map_or(true, |limit| self.used_count < limit)
    }
}

/// A coupon that passed validation for a given subtotal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidCoupon {
    pub coupon: Coupon,
    pub discount: i64,
}

/// Read access to coupons by code
pub trait CouponSource {
    fn get_coupon_by_code(&self, code: &str) -> Option<&Coupon>;
}

/// Stateless coupon checks
pub struct CouponValidator;

impl CouponValidator {
    /// Check a looked-up coupon against the order subtotal.
    ///
    /// Checks run in a fixed order so the shopper always sees the same reason
    /// for the same coupon: missing, inactive, expired, used up, below minimum.
    pub fn validate(
        coupon: Option<&Coupon>,
        subtotal: i64,
        now: DateTime<Utc>,
    ) -> Result<ValidCoupon, CouponError> {
        let coupon = coupon.ok_or(CouponError::NotFound)?;

        if !coupon.is_active {
            return Err(CouponError::Inactive);
        }

        if coupon.expires_at.is_some_and(|expires_at| now > expires_at) {
            return Err(CouponError::Expired);
        }

        if !coupon.has_uses_left() {
            return Err(CouponError::UsageExceeded);
        }

        if subtotal < coupon.min_order_amount {
            return Err(CouponError::BelowMinimum {
                minimum: coupon.min_order_amount,
            });
        }

        Ok(ValidCoupon {
            discount: Self::compute_discount(coupon, subtotal),
            coupon: coupon.clone(),
        })
    }

    /// Discount amount; never more than the subtotal and never negative
    pub fn compute_discount(coupon: &Coupon, subtotal: i64) -> i64 {
        let subtotal = subtotal.max(0);
        let discount = match coupon.discount_kind {
            DiscountKind::Fixed => coupon.discount_value.min(subtotal),
            DiscountKind::Percentage => {
                (subtotal as i128 * coupon.discount_value as i128 / 100) as i64
            }
        };
        discount.clamp(0, subtotal)
    }
}

/// Coupons keyed by normalized code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponBook {
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

impl CouponBook {
    pub fn new() -> Self {
        Self {
            coupons: Vec::new(),
        }
    }

    /// Add a coupon; returns false if the code already exists
    pub fn add(&mut self, mut coupon: Coupon) -> bool {
        coupon.code = normalize_code(&coupon.code);
        if self.coupons.iter().any(|c| c.code == coupon.code) {
            return false;
        }
        self.coupons.push(coupon);
        true
    }

    pub fn with_coupon(mut self, coupon: Coupon) -> Self {
        self.add(coupon);
        self
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Coupon> {
        let code = normalize_code(code);
        self.coupons.iter_mut().find(|c| c.code == code)
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl CouponSource for CouponBook {
    fn get_coupon_by_code(&self, code: &str) -> Option<&Coupon> {
        let code = normalize_code(code);
        self.coupons
            .iter()
            .find(|c| normalize_code(&c.code) == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_coupon_is_not_found() {
        assert_eq!(
            CouponValidator::validate(None, 1000, now()),
            Err(CouponError::NotFound)
        );
    }

    #[test]
    fn test_inactive_coupon() {
        let mut coupon = Coupon::fixed("crab50", 50);
        coupon.is_active = false;
        assert_eq!(
            CouponValidator::validate(Some(&coupon), 1000, now()),
            Err(CouponError::Inactive)
        );
    }

    #[test]
    fn test_scenario_e_expired_coupon() {
        let coupon = Coupon::fixed("OLD", 100).with_expiry(now() - Duration::days(1));
        assert_eq!(
            CouponValidator::validate(Some(&coupon), 5000, now()),
            Err(CouponError::Expired)
        );
    }

    #[test]
    fn test_expiry_instant_itself_is_still_valid() {
        let coupon = Coupon::fixed("EDGE", 100).with_expiry(now());
        assert!(CouponValidator::validate(Some(&coupon), 5000, now()).is_ok());
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut coupon = Coupon::fixed("ONCE", 100).with_usage_limit(1);
        assert!(CouponValidator::validate(Some(&coupon), 5000, now()).is_ok());
        coupon.used_count = 1;
        assert_eq!(
            CouponValidator::validate(Some(&coupon), 5000, now()),
            Err(CouponError::UsageExceeded)
        );
    }

    #[test]
    fn test_below_minimum_reports_minimum() {
        let coupon = Coupon::fixed("BIG", 100).with_min_order(1000);
        assert_eq!(
            CouponValidator::validate(Some(&coupon), 999, now()),
            Err(CouponError::BelowMinimum { minimum: 1000 })
        );
        assert!(CouponValidator::validate(Some(&coupon), 1000, now()).is_ok());
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let coupon = Coupon::fixed("FLAT500", 500);
        assert_eq!(CouponValidator::compute_discount(&coupon, 1500), 500);
        assert_eq!(CouponValidator::compute_discount(&coupon, 300), 300);
    }

    #[test]
    fn test_percentage_discount_rounds_down() {
        let coupon = Coupon::percentage("TEN", 10);
        assert_eq!(CouponValidator::compute_discount(&coupon, 1999), 199);
        assert_eq!(CouponValidator::compute_discount(&coupon, 9), 0);
    }

    #[test]
    fn test_percentage_discount_monotonic() {
        let coupon = Coupon::percentage("SEVEN", 7);
        let mut last = 0;
        for subtotal in 0..2000 {
            let d = CouponValidator::compute_discount(&coupon, subtotal);
            assert!(d >= last);
            assert!(d <= subtotal);
            last = d;
        }
    }

    #[test]
    fn test_coupon_book_is_case_insensitive() {
        let book = CouponBook::new().with_coupon(Coupon::fixed("Welcome", 100));
        assert!(book.get_coupon_by_code("welcome").is_some());
        assert!(book.get_coupon_by_code("  WELCOME ").is_some());
        assert_eq!(book.get_coupon_by_code("WELCOME").unwrap().code, "WELCOME");
    }

    #[test]
    fn test_coupon_book_rejects_duplicates() {
        let mut book = CouponBook::new();
        assert!(book.add(Coupon::fixed("DUP", 10)));
        assert!(!book.add(Coupon::percentage("dup", 5)));
        assert_eq!(book.len(), 1);
    }
}
