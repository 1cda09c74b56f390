//! # Tax and Advance Payment
//!
//! Tax on the discounted subtotal, and the split between what the customer
//! pays up front and what the rider collects on delivery.
//!
//! Rounding is fixed per operation: tax rounds up, percentage advances round
//! down. Both are computed in integer space.

use serde::{Deserialize, Serialize};

/// Ways a customer can pay, as enabled in the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    /// Merchant wallet (bKash merchant API)
    WalletA,
    /// Personal wallet transfer (bKash/Nagad)
    WalletB,
    ManualTransfer,
}

/// How much of the grand total must be paid before delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvancePolicy {
    #[default]
    Full,
    DeliveryOnly,
    Percentage,
    Fixed,
}

/// Store-wide payment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_true")]
    pub cod_enabled: bool,
    #[serde(default)]
    pub wallet_a_enabled: bool,
    #[serde(default)]
    pub wallet_b_enabled: bool,
    #[serde(default)]
    pub manual_transfer_enabled: bool,
    #[serde(default)]
    pub advance_payment_policy: AdvancePolicy,
    /// Percent for `Percentage`, amount for `Fixed`, ignored otherwise
    #[serde(default)]
    pub advance_payment_value: i64,
}

fn default_true() -> bool {
    true
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            cod_enabled: true,
            wallet_a_enabled: false,
            wallet_b_enabled: false,
            manual_transfer_enabled: false,
            advance_payment_policy: AdvancePolicy::Full,
            advance_payment_value: 0,
        }
    }
}

impl PaymentConfig {
    pub fn with_advance(mut self, policy: AdvancePolicy, value: i64) -> Self {
        self.advance_payment_policy = policy;
        self.advance_payment_value = value;
        self
    }

    /// Enabled methods for a checkout. COD drops out when the destination
    /// does not allow it.
    pub fn offered_methods(&self, cod_eligible: bool) -> Vec<PaymentMethod> {
        let mut methods = Vec::with_capacity(4);
        if self.cod_enabled && cod_eligible {
            methods.push(PaymentMethod::CashOnDelivery);
        }
        if self.wallet_a_enabled {
            methods.push(PaymentMethod::WalletA);
        }
        if self.wallet_b_enabled {
            methods.push(PaymentMethod::WalletB);
        }
        if self.manual_transfer_enabled {
            methods.push(PaymentMethod::ManualTransfer);
        }
        methods
    }
}

/// Up-front amount and the remainder collected on delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceSplit {
    pub advance_due_now: i64,
    pub cod_collectable_later: i64,
}

pub struct TaxAndAdvanceCalculator;

impl TaxAndAdvanceCalculator {
    /// `ceil(base × rate / 100)`; zero for a non-positive base or rate
    pub fn compute_tax(discounted_subtotal: i64, tax_percentage: u32) -> i64 {
        if discounted_subtotal <= 0 || tax_percentage == 0 {
            return 0;
        }
        let scaled = discounted_subtotal as i128 * tax_percentage as i128;
        ((scaled + 99) / 100) as i64
    }

    /// Amount due before delivery under `policy`, never above the grand total
    pub fn compute_advance_due(grand_total: i64, delivery_fee: i64, policy: AdvancePolicy, policy_value: i64) -> i64 {
        let grand_total = grand_total.max(0);
        let due = match policy {
            AdvancePolicy::Full => grand_total,
            AdvancePolicy::DeliveryOnly => delivery_fee,
            AdvancePolicy::Percentage => {
                (grand_total as i128 * policy_value.max(0) as i128 / 100) as i64
            }
            AdvancePolicy::Fixed => policy_value.min(grand_total),
        };
        due.clamp(0, grand_total)
    }

    pub fn split(grand_total: i64, delivery_fee: i64, config: &PaymentConfig) -> AdvanceSplit {
        let advance_due_now = Self::compute_advance_due(
            grand_total,
            delivery_fee,
            config.advance_payment_policy,
            config.advance_payment_value,
        );
        AdvanceSplit {
            advance_due_now,
            cod_collectable_later: (grand_total - advance_due_now).max(0),
        }
    }
}
