//! # Store Configuration
//!
//! Store-wide settings are plain immutable values handed to every pricing
//! call. Callers own fetching and caching them.
//!
//! ## File layout (`config/store.toml`)
//!
//! ```toml
//! [settings]
//! measurement_mode = "WEIGHT"
//! tax_percentage = 5
//!
//! [settings.delivery]
//! default_charge = 60
//!
//! [settings.payment]
//! advance_payment_policy = "DELIVERY_ONLY"
//!
//! [[products]]
//! id = "masala-crab"
//! price = 850
//! stock_units = 40
//!
//! [[coupons]]
//! code = "WELCOME100"
//! discount_kind = "FIXED"
//! discount_value = 100
//! ```

use crate::coupon::{Coupon, CouponBook};
use crate::delivery::DeliveryConfig;
use crate::payment::PaymentConfig;
use crate::product::{Product, ProductCatalog};
use crate::stock::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::units::MeasurementMode;
use serde::{Deserialize, Serialize};

/// Read access to store-wide settings
pub trait ConfigSource {
    fn delivery_config(&self) -> &DeliveryConfig;
    fn payment_config(&self) -> &PaymentConfig;
    fn tax_percentage(&self) -> u32;
    fn measurement_mode(&self) -> MeasurementMode;
}

/// Store-wide pricing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub measurement_mode: MeasurementMode,
    /// Whole percent applied to the discounted subtotal
    #[serde(default)]
    pub tax_percentage: u32,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u64,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
}

fn default_low_stock_threshold() -> u64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            measurement_mode: MeasurementMode::Pieces,
            tax_percentage: 0,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            delivery: DeliveryConfig::default(),
            payment: PaymentConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_measurement_mode(mut self, mode: MeasurementMode) -> Self {
        self.measurement_mode = mode;
        self
    }

    pub fn with_tax_percentage(mut self, percent: u32) -> Self {
        self.tax_percentage = percent;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_payment(mut self, payment: PaymentConfig) -> Self {
        self.payment = payment;
        self
    }
}

impl ConfigSource for StoreConfig {
    fn delivery_config(&self) -> &DeliveryConfig {
        &self.delivery
    }

    fn payment_config(&self) -> &PaymentConfig {
        &self.payment
    }

    fn tax_percentage(&self) -> u32 {
        self.tax_percentage
    }

    fn measurement_mode(&self) -> MeasurementMode {
        self.measurement_mode
    }
}

/// Everything in a store file: settings, catalog and coupons
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub settings: StoreConfig,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

impl StoreData {
    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Split into the read models the engine works with. Duplicate coupon
    /// codes keep the first occurrence.
    pub fn into_parts(self) -> (StoreConfig, ProductCatalog, CouponBook) {
        let mut catalog = ProductCatalog::new();
        for product in self.products {
            catalog.add(product);
        }
        let mut coupons = CouponBook::new();
        for coupon in self.coupons {
            coupons.add(coupon);
        }
        (self.settings, catalog, coupons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::CouponSource;
    use crate::delivery::{SurchargeMode, ZoneScope};
    use crate::payment::AdvancePolicy;
    use crate::product::Catalog;

    const STORE: &str = r#"
        [settings]
        measurement_mode = "WEIGHT"
        tax_percentage = 5

        [settings.delivery]
        default_charge = 80
        default_cod_enabled = false
        surcharge_mode = "HIGHEST_TIER"
        weight_tiers = [{ min_weight_kg = 2.0, charge = 30 }]
        zones = [
            { id = "mirpur-2", scope = "SUB_DISTRICT", name = "Mirpur-2", price = 40, cod_eligible = false },
            { id = "dhaka", scope = "DISTRICT", name = "Dhaka", price = 60 },
        ]

        [settings.payment]
        wallet_b_enabled = true
        advance_payment_policy = "PERCENTAGE"
        advance_payment_value = 20

        [[products]]
        id = "masala-crab"
        name = "Masala Crab"
        price = 850
        stock_units = 40
        unit_weight = 250

        [[coupons]]
        code = "welcome100"
        discount_kind = "FIXED"
        discount_value = 100
        min_order_amount = 1000
        expires_at = "2030-01-01T00:00:00Z"
    "#;

    #[test]
    fn test_store_file_parses() {
        let (settings, catalog, coupons) = StoreData::from_toml(STORE).unwrap().into_parts();

        assert_eq!(settings.measurement_mode(), MeasurementMode::Weight);
        assert_eq!(settings.tax_percentage(), 5);
        assert_eq!(settings.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);

        let delivery = settings.delivery_config();
        assert_eq!(delivery.default_charge, 80);
        assert!(!delivery.default_cod_enabled);
        assert_eq!(delivery.surcharge_mode, SurchargeMode::HighestTier);
        assert_eq!(delivery.zones.len(), 2);
        assert_eq!(delivery.zones[0].scope, ZoneScope::SubDistrict);
        assert!(delivery.zones[1].cod_eligible);

        assert_eq!(settings.payment_config().advance_payment_policy, AdvancePolicy::Percentage);

        assert_eq!(catalog.get_product("masala-crab").map(|p| p.price), Some(850));
        let coupon = coupons.get_coupon_by_code("WELCOME100").unwrap();
        assert_eq!(coupon.code, "WELCOME100");
        assert!(coupon.expires_at.is_some());
    }

    #[test]
    fn test_empty_store_uses_defaults() {
        let data = StoreData::from_toml("").unwrap();
        assert_eq!(data.settings, StoreConfig::default());
        assert_eq!(data.settings.delivery.default_charge, 60);
        assert!(data.products.is_empty());
    }
}
