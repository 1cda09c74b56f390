//! # Order Totals
//!
//! Cart lines and the order-total assembler.
//!
//! ## Pricing states
//!
//! ```text
//!  OrderDraft ──price()──► PricedOrder ──finalize()──► OrderTotalBreakdown
//!  (lines checked)         (subtotal, discount,        (advance split,
//!                           delivery, tax)               immutable)
//! ```
//!
//! Each step consumes the previous one; there is no way back. A cart change
//! means a new draft. Steps run in a fixed order:
//!
//! 1. subtotal = Σ line totals
//! 2. coupon validation and discount (a rejected coupon is an error, never 0)
//! 3. delivery fee and COD from destination and parcel weight
//! 4. tax = ceil(max(0, subtotal - discount) × rate / 100)
//! 5. grand total = taxable base + delivery + tax
//! 6. advance / COD split

use crate::config::ConfigSource;
use crate::coupon::{CouponSource, CouponValidator};
use crate::delivery::{DeliveryChargeResolver, DeliveryQuote, Destination};
use crate::error::{AssemblyError, PricingResult};
use crate::payment::{AdvancePolicy, PaymentConfig, PaymentMethod, TaxAndAdvanceCalculator};
use crate::product::{Catalog, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// A line in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// Unit price captured when the item was added
    pub unit_price: i64,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, unit_price: i64, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price,
            quantity,
        }
    }

    /// Create a line at the product's current catalog price
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self::new(product.id.clone(), product.price, quantity)
    }

    pub fn total(&self) -> i64 {
        self.unit_price.saturating_mul(self.quantity as i64)
    }
}

/// What the caller wants priced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub lines: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub destination: Destination,
}

impl PricingRequest {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            lines,
            coupon_code: None,
            destination: Destination::default(),
        }
    }

    pub fn with_coupon(mut self, code: impl Into<String>) -> Self {
        self.coupon_code = Some(code.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Coupon code, if one was actually entered
    fn entered_coupon(&self) -> Option<&str> {
        self.coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Final price breakdown for one pricing request.
///
/// Built once by [`PricedOrder::finalize`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTotalBreakdown {
    subtotal: i64,
    discount_amount: i64,
    delivery_fee: i64,
    tax_amount: i64,
    grand_total: i64,
    advance_due_now: i64,
    cod_collectable_later: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    coupon_code: Option<String>,
    tax_percentage: u32,
    advance_policy: AdvancePolicy,
    delivery: DeliveryQuote,
    payment_methods: Vec<PaymentMethod>,
}

impl OrderTotalBreakdown {
    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn discount_amount(&self) -> i64 {
        self.discount_amount
    }

    pub fn delivery_fee(&self) -> i64 {
        self.delivery_fee
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount
    }

    pub fn grand_total(&self) -> i64 {
        self.grand_total
    }

    pub fn advance_due_now(&self) -> i64 {
        self.advance_due_now
    }

    pub fn cod_collectable_later(&self) -> i64 {
        self.cod_collectable_later
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn delivery(&self) -> &DeliveryQuote {
        &self.delivery
    }

    pub fn cod_eligible(&self) -> bool {
        self.delivery.cod_eligible
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    /// Canonical JSON encoding
    pub fn to_canonical_json(&self) -> Vec<u8> {
        // Field order is fixed by the struct definition
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// SHA-256 (hex) of the canonical encoding, for audit trails and quote signing
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_canonical_json()))
    }
}

/// DRAFT: cart lines present and structurally sound, nothing priced yet
#[derive(Debug)]
pub struct OrderDraft<'r> {
    request: &'r PricingRequest,
}

impl<'r> OrderDraft<'r> {
    pub fn new(request: &'r PricingRequest) -> Result<Self, AssemblyError> {
        if request.lines.is_empty() {
            return Err(AssemblyError::EmptyCart);
        }
        if let Some(line) = request.lines.iter().find(|l| l.quantity == 0) {
            return Err(AssemblyError::InvalidQuantity {
                product_id: line.product_id.clone(),
            });
        }
        Ok(Self { request })
    }

    /// Steps 1-5: subtotal, discount, delivery, tax, grand total
    pub fn price(
        self,
        catalog: &dyn Catalog,
        coupons: &dyn CouponSource,
        config: &dyn ConfigSource,
        now: DateTime<Utc>,
    ) -> PricingResult<PricedOrder> {
        let request = self.request;

        if let Some(line) = request
            .lines
            .iter()
            .find(|l| catalog.get_product(&l.product_id).is_none())
        {
            return Err(AssemblyError::UnknownProduct {
                product_id: line.product_id.clone(),
            }
            .into());
        }

        let subtotal: i64 = request.lines.iter().map(CartLine::total).sum();

        let (discount, coupon_code) = match request.entered_coupon() {
            Some(code) => {
                let valid = CouponValidator::validate(coupons.get_coupon_by_code(code), subtotal, now)?;
                (valid.discount, Some(valid.coupon.code))
            }
            None => (0, None),
        };

        let weight_kg =
            DeliveryChargeResolver::parcel_weight_kg(&request.lines, catalog, config.measurement_mode())?;
        let delivery = DeliveryChargeResolver::resolve(&request.destination, weight_kg, config.delivery_config());

        let taxable_base = (subtotal - discount).max(0);
        let tax_percentage = config.tax_percentage();
        let tax = TaxAndAdvanceCalculator::compute_tax(taxable_base, tax_percentage);

        Ok(PricedOrder {
            subtotal,
            discount,
            coupon_code,
            taxable_base,
            tax,
            tax_percentage,
            grand_total: taxable_base + delivery.fee + tax,
            delivery,
        })
    }
}

/// PRICED: all amounts known except the advance split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    subtotal: i64,
    discount: i64,
    coupon_code: Option<String>,
    taxable_base: i64,
    tax: i64,
    tax_percentage: u32,
    grand_total: i64,
    delivery: DeliveryQuote,
}

impl PricedOrder {
    pub fn grand_total(&self) -> i64 {
        self.grand_total
    }

    pub fn taxable_base(&self) -> i64 {
        self.taxable_base
    }

    /// Step 6: advance split. Produces the immutable breakdown.
    pub fn finalize(self, payment: &PaymentConfig) -> OrderTotalBreakdown {
        let split = TaxAndAdvanceCalculator::split(self.grand_total, self.delivery.fee, payment);
        OrderTotalBreakdown {
            subtotal: self.subtotal,
            discount_amount: self.discount,
            delivery_fee: self.delivery.fee,
            tax_amount: self.tax,
            grand_total: self.grand_total,
            advance_due_now: split.advance_due_now,
            cod_collectable_later: split.cod_collectable_later,
            coupon_code: self.coupon_code,
            tax_percentage: self.tax_percentage,
            advance_policy: payment.advance_payment_policy,
            payment_methods: payment.offered_methods(self.delivery.cod_eligible),
            delivery: self.delivery,
        }
    }
}

/// Runs a pricing request through draft, priced and finalized states
/// against one consistent snapshot of catalog, coupons and settings.
pub struct OrderTotalAssembler<'a> {
    catalog: &'a dyn Catalog,
    coupons: &'a dyn CouponSource,
    config: &'a dyn ConfigSource,
}

impl<'a> OrderTotalAssembler<'a> {
    pub fn new(catalog: &'a dyn Catalog, coupons: &'a dyn CouponSource, config: &'a dyn ConfigSource) -> Self {
        Self {
            catalog,
            coupons,
            config,
        }
    }

    pub fn assemble(&self, request: &PricingRequest, now: DateTime<Utc>) -> PricingResult<OrderTotalBreakdown> {
        let priced = OrderDraft::new(request)?.price(self.catalog, self.coupons, self.config, now)?;
        let breakdown = priced.finalize(self.config.payment_config());

        debug!(
            subtotal = breakdown.subtotal(),
            discount = breakdown.discount_amount(),
            delivery = breakdown.delivery_fee(),
            tax = breakdown.tax_amount(),
            grand_total = breakdown.grand_total(),
            "order assembled"
        );

        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::coupon::{Coupon, CouponBook};
    use crate::delivery::{DeliveryConfig, DeliveryZone, ZoneScope};
    use crate::error::{CouponError, PricingError};
    use crate::payment::AdvancePolicy;
    use crate::product::ProductCatalog;
    use crate::units::MeasurementMode;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap()
    }

    fn catalog() -> ProductCatalog {
        ProductCatalog::new()
            .with_product(Product::single("crab-curry", 750, 20).with_unit_weight(500))
            .with_product(Product::single("rice", 0, 100))
    }

    fn coupons() -> CouponBook {
        CouponBook::new()
            .with_coupon(Coupon::fixed("SAVE100", 100).with_min_order(1000))
            .with_coupon(Coupon::fixed("OLD", 100).with_expiry(now() - Duration::hours(1)))
    }

    #[test]
    fn test_line_total() {
        assert_eq!(CartLine::new("x", 250, 3).total(), 750);
    }

    #[test]
    fn test_scenario_a_fixed_coupon_with_tax() {
        let catalog = catalog();
        let coupons = coupons();
        let config = StoreConfig::default().with_tax_percentage(5);
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 2)]).with_coupon("save100");

        let breakdown = OrderTotalAssembler::new(&catalog, &coupons, &config)
            .assemble(&request, now())
            .unwrap();

        assert_eq!(breakdown.subtotal(), 1500);
        assert_eq!(breakdown.discount_amount(), 100);
        assert_eq!(breakdown.tax_amount(), 70);
        assert_eq!(breakdown.delivery_fee(), 60);
        assert_eq!(breakdown.grand_total(), 1530);
        assert_eq!(breakdown.coupon_code(), Some("SAVE100"));
        assert_eq!(breakdown.advance_due_now(), 1530);
        assert_eq!(breakdown.cod_collectable_later(), 0);
    }

    #[test]
    fn test_scenario_d_percentage_advance_through_assembler() {
        let catalog = ProductCatalog::new().with_product(Product::single("feast", 1940, 5));
        let config = StoreConfig::default()
            .with_payment(PaymentConfig::default().with_advance(AdvancePolicy::Percentage, 20));
        let request = PricingRequest::new(vec![CartLine::new("feast", 1940, 1)]);

        let breakdown = OrderTotalAssembler::new(&catalog, &CouponBook::new(), &config)
            .assemble(&request, now())
            .unwrap();

        assert_eq!(breakdown.grand_total(), 2000);
        assert_eq!(breakdown.advance_due_now(), 400);
        assert_eq!(breakdown.cod_collectable_later(), 1600);
    }

    #[test]
    fn test_scenario_e_expired_coupon_surfaces() {
        let catalog = catalog();
        let coupons = coupons();
        let config = StoreConfig::default();
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 2)]).with_coupon("OLD");

        let err = OrderTotalAssembler::new(&catalog, &coupons, &config)
            .assemble(&request, now())
            .unwrap_err();
        assert_eq!(err, PricingError::Coupon(CouponError::Expired));
    }

    #[test]
    fn test_unknown_coupon_is_not_silently_ignored() {
        let catalog = catalog();
        let config = StoreConfig::default();
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 1)]).with_coupon("NOPE");

        let err = OrderTotalAssembler::new(&catalog, &coupons(), &config)
            .assemble(&request, now())
            .unwrap_err();
        assert_eq!(err, PricingError::Coupon(CouponError::NotFound));
    }

    #[test]
    fn test_blank_coupon_code_means_no_coupon() {
        let catalog = catalog();
        let config = StoreConfig::default();
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 1)]).with_coupon("  ");

        let breakdown = OrderTotalAssembler::new(&catalog, &coupons(), &config)
            .assemble(&request, now())
            .unwrap();
        assert_eq!(breakdown.discount_amount(), 0);
        assert_eq!(breakdown.coupon_code(), None);
    }

    #[test]
    fn test_empty_cart() {
        let request = PricingRequest::new(vec![]);
        let err = OrderTotalAssembler::new(&catalog(), &coupons(), &StoreConfig::default())
            .assemble(&request, now())
            .unwrap_err();
        assert_eq!(err, PricingError::Assembly(AssemblyError::EmptyCart));
    }

    #[test]
    fn test_unknown_product_rejected() {
        let request = PricingRequest::new(vec![CartLine::new("lobster", 3000, 1)]);
        let err = OrderTotalAssembler::new(&catalog(), &coupons(), &StoreConfig::default())
            .assemble(&request, now())
            .unwrap_err();
        assert!(matches!(
            err,
            PricingError::Assembly(AssemblyError::UnknownProduct { .. })
        ));
    }

    #[test]
    fn test_weight_mode_adds_surcharge_and_zone_price() {
        let catalog = catalog();
        let delivery = DeliveryConfig::default()
            .with_zone(DeliveryZone::new("dhaka", ZoneScope::District, "Dhaka", 60, true))
            .with_zone(DeliveryZone::new("mirpur", ZoneScope::SubDistrict, "Mirpur-2", 40, false))
            .with_tier(1.0, 20)
            .with_tier(2.0, 30);
        let config = StoreConfig::default()
            .with_measurement_mode(MeasurementMode::Weight)
            .with_delivery(delivery);
        // 5 × 500 g = 2.5 kg -> both tiers
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 5)])
            .with_destination(Destination::new().district("Dhaka").sub_district("Mirpur-2"));

        let breakdown = OrderTotalAssembler::new(&catalog, &coupons(), &config)
            .assemble(&request, now())
            .unwrap();
        assert_eq!(breakdown.delivery().base_fee, 40);
        assert_eq!(breakdown.delivery().surcharge, 50);
        assert_eq!(breakdown.delivery_fee(), 90);
        assert!(!breakdown.cod_eligible());
        assert!(!breakdown.payment_methods().contains(&PaymentMethod::CashOnDelivery));
        assert_eq!(breakdown.grand_total(), 3750 + 90);
    }

    #[test]
    fn test_pieces_mode_ignores_weight_tiers() {
        let catalog = catalog();
        let config = StoreConfig::default().with_delivery(DeliveryConfig::default().with_tier(0.5, 25));
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 5)]);

        let breakdown = OrderTotalAssembler::new(&catalog, &coupons(), &config)
            .assemble(&request, now())
            .unwrap();
        assert_eq!(breakdown.delivery_fee(), 60);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let catalog = catalog();
        let coupons = coupons();
        let config = StoreConfig::default().with_tax_percentage(7);
        let request = PricingRequest::new(vec![
            CartLine::new("crab-curry", 750, 3),
            CartLine::new("rice", 0, 2),
        ])
        .with_coupon("SAVE100");
        let assembler = OrderTotalAssembler::new(&catalog, &coupons, &config);

        let first = assembler.assemble(&request, now()).unwrap();
        let second = assembler.assemble(&request, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_canonical_json(), second.to_canonical_json());
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn test_typestate_steps() {
        let catalog = catalog();
        let config = StoreConfig::default().with_tax_percentage(10);
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 1)]);

        let priced = OrderDraft::new(&request)
            .unwrap()
            .price(&catalog, &CouponBook::new(), &config, now())
            .unwrap();
        assert_eq!(priced.taxable_base(), 750);
        assert_eq!(priced.grand_total(), 750 + 60 + 75);

        let breakdown = priced.finalize(&PaymentConfig::default().with_advance(AdvancePolicy::DeliveryOnly, 0));
        assert_eq!(breakdown.advance_due_now(), 60);
        assert_eq!(breakdown.cod_collectable_later(), 825);
    }

    #[test]
    fn test_zero_quantity_line_rejected_in_draft() {
        let request = PricingRequest::new(vec![CartLine::new("crab-curry", 750, 0)]);
        assert!(matches!(
            OrderDraft::new(&request),
            Err(AssemblyError::InvalidQuantity { .. })
        ));
    }
}
