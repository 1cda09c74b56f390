//! # pricing-core
//!
//! Order pricing, stock resolution and delivery charge engine for the
//! restaurant storefront.
//!
//! This crate provides:
//! - `UnitConverter` for pieces / weight / volume display
//! - `StockResolver` for truthful availability, including combo products
//! - `CouponValidator` for discount codes
//! - `DeliveryChargeResolver` for zone precedence, weight surcharges and COD
//! - `TaxAndAdvanceCalculator` for tax and the advance-payment split
//! - `OrderTotalAssembler` tying it all into one `OrderTotalBreakdown`
//!
//! Everything here is a pure function over immutable snapshots. The engine
//! performs no I/O; persistence and stock commits belong to the caller.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use pricing_core::{
//!     CartLine, CouponBook, OrderTotalAssembler, PricingRequest, Product, ProductCatalog,
//!     StoreConfig,
//! };
//!
//! let catalog = ProductCatalog::new().with_product(Product::single("masala-crab", 850, 12));
//! let config = StoreConfig::default().with_tax_percentage(5);
//! let request = PricingRequest::new(vec![CartLine::new("masala-crab", 850, 2)]);
//!
//! let breakdown = OrderTotalAssembler::new(&catalog, &CouponBook::new(), &config)
//!     .assemble(&request, Utc::now())
//!     .unwrap();
//!
//! assert_eq!(breakdown.grand_total(), 1700 + 60 + 85);
//! ```

pub mod config;
pub mod coupon;
pub mod delivery;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod stock;
pub mod units;

// Re-exports for convenience
pub use config::{ConfigSource, StoreConfig, StoreData};
pub use coupon::{normalize_code, Coupon, CouponBook, CouponSource, CouponValidator, DiscountKind, ValidCoupon};
pub use delivery::{
    DeliveryChargeResolver, DeliveryConfig, DeliveryQuote, DeliveryZone, Destination, SurchargeMode,
    WeightSurchargeTier, ZoneScope,
};
pub use error::{AssemblyError, ConfigurationError, CouponError, PricingError, PricingResult};
pub use order::{CartLine, OrderDraft, OrderTotalAssembler, OrderTotalBreakdown, PricedOrder, PricingRequest};
pub use payment::{AdvancePolicy, AdvanceSplit, PaymentConfig, PaymentMethod, TaxAndAdvanceCalculator};
pub use product::{Catalog, ComboComponent, Product, ProductCatalog, ProductKind};
pub use stock::{StockCommitPlan, StockDeduction, StockLevel, StockResolver, DEFAULT_LOW_STOCK_THRESHOLD};
pub use units::{DisplayQuantity, DisplayUnit, MeasurementMode, UnitConverter, DEFAULT_UNIT_WEIGHT_GRAMS};
