//! # Store
//!
//! The persistence collaborator behind the pricing engine: catalog, coupons,
//! settings and accepted orders.
//!
//! Readers take an `Arc<StoreSnapshot>` and price against it without holding
//! any lock. Writers (order commits, stock adjustments) build a new snapshot
//! under the write lock and swap it in, so a commit lands completely or not
//! at all.
//!
//! ```text
//!   quote ──► snapshot() ──► Arc<StoreSnapshot> ──► pricing-core
//!
//!   order ──► commit() ──┬─ write lock
//!                        ├─ re-check stock + coupon uses against CURRENT state
//!                        ├─ apply decrements / usage increment on a copy
//!                        └─ swap copy in, record order
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricing_core::{
    AssemblyError, Catalog, Coupon, CouponBook, CouponError, CouponValidator, OrderTotalBreakdown, PricingError,
    PricingRequest, Product, ProductCatalog, StockDeduction, StockResolver, StoreConfig, StoreData,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Immutable view of everything the engine reads
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub settings: StoreConfig,
    pub catalog: ProductCatalog,
    pub coupons: CouponBook,
}

impl From<StoreData> for StoreSnapshot {
    fn from(data: StoreData) -> Self {
        let (settings, catalog, coupons) = data.into_parts();
        Self {
            settings,
            catalog,
            coupons,
        }
    }
}

/// Errors from store writes
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    #[error("Combo stock is derived from its components and cannot be adjusted: {product_id}")]
    ComboNotAdjustable { product_id: String },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Coupon not found: {code}")]
    CouponNotFound { code: String },

    #[error("Order cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Pricing(e) => e.status_code(),
            StoreError::ProductNotFound { .. } => 404,
            StoreError::ComboNotAdjustable { .. } => 400,
            StoreError::OrderNotFound { .. } | StoreError::CouponNotFound { .. } => 404,
            StoreError::InvalidTransition { .. } => 409,
        }
    }

    /// Machine-readable reason code for API responses
    pub fn reason(&self) -> &'static str {
        match self {
            StoreError::Pricing(e) => e.reason(),
            StoreError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            StoreError::ComboNotAdjustable { .. } => "COMBO_NOT_ADJUSTABLE",
            StoreError::OrderNotFound { .. } => "ORDER_NOT_FOUND",
            StoreError::CouponNotFound { .. } => "COUPON_NOT_FOUND",
            StoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

/// Customer details captured at checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Lifecycle of an accepted order
///
/// ```text
///   PENDING ──► CONFIRMED ──► DELIVERED
///      │            │
///      └────────────┴──► CANCELLED (stock returned)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Delivered) | (Confirmed, Cancelled)
        )
    }
}

/// A priced order waiting to be committed
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub request: PricingRequest,
    pub breakdown: OrderTotalBreakdown,
}

/// A committed order
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub id: String,
    pub customer: CustomerInfo,
    pub request: PricingRequest,
    pub breakdown: OrderTotalBreakdown,
    pub fingerprint: String,
    /// Leaf stock taken by this order, returned on cancellation
    pub deductions: Vec<StockDeduction>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage seam used by the HTTP layer
#[async_trait]
pub trait StorefrontStore: Send + Sync {
    /// Consistent read-only view for pricing
    async fn snapshot(&self) -> Arc<StoreSnapshot>;

    /// Atomically decrement stock and consume the coupon, then record the order.
    ///
    /// Stock and coupon limits are re-checked against the state at commit
    /// time, so two orders racing for the last unit cannot both succeed.
    async fn commit(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    /// Back-office stock edit on a single product
    async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, StoreError>;

    async fn order(&self, order_id: &str) -> Option<OrderRecord>;

    /// All orders, newest first
    async fn orders(&self) -> Vec<OrderRecord>;

    /// Move an order along its lifecycle. Cancelling returns its stock.
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<OrderRecord, StoreError>;

    /// Enable or disable a coupon for future orders
    async fn set_coupon_active(&self, code: &str, active: bool) -> Result<Coupon, StoreError>;
}

/// Shared handle to a store implementation
pub type SharedStore = Arc<dyn StorefrontStore>;

/// In-process store guarded by a tokio `RwLock`
#[derive(Default)]
pub struct InMemoryStore {
    snapshot: RwLock<Arc<StoreSnapshot>>,
    orders: RwLock<HashMap<String, OrderRecord>>,
}

impl InMemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            orders: RwLock::new(HashMap::new()),
        }
    }

    pub fn shared(snapshot: StoreSnapshot) -> SharedStore {
        Arc::new(Self::new(snapshot))
    }
}

#[async_trait]
impl StorefrontStore for InMemoryStore {
    async fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshot.read().await.clone()
    }

    async fn commit(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let mut guard = self.snapshot.write().await;
        let mut next = StoreSnapshot::clone(&guard);

        let now = Utc::now();
        let plan = StockResolver::plan_commit(&order.request.lines, &next.catalog)?;

        if let Some(code) = order.breakdown.coupon_code() {
            let coupon = next.coupons.get_mut(code).ok_or(CouponError::NotFound).map_err(PricingError::from)?;
            if let Err(e) = CouponValidator::validate(Some(coupon), order.breakdown.subtotal(), now) {
                warn!(code, reason = e.reason(), "coupon no longer valid at commit");
                return Err(PricingError::from(e).into());
            }
            coupon.used_count += 1;
        }

        for deduction in &plan.deductions {
            let product = next.catalog.get_mut(&deduction.product_id).ok_or_else(|| {
                StoreError::from(PricingError::from(AssemblyError::UnknownProduct {
                    product_id: deduction.product_id.clone(),
                }))
            })?;
            product.stock_units -= deduction.units as i64;
        }

        *guard = Arc::new(next);
        drop(guard);

        let record = OrderRecord {
            id: format!("ORD-{}", Uuid::new_v4().simple()),
            fingerprint: order.breakdown.fingerprint(),
            customer: order.customer,
            request: order.request,
            breakdown: order.breakdown,
            deductions: plan.deductions,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        info!(
            order_id = %record.id,
            grand_total = record.breakdown.grand_total(),
            deductions = record.deductions.len(),
            "order committed"
        );

        self.orders.write().await.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, StoreError> {
        let mut guard = self.snapshot.write().await;
        let mut next = StoreSnapshot::clone(&guard);

        let product = next
            .catalog
            .get_mut(product_id)
            .ok_or_else(|| StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;

        if product.is_combo() {
            return Err(StoreError::ComboNotAdjustable {
                product_id: product_id.to_string(),
            });
        }

        product.stock_units = StockResolver::adjusted_units(product, delta).map_err(PricingError::from)?;
        let updated = product.clone();

        *guard = Arc::new(next);
        info!(product_id, delta, stock_units = updated.stock_units, "stock adjusted");
        Ok(updated)
    }

    async fn order(&self, order_id: &str) -> Option<OrderRecord> {
        self.orders.read().await.get(order_id).cloned()
    }

    async fn orders(&self) -> Vec<OrderRecord> {
        let mut orders: Vec<OrderRecord> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<OrderRecord, StoreError> {
        // Same lock order as commit: snapshot, then orders
        let mut snapshot_guard = self.snapshot.write().await;
        let mut orders = self.orders.write().await;

        let record = orders.get_mut(order_id).ok_or_else(|| StoreError::OrderNotFound {
            order_id: order_id.to_string(),
        })?;

        if !record.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }

        if status == OrderStatus::Cancelled {
            let mut next = StoreSnapshot::clone(&snapshot_guard);
            for deduction in &record.deductions {
                // A product removed from the catalog since has nothing to return to
                if let Some(product) = next.catalog.get_mut(&deduction.product_id) {
                    product.stock_units = product.stock_units.saturating_add(deduction.units as i64);
                }
            }
            *snapshot_guard = Arc::new(next);
        }

        let from = record.status;
        record.status = status;
        record.updated_at = Utc::now();
        info!(order_id, from = ?from, to = ?status, "order status changed");
        Ok(record.clone())
    }

    async fn set_coupon_active(&self, code: &str, active: bool) -> Result<Coupon, StoreError> {
        let mut guard = self.snapshot.write().await;
        let mut next = StoreSnapshot::clone(&guard);

        let coupon = next.coupons.get_mut(code).ok_or_else(|| StoreError::CouponNotFound {
            code: code.to_string(),
        })?;
        coupon.is_active = active;
        let updated = coupon.clone();

        *guard = Arc::new(next);
        info!(code = %updated.code, active, "coupon status changed");
        Ok(updated)
    }
}

/// Product lookup that hides delisted products from customers
pub fn find_active<'a>(snapshot: &'a StoreSnapshot, product_id: &str) -> Option<&'a Product> {
    snapshot.catalog.get_product(product_id).filter(|p| p.active)
}
