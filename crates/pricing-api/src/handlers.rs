//! # Request Handlers
//!
//! Axum request handlers for the pricing API.
//!
//! Every pricing handler takes one store snapshot up front and prices against
//! it, so a single response never mixes two versions of the catalog.

use crate::state::AppState;
use crate::store::{find_active, CustomerInfo, NewOrder, OrderRecord, OrderStatus, StoreError, StoreSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use pricing_core::{
    AssemblyError, CartLine, ComboComponent, Coupon, CouponSource, CouponValidator, DeliveryChargeResolver, DeliveryQuote,
    Destination, OrderTotalAssembler, OrderTotalBreakdown, PricingError, PricingRequest, Product, ProductKind,
    StockLevel, StockResolver,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Item in a quote or order request
#[derive(Debug, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Price a cart without committing anything
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub destination: Destination,
}

/// Priced cart plus the signature to send back with the order
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub breakdown: OrderTotalBreakdown,
    pub fingerprint: String,
    pub signature: String,
}

/// Place an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerInfo,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub destination: Destination,
    /// Signature from a previous quote; if present the re-priced order must match it
    #[serde(default)]
    pub quote_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub subtotal: i64,
}

#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub code: String,
    pub discount: i64,
    pub discounted_subtotal: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryQuoteRequest {
    #[serde(flatten)]
    pub destination: Destination,
    #[serde(default)]
    pub weight_kg: f64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Units to add (positive) or remove (negative)
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetCouponStatusRequest {
    pub is_active: bool,
}

/// Product as listed to shoppers, with resolved availability
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub kind: ProductKind,
    pub available: u64,
    /// Availability in display units, e.g. "1.4 kg" or "3 sets"
    pub stock_display: String,
    pub low_stock: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComboComponent>,
}

impl ProductView {
    fn new(product: &Product, level: StockLevel) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            kind: product.kind,
            available: level.available,
            stock_display: level.display.to_string(),
            low_stock: level.low_stock,
            components: product.components.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockReportResponse {
    pub product_count: usize,
    /// Σ available × price over single products
    pub valuation: i64,
    pub low_stock: Vec<StockLevel>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(code: u16, message: String, reason: &str) -> ApiError {
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(message, code).with_reason(reason)),
    )
}

fn pricing_error_to_response(err: PricingError) -> ApiError {
    if !err.is_recoverable() {
        error!(error = %err, "store configuration fault");
    }
    error_response(err.status_code(), err.to_string(), err.reason())
}

fn store_error_to_response(err: StoreError) -> ApiError {
    match err {
        StoreError::Pricing(e) => pricing_error_to_response(e),
        other => error_response(other.status_code(), other.to_string(), other.reason()),
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("{} not found: {}", what, id), 404)),
    )
}

// =============================================================================
// Pricing
// =============================================================================

/// Turn requested items into cart lines at current catalog prices.
/// Delisted products are treated as unknown.
fn build_request(
    snapshot: &StoreSnapshot,
    items: &[CartItem],
    coupon_code: Option<String>,
    destination: Destination,
) -> Result<PricingRequest, PricingError> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = find_active(snapshot, &item.product_id).ok_or_else(|| AssemblyError::UnknownProduct {
            product_id: item.product_id.clone(),
        })?;
        lines.push(CartLine::from_product(product, item.quantity));
    }

    let mut request = PricingRequest::new(lines).with_destination(destination);
    request.coupon_code = coupon_code;
    Ok(request)
}

/// Price a request and check the cart can actually be fulfilled
fn price_request(snapshot: &StoreSnapshot, request: &PricingRequest) -> Result<OrderTotalBreakdown, PricingError> {
    let breakdown = OrderTotalAssembler::new(&snapshot.catalog, &snapshot.coupons, &snapshot.settings)
        .assemble(request, Utc::now())?;
    StockResolver::plan_commit(&request.lines, &snapshot.catalog)?;
    Ok(breakdown)
}

fn product_view(snapshot: &StoreSnapshot, product: &Product) -> Result<ProductView, PricingError> {
    let level = StockResolver::stock_level(
        product,
        &snapshot.catalog,
        snapshot.settings.measurement_mode,
        snapshot.settings.low_stock_threshold,
    )?;
    Ok(ProductView::new(product, level))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-pricing",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List active products with availability
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let products = snapshot
        .catalog
        .active_products()
        .map(|p| product_view(&snapshot, p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(pricing_error_to_response)?;
    Ok(Json(products))
}

/// Get one active product with availability
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let product = find_active(&snapshot, &product_id).ok_or_else(|| not_found("Product", &product_id))?;
    product_view(&snapshot, product)
        .map(Json)
        .map_err(pricing_error_to_response)
}

/// Stock valuation and the low-stock list for the back office
#[instrument(skip(state))]
pub async fn stock_report(State(state): State<AppState>) -> Result<Json<StockReportResponse>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let settings = &snapshot.settings;

    let mut low_stock = Vec::new();
    for product in &snapshot.catalog.products {
        let level = StockResolver::stock_level(
            product,
            &snapshot.catalog,
            settings.measurement_mode,
            settings.low_stock_threshold,
        )
        .map_err(|e| pricing_error_to_response(e.into()))?;
        if level.low_stock {
            low_stock.push(level);
        }
    }

    Ok(Json(StockReportResponse {
        product_count: snapshot.catalog.len(),
        valuation: StockResolver::stock_valuation(&snapshot.catalog.products),
        low_stock,
    }))
}

/// Add or remove stock units on a single product
#[instrument(skip(state, request), fields(delta = request.delta))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state
        .store
        .adjust_stock(&product_id, request.delta)
        .await
        .map_err(store_error_to_response)?;

    let snapshot = state.store.snapshot().await;
    product_view(&snapshot, &product)
        .map(Json)
        .map_err(pricing_error_to_response)
}

/// Check a coupon against a subtotal
#[instrument(skip(state, request), fields(code = %request.code))]
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let valid = CouponValidator::validate(
        snapshot.coupons.get_coupon_by_code(&request.code),
        request.subtotal,
        Utc::now(),
    )
    .map_err(|e| pricing_error_to_response(e.into()))?;

    Ok(Json(ValidateCouponResponse {
        code: valid.coupon.code,
        discount: valid.discount,
        discounted_subtotal: (request.subtotal - valid.discount).max(0),
    }))
}

/// Delivery fee and COD eligibility for a destination
#[instrument(skip(state, request))]
pub async fn delivery_quote(
    State(state): State<AppState>,
    Json(request): Json<DeliveryQuoteRequest>,
) -> Json<DeliveryQuote> {
    let snapshot = state.store.snapshot().await;
    Json(DeliveryChargeResolver::resolve(
        &request.destination,
        request.weight_kg.max(0.0),
        &snapshot.settings.delivery,
    ))
}

/// Price a cart and sign the result
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let pricing = build_request(&snapshot, &request.items, request.coupon_code, request.destination)
        .map_err(pricing_error_to_response)?;
    let breakdown = price_request(&snapshot, &pricing).map_err(pricing_error_to_response)?;

    let fingerprint = breakdown.fingerprint();
    let signature = state.signer.sign(&fingerprint);

    Ok(Json(QuoteResponse {
        breakdown,
        fingerprint,
        signature,
    }))
}

/// Re-price, verify the quote if one was given, and commit the order
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderRecord>), ApiError> {
    let snapshot = state.store.snapshot().await;
    let pricing = build_request(&snapshot, &request.items, request.coupon_code, request.destination)
        .map_err(pricing_error_to_response)?;
    let breakdown = price_request(&snapshot, &pricing).map_err(pricing_error_to_response)?;

    if let Some(signature) = request.quote_signature.as_deref() {
        if !state.signer.verify(&breakdown.fingerprint(), signature) {
            warn!("quote signature does not match re-priced order");
            return Err(error_response(
                409,
                "Quote is stale: the order no longer prices the same as the quoted cart".to_string(),
                "STALE_QUOTE",
            ));
        }
    }

    let record = state
        .store
        .commit(NewOrder {
            customer: request.customer,
            request: pricing,
            breakdown,
        })
        .await
        .map_err(store_error_to_response)?;

    info!(order_id = %record.id, "order created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch a stored order
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecord>, ApiError> {
    state
        .store
        .order(&order_id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Order", &order_id))
}

// =============================================================================
// Back office
// =============================================================================

/// All orders, newest first
#[instrument(skip(state))]
pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<OrderRecord>> {
    Json(state.store.orders().await)
}

/// Confirm, deliver or cancel an order
#[instrument(skip(state, request), fields(status = ?request.status))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderRecord>, ApiError> {
    state
        .store
        .update_order_status(&order_id, request.status)
        .await
        .map(Json)
        .map_err(store_error_to_response)
}

/// All coupons with their usage counters
#[instrument(skip(state))]
pub async fn list_coupons(State(state): State<AppState>) -> Json<Vec<Coupon>> {
    let snapshot = state.store.snapshot().await;
    Json(snapshot.coupons.coupons.clone())
}

/// Enable or disable a coupon
#[instrument(skip(state, request), fields(is_active = request.is_active))]
pub async fn set_coupon_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<SetCouponStatusRequest>,
) -> Result<Json<Coupon>, ApiError> {
    state
        .store
        .set_coupon_active(&code, request.is_active)
        .await
        .map(Json)
        .map_err(store_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_core::{ConfigurationError, CouponError};

    #[test]
    fn test_error_response_carries_reason() {
        let (status, Json(body)) = pricing_error_to_response(CouponError::Expired.into());
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, 422);
        assert_eq!(body.reason.as_deref(), Some("EXPIRED"));
    }

    #[test]
    fn test_configuration_error_is_500() {
        let err = PricingError::from(ConfigurationError::MissingComponent {
            combo_id: "combo".to_string(),
            component_id: "ghost".to_string(),
        });
        let (status, _) = pricing_error_to_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_build_request_rejects_inactive_product() {
        let mut hidden = Product::single("hidden", 100, 5);
        hidden.active = false;
        let snapshot = StoreSnapshot {
            catalog: pricing_core::ProductCatalog::new().with_product(hidden),
            ..StoreSnapshot::default()
        };
        let items = vec![CartItem {
            product_id: "hidden".to_string(),
            quantity: 1,
        }];

        let err = build_request(&snapshot, &items, None, Destination::default()).unwrap_err();
        assert_eq!(err.reason(), "UNKNOWN_PRODUCT");
    }
}
