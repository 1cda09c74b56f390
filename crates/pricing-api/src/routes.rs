//! # Routes
//!
//! Axum router configuration for the pricing API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// In-flight request cap across all routes
const MAX_CONCURRENT_REQUESTS: usize = 256;

/// Create the main application router
///
/// Routes:
/// - Storefront:
///   - GET  /api/v1/products - List products with availability
///   - GET  /api/v1/products/{id} - Get product by ID
///   - POST /api/v1/coupons/validate - Check a coupon code
///   - POST /api/v1/delivery/quote - Delivery fee and COD for a destination
///   - POST /api/v1/quote - Price a cart, signed
///   - POST /api/v1/orders - Place an order
///   - GET  /api/v1/orders/{id} - Get order by ID
///
/// - Back office:
///   - GET  /api/v1/stock/report - Valuation and low-stock list
///   - POST /api/v1/stock/{id}/adjust - Add or remove stock units
///   - GET  /api/v1/orders - List orders, newest first
///   - POST /api/v1/orders/{id}/status - Confirm, deliver or cancel an order
///   - GET  /api/v1/coupons - List coupons
///   - POST /api/v1/coupons/{code}/status - Enable or disable a coupon
pub fn create_router(state: AppState) -> Router {
    let concurrency_limit = ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let storefront_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/coupons/validate", post(handlers::validate_coupon))
        .route("/delivery/quote", post(handlers::delivery_quote))
        .route("/quote", post(handlers::create_quote))
        .route("/orders", get(handlers::list_orders).post(handlers::create_order))
        .route("/orders/{order_id}", get(handlers::get_order));

    let back_office_routes = Router::new()
        .route("/stock/report", get(handlers::stock_report))
        .route("/stock/{product_id}/adjust", post(handlers::adjust_stock))
        .route("/orders/{order_id}/status", post(handlers::update_order_status))
        .route("/coupons", get(handlers::list_coupons))
        .route("/coupons/{code}/status", post(handlers::set_coupon_status));

    let api_routes = Router::new().merge(storefront_routes).merge(back_office_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(concurrency_limit)
        .with_state(state)
}
