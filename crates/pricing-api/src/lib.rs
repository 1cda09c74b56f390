//! # pricing-api
//!
//! HTTP layer for the storefront pricing engine.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Quote and order endpoints backed by `pricing-core`
//! - An in-memory store with atomic order commits
//! - HMAC-signed quotes so a stale price is caught at order time
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products with availability |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | GET | `/api/v1/stock/report` | Stock valuation and low-stock list |
//! | POST | `/api/v1/stock/{id}/adjust` | Adjust stock of a single product |
//! | POST | `/api/v1/coupons/validate` | Validate a coupon against a subtotal |
//! | POST | `/api/v1/delivery/quote` | Delivery fee and COD eligibility |
//! | POST | `/api/v1/quote` | Price a cart (signed breakdown) |
//! | POST | `/api/v1/orders` | Place an order |
//! | GET | `/api/v1/orders/{id}` | Get order |
//! | GET | `/api/v1/orders` | List orders, newest first |
//! | POST | `/api/v1/orders/{id}/status` | Confirm, deliver or cancel an order |
//! | GET | `/api/v1/coupons` | List coupons |
//! | POST | `/api/v1/coupons/{code}/status` | Enable or disable a coupon |

pub mod handlers;
pub mod routes;
pub mod signing;
pub mod state;
pub mod store;

pub use routes::create_router;
pub use signing::QuoteSigner;
pub use state::{AppConfig, AppState};
pub use store::{InMemoryStore, SharedStore, StoreSnapshot, StorefrontStore};
