//! # Storefront Pricing
//!
//! Order pricing and order-creation service for the restaurant storefront.
//!
//! ## Usage
//!
//! ```bash
//! # Optional environment
//! export STORE_CONFIG=config/store.toml
//! export QUOTE_SIGNING_SECRET=change-me
//!
//! # Run the server
//! storefront-pricing
//! ```

use pricing_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    let snapshot = state.store.snapshot().await;
    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", snapshot.catalog.len());
    info!("Coupons loaded: {}", snapshot.coupons.len());
    info!(
        "Measurement mode: {:?}, tax: {}%",
        snapshot.settings.measurement_mode, snapshot.settings.tax_percentage
    );
    drop(snapshot);

    let app = routes::create_router(state);

    info!("🦀 Storefront pricing starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🧾 Quote: POST http://{}/api/v1/quote", addr);
        info!("📦 Orders: POST http://{}/api/v1/orders", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🦀 Storefront Pricing 🦀
  ━━━━━━━━━━━━━━━━━━━━━━━━
  Orders, stock and delivery
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
