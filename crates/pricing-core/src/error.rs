//! # Pricing Error Types
//!
//! Typed error handling for the pricing engine.
//! All engine operations return `Result<T, PricingError>` or one of the
//! narrower error enums below.

use thiserror::Error;

/// Catalog configuration faults. These abort pricing and need operator attention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A combo product (directly or transitively) contains itself
    #[error("Cyclic combo reference at {product_id}: {}", path.join(" -> "))]
    CyclicCombo {
        product_id: String,
        path: Vec<String>,
    },

    /// A combo component points at a product the catalog does not know
    #[error("Combo {combo_id} references missing component {component_id}")]
    MissingComponent {
        combo_id: String,
        component_id: String,
    },

    /// A combo component with a zero per-set quantity
    #[error("Combo {combo_id} has zero quantity for component {component_id}")]
    ZeroComponentQuantity {
        combo_id: String,
        component_id: String,
    },
}

/// Coupon validation failures, surfaced to the shopper with the specific reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Invalid coupon code")]
    NotFound,

    #[error("Coupon is inactive")]
    Inactive,

    #[error("Coupon has expired")]
    Expired,

    #[error("Coupon usage limit reached")]
    UsageExceeded,

    #[error("Minimum order amount is {minimum}")]
    BelowMinimum { minimum: i64 },
}

impl CouponError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            CouponError::NotFound => "NOT_FOUND",
            CouponError::Inactive => "INACTIVE",
            CouponError::Expired => "EXPIRED",
            CouponError::UsageExceeded => "USAGE_EXCEEDED",
            CouponError::BelowMinimum { .. } => "BELOW_MINIMUM",
        }
    }
}

/// Problems with the cart itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product not found: {product_id}")]
    UnknownProduct { product_id: String },

    #[error("Invalid quantity for {product_id}: must be at least 1")]
    InvalidQuantity { product_id: String },

    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: u64,
        requested: u64,
    },
}

impl AssemblyError {
    pub fn reason(&self) -> &'static str {
        match self {
            AssemblyError::EmptyCart => "EMPTY_CART",
            AssemblyError::UnknownProduct { .. } => "UNKNOWN_PRODUCT",
            AssemblyError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            AssemblyError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

/// Core error type for all pricing operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Coupon(#[from] CouponError),

    #[error("{0}")]
    Assembly(#[from] AssemblyError),
}

impl PricingError {
    /// Returns true if the shopper can act on this error (change code, edit cart)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PricingError::Configuration(_))
    }

    /// Machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            PricingError::Configuration(_) => "CONFIGURATION",
            PricingError::Coupon(e) => e.reason(),
            PricingError::Assembly(e) => e.reason(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PricingError::Configuration(_) => 500,
            PricingError::Coupon(_) => 422,
            PricingError::Assembly(AssemblyError::EmptyCart) => 400,
            PricingError::Assembly(AssemblyError::InvalidQuantity { .. }) => 400,
            PricingError::Assembly(AssemblyError::UnknownProduct { .. }) => 404,
            PricingError::Assembly(AssemblyError::InsufficientStock { .. }) => 409,
        }
    }
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(PricingError::from(CouponError::Expired).is_recoverable());
        assert!(PricingError::from(AssemblyError::EmptyCart).is_recoverable());
        assert!(!PricingError::from(ConfigurationError::CyclicCombo {
            product_id: "a".into(),
            path: vec!["a".into(), "b".into(), "a".into()],
        })
        .is_recoverable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PricingError::from(AssemblyError::EmptyCart).status_code(), 400);
        assert_eq!(
            PricingError::from(AssemblyError::UnknownProduct {
                product_id: "x".into()
            })
            .status_code(),
            404
        );
        assert_eq!(
            PricingError::from(CouponError::BelowMinimum { minimum: 500 }).status_code(),
            422
        );
    }

    #[test]
    fn test_cycle_message_shows_path() {
        let err = ConfigurationError::CyclicCombo {
            product_id: "party-box".into(),
            path: vec!["party-box".into(), "family-box".into(), "party-box".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic combo reference at party-box: party-box -> family-box -> party-box"
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(PricingError::from(CouponError::Expired).reason(), "EXPIRED");
        assert_eq!(
            PricingError::from(CouponError::BelowMinimum { minimum: 1 }).reason(),
            "BELOW_MINIMUM"
        );
        assert_eq!(PricingError::from(AssemblyError::EmptyCart).reason(), "EMPTY_CART");
    }
}
