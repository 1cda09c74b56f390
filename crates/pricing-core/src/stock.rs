//! # Stock Resolution
//!
//! Turns raw stock counters into truthful availability numbers.
//!
//! ```text
//!   SINGLE ──► stock_units (clamped at 0)
//!
//!   COMBO  ──► min over components of floor(available(child) / quantity_per_set)
//!                 │
//!                 └── child may itself be a COMBO (resolved recursively,
//!                     a product already on the current path is a cycle)
//! ```
//!
//! The resolver is a read-only projection. Decrementing counters after an
//! order is accepted belongs to the store; [`StockResolver::plan_commit`] only
//! works out what those decrements are.

use crate::error::{AssemblyError, ConfigurationError, PricingResult};
use crate::order::CartLine;
use crate::product::{Catalog, Product, ProductKind};
use crate::units::{DisplayQuantity, DisplayUnit, MeasurementMode, UnitConverter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Default threshold (in units) below which stock is flagged as low
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 10;

/// A decrement of one leaf product's stock counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDeduction {
    pub product_id: String,
    pub units: u64,
}

/// All leaf decrements an order causes, aggregated per product id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCommitPlan {
    pub deductions: Vec<StockDeduction>,
}

impl StockCommitPlan {
    pub fn units_for(&self, product_id: &str) -> u64 {
        self.deductions
            .iter()
            .find(|d| d.product_id == product_id)
            .map(|d| d.units)
            .unwrap_or(0)
    }
}

/// Availability as shown on the stock list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub available: u64,
    pub display: DisplayQuantity,
    pub low_stock: bool,
}

/// Stateless stock projections over a catalog snapshot
pub struct StockResolver;

impl StockResolver {
    /// Units (or combo sets) that can be sold right now
    pub fn available_units<C: Catalog + ?Sized>(
        product: &Product,
        catalog: &C,
    ) -> Result<u64, ConfigurationError> {
        let mut path = Vec::new();
        Self::resolve(product, catalog, &mut path)
    }

    /// Whether `requested` units of `product` are available
    pub fn can_fulfill<C: Catalog + ?Sized>(
        product: &Product,
        requested: u64,
        catalog: &C,
    ) -> Result<bool, ConfigurationError> {
        Ok(requested <= Self::available_units(product, catalog)?)
    }

    fn resolve<C: Catalog + ?Sized>(
        product: &Product,
        catalog: &C,
        path: &mut Vec<String>,
    ) -> Result<u64, ConfigurationError> {
        match product.kind {
            ProductKind::Single => Ok(product.stock_units.max(0) as u64),
            ProductKind::Combo => {
                Self::enter(product, path)?;
                if product.components.is_empty() {
                    path.pop();
                    return Ok(0);
                }

                let mut sets = u64::MAX;
                for component in &product.components {
                    let child = Self::component_product(product, component.product_id.as_str(), catalog)?;
                    if component.quantity_per_set == 0 {
                        return Err(ConfigurationError::ZeroComponentQuantity {
                            combo_id: product.id.clone(),
                            component_id: component.product_id.clone(),
                        });
                    }
                    let available = Self::resolve(child, catalog, path)?;
                    sets = sets.min(available / component.quantity_per_set as u64);
                }

                path.pop();
                Ok(sets)
            }
        }
    }

    /// Push a combo onto the recursion path, failing if it is already there
    fn enter(product: &Product, path: &mut Vec<String>) -> Result<(), ConfigurationError> {
        if path.iter().any(|id| id == &product.id) {
            let mut cycle = path.clone();
            cycle.push(product.id.clone());
            warn!(product_id = %product.id, path = ?cycle, "cyclic combo reference");
            return Err(ConfigurationError::CyclicCombo {
                product_id: product.id.clone(),
                path: cycle,
            });
        }
        path.push(product.id.clone());
        Ok(())
    }

    fn component_product<'c, C: Catalog + ?Sized>(
        combo: &Product,
        component_id: &str,
        catalog: &'c C,
    ) -> Result<&'c Product, ConfigurationError> {
        catalog.get_product(component_id).ok_or_else(|| {
            warn!(combo_id = %combo.id, component_id, "combo component missing from catalog");
            ConfigurationError::MissingComponent {
                combo_id: combo.id.clone(),
                component_id: component_id.to_string(),
            }
        })
    }

    /// Leaf stock decrements caused by selling `units` of `product`
    pub fn deductions<C: Catalog + ?Sized>(
        product: &Product,
        units: u64,
        catalog: &C,
    ) -> Result<Vec<StockDeduction>, ConfigurationError> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        Self::collect_deductions(product, units, catalog, &mut path, &mut out)?;
        Ok(out)
    }

    fn collect_deductions<C: Catalog + ?Sized>(
        product: &Product,
        units: u64,
        catalog: &C,
        path: &mut Vec<String>,
        out: &mut Vec<StockDeduction>,
    ) -> Result<(), ConfigurationError> {
        match product.kind {
            ProductKind::Single => {
                out.push(StockDeduction {
                    product_id: product.id.clone(),
                    units,
                });
                Ok(())
            }
            ProductKind::Combo => {
                Self::enter(product, path)?;
                for component in &product.components {
                    let child = Self::component_product(product, component.product_id.as_str(), catalog)?;
                    if component.quantity_per_set == 0 {
                        return Err(ConfigurationError::ZeroComponentQuantity {
                            combo_id: product.id.clone(),
                            component_id: component.product_id.clone(),
                        });
                    }
                    let child_units = units.saturating_mul(component.quantity_per_set as u64);
                    Self::collect_deductions(child, child_units, catalog, path, out)?;
                }
                path.pop();
                Ok(())
            }
        }
    }

    /// Aggregate the stock decrements for a whole cart and check them against
    /// current counters. Each line must pass `can_fulfill` on its own, then
    /// combos sharing a component are checked together.
    pub fn plan_commit<C: Catalog + ?Sized>(
        lines: &[CartLine],
        catalog: &C,
    ) -> PricingResult<StockCommitPlan> {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();

        for line in lines {
            if line.quantity == 0 {
                return Err(AssemblyError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                }
                .into());
            }
            let product = catalog.get_product(&line.product_id).ok_or_else(|| {
                AssemblyError::UnknownProduct {
                    product_id: line.product_id.clone(),
                }
            })?;
            // Per-line projection catches combos that expand to no leaves
            let available = Self::available_units(product, catalog)?;
            if line.quantity as u64 > available {
                return Err(AssemblyError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available,
                    requested: line.quantity as u64,
                }
                .into());
            }
            for deduction in Self::deductions(product, line.quantity as u64, catalog)? {
                let total = totals.entry(deduction.product_id).or_insert(0);
                *total = total.saturating_add(deduction.units);
            }
        }

        for (product_id, requested) in &totals {
            // Leaves are always singles, so the counter is authoritative
            let available = catalog
                .get_product(product_id)
                .map(|p| p.stock_units.max(0) as u64)
                .unwrap_or(0);
            if *requested > available {
                return Err(AssemblyError::InsufficientStock {
                    product_id: product_id.clone(),
                    available,
                    requested: *requested,
                }
                .into());
            }
        }

        Ok(StockCommitPlan {
            deductions: totals
                .into_iter()
                .map(|(product_id, units)| StockDeduction { product_id, units })
                .collect(),
        })
    }

    /// Availability plus display quantity and low-stock flag
    pub fn stock_level<C: Catalog + ?Sized>(
        product: &Product,
        catalog: &C,
        mode: MeasurementMode,
        low_stock_threshold: u64,
    ) -> Result<StockLevel, ConfigurationError> {
        let available = Self::available_units(product, catalog)?;
        let display = if product.is_combo() {
            DisplayQuantity {
                value: available as f64,
                unit: DisplayUnit::Sets,
            }
        } else {
            UnitConverter::to_display(available, mode, product.unit_weight)
        };

        Ok(StockLevel {
            product_id: product.id.clone(),
            available,
            display,
            low_stock: available < low_stock_threshold,
        })
    }

    /// Value of stock on hand: sum of `available × price` over single products
    pub fn stock_valuation<'a, I>(products: I) -> i64
    where
        I: IntoIterator<Item = &'a Product>,
    {
        products
            .into_iter()
            .filter(|p| !p.is_combo())
            .map(|p| p.stock_units.max(0).saturating_mul(p.price))
            .sum()
    }

    /// New counter value after a back-office adjustment of `delta` units.
    /// Removing more than is on hand is rejected.
    pub fn adjusted_units(product: &Product, delta: i64) -> Result<i64, AssemblyError> {
        let current = product.stock_units.max(0);
        let next = current.saturating_add(delta);
        if next < 0 {
            return Err(AssemblyError::InsufficientStock {
                product_id: product.id.clone(),
                available: current as u64,
                requested: delta.unsigned_abs(),
            });
        }
        Ok(next)
    }
}
