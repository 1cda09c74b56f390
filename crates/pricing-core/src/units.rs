//! # Measurement Units
//!
//! Converts abstract stock/cart unit counts into something a shopper can read
//! (pieces, grams, millilitres) and back.
//!
//! The measurement mode is a store-wide setting. In `Weight` and `Volume` mode a
//! single unit stands for `unit_weight` grams (or millilitres).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grams (or ml) per unit when the product does not say otherwise
pub const DEFAULT_UNIT_WEIGHT_GRAMS: u32 = 200;

/// Store-wide measurement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementMode {
    #[default]
    Pieces,
    Weight,
    Volume,
}

impl MeasurementMode {
    /// Whether units carry a physical weight for delivery purposes
    pub fn is_physical(&self) -> bool {
        !matches!(self, MeasurementMode::Pieces)
    }
}

/// Display unit attached to a converted quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayUnit {
    #[serde(rename = "pcs")]
    Pieces,
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "ml")]
    Millilitres,
    #[serde(rename = "L")]
    Litres,
    #[serde(rename = "sets")]
    Sets,
}

impl DisplayUnit {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayUnit::Pieces => "pcs",
            DisplayUnit::Grams => "g",
            DisplayUnit::Kilograms => "kg",
            DisplayUnit::Millilitres => "ml",
            DisplayUnit::Litres => "L",
            DisplayUnit::Sets => "sets",
        }
    }
}

/// A quantity ready for display, e.g. `1.4 kg`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayQuantity {
    pub value: f64,
    pub unit: DisplayUnit,
}

impl fmt::Display for DisplayQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            DisplayUnit::Kilograms | DisplayUnit::Litres => {
                write!(f, "{:.1} {}", self.value, self.unit.label())
            }
            _ => write!(f, "{} {}", self.value as u64, self.unit.label()),
        }
    }
}

/// Resolve the effective grams-per-unit, falling back to the default
pub fn effective_unit_weight(unit_weight: Option<u32>) -> u32 {
    match unit_weight {
        Some(w) if w > 0 => w,
        _ => DEFAULT_UNIT_WEIGHT_GRAMS,
    }
}

/// Stateless unit conversions
pub struct UnitConverter;

impl UnitConverter {
    /// Convert a unit count into a displayable quantity.
    ///
    /// Pieces pass through. Weight/volume are multiplied out to grams/ml and
    /// shown in kg/L (one decimal) from 1000 upwards.
    pub fn to_display(units: u64, mode: MeasurementMode, unit_weight: Option<u32>) -> DisplayQuantity {
        let (small, large) = match mode {
            MeasurementMode::Pieces => {
                return DisplayQuantity {
                    value: units as f64,
                    unit: DisplayUnit::Pieces,
                }
            }
            MeasurementMode::Weight => (DisplayUnit::Grams, DisplayUnit::Kilograms),
            MeasurementMode::Volume => (DisplayUnit::Millilitres, DisplayUnit::Litres),
        };

        let base = Self::to_base(units, mode, unit_weight);
        if base >= 1000 {
            // Round to tenths in integer space so 1450 g -> 1.5 kg consistently
            let tenths = (base + 50) / 100;
            DisplayQuantity {
                value: tenths as f64 / 10.0,
                unit: large,
            }
        } else {
            DisplayQuantity {
                value: base as f64,
                unit: small,
            }
        }
    }

    /// Units expressed in grams/ml (or pieces in `Pieces` mode)
    pub fn to_base(units: u64, mode: MeasurementMode, unit_weight: Option<u32>) -> u64 {
        match mode {
            MeasurementMode::Pieces => units,
            _ => units.saturating_mul(effective_unit_weight(unit_weight) as u64),
        }
    }

    /// Convert grams/ml back into whole units, rounding down
    pub fn to_units(base_quantity: u64, mode: MeasurementMode, unit_weight: Option<u32>) -> u64 {
        match mode {
            MeasurementMode::Pieces => base_quantity,
            _ => base_quantity / effective_unit_weight(unit_weight) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pieces_pass_through() {
        let q = UnitConverter::to_display(7, MeasurementMode::Pieces, Some(500));
        assert_eq!(q.value, 7.0);
        assert_eq!(q.unit, DisplayUnit::Pieces);
        assert_eq!(q.to_string(), "7 pcs");
    }

    #[test]
    fn test_weight_below_kilo_stays_in_grams() {
        let q = UnitConverter::to_display(2, MeasurementMode::Weight, Some(200));
        assert_eq!(q.unit, DisplayUnit::Grams);
        assert_eq!(q.to_string(), "400 g");
    }

    #[test]
    fn test_weight_rolls_over_to_kilograms() {
        let q = UnitConverter::to_display(7, MeasurementMode::Weight, Some(200));
        assert_eq!(q.unit, DisplayUnit::Kilograms);
        assert_eq!(q.value, 1.4);
        assert_eq!(q.to_string(), "1.4 kg");

        let exact = UnitConverter::to_display(5, MeasurementMode::Weight, Some(200));
        assert_eq!(exact.to_string(), "1.0 kg");
    }

    #[test]
    fn test_volume_uses_litres() {
        let q = UnitConverter::to_display(3, MeasurementMode::Volume, Some(400));
        assert_eq!(q.to_string(), "1.2 L");

        let small = UnitConverter::to_display(3, MeasurementMode::Volume, Some(200));
        assert_eq!(small.to_string(), "600 ml");
    }

    #[test]
    fn test_missing_or_zero_unit_weight_defaults() {
        assert_eq!(effective_unit_weight(None), 200);
        assert_eq!(effective_unit_weight(Some(0)), 200);
        let q = UnitConverter::to_display(1, MeasurementMode::Weight, Some(0));
        assert_eq!(q.to_string(), "200 g");
    }

    #[test]
    fn test_back_conversion_floors() {
        assert_eq!(UnitConverter::to_units(1450, MeasurementMode::Weight, Some(200)), 7);
        assert_eq!(UnitConverter::to_units(199, MeasurementMode::Weight, Some(200)), 0);
        assert_eq!(UnitConverter::to_units(12, MeasurementMode::Pieces, Some(200)), 12);
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let a = UnitConverter::to_display(9, MeasurementMode::Weight, Some(250));
        let b = UnitConverter::to_display(9, MeasurementMode::Weight, Some(250));
        assert_eq!(a, b);
    }
}
