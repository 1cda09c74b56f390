//! # Delivery Charges
//!
//! Resolves the delivery fee and cash-on-delivery eligibility for a
//! destination and parcel weight.
//!
//! ## Lookup precedence
//!
//! ```text
//! SUB_DISTRICT exact name ──► hit? use it
//!        │ miss
//! DISTRICT exact name     ──► hit? use it
//!        │ miss
//! ZONE exact name         ──► hit? use it
//!        │ miss
//! default_charge / default_cod_enabled
//! ```
//!
//! The first hit wins; prices are never summed across scopes. Weight
//! surcharges are added on top of whatever base fee was resolved and have no
//! influence on COD eligibility.

use crate::error::AssemblyError;
use crate::order::CartLine;
use crate::product::Catalog;
use crate::units::{MeasurementMode, UnitConverter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Geographic granularity of a delivery zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneScope {
    Zone,
    District,
    SubDistrict,
}

/// A priced delivery area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: String,
    pub scope: ZoneScope,
    /// Unique within its scope
    pub name: String,
    pub price: i64,
    #[serde(default = "default_true")]
    pub cod_eligible: bool,
}

impl DeliveryZone {
    pub fn new(id: impl Into<String>, scope: ZoneScope, name: impl Into<String>, price: i64, cod_eligible: bool) -> Self {
        Self {
            id: id.into(),
            scope,
            name: name.into(),
            price,
            cod_eligible,
        }
    }
}

/// Extra charge once the parcel reaches `min_weight_kg`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSurchargeTier {
    pub min_weight_kg: f64,
    pub charge: i64,
}

/// How matched weight tiers combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurchargeMode {
    /// Every tier whose threshold is met adds its charge
    #[default]
    Stacked,
    /// Only the tier with the highest met threshold applies
    HighestTier,
}

/// Store-wide delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_charge")]
    pub default_charge: i64,
    #[serde(default = "default_true")]
    pub default_cod_enabled: bool,
    /// Informational; refunds are handled outside the engine
    #[serde(default)]
    pub non_refundable_delivery_charge: bool,
    #[serde(default)]
    pub surcharge_mode: SurchargeMode,
    #[serde(default)]
    pub weight_tiers: Vec<WeightSurchargeTier>,
    #[serde(default)]
    pub zones: Vec<DeliveryZone>,
}

fn default_charge() -> i64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_charge: default_charge(),
            default_cod_enabled: true,
            non_refundable_delivery_charge: false,
            surcharge_mode: SurchargeMode::Stacked,
            weight_tiers: Vec::new(),
            zones: Vec::new(),
        }
    }
}

impl DeliveryConfig {
    pub fn with_zone(mut self, zone: DeliveryZone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn with_tier(mut self, min_weight_kg: f64, charge: i64) -> Self {
        self.weight_tiers.push(WeightSurchargeTier {
            min_weight_kg,
            charge,
        });
        self
    }

    fn find_zone(&self, scope: ZoneScope, name: Option<&str>) -> Option<&DeliveryZone> {
        let name = name?;
        self.zones
            .iter()
            .find(|z| z.scope == scope && z.name == name)
    }
}

/// Where the customer wants the order delivered, as declared at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_district: Option<String>,
}

impl Destination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(mut self, name: impl Into<String>) -> Self {
        self.zone = Some(name.into());
        self
    }

    pub fn district(mut self, name: impl Into<String>) -> Self {
        self.district = Some(name.into());
        self
    }

    pub fn sub_district(mut self, name: impl Into<String>) -> Self {
        self.sub_district = Some(name.into());
        self
    }
}

/// Resolved delivery charge with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub fee: i64,
    pub cod_eligible: bool,
    pub base_fee: i64,
    pub surcharge: i64,
    /// Scope of the matched zone; `None` means store defaults applied
    pub matched_scope: Option<ZoneScope>,
    pub matched_zone_id: Option<String>,
}

pub struct DeliveryChargeResolver;

impl DeliveryChargeResolver {
    /// Resolve fee and COD eligibility for a destination and parcel weight
    pub fn resolve(destination: &Destination, parcel_weight_kg: f64, config: &DeliveryConfig) -> DeliveryQuote {
        let matched = config
            .find_zone(ZoneScope::SubDistrict, destination.sub_district.as_deref())
            .or_else(|| config.find_zone(ZoneScope::District, destination.district.as_deref()))
            .or_else(|| config.find_zone(ZoneScope::Zone, destination.zone.as_deref()));

        let (base_fee, cod_eligible) = match matched {
            Some(zone) => {
                debug!(zone_id = %zone.id, scope = ?zone.scope, price = zone.price, "delivery zone matched");
                (zone.price, zone.cod_eligible)
            }
            None => (config.default_charge, config.default_cod_enabled),
        };

        let surcharge = Self::weight_surcharge(parcel_weight_kg, config);

        DeliveryQuote {
            fee: base_fee + surcharge,
            cod_eligible,
            base_fee,
            surcharge,
            matched_scope: matched.map(|z| z.scope),
            matched_zone_id: matched.map(|z| z.id.clone()),
        }
    }

    /// Weight surcharge for a parcel according to the configured mode
    pub fn weight_surcharge(parcel_weight_kg: f64, config: &DeliveryConfig) -> i64 {
        let met = config
            .weight_tiers
            .iter()
            .filter(|tier| tier.min_weight_kg <= parcel_weight_kg);

        match config.surcharge_mode {
            SurchargeMode::Stacked => met.map(|tier| tier.charge).sum(),
            SurchargeMode::HighestTier => met
                .fold(None::<&WeightSurchargeTier>, |best, tier| match best {
                    Some(b) if b.min_weight_kg >= tier.min_weight_kg => Some(b),
                    _ => Some(tier),
                })
                .map(|tier| tier.charge)
                .unwrap_or(0),
        }
    }

    /// Total parcel weight in kilograms. Zero in `Pieces` mode.
    pub fn parcel_weight_kg<C: Catalog + ?Sized>(
        lines: &[CartLine],
        catalog: &C,
        mode: MeasurementMode,
    ) -> Result<f64, AssemblyError> {
        if !mode.is_physical() {
            return Ok(0.0);
        }

        let mut grams: u64 = 0;
        for line in lines {
            let product = catalog.get_product(&line.product_id).ok_or_else(|| {
                AssemblyError::UnknownProduct {
                    product_id: line.product_id.clone(),
                }
            })?;
            grams = grams.saturating_add(UnitConverter::to_base(
                line.quantity as u64,
                mode,
                product.unit_weight,
            ));
        }
        Ok(grams as f64 / 1000.0)
    }
}
