//! # Product Types
//!
//! Catalog types for the storefront. Products are loaded from the
//! `[[products]]` tables of `config/store.toml` or handed over by the
//! persistence layer as plain records.

use serde::{Deserialize, Serialize};

/// Single item or a bundle built from other products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    #[default]
    Single,
    Combo,
}

/// One ingredient of a combo: `quantity_per_set` units of `product_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboComponent {
    pub product_id: String,
    pub quantity_per_set: u32,
}

impl ComboComponent {
    pub fn new(product_id: impl Into<String>, quantity_per_set: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity_per_set,
        }
    }
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "masala-crab")
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unit price in whole currency units
    pub price: i64,

    #[serde(default)]
    pub kind: ProductKind,

    /// Stock counter. Authoritative for singles, ignored for combos.
    #[serde(default)]
    pub stock_units: i64,

    /// Grams per unit, used in weight/volume mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_weight: Option<u32>,

    /// Components, in display order (combos only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComboComponent>,

    /// Whether this product is listed and purchasable
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a single product with its own stock counter
    pub fn single(id: impl Into<String>, price: i64, stock_units: i64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            price,
            kind: ProductKind::Single,
            stock_units,
            unit_weight: None,
            components: Vec::new(),
            active: true,
        }
    }

    /// Create a combo product; its availability is derived from the components
    pub fn combo(id: impl Into<String>, price: i64, components: Vec<ComboComponent>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            price,
            kind: ProductKind::Combo,
            stock_units: 0,
            unit_weight: None,
            components,
            active: true,
        }
    }

    /// Builder: set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set grams per unit
    pub fn with_unit_weight(mut self, grams: u32) -> Self {
        self.unit_weight = Some(grams);
        self
    }

    pub fn is_combo(&self) -> bool {
        matches!(self.kind, ProductKind::Combo)
    }
}

/// Read access to the catalog, implemented by whatever owns product records
pub trait Catalog {
    fn get_product(&self, id: &str) -> Option<&Product>;

    fn get_products(&self, ids: &[&str]) -> Vec<&Product> {
        ids.iter().filter_map(|id| self.get_product(id)).collect()
    }
}

/// Product catalog (loaded from config or a store snapshot)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Add a product, replacing any existing record with the same id
    pub fn add(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    /// Add with builder pattern
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    /// Get all active products
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

impl Catalog for ProductCatalog {
    fn get_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
