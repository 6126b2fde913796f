use serde::{Deserialize, Serialize};

use stockroom_core::{Dimensions, DomainError, DomainResult, Entity, ProductId};

/// Catalog product.
///
/// Updates replace the whole record; build a new `Product` with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    /// Price in smallest currency unit (e.g., cents).
    unit_price: u64,
    weight: f64,
    dimensions: Dimensions,
}

/// Unvalidated wire shape; deserialization goes through [`Product::new`].
#[derive(Deserialize)]
struct ProductRecord {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: String,
    unit_price: u64,
    weight: f64,
    dimensions: Dimensions,
}

impl TryFrom<ProductRecord> for Product {
    type Error = DomainError;

    fn try_from(r: ProductRecord) -> Result<Self, Self::Error> {
        Product::new(r.id, r.name, r.description, r.unit_price, r.weight, r.dimensions)
    }
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        unit_price: u64,
        weight: f64,
        dimensions: Dimensions,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if unit_price == 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DomainError::validation(format!(
                "weight must be a positive number (got {weight})"
            )));
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            unit_price,
            weight,
            dimensions,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
