//! Product kinds and the field relevance policy.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::field::OrderField;

/// The kind of item being ordered. Chooses the wizard branch and which fields
/// are rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Bag,
    Coaster,
    Custom,
}

impl ProductKind {
    /// Internal code, as sent in payloads and used as the normalization key.
    pub fn code(&self) -> &'static str {
        match self {
            ProductKind::Bag => "bag",
            ProductKind::Coaster => "coaster",
            ProductKind::Custom => "custom",
        }
    }

    /// Whether `field` is relevant (rendered, sent) for this product.
    ///
    /// | product | size | shape | material | color | options | description |
    /// |---------|------|-------|----------|-------|---------|-------------|
    /// | bag     | yes  | yes   | yes      | yes   | yes     | no          |
    /// | coaster | no   | no    | yes      | yes   | yes     | no          |
    /// | custom  | no   | no    | no       | no    | no      | yes         |
    ///
    /// `colorPreference` follows `color`; `product` is always relevant.
    pub fn shows(&self, field: OrderField) -> bool {
        use OrderField::*;
        match (self, field) {
            (_, Product) => true,
            (ProductKind::Bag, CustomDescription) => false,
            (ProductKind::Bag, _) => true,
            (ProductKind::Coaster, Material | Color | ColorPreference | Options) => true,
            (ProductKind::Coaster, _) => false,
            (ProductKind::Custom, CustomDescription) => true,
            (ProductKind::Custom, _) => false,
        }
    }
}

impl core::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProductKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bag" => Ok(ProductKind::Bag),
            "coaster" => Ok(ProductKind::Coaster),
            "custom" => Ok(ProductKind::Custom),
            other => Err(DomainError::invalid_code(format!("unknown product `{other}`"))),
        }
    }
}
