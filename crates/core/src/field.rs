//! Semantic fields of an order draft.

use serde::{Deserialize, Serialize};

/// A semantic field of the order draft.
///
/// The serialized form is the camelCase key used in outbound payloads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    Product,
    Size,
    Shape,
    Material,
    Color,
    ColorPreference,
    Options,
    CustomDescription,
}

impl OrderField {
    /// Every field, in render order.
    pub const ALL: [OrderField; 8] = [
        OrderField::Product,
        OrderField::Size,
        OrderField::Shape,
        OrderField::Material,
        OrderField::Color,
        OrderField::ColorPreference,
        OrderField::Options,
        OrderField::CustomDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderField::Product => "product",
            OrderField::Size => "size",
            OrderField::Shape => "shape",
            OrderField::Material => "material",
            OrderField::Color => "color",
            OrderField::ColorPreference => "colorPreference",
            OrderField::Options => "options",
            OrderField::CustomDescription => "customDescription",
        }
    }
}

impl core::fmt::Display for OrderField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_as_str() {
        for field in OrderField::ALL {
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, serde_json::Value::String(field.as_str().to_string()));
        }
    }
}
