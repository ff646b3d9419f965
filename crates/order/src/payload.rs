//! The structure handed to the host bridge.

use serde::{Deserialize, Serialize};

use sumki_core::{OrderField, ProductKind};

use crate::draft::OrderDraft;
use crate::identity::{Contact, Identity};

/// Outbound order payload.
///
/// Carries raw codes (not display labels) for every field relevant to the
/// product, plus the host identity and contact. A key is present only when it
/// has a non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl OutboundPayload {
    pub fn from_draft(
        draft: &OrderDraft,
        identity: Option<&Identity>,
        contact: Option<&Contact>,
    ) -> Self {
        let relevant = |field: OrderField, value: Option<&str>| -> Option<String> {
            if draft.is_relevant(field) {
                value.map(str::to_string)
            } else {
                None
            }
        };

        let options = if draft.is_relevant(OrderField::Options) {
            draft.options().to_vec()
        } else {
            Vec::new()
        };

        Self {
            product: draft.product(),
            size: relevant(OrderField::Size, draft.size()),
            shape: relevant(OrderField::Shape, draft.shape()),
            material: relevant(OrderField::Material, draft.material()),
            color: relevant(OrderField::Color, draft.color()),
            color_preference: relevant(OrderField::ColorPreference, draft.color_preference()),
            options,
            custom_description: relevant(OrderField::CustomDescription, draft.custom_description()),
            user: identity.map(Identity::normalized),
            contact: contact
                .filter(|c| !c.phone_number.trim().is_empty())
                .cloned(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rebuild a draft from a received payload, for rendering on the receiving
    /// side. `None` when the payload names no product.
    pub fn to_draft(&self) -> Option<OrderDraft> {
        let mut draft = OrderDraft::new(self.product?).with_options(self.options.iter().cloned());
        if let Some(v) = &self.size {
            draft = draft.with_size(v.clone());
        }
        if let Some(v) = &self.shape {
            draft = draft.with_shape(v.clone());
        }
        if let Some(v) = &self.material {
            draft = draft.with_material(v.clone());
        }
        if let Some(v) = &self.color {
            draft = draft.with_color(v.clone());
        }
        if let Some(v) = &self.color_preference {
            draft = draft.with_color_preference(v.clone());
        }
        if let Some(v) = &self.custom_description {
            draft = draft.with_custom_description(v.clone());
        }
        if let Some(c) = &self.contact {
            draft = draft.with_contact(c.clone());
        }
        if let Some(u) = &self.user {
            draft = draft.with_user(u.clone());
        }
        Some(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bag_payload_keeps_codes_and_omits_empty_keys() {
        let draft = OrderDraft::new(ProductKind::Bag)
            .with_size("M")
            .with_shape("round")
            .with_material("acrylic")
            .with_color("pink")
            .with_custom_description("ignored for bags");
        let payload = OutboundPayload::from_draft(&draft, None, None);
        let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "product": "bag",
                "size": "M",
                "shape": "round",
                "material": "acrylic",
                "color": "pink",
            })
        );
    }

    #[test]
    fn custom_payload_carries_identity_and_contact() {
        let draft = OrderDraft::new(ProductKind::Custom)
            .with_custom_description("red velvet pouch")
            .with_color("pink");
        let user = Identity::new(42, "Anna")
            .with_username(" ")
            .with_language_code("ru");
        let contact = Contact::new("+79990001122").unwrap();
        let payload = OutboundPayload::from_draft(&draft, Some(&user), Some(&contact));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "product": "custom",
                "customDescription": "red velvet pouch",
                "user": {"id": 42, "first_name": "Anna", "language_code": "ru"},
                "contact": {"phone_number": "+79990001122"},
            })
        );
    }

    #[test]
    fn to_draft_preserves_relevant_fields() {
        let draft = OrderDraft::new(ProductKind::Bag)
            .with_size("L")
            .with_shape("heart")
            .with_material("crystal")
            .with_color("black")
            .with_options(["chain", "clasp"]);
        let user = Identity::new(3, "Ivan");
        let payload = OutboundPayload::from_draft(&draft, Some(&user), None);
        let rebuilt = payload.to_draft().unwrap();
        assert_eq!(rebuilt, draft.clone().with_user(user));
        assert_eq!(OutboundPayload::default().to_draft(), None);
    }

    #[test]
    fn payload_parses_back_from_host_json() {
        let raw = r#"{"product":"coaster","material":"crystal","options":["chain"]}"#;
        let payload: OutboundPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.product, Some(ProductKind::Coaster));
        assert_eq!(payload.options, vec!["chain".to_string()]);
        assert_eq!(payload.user, None);
    }
}
