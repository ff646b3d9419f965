//! The order draft aggregate.

use serde::{Deserialize, Serialize};

use sumki_core::{OrderField, ProductKind};

use crate::identity::{Contact, Identity};

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn clean(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Everything collected for one order, built up step by step.
///
/// Storage is permissive: fields irrelevant to the current `product` are kept
/// (the user may switch product and come back) and are filtered at render time
/// by [`ProductKind::shows`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    product: Option<ProductKind>,
    size: Option<String>,
    shape: Option<String>,
    material: Option<String>,
    color: Option<String>,
    color_preference: Option<String>,
    options: Vec<String>,
    custom_description: Option<String>,
    contact: Option<Contact>,
    user: Option<Identity>,
}

impl OrderDraft {
    /// An empty draft with no product chosen yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A standalone draft for `product`. Wizard sessions build theirs through
    /// step inputs instead.
    pub fn new(product: ProductKind) -> Self {
        Self {
            product: Some(product),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = clean(size);
        self
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = clean(shape);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = clean(material);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = clean(color);
        self
    }

    pub fn with_color_preference(mut self, preference: impl Into<String>) -> Self {
        self.color_preference = clean(preference);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_options(options);
        self
    }

    pub fn with_custom_description(mut self, description: impl Into<String>) -> Self {
        self.custom_description = clean(description);
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_user(mut self, user: Identity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn product(&self) -> Option<ProductKind> {
        self.product
    }

    pub fn size(&self) -> Option<&str> {
        non_blank(self.size.as_deref())
    }

    pub fn shape(&self) -> Option<&str> {
        non_blank(self.shape.as_deref())
    }

    pub fn material(&self) -> Option<&str> {
        non_blank(self.material.as_deref())
    }

    pub fn color(&self) -> Option<&str> {
        non_blank(self.color.as_deref())
    }

    pub fn color_preference(&self) -> Option<&str> {
        non_blank(self.color_preference.as_deref())
    }

    /// Selected option codes, in selection order, without duplicates.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn custom_description(&self) -> Option<&str> {
        non_blank(self.custom_description.as_deref())
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    /// A draft is orderable once a product is chosen.
    pub fn is_orderable(&self) -> bool {
        self.product.is_some()
    }

    /// Whether `field` should be rendered for the chosen product.
    pub fn is_relevant(&self, field: OrderField) -> bool {
        self.product.is_some_and(|p| p.shows(field))
    }

    /// Whether a scalar field carries a non-blank value (options: non-empty set).
    pub fn has_value(&self, field: OrderField) -> bool {
        match field {
            OrderField::Product => self.product.is_some(),
            OrderField::Size => self.size().is_some(),
            OrderField::Shape => self.shape().is_some(),
            OrderField::Material => self.material().is_some(),
            OrderField::Color => self.color().is_some(),
            OrderField::ColorPreference => self.color_preference().is_some(),
            OrderField::Options => !self.options.is_empty(),
            OrderField::CustomDescription => self.custom_description().is_some(),
        }
    }

    // Step merges: `Some` overwrites (a blank value clears), `None` keeps.

    pub(crate) fn set_product(&mut self, product: ProductKind) {
        self.product = Some(product);
    }

    pub(crate) fn merge_size(&mut self, size: Option<String>) {
        if let Some(v) = size {
            self.size = clean(v);
        }
    }

    pub(crate) fn merge_shape(&mut self, shape: Option<String>) {
        if let Some(v) = shape {
            self.shape = clean(v);
        }
    }

    pub(crate) fn merge_material(&mut self, material: Option<String>) {
        if let Some(v) = material {
            self.material = clean(v);
        }
    }

    pub(crate) fn merge_color(&mut self, color: Option<String>) {
        if let Some(v) = color {
            self.color = clean(v);
        }
    }

    pub(crate) fn merge_color_preference(&mut self, preference: Option<String>) {
        if let Some(v) = preference {
            self.color_preference = clean(v);
        }
    }

    pub(crate) fn merge_custom_description(&mut self, description: Option<String>) {
        if let Some(v) = description {
            self.custom_description = clean(v);
        }
    }

    pub(crate) fn set_options<I, S>(&mut self, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for option in options {
            if let Some(code) = clean(option) {
                if !out.contains(&code) {
                    out.push(code);
                }
            }
        }
        self.options = out;
    }

    pub(crate) fn set_contact(&mut self, contact: Contact) {
        self.contact = Some(contact);
    }

    pub(crate) fn set_user(&mut self, user: Option<Identity>) {
        self.user = user;
    }
}
