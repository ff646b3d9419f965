//! Rendering a draft into review rows and into the seller-facing message.
//!
//! Both renderings are pure: same draft, same identity, same tables → same
//! output, byte for byte. Fields irrelevant to the product and values that
//! are blank after trimming never appear.

use sumki_catalog::{NormalizationTables, TableKind};
use sumki_core::{OrderField, ProductKind};

use crate::draft::{OrderDraft, non_blank};
use crate::identity::{Contact, Identity};

const MESSAGE_HEADER: &str = "🛍️ *Новый заказ из мини-приложения*";
const DETAILS_HEADER: &str = "*Детали заказа:*";
const CLIENT_HEADER: &str = "*Данные клиента:*";
const NO_OPTIONS: &str = "Не выбраны";

/// One labeled line of the on-screen review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub field: OrderField,
    pub label: &'static str,
    pub value: String,
}

fn row_label(field: OrderField) -> &'static str {
    match field {
        OrderField::Product => "Тип изделия",
        OrderField::Size => "Размер",
        OrderField::Shape => "Форма",
        OrderField::Material => "Материал",
        OrderField::Color => "Цвет",
        OrderField::ColorPreference => "Пожелания по цвету",
        OrderField::Options => "Дополнительные опции",
        OrderField::CustomDescription => "Описание",
    }
}

fn message_label(field: OrderField) -> &'static str {
    match field {
        OrderField::Product => "Продукт",
        OrderField::Material => "Материал бусин",
        OrderField::CustomDescription => "Описание индивидуального заказа",
        other => row_label(other),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryFormatter<'t> {
    tables: &'t NormalizationTables,
}

impl SummaryFormatter<'static> {
    /// Formatter over the process-wide built-in tables.
    pub fn builtin() -> Self {
        Self::new(NormalizationTables::builtin())
    }
}

impl<'t> SummaryFormatter<'t> {
    pub fn new(tables: &'t NormalizationTables) -> Self {
        Self { tables }
    }

    /// Display labels of the selected options, in selection order.
    fn option_labels(&self, draft: &OrderDraft) -> Vec<String> {
        draft
            .options()
            .iter()
            .filter_map(|code| non_blank(Some(self.tables.label(TableKind::Option, code))))
            .map(str::to_string)
            .collect()
    }

    /// Resolved scalar value for `field`, or `None` when irrelevant or blank.
    fn scalar(&self, draft: &OrderDraft, product: ProductKind, field: OrderField) -> Option<String> {
        if !product.shows(field) {
            return None;
        }
        let resolved = match field {
            OrderField::Product => Some(self.tables.product_label(product)),
            OrderField::Size => draft.size(),
            OrderField::Shape => draft.shape().map(|c| self.tables.label(TableKind::Shape, c)),
            OrderField::Material => draft
                .material()
                .map(|c| self.tables.label(TableKind::Material, c)),
            OrderField::Color => draft.color().map(|c| self.tables.label(TableKind::Color, c)),
            OrderField::ColorPreference => draft.color_preference(),
            OrderField::CustomDescription => draft.custom_description(),
            OrderField::Options => None,
        };
        non_blank(resolved).map(str::to_string)
    }

    /// Rows for the review screen. Empty when no product is chosen yet.
    pub fn rows(&self, draft: &OrderDraft) -> Vec<SummaryRow> {
        let Some(product) = draft.product() else {
            return Vec::new();
        };

        OrderField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = if field == OrderField::Options {
                    if !product.shows(field) {
                        return None;
                    }
                    let labels = self.option_labels(draft);
                    if labels.is_empty() {
                        return None;
                    }
                    labels.join(", ")
                } else {
                    self.scalar(draft, product, field)?
                };
                Some(SummaryRow {
                    field,
                    label: row_label(field),
                    value,
                })
            })
            .collect()
    }

    /// The text handed to the seller.
    ///
    /// Options are listed one per bulleted line; an empty selection is spelled
    /// out when options apply to the product. The client block is omitted when
    /// there is neither identity nor contact.
    pub fn message(
        &self,
        draft: &OrderDraft,
        identity: Option<&Identity>,
        contact: Option<&Contact>,
    ) -> String {
        let mut out = String::new();
        out.push_str(MESSAGE_HEADER);
        out.push_str("\n\n");
        out.push_str(DETAILS_HEADER);
        out.push('\n');

        if let Some(product) = draft.product() {
            for field in OrderField::ALL {
                if field == OrderField::Options {
                    if !product.shows(field) {
                        continue;
                    }
                    let labels = self.option_labels(draft);
                    if labels.is_empty() {
                        out.push_str(&format!("- {}: {}\n", message_label(field), NO_OPTIONS));
                    } else {
                        out.push_str(&format!("- {}:", message_label(field)));
                        for label in labels {
                            out.push_str(&format!("\n  • {label}"));
                        }
                        out.push('\n');
                    }
                } else if let Some(value) = self.scalar(draft, product, field) {
                    out.push_str(&format!("- {}: {}\n", message_label(field), value));
                }
            }
        }

        let client = client_lines(identity, contact);
        if !client.is_empty() {
            out.push('\n');
            out.push_str(CLIENT_HEADER);
            out.push('\n');
            for line in client {
                out.push_str(&line);
                out.push('\n');
            }
        }

        out
    }
}

fn client_lines(identity: Option<&Identity>, contact: Option<&Contact>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(user) = identity {
        lines.push(format!("- ID: {}", user.id));
        let name = user.display_name();
        if !name.is_empty() {
            lines.push(format!("- Имя: {name}"));
        }
        if let Some(handle) = user.handle() {
            lines.push(format!("- Username: @{handle}"));
        }
    }
    if let Some(phone) = contact.and_then(|c| non_blank(Some(c.phone_number.as_str()))) {
        lines.push(format!("- Телефон: {phone}"));
    }
    lines
}
