use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use sumki_core::ProductKind;

/// Which of the five independent mappings a code belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Product,
    Shape,
    Material,
    Color,
    Option,
}

/// Code → label mappings used when rendering a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationTables {
    product: HashMap<String, String>,
    shape: HashMap<String, String>,
    material: HashMap<String, String>,
    color: HashMap<String, String>,
    option: HashMap<String, String>,
}

const PRODUCTS: &[(&str, &str)] = &[
    ("bag", "Сумка"),
    ("coaster", "Подстаканник"),
    ("custom", "Индивидуальный заказ"),
];

// Transliterated ids come from the chat flow, English ids from the mini app.
const SHAPES: &[(&str, &str)] = &[
    ("kruglaya", "Круглая"),
    ("pryamougolnaya", "Прямоугольная"),
    ("kvadratnaya", "Квадратная"),
    ("trapeciya", "Трапеция"),
    ("mesyac", "Месяц"),
    ("serdce", "Сердце"),
    ("round", "Круглая"),
    ("rectangular", "Прямоугольная"),
    ("square", "Квадратная"),
    ("trapezoid", "Трапеция"),
    ("crescent", "Месяц"),
    ("heart", "Сердце"),
];

const MATERIALS: &[(&str, &str)] = &[
    ("akril", "Акрил"),
    ("hrustal", "Хрусталь"),
    ("swarovski", "Swarovski"),
    ("acrylic", "Акрил"),
    ("crystal", "Хрусталь"),
];

const COLORS: &[(&str, &str)] = &[
    ("pink", "Розовый"),
    ("red", "Красный"),
    ("blue", "Синий"),
    ("green", "Зеленый"),
    ("yellow", "Желтый"),
    ("black", "Черный"),
    ("white", "Белый"),
    ("purple", "Фиолетовый"),
    ("orange", "Оранжевый"),
    ("gray", "Серый"),
    ("brown", "Коричневый"),
    ("gold", "Золотой"),
    ("silver", "Серебряный"),
    ("darkred", "Темно-красный"),
    ("darkblue", "Темно-синий"),
    ("darkgreen", "Темно-зеленый"),
    ("#f5222d", "Красный"),
    ("#eb2f96", "Розовый"),
    ("#722ed1", "Фиолетовый"),
    ("#1890ff", "Синий"),
    ("#13c2c2", "Голубой"),
    ("#52c41a", "Зеленый"),
    ("#fadb14", "Желтый"),
    ("#fa8c16", "Оранжевый"),
    ("#000000", "Черный"),
    ("#8c8c8c", "Серый"),
    ("#ffffff", "Белый"),
    ("#8B0000", "Темно-красный"),
    ("#00008B", "Темно-синий"),
    ("#006400", "Темно-зеленый"),
    ("#FFC0CB", "Розовый"),
];

const OPTIONS: &[(&str, &str)] = &[
    ("clasp", "Застежка"),
    ("lining", "Подкладка"),
    ("chain", "Цепочка"),
    ("short_handle", "Короткая ручка"),
    ("long_handle", "Длинная ручка"),
    ("pocket", "Карман"),
    ("zipper", "Молния"),
    ("embroidery", "Вышивка"),
    ("custom_color", "Индивидуальный цвет"),
];

fn to_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect()
}

impl NormalizationTables {
    /// Empty tables: every lookup falls back to the raw code.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide built-in tables, constructed on first use.
    pub fn builtin() -> &'static NormalizationTables {
        static TABLES: OnceLock<NormalizationTables> = OnceLock::new();
        TABLES.get_or_init(|| Self {
            product: to_map(PRODUCTS),
            shape: to_map(SHAPES),
            material: to_map(MATERIALS),
            color: to_map(COLORS),
            option: to_map(OPTIONS),
        })
    }

    /// Builder-style insertion, for assembling custom tables before they are shared.
    pub fn with_entry(
        mut self,
        kind: TableKind,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.table_mut(kind).insert(code.into(), label.into());
        self
    }

    fn table(&self, kind: TableKind) -> &HashMap<String, String> {
        match kind {
            TableKind::Product => &self.product,
            TableKind::Shape => &self.shape,
            TableKind::Material => &self.material,
            TableKind::Color => &self.color,
            TableKind::Option => &self.option,
        }
    }

    fn table_mut(&mut self, kind: TableKind) -> &mut HashMap<String, String> {
        match kind {
            TableKind::Product => &mut self.product,
            TableKind::Shape => &mut self.shape,
            TableKind::Material => &mut self.material,
            TableKind::Color => &mut self.color,
            TableKind::Option => &mut self.option,
        }
    }

    /// Exact lookup; `None` when the code is not in the table.
    pub fn lookup(&self, kind: TableKind, code: &str) -> Option<&str> {
        self.table(kind).get(code).map(String::as_str)
    }

    /// Label for `code`, or `code` itself when the table has no entry.
    pub fn label<'a>(&'a self, kind: TableKind, code: &'a str) -> &'a str {
        self.lookup(kind, code).unwrap_or(code)
    }

    pub fn product_label(&self, product: ProductKind) -> &str {
        self.label(TableKind::Product, product.code())
    }

    pub fn len(&self, kind: TableKind) -> usize {
        self.table(kind).len()
    }
}
