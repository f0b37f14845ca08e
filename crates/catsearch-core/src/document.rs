//! Catalog entity → search document.

use regex::{Regex, RegexBuilder};

use crate::alt_name::alternate_name;
use crate::error::{Error, Result};
use crate::types::{CatalogEntity, DocumentAttributes, SearchDocument};

/// Categories matching this vocabulary mark an item as secondary (accessories,
/// glassware, snacks) so it ranks below primary catalog items.
pub const DEFAULT_LOW_PRIORITY_PATTERN: &str = r"accesori|accessor|cristaler|glassware|\bcopas?\b|sacacorcho|corkscrew|decant|estuche|gift ?box|merchandising|snack|piqueo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKey {
    Brand,
    Country,
    Region,
    Kind,
    Varietal,
    Volume,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 6] = [
        AttributeKey::Brand,
        AttributeKey::Country,
        AttributeKey::Region,
        AttributeKey::Kind,
        AttributeKey::Varietal,
        AttributeKey::Volume,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            AttributeKey::Brand => "brand",
            AttributeKey::Country => "country",
            AttributeKey::Region => "region",
            AttributeKey::Kind => "kind",
            AttributeKey::Varietal => "varietal",
            AttributeKey::Volume => "volume",
        }
    }

    /// Normalized catalog keys accepted for this attribute.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            AttributeKey::Brand => &["marca", "brand"],
            AttributeKey::Country => &["pais", "country"],
            AttributeKey::Region => &["region"],
            AttributeKey::Kind => &["tipo", "type", "kind"],
            AttributeKey::Varietal => &["varietal", "cepa"],
            AttributeKey::Volume => &["volumen", "volume"],
        }
    }

    fn slot(self, attrs: &mut DocumentAttributes) -> &mut String {
        match self {
            AttributeKey::Brand => &mut attrs.brand,
            AttributeKey::Country => &mut attrs.country,
            AttributeKey::Region => &mut attrs.region,
            AttributeKey::Kind => &mut attrs.kind,
            AttributeKey::Varietal => &mut attrs.varietal,
            AttributeKey::Volume => &mut attrs.volume,
        }
    }
}

impl DocumentAttributes {
    pub fn get(&self, key: AttributeKey) -> &str {
        match key {
            AttributeKey::Brand => &self.brand,
            AttributeKey::Country => &self.country,
            AttributeKey::Region => &self.region,
            AttributeKey::Kind => &self.kind,
            AttributeKey::Varietal => &self.varietal,
            AttributeKey::Volume => &self.volume,
        }
    }
}

/// `"pa_País "` → `"pais"`.
fn normalize_attribute_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();
    let bare = lowered.strip_prefix("pa_").unwrap_or(lowered.as_str());
    bare.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    pattern: Regex,
}

impl PriorityClassifier {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("priority pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// 0 if any category matches the low-priority vocabulary, else 1.
    pub fn priority(&self, categories: &[String]) -> u8 {
        if categories.iter().any(|c| self.pattern.is_match(c)) { 0 } else { 1 }
    }
}

impl Default for PriorityClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_PRIORITY_PATTERN).expect("default priority pattern compiles")
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    classifier: PriorityClassifier,
}

impl DocumentBuilder {
    pub fn new(classifier: PriorityClassifier) -> Self {
        Self { classifier }
    }

    pub fn build(&self, entity: &CatalogEntity) -> SearchDocument {
        SearchDocument {
            id: entity.id,
            name: entity.name.clone(),
            name_alt: alternate_name(&entity.name),
            sku: entity.sku.clone(),
            description: entity.description.clone(),
            price: entity.price.max(0.0),
            stock_status: entity.stock_status,
            in_stock: entity.stock_status.is_in_stock(),
            categories: entity.categories.clone(),
            tags: entity.tags.clone(),
            image: entity.image_url.clone(),
            url: entity.permalink.clone(),
            attributes: extract_attributes(entity),
            priority: self.classifier.priority(&entity.categories),
        }
    }

    pub fn build_all(&self, entities: &[CatalogEntity]) -> Vec<SearchDocument> {
        entities.iter().map(|e| self.build(e)).collect()
    }
}

/// Every key is always present; missing attributes map to "".
fn extract_attributes(entity: &CatalogEntity) -> DocumentAttributes {
    let mut attrs = DocumentAttributes::default();
    for key in AttributeKey::ALL {
        let value = entity
            .attributes
            .iter()
            .filter(|(k, _)| key.aliases().contains(&normalize_attribute_key(k).as_str()))
            .map(|(_, v)| v.joined())
            .find(|v| !v.is_empty())
            .unwrap_or_default();
        *key.slot(&mut attrs) = value;
    }
    attrs
}
