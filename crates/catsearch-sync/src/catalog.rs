//! File-backed catalog reading the scraper's `products.json` export.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::hash::Hasher;
use std::path::Path;
use tracing::{info, warn};
use twox_hash::XxHash64;

use catsearch_core::error::{Error, Result};
use catsearch_core::traits::CatalogSource;
use catsearch_core::types::{AttributeValue, CatalogEntity, EntityId, StockStatus};

/// One product as exported by the scraper.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    id: Option<EntityId>,
    name: String,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    regular_price: Option<f64>,
    #[serde(default)]
    sale_price: Option<f64>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    stock_status: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    published: Option<bool>,
}

impl ProductRecord {
    fn into_entity(self) -> CatalogEntity {
        let id = self.id.unwrap_or_else(|| {
            let key = if self.external_id.is_empty() { &self.url } else { &self.external_id };
            stable_id(key)
        });
        let description = if self.description.trim().is_empty() { self.short_description } else { self.description };
        let price = self.sale_price.or(self.price).or(self.regular_price).unwrap_or(0.0);
        CatalogEntity {
            id,
            name: self.name,
            sku: self.sku,
            description,
            price,
            stock_status: StockStatus::parse(&self.stock_status).unwrap_or(StockStatus::InStock),
            categories: self.categories,
            tags: self.tags,
            image_url: self.images.into_iter().next().unwrap_or_default(),
            permalink: self.url,
            attributes: self.attributes,
            published: self.published.unwrap_or(true),
        }
    }
}

/// xxHash64 of the external key, kept within the positive `i64` range.
pub fn stable_id(key: &str) -> EntityId {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(key.as_bytes());
    hasher.finish() >> 1
}

/// In-memory catalog in file order.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    entities: Vec<CatalogEntity>,
}

impl JsonCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("reading {}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&raw)?;
        info!(path = %path.display(), entities = catalog.entities.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Parse a JSON array of products. Records without a name are skipped.
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<ProductRecord> =
            serde_json::from_str(raw).map_err(|e| Error::Catalog(format!("malformed catalog: {}", e)))?;
        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            if record.name.trim().is_empty() {
                warn!(url = %record.url, "skipping product without a name");
                continue;
            }
            entities.push(record.into_entity());
        }
        Ok(Self { entities })
    }

    pub fn from_entities(entities: Vec<CatalogEntity>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[CatalogEntity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Result<&CatalogEntity> {
        self.entities.iter().find(|e| e.id == id).ok_or_else(|| Error::NotFound(format!("entity {}", id)))
    }
}

impl CatalogSource for JsonCatalog {
    fn count(&self) -> anyhow::Result<usize> {
        Ok(self.entities.len())
    }

    fn page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<CatalogEntity>> {
        Ok(self.entities.iter().skip(offset).take(limit).cloned().collect())
    }
}
