//! Domain types used by the engine backend, the gateways and the synchronizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "instock", alias = "in_stock", alias = "in-stock")]
    InStock,
    #[serde(rename = "outofstock", alias = "out_of_stock", alias = "out-of-stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "instock",
            StockStatus::OutOfStock => "outofstock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "instock" | "in_stock" | "in-stock" => Some(StockStatus::InStock),
            "outofstock" | "out_of_stock" | "out-of-stock" => Some(StockStatus::OutOfStock),
            _ => None,
        }
    }

    pub fn is_in_stock(self) -> bool {
        self == StockStatus::InStock
    }
}

/// An attribute value as the catalog exposes it: a single term or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    One(String),
    Many(Vec<String>),
}

impl AttributeValue {
    /// Flatten to the document representation (`", "`-joined, blanks dropped).
    pub fn joined(&self) -> String {
        match self {
            AttributeValue::One(s) => s.trim().to_string(),
            AttributeValue::Many(values) => values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::One(s.to_string())
    }
}

/// A catalog item as the catalog collaborator exposes it. Read-only to us.
///
/// - `id`: stable, unique entity identifier; primary key of the search document
/// - `attributes`: raw attribute map, keys as the catalog names them
/// - `published`: unpublished entities must not have a search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default = "published_by_default")]
    pub published: bool,
}

fn published_by_default() -> bool {
    true
}

impl CatalogEntity {
    /// A published, in-stock entity with only id and name set.
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sku: String::new(),
            description: String::new(),
            price: 0.0,
            stock_status: StockStatus::InStock,
            categories: Vec::new(),
            tags: Vec::new(),
            image_url: String::new(),
            permalink: String::new(),
            attributes: BTreeMap::new(),
            published: true,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// The six fixed attribute fields carried by every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttributes {
    pub brand: String,
    pub country: String,
    pub region: String,
    pub kind: String,
    pub varietal: String,
    pub volume: String,
}

/// The document shape stored in the engine, one per published entity.
///
/// `name_alt` is derived from `name` and `priority` from `categories`; both are
/// recomputed on every build, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: EntityId,
    pub name: String,
    pub name_alt: String,
    pub sku: String,
    pub description: String,
    pub price: f64,
    pub stock_status: StockStatus,
    pub in_stock: bool,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub image: String,
    pub url: String,
    #[serde(flatten)]
    pub attributes: DocumentAttributes,
    pub priority: u8,
}

/// Fields a caller may project into result items. `id` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultField {
    Name,
    Price,
    Image,
    Url,
    Categories,
    StockStatus,
}

impl ResultField {
    pub const ALL: [ResultField; 6] = [
        ResultField::Name,
        ResultField::Price,
        ResultField::Image,
        ResultField::Url,
        ResultField::Categories,
        ResultField::StockStatus,
    ];
}

/// A projection of a document returned to callers; never the full document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<StockStatus>,
}

impl SearchResultItem {
    /// Drop every field not listed in `fields`.
    pub fn project(mut self, fields: &[ResultField]) -> Self {
        let keep = |f: ResultField| fields.contains(&f);
        if !keep(ResultField::Name) { self.name = None; }
        if !keep(ResultField::Price) { self.price = None; }
        if !keep(ResultField::Image) { self.image = None; }
        if !keep(ResultField::Url) { self.url = None; }
        if !keep(ResultField::Categories) { self.categories = None; }
        if !keep(ResultField::StockStatus) { self.stock_status = None; }
        self
    }
}

/// Engine-side filters over the filterable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// Caller options; together with the query they form the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub limit: usize,
    #[serde(default)]
    pub fields: Option<Vec<ResultField>>,
    #[serde(default)]
    pub filter: SearchFilter,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { limit: 20, fields: None, filter: SearchFilter::default() }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, ..Self::default() }
    }
}

/// Which fallback strategy produced a response. Absent means the direct search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLayer {
    Split,
    FirstCharStrip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub processing_time_ms: u64,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackLayer>,
}

impl SearchResponse {
    /// The normal "no matches" outcome.
    pub fn empty(processing_time_ms: u64) -> Self {
        Self { results: Vec::new(), processing_time_ms, cached: false, fallback: None }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Cache value: a response minus its cache-hit flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub results: Vec<SearchResultItem>,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub fallback: Option<FallbackLayer>,
}

impl From<&SearchResponse> for CachedResponse {
    fn from(r: &SearchResponse) -> Self {
        Self { results: r.results.clone(), processing_time_ms: r.processing_time_ms, fallback: r.fallback }
    }
}

impl CachedResponse {
    pub fn into_hit(self) -> SearchResponse {
        SearchResponse {
            results: self.results,
            processing_time_ms: self.processing_time_ms,
            cached: true,
            fallback: self.fallback,
        }
    }
}

/// One query as issued to the engine.
///
/// `searchable_override` restricts matching to the listed fields; `None`
/// searches the configured searchable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineQuery {
    pub q: String,
    pub limit: usize,
    pub searchable_override: Option<Vec<String>>,
    pub filter: SearchFilter,
}

impl EngineQuery {
    pub fn new(q: impl Into<String>, limit: usize) -> Self {
        Self { q: q.into(), limit, searchable_override: None, filter: SearchFilter::default() }
    }

    pub fn restricted_to(mut self, fields: &[&str]) -> Self {
        self.searchable_override = Some(fields.iter().map(|f| (*f).to_string()).collect());
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Ranked hits from one engine query, in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineHits {
    pub items: Vec<SearchResultItem>,
    pub processing_time_ms: u64,
}

/// Inbound change notifications from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    Created(CatalogEntity),
    Updated(CatalogEntity),
    Unpublished(EntityId),
    Deleted(EntityId),
}
