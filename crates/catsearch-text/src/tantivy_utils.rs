use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

use catsearch_core::document::AttributeKey;
use catsearch_core::settings::fields;

pub const CATALOG_TOKENIZER: &str = "catalog";

/// Raw category values, used for exact category filters.
pub const CATEGORY_EXACT: &str = "category_exact";
pub const IMAGE: &str = "image";
pub const URL: &str = "url";

/// Fields whose content goes through the catalog analyzer and may be searched.
pub const TEXT_FIELDS: [&str; 6] = [
	fields::NAME,
	fields::NAME_ALT,
	fields::SKU,
	fields::DESCRIPTION,
	fields::CATEGORIES,
	fields::TAGS,
];

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field(fields::ID, INDEXED | STORED | FAST);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(CATALOG_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let stored_text_options = text_options.clone().set_stored();
	schema_builder.add_text_field(fields::NAME, stored_text_options.clone());
	schema_builder.add_text_field(fields::NAME_ALT, text_options.clone());
	schema_builder.add_text_field(fields::SKU, text_options.clone());
	schema_builder.add_text_field(fields::DESCRIPTION, text_options.clone());
	schema_builder.add_text_field(fields::CATEGORIES, stored_text_options);
	schema_builder.add_text_field(fields::TAGS, text_options);
	schema_builder.add_text_field(CATEGORY_EXACT, STRING);
	schema_builder.add_f64_field(fields::PRICE, STORED | FAST);
	schema_builder.add_text_field(fields::STOCK_STATUS, STRING | STORED);
	schema_builder.add_u64_field(fields::IN_STOCK, INDEXED);
	schema_builder.add_u64_field(fields::PRIORITY, STORED | FAST);
	schema_builder.add_text_field(IMAGE, STORED);
	schema_builder.add_text_field(URL, STORED);
	for key in AttributeKey::ALL { schema_builder.add_text_field(key.field_name(), STRING | STORED); }
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.build();
	index.tokenizers().register(CATALOG_TOKENIZER, tokenizer);
}

/// Resolved field handles for the catalog schema.
#[derive(Debug, Clone)]
pub struct CatalogFields {
	pub id: Field,
	pub name: Field,
	pub name_alt: Field,
	pub sku: Field,
	pub description: Field,
	pub categories: Field,
	pub tags: Field,
	pub category_exact: Field,
	pub price: Field,
	pub stock_status: Field,
	pub in_stock: Field,
	pub priority: Field,
	pub image: Field,
	pub url: Field,
	pub attributes: Vec<(AttributeKey, Field)>,
}

impl CatalogFields {
	pub fn resolve(schema: &Schema) -> tantivy::Result<Self> {
		let mut attributes = Vec::with_capacity(AttributeKey::ALL.len());
		for key in AttributeKey::ALL { attributes.push((key, schema.get_field(key.field_name())?)); }
		Ok(Self {
			id: schema.get_field(fields::ID)?,
			name: schema.get_field(fields::NAME)?,
			name_alt: schema.get_field(fields::NAME_ALT)?,
			sku: schema.get_field(fields::SKU)?,
			description: schema.get_field(fields::DESCRIPTION)?,
			categories: schema.get_field(fields::CATEGORIES)?,
			tags: schema.get_field(fields::TAGS)?,
			category_exact: schema.get_field(CATEGORY_EXACT)?,
			price: schema.get_field(fields::PRICE)?,
			stock_status: schema.get_field(fields::STOCK_STATUS)?,
			in_stock: schema.get_field(fields::IN_STOCK)?,
			priority: schema.get_field(fields::PRIORITY)?,
			image: schema.get_field(IMAGE)?,
			url: schema.get_field(URL)?,
			attributes,
		})
	}

	/// Handle for a searchable text field, `None` for anything else.
	pub fn text_field(&self, name: &str) -> Option<Field> {
		match name {
			n if n == fields::NAME => Some(self.name),
			n if n == fields::NAME_ALT => Some(self.name_alt),
			n if n == fields::SKU => Some(self.sku),
			n if n == fields::DESCRIPTION => Some(self.description),
			n if n == fields::CATEGORIES => Some(self.categories),
			n if n == fields::TAGS => Some(self.tags),
			_ => None,
		}
	}
}
