use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::{Mutex, RwLock};
use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::warn;

use catsearch_core::error::Error;
use catsearch_core::settings::{fields, IndexSettings};
use catsearch_core::traits::SearchBackend;
use catsearch_core::types::{EngineHits, EngineQuery, EntityId, SearchDocument};

use crate::tantivy_utils::{build_schema, register_tokenizer, CatalogFields, TEXT_FIELDS};

/// Fields the engine can filter on.
const FILTERABLE: [&str; 4] = [fields::IN_STOCK, fields::CATEGORIES, fields::PRICE, fields::STOCK_STATUS];
const SORTABLE: [&str; 2] = [fields::PRICE, fields::NAME];

pub struct TantivyBackend {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	/// Opened on the first mutation so read-only users never take the directory's writer lock.
	writer: Mutex<Option<IndexWriter>>,
	writer_memory: usize,
	pub(crate) fields: CatalogFields,
	pub(crate) settings: RwLock<IndexSettings>,
}

impl TantivyBackend {
	pub fn in_ram(writer_memory: usize) -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()), writer_memory)
	}

	/// Open the index under `index_dir`, creating the directory and index if missing.
	pub fn open_or_create(index_dir: &Path, writer_memory: usize) -> Result<Self> {
		std::fs::create_dir_all(index_dir)?;
		let directory = MmapDirectory::open(index_dir)?;
		let index = Index::open_or_create(directory, build_schema())?;
		Self::from_index(index, writer_memory)
	}

	fn from_index(index: Index, writer_memory: usize) -> Result<Self> {
		register_tokenizer(&index);
		let fields = CatalogFields::resolve(&index.schema())?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, writer: Mutex::new(None), writer_memory, fields, settings: RwLock::new(IndexSettings::default()) })
	}

	pub fn settings(&self) -> Result<IndexSettings> {
		Ok(self.settings.read().map_err(|_| anyhow!("settings lock poisoned"))?.clone())
	}

	/// Run `op` against the writer, opening it if needed. A failed operation is
	/// rolled back so its queued deletes never reach a later commit.
	fn with_writer<T>(&self, op: impl FnOnce(&mut IndexWriter) -> Result<T>) -> Result<T> {
		let mut guard = self.writer.lock().map_err(|_| anyhow!("index writer lock poisoned"))?;
		if guard.is_none() {
			*guard = Some(self.index.writer_with_num_threads(1, self.writer_memory)?);
		}
		let writer = guard.as_mut().ok_or_else(|| anyhow!("index writer unavailable"))?;
		match op(writer) {
			Ok(value) => Ok(value),
			Err(e) => {
				if let Err(rollback) = writer.rollback() {
					warn!(error = %rollback, "rollback failed, dropping index writer");
					*guard = None;
				}
				Err(e)
			}
		}
	}

	/// Commit pending operations and make them visible to searchers.
	fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
		writer.commit()?;
		self.reader.reload()?;
		Ok(())
	}

	fn to_tantivy(&self, d: &SearchDocument) -> TantivyDocument {
		let f = &self.fields;
		let mut doc = TantivyDocument::default();
		doc.add_u64(f.id, d.id);
		doc.add_text(f.name, &d.name);
		doc.add_text(f.name_alt, &d.name_alt);
		doc.add_text(f.sku, &d.sku);
		doc.add_text(f.description, &d.description);
		for c in &d.categories { doc.add_text(f.categories, c); doc.add_text(f.category_exact, c); }
		for t in &d.tags { doc.add_text(f.tags, t); }
		doc.add_f64(f.price, d.price);
		doc.add_text(f.stock_status, d.stock_status.as_str());
		doc.add_u64(f.in_stock, u64::from(d.in_stock));
		doc.add_u64(f.priority, u64::from(d.priority));
		doc.add_text(f.image, &d.image);
		doc.add_text(f.url, &d.url);
		for (key, field) in &f.attributes { doc.add_text(*field, d.attributes.get(*key)); }
		doc
	}
}

fn validate_settings(settings: &IndexSettings) -> std::result::Result<(), Error> {
	if settings.searchable.is_empty() {
		return Err(Error::IndexConfiguration("no searchable fields".into()));
	}
	if let Some(bad) = settings.searchable.iter().find(|f| !TEXT_FIELDS.contains(&f.as_str())) {
		return Err(Error::IndexConfiguration(format!("field '{}' is not searchable", bad)));
	}
	if let Some(bad) = settings.filterable.iter().find(|f| !FILTERABLE.contains(&f.as_str())) {
		return Err(Error::IndexConfiguration(format!("field '{}' is not filterable", bad)));
	}
	if let Some(bad) = settings.sortable.iter().find(|f| !SORTABLE.contains(&f.as_str())) {
		return Err(Error::IndexConfiguration(format!("field '{}' is not sortable", bad)));
	}
	let tolerance = settings.typo_tolerance;
	if tolerance.one_typo == 0 || tolerance.one_typo > tolerance.two_typos {
		return Err(Error::IndexConfiguration(format!(
			"typo thresholds must satisfy 0 < one_typo <= two_typos (got {} / {})",
			tolerance.one_typo, tolerance.two_typos
		)));
	}
	Ok(())
}

impl SearchBackend for TantivyBackend {
	fn configure(&self, settings: &IndexSettings) -> anyhow::Result<()> {
		validate_settings(settings)?;
		*self.settings.write().map_err(|_| anyhow!("settings lock poisoned"))? = settings.clone();
		Ok(())
	}

	fn search(&self, query: &EngineQuery) -> anyhow::Result<EngineHits> {
		self.run_query(query)
	}

	fn upsert(&self, docs: &[SearchDocument]) -> anyhow::Result<()> {
		if docs.is_empty() { return Ok(()); }
		self.with_writer(|writer| {
			for d in docs {
				writer.delete_term(Term::from_field_u64(self.fields.id, d.id));
				writer.add_document(self.to_tantivy(d))?;
			}
			self.commit(writer)
		})
	}

	fn delete(&self, id: EntityId) -> anyhow::Result<()> {
		self.with_writer(|writer| {
			writer.delete_term(Term::from_field_u64(self.fields.id, id));
			self.commit(writer)
		})
	}

	fn clear_all(&self) -> anyhow::Result<()> {
		self.with_writer(|writer| {
			writer.delete_all_documents()?;
			self.commit(writer)
		})
	}

	fn health(&self) -> anyhow::Result<()> {
		self.index.searchable_segment_ids()?;
		self.reader.searcher();
		Ok(())
	}

	fn document_count(&self) -> anyhow::Result<u64> {
		Ok(self.reader.searcher().num_docs())
	}
}
