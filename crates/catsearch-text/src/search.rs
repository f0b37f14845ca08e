//! Query execution: analyzed query words are expanded against the term
//! dictionary into the exact, prefix and typo-corrected terms they may match,
//! then combined so that every word must match in at least one field.
//! Hits are ordered by document priority first and relevance second across
//! the whole match set, so the limit never cuts a primary item in favour of a
//! low-priority one.
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::time::Instant;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocId, Score, Searcher, SegmentReader, TantivyDocument, Term};
use tracing::debug;

use catsearch_core::settings::{fields as field_names, IndexSettings, RankingRule, TypoTolerance};
use catsearch_core::types::{EngineHits, EngineQuery, SearchResultItem, StockStatus};

use crate::index::TantivyBackend;
use crate::tantivy_utils::CATALOG_TOKENIZER;

/// A dictionary term one query word may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatch {
	pub typos: u8,
	pub exact: bool,
}

/// Expand `word` into matching terms of `field`.
///
/// Candidates must share the word's first character. A term matches when it is
/// within the word's typo budget, or, for the last query word, when it starts
/// with the word.
pub fn expand_word(searcher: &Searcher, field: Field, word: &str, is_last: bool, tolerance: &TypoTolerance) -> Result<BTreeMap<String, TermMatch>> {
	let mut found: BTreeMap<String, TermMatch> = BTreeMap::new();
	let Some(first) = word.chars().next() else { return Ok(found) };
	let mut first_buf = [0u8; 4];
	let first = first.encode_utf8(&mut first_buf);
	let word_len = word.chars().count();
	let budget = usize::from(tolerance.allowed_typos(word_len));

	for segment in searcher.segment_readers() {
		let inverted = segment.inverted_index(field)?;
		let mut stream = inverted.terms().range().ge(first.as_bytes()).into_stream()?;
		while stream.advance() {
			let Ok(term) = std::str::from_utf8(stream.key()) else { continue };
			if !term.starts_with(&*first) { break; }
			let candidate = if term == word {
				Some(TermMatch { typos: 0, exact: true })
			} else if is_last && term.starts_with(word) {
				Some(TermMatch { typos: 0, exact: false })
			} else if budget > 0 && term.chars().count().abs_diff(word_len) <= budget {
				let distance = strsim::levenshtein(word, term);
				(distance <= budget).then(|| TermMatch { typos: distance as u8, exact: false })
			} else {
				None
			};
			if let Some(candidate) = candidate {
				found.entry(term.to_string())
					.and_modify(|m| if candidate.typos < m.typos || candidate.exact { *m = candidate })
					.or_insert(candidate);
			}
		}
	}
	Ok(found)
}

/// Boost for a matched term: earlier searchable fields weigh more, typos and
/// inexact matches weigh less.
fn term_boost(settings: &IndexSettings, field_rank: usize, field_count: usize, m: TermMatch) -> f32 {
	let mut boost = 1.0;
	if settings.has_rule(RankingRule::Attribute) {
		boost *= 1.0 + 0.5 * (field_count - 1 - field_rank) as f32;
	}
	if settings.has_rule(RankingRule::Typo) {
		boost /= 1.0 + f32::from(m.typos);
	}
	if settings.has_rule(RankingRule::Exactness) && m.exact {
		boost *= 1.5;
	}
	boost
}

/// Bonus for documents holding the query words side by side.
const ADJACENCY_BOOST: f32 = 2.0;

fn require_filterable(settings: &IndexSettings, field: &str) -> Result<()> {
	if settings.filterable.iter().any(|f| f == field) { Ok(()) } else { Err(anyhow!("field '{}' is not filterable", field)) }
}

impl TantivyBackend {
	/// Run the query through the catalog analyzer; only the resulting words are matched.
	pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
		let mut analyzer = self.index.tokenizers().get(CATALOG_TOKENIZER).ok_or_else(|| anyhow!("tokenizer '{}' not registered", CATALOG_TOKENIZER))?;
		let mut stream = analyzer.token_stream(text);
		let mut words = Vec::new();
		while stream.advance() { words.push(stream.token().text.clone()); }
		Ok(words)
	}

	pub(crate) fn run_query(&self, query: &EngineQuery) -> Result<EngineHits> {
		let started = Instant::now();
		let elapsed = |started: Instant| started.elapsed().as_millis() as u64;
		let settings = self.settings()?;
		let searchable = query.searchable_override.as_ref().unwrap_or(&settings.searchable);
		let mut fields = Vec::with_capacity(searchable.len());
		for name in searchable {
			fields.push(self.fields.text_field(name).ok_or_else(|| anyhow!("field '{}' is not searchable", name))?);
		}
		let words = self.analyze(&query.q)?;
		if words.is_empty() || fields.is_empty() || query.limit == 0 {
			return Ok(EngineHits { items: Vec::new(), processing_time_ms: elapsed(started) });
		}

		let searcher = self.reader.searcher();
		let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(words.len() + 2);
		for (pos, word) in words.iter().enumerate() {
			let is_last = pos + 1 == words.len();
			let mut alternatives: Vec<(Occur, Box<dyn Query>)> = Vec::new();
			for (rank, field) in fields.iter().enumerate() {
				for (term, m) in expand_word(&searcher, *field, word, is_last, &settings.typo_tolerance)? {
					let term_query = TermQuery::new(Term::from_field_text(*field, &term), IndexRecordOption::WithFreqs);
					let boost = term_boost(&settings, rank, fields.len(), m);
					alternatives.push((Occur::Should, Box::new(BoostQuery::new(Box::new(term_query), boost))));
				}
			}
			if alternatives.is_empty() {
				debug!(word = %word, "query word matches no term");
				return Ok(EngineHits { items: Vec::new(), processing_time_ms: elapsed(started) });
			}
			clauses.push((Occur::Must, Box::new(BooleanQuery::new(alternatives))));
		}
		if settings.has_rule(RankingRule::Proximity) && words.len() > 1 {
			for field in &fields {
				let terms = words.iter().map(|w| Term::from_field_text(*field, w)).collect();
				clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(PhraseQuery::new(terms)), ADJACENCY_BOOST))));
			}
		}
		if query.filter.in_stock_only {
			require_filterable(&settings, field_names::IN_STOCK)?;
			clauses.push((Occur::Must, Box::new(TermQuery::new(Term::from_field_u64(self.fields.in_stock, 1), IndexRecordOption::Basic))));
		}
		if let Some(category) = &query.filter.category {
			require_filterable(&settings, field_names::CATEGORIES)?;
			clauses.push((Occur::Must, Box::new(TermQuery::new(Term::from_field_text(self.fields.category_exact, category), IndexRecordOption::Basic))));
		}

		// Ordered by (priority, relevance) over every match, before the limit applies.
		let collector = TopDocs::with_limit(query.limit).tweak_score(move |segment: &SegmentReader| {
			let priority = segment.fast_fields().u64(field_names::PRIORITY).ok();
			move |doc: DocId, score: Score| (priority.as_ref().and_then(|column| column.first(doc)).unwrap_or(1), score)
		});
		let top_docs = searcher.search(&BooleanQuery::new(clauses), &collector)?;
		let mut items = Vec::with_capacity(top_docs.len());
		for (_rank, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			items.push(self.to_item(&doc));
		}
		Ok(EngineHits { items, processing_time_ms: elapsed(started) })
	}

	fn to_item(&self, doc: &TantivyDocument) -> SearchResultItem {
		let f = &self.fields;
		let text = |field: Field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
		SearchResultItem {
			id: doc.get_first(f.id).and_then(|v| v.as_u64()).unwrap_or(0),
			name: Some(text(f.name)),
			price: Some(doc.get_first(f.price).and_then(|v| v.as_f64()).unwrap_or(0.0)),
			image: Some(text(f.image)),
			url: Some(text(f.url)),
			categories: Some(doc.get_all(f.categories).filter_map(|v| v.as_str()).map(str::to_string).collect()),
			stock_status: StockStatus::parse(&text(f.stock_status)),
		}
	}
}
