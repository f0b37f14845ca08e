//! Index-level settings applied to the engine once at startup.

use serde::{Deserialize, Serialize};

/// Engine field names.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const NAME_ALT: &str = "name_alt";
    pub const SKU: &str = "sku";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORIES: &str = "categories";
    pub const TAGS: &str = "tags";
    pub const PRICE: &str = "price";
    pub const STOCK_STATUS: &str = "stock_status";
    pub const IN_STOCK: &str = "in_stock";
    pub const PRIORITY: &str = "priority";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingRule {
    Words,
    Typo,
    Proximity,
    Attribute,
    Sort,
    Exactness,
}

/// Minimum word length (in characters) for one and two correctable typos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypoTolerance {
    pub one_typo: usize,
    pub two_typos: usize,
}

impl Default for TypoTolerance {
    fn default() -> Self {
        Self { one_typo: 3, two_typos: 7 }
    }
}

impl TypoTolerance {
    pub fn allowed_typos(&self, word_len: usize) -> u8 {
        if word_len >= self.two_typos {
            2
        } else if word_len >= self.one_typo {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Highest priority first. `name_alt` stays last so it never outranks a direct name match.
    pub searchable: Vec<String>,
    /// Filters on fields missing here are rejected at query time.
    pub filterable: Vec<String>,
    /// Validated only. Results have no caller-selected sort order.
    pub sortable: Vec<String>,
    /// `Sort` is accepted but has no effect for the same reason.
    pub ranking_rules: Vec<RankingRule>,
    pub typo_tolerance: TypoTolerance,
}

impl Default for IndexSettings {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| (*n).to_string()).collect::<Vec<_>>();
        Self {
            searchable: owned(&[
                fields::NAME,
                fields::SKU,
                fields::DESCRIPTION,
                fields::CATEGORIES,
                fields::TAGS,
                fields::NAME_ALT,
            ]),
            filterable: owned(&[fields::IN_STOCK, fields::CATEGORIES, fields::PRICE, fields::STOCK_STATUS]),
            sortable: owned(&[fields::PRICE, fields::NAME]),
            ranking_rules: vec![
                RankingRule::Words,
                RankingRule::Typo,
                RankingRule::Proximity,
                RankingRule::Attribute,
                RankingRule::Sort,
                RankingRule::Exactness,
            ],
            typo_tolerance: TypoTolerance::default(),
        }
    }
}

impl IndexSettings {
    pub fn has_rule(&self, rule: RankingRule) -> bool {
        self.ranking_rules.contains(&rule)
    }
}
