use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use catsearch_core::types::ResultField;

#[derive(Parser)]
#[command(name = "catsearch")]
#[command(about = "Typo-tolerant catalog search with layered fallbacks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Index directory (overrides engine.index_dir)
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    /// Keep the index in memory for this invocation only
    #[arg(long, global = true, conflicts_with = "index_dir")]
    pub in_memory: bool,

    /// Catalog export (overrides sync.catalog_path)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clear the index and rebuild it from the catalog
    Reindex,
    /// Run a query through the fallback layers and print the response as JSON
    Search {
        query: String,
        #[arg(long, short)]
        limit: Option<usize>,
        /// Only in-stock products
        #[arg(long)]
        in_stock: bool,
        /// Exact category name
        #[arg(long)]
        category: Option<String>,
        /// Result fields to include (default: all)
        #[arg(long, value_delimiter = ',', value_enum)]
        fields: Vec<FieldArg>,
    },
    /// Apply one catalog change event
    Sync {
        #[arg(value_enum)]
        event: EventArg,
        /// Entity id
        id: u64,
    },
    /// Report engine and cache status
    Health,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventArg {
    Created,
    Updated,
    Unpublished,
    Deleted,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldArg {
    Name,
    Price,
    Image,
    Url,
    Categories,
    StockStatus,
}

impl From<FieldArg> for ResultField {
    fn from(f: FieldArg) -> Self {
        match f {
            FieldArg::Name => ResultField::Name,
            FieldArg::Price => ResultField::Price,
            FieldArg::Image => ResultField::Image,
            FieldArg::Url => ResultField::Url,
            FieldArg::Categories => ResultField::Categories,
            FieldArg::StockStatus => ResultField::StockStatus,
        }
    }
}
