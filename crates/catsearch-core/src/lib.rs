//! catsearch-core
//!
//! Catalog model, the alternate-name transform, document building and the
//! collaborator traits shared by the engine backend, gateways and synchronizer.

pub mod alt_name;
pub mod config;
pub mod document;
pub mod error;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
