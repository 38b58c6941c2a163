//! Herbarium Sources
//!
//! The data-source abstraction and its three variants: scraped HTML
//! listings, cursor-paginated REST APIs, and pre-fetched bulk files.
//! A registry memoizes one instance per source id and a run context
//! wires the shared cache into every factory.

mod bulk;
mod context;
mod convert;
mod database;
mod error;
mod record;
mod registry;
mod rest;
mod scraped;

pub use bulk::BulkSource;
pub use context::{Config, Context, SourceConfig};
pub use convert::{Converter, FieldRule};
pub use database::Database;
pub use error::SourceError;
pub use record::{PlantRecord, Records, Trait};
pub use registry::Registry;
pub use rest::RestSource;
pub use scraped::ScrapedSource;
