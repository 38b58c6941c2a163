//! Herbarium Core - Fundamental types
//!
//! This crate provides the two leaf abstractions used throughout
//! Herbarium:
//! - `Number`: arbitrary precision decimals for measurement magnitudes
//! - `Lazy`: pull-based lazy sequences for demand-driven catalogs

mod lazy;
mod number;

pub use lazy::{Lazy, LazyState};
pub use number::{Number, NumberError};
