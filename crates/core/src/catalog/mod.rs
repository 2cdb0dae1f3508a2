//! Bookmarked magnet links.
//!
//! Records live as one JSON array under the `records` key. Every mutation
//! validates the magnet URI first, so the store never holds one that fails
//! the active rule.

mod store;
mod transfer;
mod types;

pub use store::Catalog;
pub use types::*;
