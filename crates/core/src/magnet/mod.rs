//! Magnet URI validation and decomposition.
//!
//! Validation decides whether a user-entered string may be stored; parsing
//! never fails and only ever degrades to partial results.

mod parser;
mod types;
mod validator;

pub use parser::parse_magnet;
pub use types::ParsedMagnet;
pub use validator::{is_valid_magnet, MagnetValidator};
