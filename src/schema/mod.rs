//! Spreadsheet input schema
//!
//! The remote sheet has no fixed header spelling. This module holds the
//! table of accepted header aliases for every logical field and the tolerant
//! decoder for the fetch-all body.

mod fields;
mod payload;

pub use fields::*;
pub use payload::*;
