//! Key meanings: the append-only history and the current key table
//!
//! This module contains the meaning history, the key-assignment table and
//! the parser for user-edited key-definition files.

pub mod history;
pub mod keys;

// Re-export key types for convenience
pub use history::{Meaning, MeaningHistory};
pub use keys::{
    is_reserved_key, load_assignments, merge_definitions, parse_key_definitions,
    split_meaning_text, KeyAssignments, KeyDefinition, DELETE_CHAR,
};
