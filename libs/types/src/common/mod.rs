//! Identifiers, pair records and errors shared by every exchange crate

pub mod errors;
pub mod identifiers;
pub mod pair;
