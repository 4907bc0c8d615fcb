//! Core types for the boundary catalog: definition records, feature rules,
//! registry loading, validation rules, licence tables and reference data.

mod error;

pub mod definition;
pub mod document;
pub mod licence;
pub mod reference;
pub mod registry;
pub mod rules;
pub mod validate;

pub use definition::{DEFINITION_FILE, Definition, LICENSE_FILE};
pub use error::CoreError;
pub use registry::{Entry, Registry};
pub use rules::{Feature, FieldRule, ValidityRule};
pub use validate::Diagnostic;
