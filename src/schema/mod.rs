//! JSON-Schema generation from Python signatures.

pub mod literal;
pub mod params;
pub mod types;

pub use literal::{decode_string, eval_literal, LiteralError};
pub use params::build_parameters_schema;
pub use types::{is_nullable, permissive_schema, resolve, resolve_type};
