//! Numeric value model for the equation language.
//!
//! - `value`: tagged stack values and their conversion rules
//! - `data_type`: storage layouts of store variables
//! - `sync`: lock types used across the workspace

pub mod data_type;
pub mod sync;
pub mod value;

// Re-exports
pub use data_type::DataType;
pub use value::{width_mask, TypedValue, Value, ValueKind};
