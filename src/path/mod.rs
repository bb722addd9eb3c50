//! Path-addressed field mutation.
//!
//! This module handles:
//! - Splitting dotted paths into segments
//! - Walking records, sequences and mappings by segment
//! - Type-checked assignment at the leaf

pub mod node;
pub mod segment;
pub mod setter;
pub mod value;

pub use node::{
	FieldSlot, Mapping, NodeMut, Record, Sequence, Settable, assign_from, is_public,
};
pub use segment::FieldPath;
pub use setter::{ApplyMode, set_fields, set_value};
pub use value::{Mismatch, Value};
