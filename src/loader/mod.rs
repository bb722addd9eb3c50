//! Configuration loading for confset.
//!
//! This module handles:
//! - Format adapters (JSON, YAML, TOML, environment variables)
//! - Merging a main and an override source
//! - Applying path overrides on top of the loaded record

pub mod file;
pub mod format;
pub mod merge;
pub mod mock;

pub use file::ConfigLoader;
pub use format::{
	Deserializer, Document, EnvDeserializer, JsonDeserializer, TomlDeserializer, YamlDeserializer,
	decode, decode_coercing, deserializer_for_path,
};
pub use merge::merge_documents;
pub use mock::MockLoader;

use crate::error::Result;
use crate::path::{FieldPath, Value};

/// Holds path overrides that every load applies last.
pub trait Overridable {
	/// Record an override for `path`, replacing any earlier one for the same path.
	///
	/// Only the path syntax is checked here; whether it resolves is known at load time.
	fn set_override(&mut self, path: &str, value: Value) -> Result<()>;
}

/// Loads configuration into a `T` and layers path overrides on top.
///
/// Each loader states what it needs from `T`: the file loader round-trips
/// through serde, the mock loader only sets paths.
pub trait Loader<T>: Overridable {
	/// Populate `config`, then apply the recorded overrides.
	fn load(&self, config: &mut T) -> Result<()>;
}

/// Shared by loaders: reject syntactically invalid paths early.
pub(crate) fn check_override_path(path: &str) -> Result<()> {
	FieldPath::parse(path)?;
	Ok(())
}
