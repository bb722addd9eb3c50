use crate::error::{ConfsetError, Result, SetError};
use crate::loader::format::{Deserializer, Document, decode, decode_coercing};
use crate::loader::merge::merge_documents;
use crate::loader::{Loader, Overridable, check_override_path};
use crate::path::{ApplyMode, Settable, Value, set_fields};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed loader.
///
/// Reads `<path>/<name>` and optionally merges an override file over it. The
/// result is layered over the destination's current contents, so fields the
/// sources leave out keep their values. Path overrides are applied last, in
/// soft mode.
pub struct ConfigLoader {
	name: String,
	path: PathBuf,
	override_file: Option<PathBuf>,
	deserializer: Option<Box<dyn Deserializer>>,
	override_deserializer: Option<Box<dyn Deserializer>>,
	overrides: HashMap<String, Value>,
}

impl ConfigLoader {
	/// Loader for the file `name` in the current directory, with no deserializer set.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			path: PathBuf::from("."),
			override_file: None,
			deserializer: None,
			override_deserializer: None,
			overrides: HashMap::new(),
		}
	}

	/// Directory holding the main config file.
	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = path.into();
		self
	}

	/// Look for the main config file in `<user config dir>/<app>`.
	pub fn with_user_config_dir(self, app: &str) -> Result<Self> {
		let config_dir = dirs::config_dir().ok_or(ConfsetError::ConfigDirNotFound)?;
		Ok(self.with_path(config_dir.join(app)))
	}

	/// File merged over the main one; its values win on conflict.
	pub fn with_override_file(mut self, path: impl AsRef<Path>, name: &str) -> Self {
		self.override_file = Some(path.as_ref().join(name));
		self
	}

	pub fn with_deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
		self.deserializer = Some(Box::new(deserializer));
		self
	}

	/// Deserializer for the override file. Defaults to the main one.
	pub fn with_override_deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
		self.override_deserializer = Some(Box::new(deserializer));
		self
	}

	pub fn main_file(&self) -> PathBuf {
		self.path.join(&self.name)
	}

	pub fn override_file(&self) -> Option<&Path> {
		self.override_file.as_deref()
	}

	pub fn overrides(&self) -> &HashMap<String, Value> {
		&self.overrides
	}

	/// Read and merge the configured sources without decoding them.
	pub fn load_document(&self) -> Result<Document> {
		let deserializer = self
			.deserializer
			.as_deref()
			.ok_or(ConfsetError::MissingDeserializer)?;

		let mut document = read_document(&self.main_file(), deserializer)?;

		if let Some(ref override_file) = self.override_file {
			let override_deserializer = self.override_deserializer.as_deref().unwrap_or(deserializer);
			let overlay = read_document(override_file, override_deserializer)?;
			merge_documents(&mut document, overlay);
		}

		Ok(document)
	}

	fn is_string_typed(&self) -> bool {
		let main = self
			.deserializer
			.as_ref()
			.is_some_and(|d| d.is_string_typed());
		let overlay = self
			.override_deserializer
			.as_ref()
			.is_some_and(|d| d.is_string_typed());
		main || overlay
	}
}

impl<T> Loader<T> for ConfigLoader
where
	T: Settable + Serialize + DeserializeOwned,
{
	fn load(&self, config: &mut T) -> Result<()> {
		let loaded = self.load_document()?;

		let mut document = serde_json::to_value(&*config).map_err(|source| ConfsetError::Encode {
			type_name: type_name::<T>(),
			source,
		})?;
		merge_documents(&mut document, loaded);

		let decoded = if self.is_string_typed() {
			decode_coercing(document)
		} else {
			decode(document)
		};
		*config = decoded.map_err(|source| ConfsetError::Decode {
			type_name: type_name::<T>(),
			source,
		})?;

		apply_overrides(config, &self.overrides)
	}
}

impl Overridable for ConfigLoader {
	fn set_override(&mut self, path: &str, value: Value) -> Result<()> {
		check_override_path(path)?;
		self.overrides.insert(path.to_string(), value);
		Ok(())
	}
}

impl fmt::Debug for ConfigLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfigLoader")
			.field("main_file", &self.main_file())
			.field("override_file", &self.override_file)
			.field("deserializer", &self.deserializer.as_ref().map(|d| d.name()))
			.field(
				"override_deserializer",
				&self.override_deserializer.as_ref().map(|d| d.name()),
			)
			.field("overrides", &self.overrides)
			.finish()
	}
}

fn read_document(path: &Path, deserializer: &dyn Deserializer) -> Result<Document> {
	debug!(path = %path.display(), format = deserializer.name(), "loading configuration");

	let data = if deserializer.reads_input() {
		std::fs::read(path).map_err(|source| ConfsetError::ConfigReadError {
			path: path.to_path_buf(),
			source,
		})?
	} else {
		Vec::new()
	};

	deserializer
		.deserialize(&data)
		.map_err(|source| ConfsetError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})
}

/// Apply `overrides` softly and fold any failures into one error.
pub(crate) fn apply_overrides(
	config: &mut dyn Settable,
	overrides: &HashMap<String, Value>,
) -> Result<()> {
	let errors: Vec<SetError> = set_fields(config, overrides, ApplyMode::Soft);
	for err in &errors {
		warn!(path = err.path(), error = %err, "override not applied");
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(ConfsetError::Overrides { errors })
	}
}
