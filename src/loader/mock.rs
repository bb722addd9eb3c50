use crate::error::Result;
use crate::loader::file::apply_overrides;
use crate::loader::{Loader, Overridable, check_override_path};
use crate::path::{ApplyMode, Settable, Value, set_fields};
use std::collections::HashMap;
use tracing::debug;

/// In-memory loader for tests.
///
/// `data` maps paths to values and is applied strictly: a path that does not
/// resolve fails the whole load. Overrides are applied softly afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
	pub data: HashMap<String, Value>,
	overrides: HashMap<String, Value>,
}

impl MockLoader {
	pub fn new(data: HashMap<String, Value>) -> Self {
		Self {
			data,
			overrides: HashMap::new(),
		}
	}

	pub fn overrides(&self) -> &HashMap<String, Value> {
		&self.overrides
	}
}

impl<K: Into<String>> FromIterator<(K, Value)> for MockLoader {
	fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
		Self::new(iter.into_iter().map(|(path, value)| (path.into(), value)).collect())
	}
}

impl<T: Settable> Loader<T> for MockLoader {
	fn load(&self, config: &mut T) -> Result<()> {
		debug!(entries = self.data.len(), "loading mock configuration");

		if let Some(err) = set_fields(config, &self.data, ApplyMode::Strict)
			.into_iter()
			.next()
		{
			return Err(err.into());
		}

		apply_overrides(config, &self.overrides)
	}
}

impl Overridable for MockLoader {
	fn set_override(&mut self, path: &str, value: Value) -> Result<()> {
		check_override_path(path)?;
		self.overrides.insert(path.to_string(), value);
		Ok(())
	}
}
