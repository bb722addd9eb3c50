use crate::error::ParseError;
use config::ValueKind;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

/// Format-neutral parsed configuration tree.
pub type Document = serde_json::Value;

/// Turns raw configuration bytes into a [`Document`].
pub trait Deserializer {
	fn deserialize(&self, data: &[u8]) -> Result<Document, ParseError>;

	/// Short format name used in logs.
	fn name(&self) -> &'static str;

	/// Whether the loader has to read a file for this format.
	fn reads_input(&self) -> bool {
		true
	}

	/// Whether every scalar comes out as a string, to be read as whatever
	/// type the destination field has.
	fn is_string_typed(&self) -> bool {
		false
	}
}

impl<D: Deserializer + ?Sized> Deserializer for Box<D> {
	fn deserialize(&self, data: &[u8]) -> Result<Document, ParseError> {
		(**self).deserialize(data)
	}

	fn name(&self) -> &'static str {
		(**self).name()
	}

	fn reads_input(&self) -> bool {
		(**self).reads_input()
	}

	fn is_string_typed(&self) -> bool {
		(**self).is_string_typed()
	}
}

/// JSON documents via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeserializer;

impl Deserializer for JsonDeserializer {
	fn deserialize(&self, data: &[u8]) -> Result<Document, ParseError> {
		Ok(serde_json::from_slice(data)?)
	}

	fn name(&self) -> &'static str {
		"json"
	}
}

/// YAML documents via `serde_yaml`. An empty file is an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDeserializer;

impl Deserializer for YamlDeserializer {
	fn deserialize(&self, data: &[u8]) -> Result<Document, ParseError> {
		if data.iter().all(u8::is_ascii_whitespace) {
			return Ok(Document::Object(Default::default()));
		}
		let document: Document = serde_yaml::from_slice(data)?;
		if document.is_null() {
			return Ok(Document::Object(Default::default()));
		}
		Ok(document)
	}

	fn name(&self) -> &'static str {
		"yaml"
	}
}

/// TOML documents via `toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDeserializer;

impl Deserializer for TomlDeserializer {
	fn deserialize(&self, data: &[u8]) -> Result<Document, ParseError> {
		let content = std::str::from_utf8(data)?;
		Ok(toml::from_str(content)?)
	}

	fn name(&self) -> &'static str {
		"toml"
	}
}

/// Environment variables via the `config` crate.
///
/// Input bytes are ignored. Keys are lowercased, stripped of `<PREFIX>_` and
/// nested on the separator (`__` by default), so `APP_NESTED__FIELD3=true`
/// becomes `{"nested": {"field3": "true"}}` with prefix `APP`. Values stay
/// strings until [`decode_coercing`] reads them into typed fields.
#[derive(Debug, Clone)]
pub struct EnvDeserializer {
	prefix: Option<String>,
	separator: String,
	vars: Option<HashMap<String, String>>,
}

impl Default for EnvDeserializer {
	fn default() -> Self {
		Self {
			prefix: None,
			separator: "__".to_string(),
			vars: None,
		}
	}
}

impl EnvDeserializer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Only consider variables starting with `<prefix>_`.
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
		self.separator = separator.into();
		self
	}

	/// Read from `vars` instead of the process environment.
	pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.vars = Some(
			vars.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		);
		self
	}
}

impl Deserializer for EnvDeserializer {
	fn deserialize(&self, _data: &[u8]) -> Result<Document, ParseError> {
		let mut source = config::Environment::default().separator(&self.separator);
		if let Some(ref prefix) = self.prefix {
			source = source.prefix(prefix).prefix_separator("_");
		}
		if let Some(ref vars) = self.vars {
			source = source.source(Some(vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()));
		}

		let document = config::Config::builder()
			.add_source(source)
			.build()?
			.try_deserialize::<Document>()?;
		Ok(document)
	}

	fn name(&self) -> &'static str {
		"env"
	}

	fn reads_input(&self) -> bool {
		false
	}

	fn is_string_typed(&self) -> bool {
		true
	}
}

/// Pick a file deserializer from the path's extension.
pub fn deserializer_for_path(path: &Path) -> Option<Box<dyn Deserializer>> {
	let extension = path.extension()?.to_str()?.to_ascii_lowercase();
	match extension.as_str() {
		"json" => Some(Box::new(JsonDeserializer)),
		"yaml" | "yml" => Some(Box::new(YamlDeserializer)),
		"toml" => Some(Box::new(TomlDeserializer)),
		_ => None,
	}
}

/// Decode a document whose scalars already carry their types.
pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, ParseError> {
	Ok(serde_json::from_value(document)?)
}

/// Decode a document that may hold numbers and booleans as strings.
///
/// Goes through `config`'s value deserializer, which parses `"8080"` into an
/// integer field and `"true"` into a bool field but leaves `String` fields as
/// written.
pub fn decode_coercing<T: DeserializeOwned>(document: Document) -> Result<T, ParseError> {
	Ok(T::deserialize(to_config_value(document))?)
}

fn to_config_value(document: Document) -> config::Value {
	let kind = match document {
		Document::Null => ValueKind::Nil,
		Document::Bool(flag) => ValueKind::Boolean(flag),
		Document::Number(number) => match (number.as_i64(), number.as_u64()) {
			(Some(signed), _) => ValueKind::I64(signed),
			(None, Some(unsigned)) => ValueKind::U64(unsigned),
			(None, None) => ValueKind::Float(number.as_f64().unwrap_or_default()),
		},
		Document::String(text) => ValueKind::String(text),
		Document::Array(items) => {
			ValueKind::Array(items.into_iter().map(to_config_value).collect())
		}
		Document::Object(map) => ValueKind::Table(
			map.into_iter()
				.map(|(key, value)| (key, to_config_value(value)))
				.collect(),
		),
	};
	config::Value::new(None, kind)
}
