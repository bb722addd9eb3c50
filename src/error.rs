use std::path::PathBuf;

/// Why a single path could not be set.
///
/// Every variant carries the full path that was requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetError {
	#[error("No value to traverse at `{at}` (path: {path})")]
	NotAReference { path: String, at: String },

	#[error("Invalid path `{path}`: {reason}")]
	InvalidPath { path: String, reason: String },

	#[error("Field `{field}` does not exist (path: {path})")]
	FieldNotFound { path: String, field: String },

	#[error("Field `{field}` is not settable (path: {path})")]
	FieldNotSettable { path: String, field: String },

	#[error("Invalid index `{segment}` (path: {path})")]
	InvalidIndex { path: String, segment: String },

	#[error("Index {index} out of range for length {len} (path: {path})")]
	IndexOutOfRange { path: String, index: i64, len: usize },

	#[error("Cannot traverse into `{segment}` of {type_name} (path: {path})")]
	UnsupportedTraversal {
		path: String,
		segment: String,
		type_name: &'static str,
	},

	#[error("Value type {provided} is not assignable to {expected} (path: {path})")]
	TypeMismatch {
		path: String,
		provided: &'static str,
		expected: &'static str,
	},
}

impl SetError {
	/// The path this error was raised for.
	pub fn path(&self) -> &str {
		match self {
			SetError::NotAReference { path, .. }
			| SetError::InvalidPath { path, .. }
			| SetError::FieldNotFound { path, .. }
			| SetError::FieldNotSettable { path, .. }
			| SetError::InvalidIndex { path, .. }
			| SetError::IndexOutOfRange { path, .. }
			| SetError::UnsupportedTraversal { path, .. }
			| SetError::TypeMismatch { path, .. } => path,
		}
	}
}

/// Failure of a format adapter to turn bytes into a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("Invalid JSON")]
	Json(#[from] serde_json::Error),

	#[error("Invalid YAML")]
	Yaml(#[from] serde_yaml::Error),

	#[error("Invalid TOML")]
	Toml(#[from] toml::de::Error),

	#[error("Config is not valid UTF-8")]
	Utf8(#[from] std::str::Utf8Error),

	#[error("Invalid environment configuration")]
	Env(#[from] config::ConfigError),
}

/// Library-level structured errors for confset.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ConfsetError {
	#[error("No deserializer set for main configuration")]
	MissingDeserializer,

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: ParseError,
	},

	#[error("Failed to encode current {type_name} as a base layer")]
	Encode {
		type_name: &'static str,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to decode configuration into {type_name}")]
	Decode {
		type_name: &'static str,
		#[source]
		source: ParseError,
	},

	#[error(transparent)]
	Set(#[from] SetError),

	#[error("Failed to apply {} override(s): {}", .errors.len(), join_errors(.errors))]
	Overrides { errors: Vec<SetError> },

	#[error("Failed to resolve user config directory")]
	ConfigDirNotFound,
}

fn join_errors(errors: &[SetError]) -> String {
	errors
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

/// Result type alias using ConfsetError.
pub type Result<T> = std::result::Result<T, ConfsetError>;
