//! Confset - layered configuration loading with path-addressed overrides.
//!
//! This library provides:
//! - A generic path mutator that sets fields, elements and map entries inside
//!   typed records by dotted path (`"nested.items.0"`, `"labels.team"`)
//! - Format adapters for JSON, YAML, TOML and environment variables
//! - A file-backed loader that layers a main and an override file over the
//!   record's current values and applies path overrides on top, plus an
//!   in-memory loader for tests
//!
//! # Example
//!
//! ```no_run
//! use confset::loader::{ConfigLoader, Loader, Overridable, YamlDeserializer};
//! use confset::Value;
//! use serde::{Deserialize, Serialize};
//!
//! confset::record! {
//!     #[derive(Debug, Default, Serialize, Deserialize)]
//!     pub struct Config {
//!         pub name: String,
//!         pub port: u16,
//!     }
//! }
//!
//! let mut loader = ConfigLoader::new("app.yaml")
//!     .with_path("/etc/app")
//!     .with_deserializer(YamlDeserializer);
//! loader.set_override("port", Value::from(8080u16)).unwrap();
//!
//! let mut config = Config::default();
//! loader.load(&mut config).unwrap();
//! ```

pub mod error;
pub mod loader;
pub mod path;

pub use error::{ConfsetError, ParseError, Result, SetError};
pub use path::{ApplyMode, Settable, Value, set_fields, set_value};
