use crate::error::SetError;
use crate::path::node::{FieldSlot, NodeMut, Settable};
use crate::path::segment::{FieldPath, parse_index};
use crate::path::value::{Mismatch, Value};
use std::collections::HashMap;
use tracing::debug;

/// How a batch of overrides reacts to a failing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
	/// Stop at the first failure. Entries applied before it stay applied.
	#[default]
	Strict,

	/// Apply every entry and collect all failures.
	Soft,
}

/// Set the value addressed by `path` inside `root`.
///
/// Each segment is interpreted by the kind of node it is applied to: a field
/// name for records, an index for sequences, a key for mappings. The final
/// segment is assigned only if `value` has exactly the destination type, or is
/// nil and the destination is nilable.
pub fn set_value(root: &mut dyn Settable, path: &str, value: Value) -> Result<(), SetError> {
	let path = FieldPath::parse(path)?;
	descend(root, &path, 0, value)
}

/// Apply every `(path, value)` pair with [`set_value`].
///
/// Returns an empty vector when everything applied. In [`ApplyMode::Strict`]
/// at most one error is returned.
pub fn set_fields(
	root: &mut dyn Settable,
	fields: &HashMap<String, Value>,
	mode: ApplyMode,
) -> Vec<SetError> {
	let mut errors = Vec::new();

	for (path, value) in fields {
		if let Err(err) = set_value(root, path, value.clone()) {
			match mode {
				ApplyMode::Strict => return vec![err],
				ApplyMode::Soft => errors.push(err),
			}
		}
	}

	debug!(
		total = fields.len(),
		failed = errors.len(),
		?mode,
		"applied field overrides"
	);

	errors
}

fn descend(
	node: &mut dyn Settable,
	path: &FieldPath<'_>,
	depth: usize,
	value: Value,
) -> Result<(), SetError> {
	let segment = path.segment(depth);
	let is_leaf = path.is_last(depth);
	let type_name = node.type_name();

	match node.node() {
		NodeMut::Record(record) => match record.field_mut(segment) {
			FieldSlot::Missing if is_leaf => match record.insert_field(segment, value) {
				Some(result) => result.map_err(|m| type_mismatch(path, m)),
				None => Err(field_not_found(path, segment)),
			},
			FieldSlot::Missing => Err(field_not_found(path, segment)),
			FieldSlot::ReadOnly => Err(SetError::FieldNotSettable {
				path: path.to_string(),
				field: segment.to_string(),
			}),
			FieldSlot::Settable(field) if is_leaf => {
				field.assign(value).map_err(|m| type_mismatch(path, m))
			}
			FieldSlot::Settable(field) => descend(field, path, depth + 1, value),
		},

		NodeMut::Sequence(sequence) => {
			let index = parse_index(segment).ok_or_else(|| SetError::InvalidIndex {
				path: path.to_string(),
				segment: segment.to_string(),
			})?;
			let len = sequence.len();
			let out_of_range = || SetError::IndexOutOfRange {
				path: path.to_string(),
				index,
				len,
			};
			let position = usize::try_from(index).map_err(|_| out_of_range())?;
			let element = sequence.element_mut(position).ok_or_else(out_of_range)?;

			if is_leaf {
				element.assign(value).map_err(|m| type_mismatch(path, m))
			} else {
				descend(element, path, depth + 1, value)
			}
		}

		NodeMut::Mapping(mapping) if is_leaf => mapping
			.upsert(segment, value)
			.map_err(|m| type_mismatch(path, m)),

		NodeMut::Mapping(_) => Err(SetError::UnsupportedTraversal {
			path: path.to_string(),
			segment: path.segment(depth + 1).to_string(),
			type_name,
		}),

		// `Some` is transparent: the same segment applies to the inner value.
		NodeMut::Indirect(Some(inner)) => descend(inner, path, depth, value),

		NodeMut::Indirect(None) => Err(SetError::NotAReference {
			path: path.to_string(),
			at: if depth == 0 {
				String::new()
			} else {
				path.prefix(depth - 1)
			},
		}),

		NodeMut::Scalar => Err(SetError::UnsupportedTraversal {
			path: path.to_string(),
			segment: segment.to_string(),
			type_name,
		}),
	}
}

fn field_not_found(path: &FieldPath<'_>, field: &str) -> SetError {
	SetError::FieldNotFound {
		path: path.to_string(),
		field: field.to_string(),
	}
}

fn type_mismatch(path: &FieldPath<'_>, mismatch: Mismatch) -> SetError {
	SetError::TypeMismatch {
		path: path.to_string(),
		provided: mismatch.provided,
		expected: mismatch.expected,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	crate::record! {
		#[derive(Debug, Clone, Default, PartialEq)]
		struct Inner {
			pub string_field: String,
			pub flag: bool,
		}
	}

	crate::record! {
		#[derive(Debug, Clone, Default, PartialEq)]
		struct TestObject {
			pub string_field: String,
			pub int_field: i64,
			pub float_field: f64,
			pub bool_field: bool,
			pub nested_field: Inner,
			pub array_field: Vec<String>,
			pub fixed_field: [u8; 2],
			pub map_field: HashMap<String, String>,
			pub sorted_map: BTreeMap<String, i64>,
			pub pointer_field: Option<String>,
			pub optional_nested: Option<Inner>,
			pub records: Vec<Inner>,
			secret: String,
		}
	}

	fn test_object() -> TestObject {
		TestObject {
			array_field: vec![String::new()],
			records: vec![Inner::default(), Inner::default()],
			..TestObject::default()
		}
	}

	#[test]
	fn test_set_each_kind_without_touching_siblings() {
		let mut obj = test_object();

		set_value(&mut obj, "string_field", "test".into()).unwrap();
		set_value(&mut obj, "int_field", 42i64.into()).unwrap();
		set_value(&mut obj, "float_field", 2.5f64.into()).unwrap();
		set_value(&mut obj, "bool_field", true.into()).unwrap();
		set_value(&mut obj, "nested_field.string_field", "nested".into()).unwrap();
		set_value(&mut obj, "array_field.0", "first".into()).unwrap();
		set_value(&mut obj, "map_field.key", "value".into()).unwrap();

		let mut expected = test_object();
		expected.string_field = "test".to_string();
		expected.int_field = 42;
		expected.float_field = 2.5;
		expected.bool_field = true;
		expected.nested_field.string_field = "nested".to_string();
		expected.array_field[0] = "first".to_string();
		expected
			.map_field
			.insert("key".to_string(), "value".to_string());
		assert_eq!(obj, expected);
	}

	#[test]
	fn test_set_single_field_changes_nothing_else() {
		let mut obj = test_object();
		set_value(&mut obj, "nested_field.flag", true.into()).unwrap();

		let mut expected = test_object();
		expected.nested_field.flag = true;
		assert_eq!(obj, expected);
	}

	#[test]
	fn test_set_whole_nested_record() {
		let mut obj = test_object();
		let replacement = Inner {
			string_field: "whole".to_string(),
			flag: true,
		};
		set_value(&mut obj, "nested_field", Value::new(replacement.clone())).unwrap();
		assert_eq!(obj.nested_field, replacement);
	}

	#[test]
	fn test_set_pointer_field() {
		let mut obj = test_object();
		set_value(
			&mut obj,
			"pointer_field",
			Value::new(Some("other".to_string())),
		)
		.unwrap();
		assert_eq!(obj.pointer_field.as_deref(), Some("other"));
	}

	#[test]
	fn test_nil_resets_nilable_fields() {
		let mut obj = test_object();
		obj.pointer_field = Some("other".to_string());
		obj.map_field.insert("k".to_string(), "v".to_string());

		set_value(&mut obj, "pointer_field", Value::nil()).unwrap();
		set_value(&mut obj, "array_field", Value::nil()).unwrap();
		set_value(&mut obj, "map_field", Value::nil()).unwrap();

		assert!(obj.pointer_field.is_none());
		assert!(obj.array_field.is_empty());
		assert!(obj.map_field.is_empty());
	}

	#[test]
	fn test_nil_into_non_nilable_field_is_type_mismatch() {
		let mut obj = test_object();
		obj.int_field = 7;
		match set_value(&mut obj, "int_field", Value::nil()).unwrap_err() {
			SetError::TypeMismatch {
				provided, expected, ..
			} => {
				assert_eq!(provided, "nil");
				assert_eq!(expected, "i64");
			}
			other => panic!("Expected TypeMismatch, got {other:?}"),
		}
		assert_eq!(obj.int_field, 7);
	}

	#[test]
	fn test_type_mismatch_leaves_destination_unchanged() {
		let mut obj = test_object();
		obj.string_field = "keep".to_string();

		let err = set_value(&mut obj, "string_field", 42i64.into()).unwrap_err();
		match err {
			SetError::TypeMismatch {
				path,
				provided,
				expected,
			} => {
				assert_eq!(path, "string_field");
				assert_eq!(provided, "i64");
				assert_eq!(expected, std::any::type_name::<String>());
			}
			other => panic!("Expected TypeMismatch, got {other:?}"),
		}
		assert_eq!(obj.string_field, "keep");
	}

	#[test]
	fn test_no_numeric_widening() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "int_field", 42i32.into()),
			Err(SetError::TypeMismatch { .. })
		));
		assert!(matches!(
			set_value(&mut obj, "float_field", 1f32.into()),
			Err(SetError::TypeMismatch { .. })
		));
		assert_eq!(obj, test_object());
	}

	#[test]
	fn test_pointer_field_with_invalid_value() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "pointer_field", 42i64.into()),
			Err(SetError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_map_with_invalid_value() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "map_field.key", 42i64.into()),
			Err(SetError::TypeMismatch { .. })
		));
		assert!(obj.map_field.is_empty());
	}

	#[test]
	fn test_map_upsert_creates_then_overwrites() {
		let mut obj = test_object();
		set_value(&mut obj, "sorted_map.retries", 1i64.into()).unwrap();
		assert_eq!(obj.sorted_map.get("retries"), Some(&1));
		set_value(&mut obj, "sorted_map.retries", 5i64.into()).unwrap();
		assert_eq!(obj.sorted_map.get("retries"), Some(&5));
		assert_eq!(obj.sorted_map.len(), 1);
	}

	#[test]
	fn test_traversal_past_map_is_unsupported() {
		let mut obj = test_object();
		match set_value(&mut obj, "map_field.a.b", "x".into()).unwrap_err() {
			SetError::UnsupportedTraversal { path, segment, .. } => {
				assert_eq!(path, "map_field.a.b");
				assert_eq!(segment, "b");
			}
			other => panic!("Expected UnsupportedTraversal, got {other:?}"),
		}
		assert!(obj.map_field.is_empty());
	}

	#[test]
	fn test_index_bounds() {
		let mut obj = test_object();
		assert!(set_value(&mut obj, "records.1.flag", true.into()).is_ok());
		assert!(obj.records[1].flag);

		match set_value(&mut obj, "records.2.flag", true.into()).unwrap_err() {
			SetError::IndexOutOfRange { index, len, .. } => {
				assert_eq!(index, 2);
				assert_eq!(len, 2);
			}
			other => panic!("Expected IndexOutOfRange, got {other:?}"),
		}
		assert!(matches!(
			set_value(&mut obj, "array_field.-1", "x".into()),
			Err(SetError::IndexOutOfRange { index: -1, .. })
		));
		assert!(matches!(
			set_value(&mut obj, "array_field.first", "x".into()),
			Err(SetError::InvalidIndex { .. })
		));
		assert_eq!(obj.records.len(), 2);
		assert_eq!(obj.array_field.len(), 1);
	}

	#[test]
	fn test_array_element() {
		let mut obj = test_object();
		set_value(&mut obj, "fixed_field.1", 9u8.into()).unwrap();
		assert_eq!(obj.fixed_field, [0, 9]);
		assert!(matches!(
			set_value(&mut obj, "fixed_field.2", 9u8.into()),
			Err(SetError::IndexOutOfRange { .. })
		));
	}

	#[test]
	fn test_field_lookup_is_case_sensitive() {
		let mut obj = test_object();
		match set_value(&mut obj, "String_Field", "x".into()).unwrap_err() {
			SetError::FieldNotFound { field, .. } => assert_eq!(field, "String_Field"),
			other => panic!("Expected FieldNotFound, got {other:?}"),
		}
	}

	#[test]
	fn test_private_field_not_settable() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "secret", "x".into()),
			Err(SetError::FieldNotSettable { .. })
		));
		assert!(obj.secret.is_empty());
	}

	#[test]
	fn test_traversal_through_scalar_is_unsupported() {
		let mut obj = test_object();
		match set_value(&mut obj, "int_field.bits", 1i64.into()).unwrap_err() {
			SetError::UnsupportedTraversal {
				segment, type_name, ..
			} => {
				assert_eq!(segment, "bits");
				assert_eq!(type_name, "i64");
			}
			other => panic!("Expected UnsupportedTraversal, got {other:?}"),
		}
	}

	#[test]
	fn test_traversal_through_option() {
		let mut obj = test_object();
		match set_value(&mut obj, "optional_nested.flag", true.into()).unwrap_err() {
			SetError::NotAReference { at, .. } => assert_eq!(at, "optional_nested"),
			other => panic!("Expected NotAReference, got {other:?}"),
		}

		obj.optional_nested = Some(Inner::default());
		set_value(&mut obj, "optional_nested.flag", true.into()).unwrap();
		assert_eq!(obj.optional_nested.as_ref().map(|inner| inner.flag), Some(true));
	}

	#[test]
	fn test_empty_root_is_not_a_reference() {
		let mut root: Option<TestObject> = None;
		assert!(matches!(
			set_value(&mut root, "int_field", 1i64.into()),
			Err(SetError::NotAReference { .. })
		));
	}

	#[test]
	fn test_invalid_path() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "", 1i64.into()),
			Err(SetError::InvalidPath { .. })
		));
		assert!(matches!(
			set_value(&mut obj, "nested_field..flag", true.into()),
			Err(SetError::InvalidPath { .. })
		));
	}

	#[test]
	fn test_set_fields_strict_reports_single_error() {
		let mut obj = test_object();
		let fields = HashMap::from([
			("string_field".to_string(), Value::from("a")),
			("does_not_exist".to_string(), Value::from("b")),
		]);

		let errors = set_fields(&mut obj, &fields, ApplyMode::Strict);
		assert_eq!(errors.len(), 1);
		assert!(matches!(&errors[0], SetError::FieldNotFound { field, .. } if field == "does_not_exist"));
	}

	#[test]
	fn test_set_fields_soft_applies_everything_else() {
		let mut obj = test_object();
		let fields = HashMap::from([
			("string_field".to_string(), Value::from("a")),
			("does_not_exist".to_string(), Value::from("b")),
		]);

		let errors = set_fields(&mut obj, &fields, ApplyMode::Soft);
		assert_eq!(errors.len(), 1);
		assert_eq!(errors[0].path(), "does_not_exist");
		assert_eq!(obj.string_field, "a");
	}

	#[test]
	fn test_set_fields_soft_collects_every_error() {
		let mut obj = test_object();
		let fields = HashMap::from([
			("bool_field".to_string(), Value::from(true)),
			("int_field".to_string(), Value::from("not a number")),
			("array_field.5".to_string(), Value::from("x")),
			("missing".to_string(), Value::nil()),
		]);

		let errors = set_fields(&mut obj, &fields, ApplyMode::Soft);
		assert_eq!(errors.len(), 3);
		assert!(obj.bool_field);
	}

	#[test]
	fn test_set_fields_empty_map() {
		let mut obj = test_object();
		assert!(set_fields(&mut obj, &HashMap::new(), ApplyMode::Strict).is_empty());
	}

	#[test]
	fn test_json_document_as_property_bag() {
		let mut doc = serde_json::json!({
			"server": {"host": "localhost", "ports": [80, 443]},
			"debug": false
		});

		set_value(&mut doc, "server.host", Value::new(serde_json::json!("example.org"))).unwrap();
		set_value(&mut doc, "server.ports.1", Value::new(serde_json::json!(8443))).unwrap();
		set_value(&mut doc, "debug", Value::nil()).unwrap();

		assert_eq!(
			doc,
			serde_json::json!({
				"server": {"host": "example.org", "ports": [80, 8443]},
				"debug": null
			})
		);
		assert!(matches!(
			set_value(&mut doc, "server.host", "plain string".into()),
			Err(SetError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_json_object_gains_keys_only_at_leaf() {
		let mut doc = serde_json::json!({"server": {"host": "localhost"}});

		set_value(&mut doc, "server.user", Value::new(serde_json::json!("root"))).unwrap();
		set_value(&mut doc, "replicas", Value::new(serde_json::json!(3))).unwrap();
		assert_eq!(
			doc,
			serde_json::json!({"server": {"host": "localhost", "user": "root"}, "replicas": 3})
		);

		match set_value(&mut doc, "cache.size", Value::new(serde_json::json!(1))).unwrap_err() {
			SetError::FieldNotFound { field, .. } => assert_eq!(field, "cache"),
			other => panic!("Expected FieldNotFound, got {other:?}"),
		}
		assert!(matches!(
			set_value(&mut doc, "server.port", "80".into()),
			Err(SetError::TypeMismatch { .. })
		));
		assert!(doc["server"].get("port").is_none());
	}

	#[test]
	fn test_declared_record_does_not_gain_fields() {
		let mut obj = test_object();
		assert!(matches!(
			set_value(&mut obj, "extra_field", "x".into()),
			Err(SetError::FieldNotFound { .. })
		));
		assert_eq!(obj, test_object());
	}
}
