use crate::path::value::{Mismatch, Value};
use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};

/// A location in a record graph that can be traversed by path and assigned to.
///
/// Implemented for scalars, `Option<T>`, `Vec<T>`, `[T; N]`, string-keyed maps and
/// `serde_json::Value`. Records get an implementation from [`record!`](crate::record).
pub trait Settable: Any {
	/// Runtime view of this node used to interpret the next path segment.
	fn node(&mut self) -> NodeMut<'_>;

	/// Replace this value with `value` if its type is exactly `Self`.
	///
	/// On error the destination is left untouched.
	fn assign(&mut self, value: Value) -> Result<(), Mismatch>;

	/// Build a fresh `Self` from an override value.
	///
	/// Nilable types override this to map the nil sentinel to their empty state.
	fn from_value(value: Value) -> Result<Self, Mismatch>
	where
		Self: Sized,
	{
		value.downcast::<Self>()
	}

	fn type_name(&self) -> &'static str {
		type_name::<Self>()
	}
}

/// Mutable view of a node, by kind.
pub enum NodeMut<'a> {
	Record(&'a mut dyn Record),
	Sequence(&'a mut dyn Sequence),
	Mapping(&'a mut dyn Mapping),
	/// A nilable indirection; `None` when there is nothing to descend into.
	Indirect(Option<&'a mut dyn Settable>),
	Scalar,
}

/// Result of looking up a field by name.
pub enum FieldSlot<'a> {
	Settable(&'a mut dyn Settable),
	ReadOnly,
	Missing,
}

/// Struct-like node addressed by field name.
pub trait Record {
	fn field_names(&self) -> Vec<&str>;
	fn field_mut(&mut self, name: &str) -> FieldSlot<'_>;

	/// Add a field that does not exist yet, as the last step of a path.
	///
	/// `None` for records with a fixed set of fields.
	fn insert_field(&mut self, _name: &str, _value: Value) -> Option<Result<(), Mismatch>> {
		None
	}
}

/// Fixed-length indexed node. Paths never grow a sequence.
pub trait Sequence {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn element_mut(&mut self, index: usize) -> Option<&mut dyn Settable>;
}

/// String-keyed node. Entries can be set but not traversed through.
pub trait Mapping {
	/// Insert or overwrite `key`.
	fn upsert(&mut self, key: &str, value: Value) -> Result<(), Mismatch>;
}

/// Assign through [`Settable::from_value`]; shared by every sized implementation.
pub fn assign_from<T: Settable>(slot: &mut T, value: Value) -> Result<(), Mismatch> {
	*slot = T::from_value(value)?;
	Ok(())
}

/// Whether a field declared with visibility `vis` may be set from a path.
#[doc(hidden)]
pub fn is_public(vis: &str) -> bool {
	vis.starts_with("pub")
}

macro_rules! impl_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl Settable for $ty {
				fn node(&mut self) -> NodeMut<'_> {
					NodeMut::Scalar
				}

				fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
					assign_from(self, value)
				}
			}
		)*
	};
}

impl_scalar!(
	String,
	bool,
	char,
	i8,
	i16,
	i32,
	i64,
	i128,
	isize,
	u8,
	u16,
	u32,
	u64,
	u128,
	usize,
	f32,
	f64,
	std::path::PathBuf,
);

impl<T: Settable> Settable for Option<T> {
	fn node(&mut self) -> NodeMut<'_> {
		NodeMut::Indirect(self.as_mut().map(|inner| inner as &mut dyn Settable))
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}

	fn from_value(value: Value) -> Result<Self, Mismatch> {
		if value.is_nil() {
			return Ok(None);
		}
		value.downcast::<Self>()
	}
}

impl<T: Settable> Settable for Vec<T> {
	fn node(&mut self) -> NodeMut<'_> {
		NodeMut::Sequence(self)
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}

	fn from_value(value: Value) -> Result<Self, Mismatch> {
		if value.is_nil() {
			return Ok(Vec::new());
		}
		value.downcast::<Self>()
	}
}

impl<T: Settable> Sequence for Vec<T> {
	fn len(&self) -> usize {
		Vec::len(self)
	}

	fn element_mut(&mut self, index: usize) -> Option<&mut dyn Settable> {
		self.get_mut(index).map(|element| element as &mut dyn Settable)
	}
}

impl<T: Settable, const N: usize> Settable for [T; N] {
	fn node(&mut self) -> NodeMut<'_> {
		NodeMut::Sequence(self)
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}
}

impl<T: Settable, const N: usize> Sequence for [T; N] {
	fn len(&self) -> usize {
		N
	}

	fn element_mut(&mut self, index: usize) -> Option<&mut dyn Settable> {
		self.get_mut(index).map(|element| element as &mut dyn Settable)
	}
}

impl<V: Settable> Settable for HashMap<String, V> {
	fn node(&mut self) -> NodeMut<'_> {
		NodeMut::Mapping(self)
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}

	fn from_value(value: Value) -> Result<Self, Mismatch> {
		if value.is_nil() {
			return Ok(HashMap::new());
		}
		value.downcast::<Self>()
	}
}

impl<V: Settable> Mapping for HashMap<String, V> {
	fn upsert(&mut self, key: &str, value: Value) -> Result<(), Mismatch> {
		let entry = V::from_value(value)?;
		self.insert(key.to_string(), entry);
		Ok(())
	}
}

impl<V: Settable> Settable for BTreeMap<String, V> {
	fn node(&mut self) -> NodeMut<'_> {
		NodeMut::Mapping(self)
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}

	fn from_value(value: Value) -> Result<Self, Mismatch> {
		if value.is_nil() {
			return Ok(BTreeMap::new());
		}
		value.downcast::<Self>()
	}
}

impl<V: Settable> Mapping for BTreeMap<String, V> {
	fn upsert(&mut self, key: &str, value: Value) -> Result<(), Mismatch> {
		let entry = V::from_value(value)?;
		self.insert(key.to_string(), entry);
		Ok(())
	}
}

/// Untyped documents behave as property bags: object keys are fields that can
/// be added at the leaf, arrays are sequences, and `Null` is the empty state.
impl Settable for serde_json::Value {
	fn node(&mut self) -> NodeMut<'_> {
		match self {
			serde_json::Value::Object(map) => NodeMut::Record(map),
			serde_json::Value::Array(items) => NodeMut::Sequence(items),
			_ => NodeMut::Scalar,
		}
	}

	fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
		assign_from(self, value)
	}

	fn from_value(value: Value) -> Result<Self, Mismatch> {
		if value.is_nil() {
			return Ok(serde_json::Value::Null);
		}
		value.downcast::<Self>()
	}
}

impl Record for serde_json::Map<String, serde_json::Value> {
	fn field_names(&self) -> Vec<&str> {
		self.keys().map(String::as_str).collect()
	}

	fn field_mut(&mut self, name: &str) -> FieldSlot<'_> {
		match self.get_mut(name) {
			Some(field) => FieldSlot::Settable(field),
			None => FieldSlot::Missing,
		}
	}

	fn insert_field(&mut self, name: &str, value: Value) -> Option<Result<(), Mismatch>> {
		let result = serde_json::Value::from_value(value).map(|field| {
			self.insert(name.to_string(), field);
		});
		Some(result)
	}
}

/// Declare a struct whose fields can be addressed by path.
///
/// Every field type must implement [`Settable`]. Fields declared `pub` are settable;
/// private fields are visible to paths but rejected as not settable.
///
/// ```
/// confset::record! {
///     #[derive(Debug, Default)]
///     pub struct Server {
///         pub host: String,
///         pub port: u16,
///     }
/// }
///
/// let mut server = Server::default();
/// confset::path::set_value(&mut server, "port", 8080u16.into()).unwrap();
/// assert_eq!(server.port, 8080);
/// ```
#[macro_export]
macro_rules! record {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$(
				$(#[$field_meta:meta])*
				$field_vis:vis $field:ident : $field_ty:ty
			),* $(,)?
		}
	) => {
		$(#[$meta])*
		$vis struct $name {
			$(
				$(#[$field_meta])*
				$field_vis $field: $field_ty,
			)*
		}

		impl $crate::path::Record for $name {
			fn field_names(&self) -> ::std::vec::Vec<&str> {
				::std::vec![$(stringify!($field)),*]
			}

			fn field_mut(&mut self, name: &str) -> $crate::path::FieldSlot<'_> {
				match name {
					$(
						stringify!($field) => {
							if $crate::path::is_public(stringify!($field_vis)) {
								$crate::path::FieldSlot::Settable(&mut self.$field)
							} else {
								$crate::path::FieldSlot::ReadOnly
							}
						}
					)*
					_ => $crate::path::FieldSlot::Missing,
				}
			}
		}

		impl $crate::path::Settable for $name {
			fn node(&mut self) -> $crate::path::NodeMut<'_> {
				$crate::path::NodeMut::Record(self)
			}

			fn assign(&mut self, value: $crate::path::Value) -> ::std::result::Result<(), $crate::path::Mismatch> {
				$crate::path::assign_from(self, value)
			}
		}
	};
}
