use std::any::{Any, type_name};
use std::fmt;

/// A dynamically-typed override value.
///
/// Wraps any `'static + Clone + Debug` value together with the name of its
/// concrete type, or the nil sentinel. Assignment into a record graph only
/// succeeds when the wrapped type is exactly the destination type.
pub struct Value {
	inner: Option<Box<dyn AnyValue>>,
	type_name: &'static str,
}

/// Provided/expected type names for a rejected assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
	pub provided: &'static str,
	pub expected: &'static str,
}

trait AnyValue: Any + fmt::Debug {
	fn clone_box(&self) -> Box<dyn AnyValue>;
	fn into_any(self: Box<Self>) -> Box<dyn Any>;
	fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Clone + fmt::Debug> AnyValue for T {
	fn clone_box(&self) -> Box<dyn AnyValue> {
		Box::new(self.clone())
	}

	fn into_any(self: Box<Self>) -> Box<dyn Any> {
		self
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

const NIL: &str = "nil";

impl Value {
	/// Wrap a concrete value.
	pub fn new<T: Any + Clone + fmt::Debug>(value: T) -> Self {
		Self {
			inner: Some(Box::new(value)),
			type_name: type_name::<T>(),
		}
	}

	/// The "no value" sentinel. Resets nilable destinations to their empty state.
	pub fn nil() -> Self {
		Self {
			inner: None,
			type_name: NIL,
		}
	}

	pub fn is_nil(&self) -> bool {
		self.inner.is_none()
	}

	/// Name of the wrapped type, or `"nil"`.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Borrow the wrapped value if it is exactly a `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.as_deref()?.as_any().downcast_ref::<T>()
	}

	/// Take the wrapped value out if it is exactly a `T`.
	pub fn downcast<T: Any>(self) -> Result<T, Mismatch> {
		let mismatch = Mismatch {
			provided: self.type_name,
			expected: type_name::<T>(),
		};
		match self.inner {
			Some(boxed) => boxed
				.into_any()
				.downcast::<T>()
				.map(|value| *value)
				.map_err(|_| mismatch),
			None => Err(mismatch),
		}
	}
}

impl Clone for Value {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.as_deref().map(AnyValue::clone_box),
			type_name: self.type_name,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.inner {
			Some(value) => write!(f, "{:?} ({})", value, self.type_name),
			None => f.write_str(NIL),
		}
	}
}

// String literals are stored as owned `String`s so they can land in `String` fields.
impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::new(value.to_string())
	}
}

macro_rules! value_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Value::new(value)
				}
			}
		)*
	};
}

value_from!(
	String,
	bool,
	char,
	i8,
	i16,
	i32,
	i64,
	isize,
	u8,
	u16,
	u32,
	u64,
	usize,
	f32,
	f64,
	std::path::PathBuf,
	serde_json::Value,
);
