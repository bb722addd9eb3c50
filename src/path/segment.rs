use crate::error::SetError;
use std::fmt;

/// A dotted path split into its segments.
///
/// Segments are never empty. A map key that itself contains `.` cannot be
/// expressed: the extra segments are read as traversal past the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
	raw: &'a str,
	segments: Vec<&'a str>,
}

impl<'a> FieldPath<'a> {
	/// Split `raw` on `.`.
	pub fn parse(raw: &'a str) -> Result<Self, SetError> {
		if raw.is_empty() {
			return Err(SetError::InvalidPath {
				path: raw.to_string(),
				reason: "path is empty".to_string(),
			});
		}

		let segments: Vec<&str> = raw.split('.').collect();
		if let Some(position) = segments.iter().position(|segment| segment.is_empty()) {
			return Err(SetError::InvalidPath {
				path: raw.to_string(),
				reason: format!("segment {} is empty", position),
			});
		}

		Ok(Self { raw, segments })
	}

	pub fn as_str(&self) -> &'a str {
		self.raw
	}

	pub fn segments(&self) -> &[&'a str] {
		&self.segments
	}

	pub fn len(&self) -> usize {
		self.segments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Segment at `depth`. Panics past the end; callers stay within `len()`.
	pub fn segment(&self, depth: usize) -> &'a str {
		self.segments[depth]
	}

	pub fn is_last(&self, depth: usize) -> bool {
		depth + 1 == self.segments.len()
	}

	/// The path up to and including the segment at `depth`.
	pub fn prefix(&self, depth: usize) -> String {
		self.segments[..=depth].join(".")
	}
}

impl fmt::Display for FieldPath<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.raw)
	}
}

/// Parse a sequence index. Negative numbers parse; bounds are checked by the caller.
pub(crate) fn parse_index(segment: &str) -> Option<i64> {
	segment.parse::<i64>().ok()
}
