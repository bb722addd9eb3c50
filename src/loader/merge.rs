use crate::loader::format::Document;

/// Merge `overlay` into `base`.
///
/// Objects are merged key by key, recursively. Any other overlay value,
/// including `null` and arrays, replaces what was in `base`.
pub fn merge_documents(base: &mut Document, overlay: Document) {
	match (base, overlay) {
		(Document::Object(base_map), Document::Object(overlay_map)) => {
			for (key, value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(existing) => merge_documents(existing, value),
					None => {
						base_map.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}
