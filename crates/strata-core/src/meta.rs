//! Metadata attached to segments and memory chunks.

use serde::{Deserialize, Serialize};

use crate::messages::Role;

/// Fixed-schema metadata record for a segment or memory chunk.
///
/// Every field is optional so callers only fill in what they know. The
/// segmenter always overwrites `entities` with the entities it extracted
/// from the final segment text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkMeta {
    /// Where the text came from (`"conversation"`, `"file"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Original file name for document chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Upstream file identifier for document chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Role of the message the text was evicted from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Entity tokens extracted from the text, sorted and deduplicated.
    pub entities: Vec<String>,
}

impl ChunkMeta {
    /// Metadata for text evicted from the conversation.
    #[must_use]
    pub fn conversation(role: Role) -> Self {
        Self {
            source: Some("conversation".to_owned()),
            role: Some(role),
            ..Self::default()
        }
    }

    /// Metadata for text ingested from a file.
    #[must_use]
    pub fn file(filename: impl Into<String>, file_id: Option<String>) -> Self {
        Self {
            source: Some("file".to_owned()),
            filename: Some(filename.into()),
            file_id,
            ..Self::default()
        }
    }

    /// Copy of this record with `entities` replaced.
    #[must_use]
    pub fn with_entities(&self, entities: Vec<String>) -> Self {
        Self {
            entities,
            ..self.clone()
        }
    }
}

/// Exact-equality filter over [`ChunkMeta`] fields.
///
/// A chunk passes when every field set on the filter equals the chunk's
/// value for that field. The empty filter accepts everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkFilter {
    /// Required `source`.
    pub source: Option<String>,
    /// Required `filename`.
    pub filename: Option<String>,
    /// Required `file_id`.
    pub file_id: Option<String>,
    /// Required `role`.
    pub role: Option<Role>,
}

impl ChunkFilter {
    /// Whether no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.filename.is_none()
            && self.file_id.is_none()
            && self.role.is_none()
    }

    /// Whether `meta` satisfies every constrained field.
    pub fn matches(&self, meta: &ChunkMeta) -> bool {
        fn field_ok<T: PartialEq>(want: Option<&T>, have: Option<&T>) -> bool {
            want.is_none_or(|w| have == Some(w))
        }

        field_ok(self.source.as_ref(), meta.source.as_ref())
            && field_ok(self.filename.as_ref(), meta.filename.as_ref())
            && field_ok(self.file_id.as_ref(), meta.file_id.as_ref())
            && field_ok(self.role.as_ref(), meta.role.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ChunkFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&ChunkMeta::default()));
        assert!(filter.matches(&ChunkMeta::file("a.txt", None)));
    }

    #[test]
    fn filter_requires_every_set_field() {
        let filter = ChunkFilter {
            source: Some("file".into()),
            filename: Some("a.txt".into()),
            ..ChunkFilter::default()
        };
        assert!(filter.matches(&ChunkMeta::file("a.txt", Some("f1".into()))));
        assert!(!filter.matches(&ChunkMeta::file("b.txt", None)));
        assert!(!filter.matches(&ChunkMeta::conversation(Role::User)));
    }

    #[test]
    fn filter_on_missing_field_rejects() {
        let filter = ChunkFilter {
            file_id: Some("f1".into()),
            ..ChunkFilter::default()
        };
        assert!(!filter.matches(&ChunkMeta::file("a.txt", None)));
    }

    #[test]
    fn role_filter() {
        let filter = ChunkFilter {
            role: Some(Role::Assistant),
            ..ChunkFilter::default()
        };
        assert!(filter.matches(&ChunkMeta::conversation(Role::Assistant)));
        assert!(!filter.matches(&ChunkMeta::conversation(Role::User)));
    }

    #[test]
    fn with_entities_keeps_other_fields() {
        let meta = ChunkMeta::file("a.txt", Some("f1".into()));
        let tagged = meta.with_entities(vec!["AAPL".into()]);
        assert_eq!(tagged.filename.as_deref(), Some("a.txt"));
        assert_eq!(tagged.file_id.as_deref(), Some("f1"));
        assert_eq!(tagged.entities, vec!["AAPL".to_owned()]);
    }

    #[test]
    fn serde_camel_case_and_partial() {
        let meta = ChunkMeta::file("a.txt", Some("f1".into()));
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("fileId").is_some());
        assert!(value.get("role").is_none());

        let parsed: ChunkMeta = serde_json::from_str(r#"{"source":"file"}"#).unwrap();
        assert_eq!(parsed.source.as_deref(), Some("file"));
        assert!(parsed.entities.is_empty());
    }
}
