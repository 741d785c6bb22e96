//! Pure-JSON document form: a single object with the same field semantics as
//! the in-memory document. Unlike the hybrid text form there is no block
//! salvage — a malformed or invariant-violating input fails atomically and
//! produces no partial document.

use std::path::Path;

use crate::error::Error;
use crate::types::CaptionsDocument;

/// Parse a `.captions_json` document. Atomic: returns `Err` without a
/// partial document when the content is malformed or violates an invariant.
pub fn parse(content: &str) -> Result<CaptionsDocument, Error> {
    let document: CaptionsDocument = serde_json::from_str(content)?;
    document.validate()?;
    Ok(document)
}

/// Serialize to deterministic pretty JSON with a trailing newline.
///
/// When `captions_path` is given, an absolute media path under the caption
/// file's directory is rewritten relative to it.
pub fn serialize(document: &CaptionsDocument, captions_path: Option<&Path>) -> Result<String, Error> {
    let mut document = document.clone();
    document.metadata = document.metadata.with_relative_media_path(captions_path);
    Ok(serde_json::to_string_pretty(&document)? + "\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::Segment;

    fn document() -> CaptionsDocument {
        let mut doc = CaptionsDocument::new("doc");
        doc.segments = vec![
            Arc::new(Segment::new("s1", 0.0, 5.0, "Hello")),
            Arc::new(Segment::new("s2", 5.0, 10.0, "world")),
        ];
        doc
    }

    #[test]
    fn round_trips_structurally() {
        let doc = document();
        let text = serialize(&doc, None).unwrap();
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn serialization_is_idempotent() {
        let first = serialize(&document(), None).unwrap();
        let second = serialize(&parse(&first).unwrap(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn accepts_camel_case_wire_fields() {
        let text = r#"{
            "metadata": {"id": "doc", "mediaFilePath": "talk.mp4"},
            "segments": [
                {"id": "s1", "startTime": 0.0, "endTime": 5.0, "text": "Hello",
                 "speakerName": "John", "rating": 3,
                 "words": [{"text": "Hello", "startTime": 1.0, "endTime": 1.5}]}
            ]
        }"#;
        let document = parse(text).unwrap();
        assert_eq!(document.segments[0].speaker_name.as_deref(), Some("John"));
        assert_eq!(document.segments[0].words.as_ref().unwrap()[0].start_time, Some(1.0));
    }

    #[test]
    fn malformed_json_fails_atomically() {
        assert!(matches!(parse("{ not json"), Err(Error::Json(_))));
    }

    #[test]
    fn invariant_violation_fails_atomically() {
        let text = r#"{
            "metadata": {"id": "doc"},
            "segments": [{"id": "s1", "startTime": 5.0, "endTime": 5.0, "text": "x"}]
        }"#;
        assert!(matches!(parse(text), Err(Error::InvalidTimeRange { .. })));
    }

    #[test]
    fn omitted_history_and_embeddings_default_empty() {
        let text = r#"{"metadata": {"id": "doc"}, "segments": []}"#;
        let document = parse(text).unwrap();
        assert!(document.history.is_empty());
        assert!(document.embeddings.is_empty());
    }
}
