use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;

/// A single timed word inside a segment.
///
/// A word without timestamps is a placeholder (untimed punctuation, filler
/// inserted by an editor) and is excluded from time-anchored operations such
/// as split.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

impl Word {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// Placeholder word with no timing.
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_time: None,
            end_time: None,
        }
    }
}

/// A timed caption unit. Field names on the wire are camelCase to stay in
/// sync with the TypeScript frontend schema.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
    /// ISO 8601 instant of creation or last modification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            text: text.into(),
            speaker_name: None,
            rating: None,
            words: None,
            timestamp: None,
        }
    }

    /// Check the per-segment invariants: `endTime > startTime`, rating in
    /// 1..=5, timed words in non-decreasing start order.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.end_time > self.start_time) {
            return Err(Error::InvalidTimeRange {
                id: self.id.clone(),
            });
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(Error::InvalidRating {
                    id: self.id.clone(),
                    rating,
                });
            }
        }
        if let Some(words) = &self.words {
            let mut last_start = f64::NEG_INFINITY;
            for word in words {
                if let Some(start) = word.start_time {
                    if start < last_start {
                        return Err(Error::UnorderedWords {
                            id: self.id.clone(),
                        });
                    }
                    last_start = start;
                }
            }
        }
        Ok(())
    }

    pub fn has_speaker(&self) -> bool {
        self.speaker_name.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMetadata {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_file_path: Option<String>,
}

impl TranscriptMetadata {
    /// Rewrite the media path relative to the caption file's directory when
    /// the media file lives under it. Other layouts keep the absolute path,
    /// matching the historical save behavior.
    pub fn with_relative_media_path(&self, captions_path: Option<&Path>) -> Self {
        let mut metadata = self.clone();
        let (Some(captions_path), Some(media)) = (captions_path, metadata.media_file_path.as_deref())
        else {
            return metadata;
        };
        let media_path = Path::new(media);
        if media_path.is_absolute() && captions_path.is_absolute() {
            if let Some(dir) = captions_path.parent() {
                if let Ok(relative) = media_path.strip_prefix(dir) {
                    metadata.media_file_path = Some(relative.to_string_lossy().into_owned());
                }
            }
        }
        metadata
    }
}

/// What a history entry records about a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum HistoryAction {
    #[serde(rename = "modified")]
    Modified,
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "renameSpeaker")]
    SpeakerRenamed,
}

/// Audit record holding a segment's full state *before* a mutation — a
/// snapshot, not a diff, so prior versions reconstruct without replay.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub action: HistoryAction,
    pub action_timestamp: String,
    pub cue: Segment,
}

/// Speaker embedding produced by a separate analysis pass. `segment_id` is a
/// weak reference: embeddings survive segment deletion and may be recomputed
/// independently, which is why they live at document level.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct SpeakerEmbedding {
    pub segment_id: String,
    pub speaker_embedding: Vec<f32>,
}

/// The transcript document. Segments are held behind `Arc` so that mutations
/// can share unaffected rows by reference between document versions —
/// observers detect change by pointer comparison alone.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct CaptionsDocument {
    pub metadata: TranscriptMetadata,
    pub segments: Vec<Arc<Segment>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<SpeakerEmbedding>,
    /// Origin/destination on disk. Not part of the wire form.
    #[serde(skip)]
    #[cfg_attr(feature = "specta", specta(skip))]
    pub file_path: Option<PathBuf>,
}

impl CaptionsDocument {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            metadata: TranscriptMetadata {
                id: document_id.into(),
                media_file_path: None,
            },
            segments: Vec::new(),
            history: Vec::new(),
            embeddings: Vec::new(),
            file_path: None,
        }
    }

    pub fn segment(&self, id: &str) -> Option<&Arc<Segment>> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Positional index in document order. This is the canonical order used
    /// for adjacency checks, independent of any display sort.
    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// Check document-wide invariants: unique segment ids plus every
    /// segment's own invariants. Run at load/import boundaries.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for segment in &self.segments {
            if !seen.insert(segment.id.as_str()) {
                return Err(Error::DuplicateSegmentId(segment.id.clone()));
            }
            segment.validate()?;
        }
        Ok(())
    }
}
