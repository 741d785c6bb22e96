//! Assembly of post-processed segments into a [`CaptionsDocument`].
//!
//! Segment ids are derived from the audio content hash and the segment start
//! time, so re-importing the same recording yields the same ids and
//! previously computed speaker embeddings keep resolving.

use std::sync::Arc;

use captions::{CaptionsDocument, Segment, SpeakerEmbedding, TranscriptMetadata, Word};
use sha2::{Digest, Sha256};

use crate::chunks::AsrSegment;
use crate::error::Error;

/// Deterministic segment id: UUID built from
/// `sha256("{audio_hash}:{start_time}")` with the start time fixed to
/// millisecond precision.
pub fn segment_id(audio_hash: &str, start_time: f64) -> String {
    let digest = Sha256::digest(format!("{audio_hash}:{start_time:.3}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Uuid::from_bytes(bytes).to_string()
}

/// Convert pipeline output into validated caption segments. Empty-text
/// segments are dropped; `created_at` stamps every segment.
pub fn into_segments(
    segments: Vec<AsrSegment>,
    audio_hash: &str,
    created_at: &str,
) -> Result<Vec<Segment>, Error> {
    let mut result = Vec::with_capacity(segments.len());

    for asr in segments {
        let text = asr.text.trim();
        if text.is_empty() {
            continue;
        }

        let mut segment = Segment::new(segment_id(audio_hash, asr.start), asr.start, asr.end, text);
        if !asr.words.is_empty() {
            segment.words = Some(
                asr.words
                    .into_iter()
                    .map(|w| Word::new(w.word, w.start, w.end))
                    .collect(),
            );
        }
        segment.timestamp = Some(created_at.to_string());
        segment.validate().map_err(Error::Validation)?;
        result.push(segment);
    }

    Ok(result)
}

/// One line of the diarization sidecar file (JSON Lines, snake_case keys).
#[derive(Debug, serde::Deserialize)]
struct EmbeddingRecord {
    segment_id: String,
    embedding: Vec<f32>,
}

/// Parse a diarization sidecar payload. Blank lines are skipped; a malformed
/// line fails the whole parse.
pub fn parse_embeddings(jsonl: &str) -> Result<Vec<SpeakerEmbedding>, Error> {
    let mut embeddings = Vec::new();
    for line in jsonl.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: EmbeddingRecord = serde_json::from_str(line)?;
        embeddings.push(SpeakerEmbedding {
            segment_id: record.segment_id,
            speaker_embedding: record.embedding,
        });
    }
    Ok(embeddings)
}

/// Build the final document. Embeddings whose segment id does not resolve
/// are kept (the link is weak by design) but logged.
pub fn build_document(
    document_id: impl Into<String>,
    media_file_path: Option<String>,
    segments: Vec<Segment>,
    embeddings: Vec<SpeakerEmbedding>,
) -> Result<CaptionsDocument, Error> {
    let document = CaptionsDocument {
        metadata: TranscriptMetadata {
            id: document_id.into(),
            media_file_path,
        },
        segments: segments.into_iter().map(Arc::new).collect(),
        history: Vec::new(),
        embeddings,
        file_path: None,
    };

    for embedding in &document.embeddings {
        if document.segment(&embedding.segment_id).is_none() {
            tracing::warn!(segment_id = %embedding.segment_id, "embedding references unknown segment");
        }
    }

    document.validate().map_err(Error::Validation)?;
    Ok(document)
}
