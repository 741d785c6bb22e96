//! Import of finished external-transcription payloads into
//! [`captions::CaptionsDocument`] values.
//!
//! This crate never runs a recognizer. It takes the raw JSON a recognizer
//! already produced (word-level or sentence-level chunks), normalizes it,
//! runs the segment post-processing pipeline and assembles a validated
//! document with deterministic segment ids, optionally attaching speaker
//! embeddings from a diarization sidecar file.

mod chunks;
mod document;
mod error;
mod pipeline;

pub use chunks::{
    AsrSegment, ProcessOutput, RawChunk, RawSpan, RawWord, WordTimestamp,
    parse_sentence_level_chunk, parse_word_level_chunk,
};
pub use document::{build_document, into_segments, parse_embeddings, segment_id};
pub use error::Error;
pub use pipeline::{
    Granularity, PostProcessOptions, group_segments_by_gap, post_process,
    resolve_overlap_conflicts, split_long_segments, split_segments_by_word_gap,
};
