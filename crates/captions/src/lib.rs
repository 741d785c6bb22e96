//! Caption document model and its two on-disk forms.
//!
//! The document model ([`CaptionsDocument`], [`Segment`], [`Word`], history,
//! speaker embeddings) is shared with a TypeScript frontend, so all wire
//! field names are camelCase. Two serializations are supported:
//!
//! - [`vtt`] — a hybrid WEBVTT file whose `NOTE CAPTION_EDITOR:…` comments
//!   carry typed JSON metadata alongside standard cue blocks;
//! - [`json`] — a single pure-JSON object.
//!
//! This crate never touches the filesystem; callers hand in raw content and
//! receive serialized content back.

mod error;
pub mod json;
pub mod timestamp;
pub mod types;
pub mod vtt;

pub use error::Error;
pub use types::{
    CaptionsDocument, HistoryAction, HistoryEntry, Segment, SpeakerEmbedding, TranscriptMetadata,
    Word,
};
pub use vtt::{ParseDiagnostic, ParseOutcome};
