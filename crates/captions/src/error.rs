#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("missing WEBVTT header")]
    MissingHeader,
    #[error("no TranscriptMetadata block found")]
    MissingMetadata,
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
    #[error("invalid cue timing line: {0:?}")]
    InvalidCueTiming(String),
    #[error("segment {id}: endTime must be greater than startTime")]
    InvalidTimeRange { id: String },
    #[error("segment {id}: rating must be within 1..=5, got {rating}")]
    InvalidRating { id: String, rating: u8 },
    #[error("segment {id}: words must be in non-decreasing start order")]
    UnorderedWords { id: String },
    #[error("duplicate segment id: {0}")]
    DuplicateSegmentId(String),
}
