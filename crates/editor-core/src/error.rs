#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no segment with id {0:?}")]
    NotFound(String),
    #[error("merge requires at least two segments")]
    TooFewSegments,
    #[error("segments are not adjacent in document order")]
    NotAdjacent,
    #[error("segment has no word-level timing")]
    NoWords,
    #[error("cannot split before the first word")]
    CannotSplitFirstWord,
    #[error("word index {0} is out of range")]
    InvalidWordIndex(usize),
    #[error("split boundary is not time-anchored")]
    WordHasNoTimestamp,
    #[error("document has no named speakers")]
    NoSpeakersFound,
    #[error(transparent)]
    Validation(#[from] captions::Error),
}
