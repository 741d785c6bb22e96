#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] captions::Error),

    /// The external transcription process failed; `detail` carries its
    /// captured diagnostic output verbatim.
    #[error("transcription process failed: {detail}")]
    Process { detail: String },
}
