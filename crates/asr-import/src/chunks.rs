//! Raw transcription payloads, normalized into a unified representation.
//!
//! Recognizers emit one JSON chunk per audio window. Two shapes exist in the
//! wild: word-level chunks where each `segments` entry is a single word
//! (whisper-style), and sentence-level chunks where `segments` holds whole
//! sentences and a separate `words` array carries the word timings
//! (parakeet-style). Both normalize to [`AsrSegment`]; all times are shifted
//! by the chunk's offset into the full recording.

use crate::error::Error;

/// A word with absolute timing, as emitted by the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// One recognized span with word-level timings. This is the unit the
/// post-processing pipeline operates on; depending on the source it may be a
/// single word or a whole sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct AsrSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub words: Vec<WordTimestamp>,
}

/// On-disk shape of one raw recognizer chunk. Entries with missing text or
/// timing are skipped rather than rejected.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawChunk {
    #[serde(default)]
    pub segments: Vec<RawSpan>,
    #[serde(default)]
    pub words: Vec<RawWord>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawSpan {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawWord {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

impl RawChunk {
    pub fn from_json(payload: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Parse the recognizer process's finished output. A failed or
    /// cancelled run yields [`Error::Process`] carrying the captured
    /// diagnostics verbatim — transcription failures are usually
    /// environment-specific (missing model, missing binary) and the detail
    /// is what makes them actionable.
    pub fn from_process_output(output: &ProcessOutput) -> Result<Self, Error> {
        if !output.success {
            tracing::warn!("recognizer process failed");
            return Err(Error::Process {
                detail: output.stderr.trim().to_string(),
            });
        }
        Self::from_json(&output.stdout)
    }
}

/// What the host observed from the external recognizer process: its exit
/// status and captured streams. The core never launches the process; it only
/// consumes this report.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Word-level chunk: every `segments` entry is one word. Emits one
/// single-word segment per entry and lets the gap-grouping pass assemble
/// sentences, so overlap resolution still works at word granularity.
pub fn parse_word_level_chunk(chunk: &RawChunk, chunk_start: f64) -> Vec<AsrSegment> {
    let mut segments = Vec::new();

    for span in &chunk.segments {
        let (Some(text), Some(start), Some(end)) = (span.text.as_deref(), span.start, span.end)
        else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let word = WordTimestamp {
            word: text.to_string(),
            start: chunk_start + start,
            end: chunk_start + end,
        };
        segments.push(AsrSegment {
            text: text.to_string(),
            start: word.start,
            end: word.end,
            words: vec![word],
        });
    }

    segments
}

/// Sentence-level chunk: `segments` holds whole sentences, `words` the word
/// timings. Each word is attached to the sentence whose time range contains
/// it, with a small tolerance for boundary jitter.
pub fn parse_sentence_level_chunk(chunk: &RawChunk, chunk_start: f64) -> Vec<AsrSegment> {
    const TOLERANCE: f64 = 0.01;

    let mut segments = Vec::new();

    for span in &chunk.segments {
        let (Some(text), Some(seg_start), Some(seg_end)) =
            (span.text.as_deref(), span.start, span.end)
        else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let mut words = Vec::new();
        for raw in &chunk.words {
            let (Some(word), Some(start), Some(end)) = (raw.word.as_deref(), raw.start, raw.end)
            else {
                continue;
            };
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            if start >= seg_start - TOLERANCE && end <= seg_end + TOLERANCE {
                words.push(WordTimestamp {
                    word: word.to_string(),
                    start: chunk_start + start,
                    end: chunk_start + end,
                });
            }
        }

        segments.push(AsrSegment {
            text: text.to_string(),
            start: chunk_start + seg_start,
            end: chunk_start + seg_end,
            words,
        });
    }

    segments
}
