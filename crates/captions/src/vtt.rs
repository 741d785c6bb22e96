//! Hybrid WEBVTT serializer/parser.
//!
//! The on-disk form is a standard cue-timing container augmented with
//! out-of-band metadata carried in `NOTE` comments:
//!
//! ```text
//! NOTE CAPTION_EDITOR:<TypeName> <compact-json>
//! ```
//!
//! Document metadata, history and embeddings are emitted in one top-of-file
//! run; each segment's metadata block is emitted immediately before its cue
//! block. Parsing tolerates blocks in any order, matches per-segment blocks
//! to cue blocks by id, and salvages the rest of the file when a single
//! payload is malformed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Error;
use crate::timestamp::{format_cue_timing, parse_cue_timing};
use crate::types::{CaptionsDocument, HistoryEntry, Segment, SpeakerEmbedding, TranscriptMetadata};

/// Sentinel distinguishing this application's NOTE comments from ordinary
/// VTT comments. Shared with the TypeScript parser and the Python tools.
pub const SENTINEL: &str = "CAPTION_EDITOR";

const HEADER: &str = "WEBVTT";

/// A non-fatal problem encountered while parsing. The offending block is
/// dropped; the rest of the file is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 1-based line number of the offending block.
    pub line: usize,
    pub message: String,
}

/// Result of a hybrid-text parse: the document plus any salvage diagnostics.
#[derive(Debug)]
pub struct ParseOutcome {
    pub document: CaptionsDocument,
    pub diagnostics: Vec<ParseDiagnostic>,
}

// ── Serialization ─────────────────────────────────────────────────────────────

/// Serialize a document to the hybrid text form.
///
/// When `captions_path` is given, an absolute media path under the caption
/// file's directory is rewritten relative to it.
pub fn serialize(document: &CaptionsDocument, captions_path: Option<&Path>) -> Result<String, Error> {
    let metadata = document.metadata.with_relative_media_path(captions_path);

    let mut lines: Vec<String> = vec![HEADER.to_string(), String::new()];
    lines.push(note_line("TranscriptMetadata", &metadata)?);

    for entry in &document.history {
        lines.push(note_line("SegmentHistoryEntry", entry)?);
    }
    for embedding in &document.embeddings {
        lines.push(note_line("SegmentSpeakerEmbedding", embedding)?);
    }

    for segment in &document.segments {
        lines.push(String::new());
        lines.push(note_line("TranscriptSegment", segment.as_ref())?);
        lines.push(segment.id.clone());
        lines.push(format_cue_timing(segment.start_time, segment.end_time));
        lines.push(segment.text.clone());
    }

    Ok(lines.join("\n") + "\n")
}

fn note_line<T: serde::Serialize>(tag: &str, payload: &T) -> Result<String, Error> {
    Ok(format!("NOTE {SENTINEL}:{tag} {}", serde_json::to_string(payload)?))
}

// ── Parsing ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Parser {
    metadata: Option<TranscriptMetadata>,
    // First-appearance order of segment ids; duplicate blocks keep their
    // original position, last payload wins.
    order: Vec<String>,
    by_id: HashMap<String, Segment>,
    history: Vec<HistoryEntry>,
    embeddings: Vec<SpeakerEmbedding>,
    diagnostics: Vec<ParseDiagnostic>,
    synthesized: usize,
}

/// Parse the hybrid text form.
///
/// Fails only on structural problems (missing header, no document metadata);
/// malformed or invariant-violating metadata payloads are dropped with a
/// diagnostic so partially corrupt files stay loadable.
pub fn parse(content: &str) -> Result<ParseOutcome, Error> {
    let lines: Vec<&str> = content.lines().map(|l| l.trim_end_matches('\r')).collect();

    let mut i = skip_blank(&lines, 0);
    if i >= lines.len() || !lines[i].trim().starts_with(HEADER) {
        return Err(Error::MissingHeader);
    }
    i += 1;

    let mut parser = Parser::default();

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix("NOTE") {
            let rest = rest.trim_start();
            if let Some(tagged) = rest.strip_prefix(&format!("{SENTINEL}:")) {
                parser.handle_note(tagged, i + 1);
                i += 1;
            } else {
                // Ordinary VTT comment: skip the whole block.
                i = skip_to_blank(&lines, i);
            }
            continue;
        }

        if line.contains("-->") {
            // Cue block without an id line; synthesize a deterministic id.
            i = parser.handle_cue(None, &lines, i);
        } else if i + 1 < lines.len() && lines[i + 1].contains("-->") {
            i = parser.handle_cue(Some(line.to_string()), &lines, i + 1);
        } else {
            parser.diagnostics.push(ParseDiagnostic {
                line: i + 1,
                message: format!("unrecognized line: {line:?}"),
            });
            i += 1;
        }
    }

    parser.finish()
}

fn skip_blank(lines: &[&str], mut i: usize) -> usize {
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    i
}

fn skip_to_blank(lines: &[&str], mut i: usize) -> usize {
    while i < lines.len() && !lines[i].trim().is_empty() {
        i += 1;
    }
    i
}

impl Parser {
    fn handle_note(&mut self, tagged: &str, line: usize) {
        let (tag, payload) = match tagged.split_once(char::is_whitespace) {
            Some(split) => split,
            None => {
                self.drop_block(line, "metadata block has no JSON payload");
                return;
            }
        };

        match tag {
            "TranscriptMetadata" => match serde_json::from_str::<TranscriptMetadata>(payload) {
                Ok(metadata) => self.metadata = Some(metadata),
                Err(err) => self.drop_block(line, &format!("bad TranscriptMetadata payload: {err}")),
            },
            // `VTTCue` is the legacy tag for the same payload.
            "TranscriptSegment" | "VTTCue" => match serde_json::from_str::<Segment>(payload) {
                Ok(segment) => match segment.validate() {
                    Ok(()) => self.upsert(segment),
                    Err(err) => self.drop_block(line, &format!("invalid segment: {err}")),
                },
                Err(err) => self.drop_block(line, &format!("bad TranscriptSegment payload: {err}")),
            },
            "SegmentHistoryEntry" => match serde_json::from_str::<HistoryEntry>(payload) {
                Ok(entry) => self.history.push(entry),
                Err(err) => self.drop_block(line, &format!("bad SegmentHistoryEntry payload: {err}")),
            },
            "SegmentSpeakerEmbedding" => match serde_json::from_str::<SpeakerEmbedding>(payload) {
                Ok(embedding) => self.embeddings.push(embedding),
                Err(err) => {
                    self.drop_block(line, &format!("bad SegmentSpeakerEmbedding payload: {err}"))
                }
            },
            other => self.drop_block(line, &format!("unrecognized metadata tag {other:?}")),
        }
    }

    /// Consume a cue block starting at the timing line `timing_at`; returns
    /// the index just past the block.
    fn handle_cue(&mut self, id: Option<String>, lines: &[&str], timing_at: usize) -> usize {
        let timing_line = lines[timing_at].trim();
        let mut next = timing_at + 1;

        let mut text_lines: Vec<&str> = Vec::new();
        while next < lines.len() && !lines[next].trim().is_empty() {
            text_lines.push(lines[next]);
            next += 1;
        }

        let (start, end) = match parse_cue_timing(timing_line) {
            Ok(times) => times,
            Err(err) => {
                self.drop_block(timing_at + 1, &format!("bad cue timing: {err}"));
                return next;
            }
        };

        // Synthesized ids must not capture a block that explicitly carries
        // the same name; skip past ids already seen.
        let id = id.unwrap_or_else(|| loop {
            self.synthesized += 1;
            let candidate = format!("cue-{}", self.synthesized);
            if !self.by_id.contains_key(&candidate) {
                break candidate;
            }
        });
        let text = text_lines.join("\n");

        // A cue block refines (or creates) the segment carried by its
        // metadata block; later blocks win on conflict.
        let mut segment = self
            .by_id
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Segment::new(id.clone(), start, end, text.clone()));
        segment.start_time = start;
        segment.end_time = end;
        segment.text = text;

        match segment.validate() {
            Ok(()) => self.upsert(segment),
            Err(err) => self.drop_block(timing_at + 1, &format!("invalid cue: {err}")),
        }

        next
    }

    fn upsert(&mut self, segment: Segment) {
        if !self.by_id.contains_key(&segment.id) {
            self.order.push(segment.id.clone());
        }
        self.by_id.insert(segment.id.clone(), segment);
    }

    fn drop_block(&mut self, line: usize, message: &str) {
        tracing::warn!(line, message, "dropping unparseable block");
        self.diagnostics.push(ParseDiagnostic {
            line,
            message: message.to_string(),
        });
    }

    fn finish(self) -> Result<ParseOutcome, Error> {
        let Parser {
            metadata,
            order,
            mut by_id,
            history,
            embeddings,
            diagnostics,
            ..
        } = self;

        let metadata = metadata.ok_or(Error::MissingMetadata)?;
        let segments: Vec<Arc<Segment>> = order
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(Arc::new)
            .collect();

        let document = CaptionsDocument {
            metadata,
            segments,
            history,
            embeddings,
            file_path: None,
        };
        document.validate()?;

        Ok(ParseOutcome {
            document,
            diagnostics,
        })
    }
}
