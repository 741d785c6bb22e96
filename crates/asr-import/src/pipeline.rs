//! Post-processing of raw recognizer output into caption-sized segments.
//!
//! The recording is transcribed in fixed-size overlapping chunks, so the raw
//! segments carry duplicated spans near chunk edges, word-level granularity
//! (word-level sources) or over-long sentences. The pipeline runs three
//! passes in a fixed order: overlap resolution, gap-based grouping or
//! splitting, then long-segment splitting.

use crate::chunks::{AsrSegment, WordTimestamp};

/// Which shape the raw segments arrived in, which decides how the gap pass
/// treats them: word-level input is grouped into sentences, sentence-level
/// input is split at large intra-sentence gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    WordLevel,
    SentenceLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessOptions {
    pub granularity: Granularity,
    /// Audio chunk size in seconds.
    pub chunk_size: f64,
    /// Overlap between consecutive chunks in seconds.
    pub overlap: f64,
    /// Word-level: maximum gap to keep words in one group. Sentence-level:
    /// minimum gap that forces a split.
    pub gap_threshold: f64,
    /// Maximum segment duration before the long-segment pass splits it.
    pub max_duration: f64,
}

impl PostProcessOptions {
    pub fn word_level() -> Self {
        Self {
            granularity: Granularity::WordLevel,
            chunk_size: 60.0,
            overlap: 5.0,
            gap_threshold: 0.5,
            max_duration: 10.0,
        }
    }

    pub fn sentence_level() -> Self {
        Self {
            granularity: Granularity::SentenceLevel,
            gap_threshold: 2.0,
            ..Self::word_level()
        }
    }
}

/// Run the full pipeline in production order.
pub fn post_process(segments: Vec<AsrSegment>, options: &PostProcessOptions) -> Vec<AsrSegment> {
    let before = segments.len();
    let segments = resolve_overlap_conflicts(segments, options.chunk_size, options.overlap);
    let segments = match options.granularity {
        Granularity::WordLevel => group_segments_by_gap(segments, options.gap_threshold),
        Granularity::SentenceLevel => split_segments_by_word_gap(segments, options.gap_threshold),
    };
    let segments = split_long_segments(segments, options.max_duration);
    tracing::debug!(raw = before, processed = segments.len(), "post-processed segments");
    segments
}

/// Drop duplicated spans created by chunk overlap. When two segments overlap
/// in time, keep the one recognized farther from its own chunk's edges —
/// recognition quality degrades toward the edges.
pub fn resolve_overlap_conflicts(
    segments: Vec<AsrSegment>,
    chunk_size: f64,
    overlap: f64,
) -> Vec<AsrSegment> {
    let mut sorted = segments;
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let stride = chunk_size - overlap;
    let edge_distance = |segment: &AsrSegment| {
        let chunk_index = (segment.start / stride) as u64;
        let chunk_start = chunk_index as f64 * stride;
        let chunk_end = chunk_start + chunk_size;
        (segment.start - chunk_start).min(chunk_end - segment.end)
    };

    let mut result: Vec<AsrSegment> = Vec::with_capacity(sorted.len());
    for segment in sorted {
        let Some(previous) = result.last() else {
            result.push(segment);
            continue;
        };
        if segment.start < previous.end {
            if edge_distance(&segment) > edge_distance(previous) {
                let slot = result.len() - 1;
                result[slot] = segment;
            }
        } else {
            result.push(segment);
        }
    }
    result
}

/// Group consecutive segments whenever the gap between them is at most
/// `max_gap_seconds`. Turns single-word segments into sentence-sized ones.
pub fn group_segments_by_gap(segments: Vec<AsrSegment>, max_gap_seconds: f64) -> Vec<AsrSegment> {
    let mut sorted = segments;
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut result = Vec::new();
    let mut group: Vec<AsrSegment> = Vec::new();
    for segment in sorted {
        match group.last() {
            Some(previous) if segment.start - previous.end > max_gap_seconds => {
                result.push(merge_group(std::mem::take(&mut group)));
                group.push(segment);
            }
            _ => group.push(segment),
        }
    }
    if !group.is_empty() {
        result.push(merge_group(group));
    }
    result
}

fn merge_group(group: Vec<AsrSegment>) -> AsrSegment {
    let start = group[0].start;
    let end = group[group.len() - 1].end;
    let words: Vec<WordTimestamp> = group.into_iter().flat_map(|s| s.words).collect();
    AsrSegment {
        text: join_words(&words),
        start,
        end,
        words,
    }
}

/// Split a segment wherever the gap between two consecutive words exceeds
/// `max_gap_seconds`. The inverse of grouping, for sentence-level sources
/// whose sentences span pauses.
pub fn split_segments_by_word_gap(
    segments: Vec<AsrSegment>,
    max_gap_seconds: f64,
) -> Vec<AsrSegment> {
    let mut result = Vec::new();

    for segment in segments {
        if segment.words.len() <= 1 {
            result.push(segment);
            continue;
        }

        let mut cuts = vec![0];
        for i in 0..segment.words.len() - 1 {
            if segment.words[i + 1].start - segment.words[i].end > max_gap_seconds {
                cuts.push(i + 1);
            }
        }
        if cuts.len() == 1 {
            result.push(segment);
            continue;
        }
        cuts.push(segment.words.len());

        for window in cuts.windows(2) {
            let words = segment.words[window[0]..window[1]].to_vec();
            if let Some(sub) = from_words(words) {
                result.push(sub);
            }
        }
    }

    result
}

/// Split segments longer than `max_duration_seconds`, cutting after the last
/// word that still fits within the budget from the sub-segment's start.
/// Single-word segments are kept whole regardless of length.
pub fn split_long_segments(segments: Vec<AsrSegment>, max_duration_seconds: f64) -> Vec<AsrSegment> {
    let mut result = Vec::new();

    for segment in segments {
        if segment.end - segment.start <= max_duration_seconds || segment.words.len() <= 1 {
            result.push(segment);
            continue;
        }

        let mut accumulated: Vec<WordTimestamp> = Vec::new();
        for word in segment.words {
            if let Some(first) = accumulated.first() {
                if word.end - first.start > max_duration_seconds {
                    if let Some(sub) = from_words(std::mem::take(&mut accumulated)) {
                        result.push(sub);
                    }
                }
            }
            accumulated.push(word);
        }
        if let Some(sub) = from_words(accumulated) {
            result.push(sub);
        }
    }

    result
}

fn from_words(words: Vec<WordTimestamp>) -> Option<AsrSegment> {
    let first = words.first()?;
    let last = words.last()?;
    let (start, end) = (first.start, last.end);
    Some(AsrSegment {
        text: join_words(&words),
        start,
        end,
        words,
    })
}

fn join_words(words: &[WordTimestamp]) -> String {
    words
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
