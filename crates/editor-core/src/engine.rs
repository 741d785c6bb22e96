//! The mutation engine: every edit is a pure function from a document plus an
//! intent to a new document plus audit entries. Failures are all-or-nothing —
//! the input document is never half-applied — and unaffected segments are
//! shared by `Arc` between the old and new document versions.

use std::collections::HashSet;
use std::sync::Arc;

use captions::{CaptionsDocument, HistoryAction, HistoryEntry, Segment, Word};

use crate::error::Error;
use crate::id::{Clock, IdGenerator, SystemClock, UuidIdGen};

/// Partial update for [`MutationEngine::update_segment`].
///
/// Outer `None` leaves a field unchanged; for the clearable fields the inner
/// `None` clears it (wire form: absent vs `null`).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct SegmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub speaker_name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<u8>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub words: Option<Option<Vec<Word>>>,
}

/// Distinguish an absent field (keep) from an explicit `null` (clear).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

impl SegmentPatch {
    fn apply(&self, segment: &mut Segment) {
        if let Some(start) = self.start_time {
            segment.start_time = start;
        }
        if let Some(end) = self.end_time {
            segment.end_time = end;
        }
        if let Some(text) = &self.text {
            segment.text = text.clone();
        }
        if let Some(speaker) = &self.speaker_name {
            segment.speaker_name = speaker.clone();
        }
        if let Some(rating) = self.rating {
            segment.rating = rating;
        }
        if let Some(words) = &self.words {
            segment.words = words.clone();
        }
    }
}

/// Stateless with respect to documents; holds only the id and clock sources
/// so tests can inject deterministic ones.
pub struct MutationEngine {
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl MutationEngine {
    pub fn new() -> Self {
        Self::with_config(UuidIdGen, SystemClock)
    }

    pub fn with_config(ids: impl IdGenerator + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            ids: Box::new(ids),
            clock: Box::new(clock),
        }
    }

    fn entry(&mut self, action: HistoryAction, before: &Segment) -> HistoryEntry {
        HistoryEntry {
            id: self.ids.next_id(),
            action,
            action_timestamp: self.clock.now(),
            cue: before.clone(),
        }
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Replace only the fields named by `patch` on the segment with `id`.
    pub fn update_segment(
        &mut self,
        document: &CaptionsDocument,
        id: &str,
        patch: &SegmentPatch,
    ) -> Result<CaptionsDocument, Error> {
        let ordinal = document.ordinal(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        let before = Arc::clone(&document.segments[ordinal]);

        let mut updated = (*before).clone();
        patch.apply(&mut updated);
        updated.timestamp = Some(self.clock.now());
        updated.validate()?;

        let mut segments = document.segments.clone();
        segments[ordinal] = Arc::new(updated);

        tracing::debug!(id, "segment updated");
        Ok(evolve(document, segments, vec![self.entry(HistoryAction::Modified, &before)]))
    }

    /// Remove every segment whose id is in `ids`, appending one `Deleted`
    /// history entry per removed segment in document order.
    pub fn delete_segments(
        &mut self,
        document: &CaptionsDocument,
        ids: &[String],
    ) -> Result<CaptionsDocument, Error> {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut segments = Vec::with_capacity(document.segments.len());
        let mut entries = Vec::new();
        for segment in &document.segments {
            if doomed.contains(segment.id.as_str()) {
                entries.push(self.entry(HistoryAction::Deleted, segment));
            } else {
                segments.push(Arc::clone(segment));
            }
        }

        if entries.is_empty() {
            return Err(Error::NotFound(ids.join(", ")));
        }

        tracing::debug!(removed = entries.len(), "segments deleted");
        Ok(evolve(document, segments, entries))
    }

    /// Set the same speaker name on every listed segment. Equivalent to N
    /// independent updates sharing one logical user action — still one
    /// history entry per affected segment. Atomic: an unknown id fails the
    /// whole call.
    pub fn bulk_set_speaker(
        &mut self,
        document: &CaptionsDocument,
        ids: &[String],
        name: &str,
    ) -> Result<CaptionsDocument, Error> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for id in &targets {
            if document.ordinal(id).is_none() {
                return Err(Error::NotFound((*id).to_string()));
            }
        }

        let mut segments = document.segments.clone();
        let mut entries = Vec::new();
        for slot in &mut segments {
            if targets.contains(slot.id.as_str()) {
                entries.push(self.entry(HistoryAction::Modified, slot));
                let mut updated = (**slot).clone();
                updated.speaker_name = Some(name.to_string());
                updated.timestamp = Some(self.clock.now());
                *slot = Arc::new(updated);
            }
        }

        tracing::debug!(affected = entries.len(), speaker = name, "bulk speaker set");
        Ok(evolve(document, segments, entries))
    }

    /// Rename every exact occurrence of `old_name` to `new_name`.
    ///
    /// Rejected with [`Error::NoSpeakersFound`] when the document has no
    /// non-empty speaker names at all (callers guard the rename affordance
    /// on this); renaming a name nobody currently has is a successful no-op.
    pub fn rename_speaker_everywhere(
        &mut self,
        document: &CaptionsDocument,
        old_name: &str,
        new_name: &str,
    ) -> Result<CaptionsDocument, Error> {
        if !document.segments.iter().any(|s| s.has_speaker()) {
            return Err(Error::NoSpeakersFound);
        }

        let mut segments = document.segments.clone();
        let mut entries = Vec::new();
        for slot in &mut segments {
            if slot.speaker_name.as_deref() == Some(old_name) {
                entries.push(self.entry(HistoryAction::SpeakerRenamed, slot));
                let mut updated = (**slot).clone();
                updated.speaker_name = Some(new_name.to_string());
                updated.timestamp = Some(self.clock.now());
                *slot = Arc::new(updated);
            }
        }

        tracing::debug!(affected = entries.len(), old_name, new_name, "speaker renamed");
        Ok(evolve(document, segments, entries))
    }

    /// Merge segments whose ordinal positions are consecutive in document
    /// order (never the display order). The merged segment keeps the first
    /// input's id, spans the union of the inputs' ranges and concatenates
    /// their text and words in ordinal order.
    pub fn merge_adjacent_segments(
        &mut self,
        document: &CaptionsDocument,
        ids: &[String],
    ) -> Result<CaptionsDocument, Error> {
        if ids.len() < 2 {
            return Err(Error::TooFewSegments);
        }

        let mut ordinals = Vec::with_capacity(ids.len());
        for id in ids {
            ordinals.push(document.ordinal(id).ok_or_else(|| Error::NotFound(id.clone()))?);
        }
        ordinals.sort_unstable();
        ordinals.dedup();
        if ordinals.len() != ids.len() || ordinals.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(Error::NotAdjacent);
        }

        let first = ordinals[0];
        let last = *ordinals.last().unwrap_or(&first);
        let inputs: Vec<&Arc<Segment>> = document.segments[first..=last].iter().collect();

        let mut merged = Segment::new(
            inputs[0].id.clone(),
            inputs.iter().map(|s| s.start_time).fold(f64::INFINITY, f64::min),
            inputs.iter().map(|s| s.end_time).fold(f64::NEG_INFINITY, f64::max),
            inputs.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "),
        );
        merged.rating = inputs.iter().filter_map(|s| s.rating).max();
        merged.speaker_name = inputs
            .iter()
            .find(|s| s.has_speaker())
            .and_then(|s| s.speaker_name.clone());
        merged.words = merge_words(&inputs);
        merged.timestamp = Some(self.clock.now());
        merged.validate()?;

        let entries: Vec<HistoryEntry> = inputs
            .iter()
            .map(|s| self.entry(HistoryAction::Modified, s))
            .collect();

        let mut segments = Vec::with_capacity(document.segments.len() - entries.len() + 1);
        segments.extend_from_slice(&document.segments[..first]);
        segments.push(Arc::new(merged));
        segments.extend_from_slice(&document.segments[last + 1..]);

        tracing::debug!(consumed = entries.len(), "segments merged");
        Ok(evolve(document, segments, entries))
    }

    /// Split a segment in two at the start of the word at `word_index`.
    ///
    /// The boundary must be time-anchored: the word at `word_index` needs a
    /// start time and its predecessor an end time. The left child keeps the
    /// parent's id; the right child gets a fresh one. Both inherit speaker
    /// and rating.
    pub fn split_segment_at_word(
        &mut self,
        document: &CaptionsDocument,
        id: &str,
        word_index: usize,
    ) -> Result<CaptionsDocument, Error> {
        let ordinal = document.ordinal(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        let parent = Arc::clone(&document.segments[ordinal]);
        let words = parent.words.as_ref().ok_or(Error::NoWords)?;

        if word_index == 0 {
            return Err(Error::CannotSplitFirstWord);
        }
        if word_index >= words.len() {
            return Err(Error::InvalidWordIndex(word_index));
        }
        let boundary = words[word_index].start_time.ok_or(Error::WordHasNoTimestamp)?;
        if words[word_index - 1].end_time.is_none() {
            return Err(Error::WordHasNoTimestamp);
        }

        let (left_words, right_words) = words.split_at(word_index);
        let now = self.clock.now();

        let mut left = Segment::new(parent.id.clone(), parent.start_time, boundary, join_words(left_words));
        let mut right = Segment::new(self.ids.next_id(), boundary, parent.end_time, join_words(right_words));
        for child in [&mut left, &mut right] {
            child.speaker_name = parent.speaker_name.clone();
            child.rating = parent.rating;
            child.timestamp = Some(now.clone());
        }
        left.words = Some(left_words.to_vec());
        right.words = Some(right_words.to_vec());
        left.validate()?;
        right.validate()?;

        let mut segments = Vec::with_capacity(document.segments.len() + 1);
        segments.extend_from_slice(&document.segments[..ordinal]);
        segments.push(Arc::new(left));
        segments.push(Arc::new(right));
        segments.extend_from_slice(&document.segments[ordinal + 1..]);

        tracing::debug!(id, word_index, "segment split");
        Ok(evolve(document, segments, vec![self.entry(HistoryAction::Modified, &parent)]))
    }
}

impl Default for MutationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn evolve(
    document: &CaptionsDocument,
    segments: Vec<Arc<Segment>>,
    appended: Vec<HistoryEntry>,
) -> CaptionsDocument {
    let mut history = document.history.clone();
    history.extend(appended);
    CaptionsDocument {
        metadata: document.metadata.clone(),
        segments,
        history,
        embeddings: document.embeddings.clone(),
        file_path: document.file_path.clone(),
    }
}

fn merge_words(inputs: &[&Arc<Segment>]) -> Option<Vec<Word>> {
    if inputs.iter().all(|s| s.words.is_none()) {
        return None;
    }
    Some(
        inputs
            .iter()
            .filter_map(|s| s.words.as_deref())
            .flatten()
            .cloned()
            .collect(),
    )
}

fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{FixedClock, SequentialIdGen};

    const NOW: &str = "2026-02-03T04:05:06.000Z";

    fn engine() -> MutationEngine {
        MutationEngine::with_config(SequentialIdGen::new(), FixedClock(NOW.into()))
    }

    fn doc(segments: Vec<Segment>) -> CaptionsDocument {
        let mut document = CaptionsDocument::new("doc");
        document.segments = segments.into_iter().map(Arc::new).collect();
        document
    }

    fn seg(id: &str, start: f64, end: f64, text: &str) -> Segment {
        Segment::new(id, start, end, text)
    }

    fn spoken(id: &str, start: f64, end: f64, text: &str, speaker: &str) -> Segment {
        let mut s = seg(id, start, end, text);
        s.speaker_name = Some(speaker.into());
        s
    }

    // ── update ────────────────────────────────────────────────────────────────

    #[test]
    fn update_replaces_only_patched_fields() {
        let document = doc(vec![spoken("s1", 0.0, 5.0, "Hello", "John")]);
        let patch = SegmentPatch {
            text: Some("Hi".into()),
            ..Default::default()
        };

        let updated = engine().update_segment(&document, "s1", &patch).unwrap();
        let segment = &updated.segments[0];
        assert_eq!(segment.text, "Hi");
        assert_eq!(segment.speaker_name.as_deref(), Some("John"));
        assert_eq!(segment.start_time, 0.0);
        assert_eq!(segment.timestamp.as_deref(), Some(NOW));
    }

    #[test]
    fn update_appends_history_with_before_snapshot() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "Hello")]);
        let patch = SegmentPatch {
            text: Some("Hi".into()),
            ..Default::default()
        };

        let updated = engine().update_segment(&document, "s1", &patch).unwrap();
        assert_eq!(updated.history.len(), 1);
        let entry = &updated.history[0];
        assert_eq!(entry.action, HistoryAction::Modified);
        assert_eq!(entry.action_timestamp, NOW);
        assert_eq!(entry.cue.text, "Hello");
    }

    #[test]
    fn update_clears_speaker_with_explicit_null() {
        let document = doc(vec![spoken("s1", 0.0, 5.0, "Hello", "John")]);
        let patch: SegmentPatch = serde_json::from_str(r#"{"speakerName": null}"#).unwrap();
        assert_eq!(patch.speaker_name, Some(None));

        let updated = engine().update_segment(&document, "s1", &patch).unwrap();
        assert_eq!(updated.segments[0].speaker_name, None);

        // Absent field leaves the speaker alone.
        let keep: SegmentPatch = serde_json::from_str(r#"{"text": "Hi"}"#).unwrap();
        assert_eq!(keep.speaker_name, None);
    }

    #[test]
    fn update_unknown_id_fails() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "Hello")]);
        assert!(matches!(
            engine().update_segment(&document, "nope", &SegmentPatch::default()),
            Err(Error::NotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn update_rejects_inverted_time_range() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "Hello")]);
        let patch = SegmentPatch {
            end_time: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            engine().update_segment(&document, "s1", &patch),
            Err(Error::Validation(captions::Error::InvalidTimeRange { .. }))
        ));
    }

    #[test]
    fn untouched_segments_are_shared_by_reference() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "a"), seg("s2", 5.0, 10.0, "b")]);
        let patch = SegmentPatch {
            text: Some("a2".into()),
            ..Default::default()
        };
        let updated = engine().update_segment(&document, "s1", &patch).unwrap();

        assert!(!Arc::ptr_eq(&document.segments[0], &updated.segments[0]));
        assert!(Arc::ptr_eq(&document.segments[1], &updated.segments[1]));
    }

    // ── delete ────────────────────────────────────────────────────────────────

    #[test]
    fn delete_removes_and_records_each_segment() {
        let document = doc(vec![
            seg("s1", 0.0, 5.0, "a"),
            seg("s2", 5.0, 10.0, "b"),
            seg("s3", 10.0, 15.0, "c"),
        ]);
        let updated = engine()
            .delete_segments(&document, &["s3".into(), "s1".into()])
            .unwrap();

        assert_eq!(updated.segments.len(), 1);
        assert_eq!(updated.segments[0].id, "s2");
        assert_eq!(updated.history.len(), 2);
        assert!(updated.history.iter().all(|e| e.action == HistoryAction::Deleted));
        // Snapshots in document order.
        assert_eq!(updated.history[0].cue.id, "s1");
        assert_eq!(updated.history[1].cue.id, "s3");
    }

    #[test]
    fn delete_with_no_matches_fails() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "a")]);
        assert!(matches!(
            engine().delete_segments(&document, &["zz".into()]),
            Err(Error::NotFound(_))
        ));
    }

    // ── bulk speaker / rename ─────────────────────────────────────────────────

    #[test]
    fn bulk_set_speaker_touches_only_listed_ids() {
        let document = doc(vec![
            seg("s1", 0.0, 5.0, "a"),
            seg("s2", 5.0, 10.0, "b"),
            seg("s3", 10.0, 15.0, "c"),
        ]);
        let updated = engine()
            .bulk_set_speaker(&document, &["s1".into(), "s3".into()], "Ada")
            .unwrap();

        assert_eq!(updated.segments[0].speaker_name.as_deref(), Some("Ada"));
        assert_eq!(updated.segments[1].speaker_name, None);
        assert_eq!(updated.segments[2].speaker_name.as_deref(), Some("Ada"));
        assert_eq!(updated.history.len(), 2);
        assert!(Arc::ptr_eq(&document.segments[1], &updated.segments[1]));
    }

    #[test]
    fn bulk_set_speaker_is_atomic_on_unknown_id() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "a")]);
        assert!(matches!(
            engine().bulk_set_speaker(&document, &["s1".into(), "zz".into()], "Ada"),
            Err(Error::NotFound(id)) if id == "zz"
        ));
    }

    #[test]
    fn rename_speaker_across_document() {
        let document = doc(vec![
            spoken("s1", 0.0, 5.0, "a", "John"),
            spoken("s2", 5.0, 10.0, "b", "Mary"),
            spoken("s3", 10.0, 15.0, "c", "John"),
        ]);
        let updated = engine()
            .rename_speaker_everywhere(&document, "John", "Jonathan")
            .unwrap();

        assert_eq!(updated.segments[0].speaker_name.as_deref(), Some("Jonathan"));
        assert_eq!(updated.segments[1].speaker_name.as_deref(), Some("Mary"));
        assert_eq!(updated.segments[2].speaker_name.as_deref(), Some("Jonathan"));
        assert_eq!(updated.history.len(), 2);
        assert!(updated
            .history
            .iter()
            .all(|e| e.action == HistoryAction::SpeakerRenamed));
        assert!(Arc::ptr_eq(&document.segments[1], &updated.segments[1]));
    }

    #[test]
    fn rename_without_any_speakers_is_rejected() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "a")]);
        assert!(matches!(
            engine().rename_speaker_everywhere(&document, "John", "Jonathan"),
            Err(Error::NoSpeakersFound)
        ));
    }

    #[test]
    fn rename_of_absent_name_is_a_noop_success() {
        let document = doc(vec![spoken("s1", 0.0, 5.0, "a", "Mary")]);
        let updated = engine()
            .rename_speaker_everywhere(&document, "John", "Jonathan")
            .unwrap();
        assert!(updated.history.is_empty());
        assert!(Arc::ptr_eq(&document.segments[0], &updated.segments[0]));
    }

    // ── merge ─────────────────────────────────────────────────────────────────

    #[test]
    fn merge_two_adjacent_segments() {
        let mut s1 = seg("s1", 0.0, 5.0, "Hello");
        s1.rating = Some(3);
        let mut s2 = seg("s2", 5.0, 10.0, "world");
        s2.rating = Some(5);
        let document = doc(vec![s1, s2]);

        let updated = engine()
            .merge_adjacent_segments(&document, &["s1".into(), "s2".into()])
            .unwrap();

        assert_eq!(updated.segments.len(), 1);
        let merged = &updated.segments[0];
        assert_eq!(merged.id, "s1");
        assert_eq!(merged.text, "Hello world");
        assert_eq!(merged.start_time, 0.0);
        assert_eq!(merged.end_time, 10.0);
        assert_eq!(merged.rating, Some(5));
        assert_eq!(updated.history.len(), 2);
    }

    #[test]
    fn merge_uses_ordinal_order_not_argument_order() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "Hello"), seg("s2", 5.0, 10.0, "world")]);
        let updated = engine()
            .merge_adjacent_segments(&document, &["s2".into(), "s1".into()])
            .unwrap();
        assert_eq!(updated.segments[0].text, "Hello world");
    }

    #[test]
    fn merge_takes_first_nonempty_speaker_and_concatenates_words() {
        let mut s1 = seg("s1", 0.0, 5.0, "Hello");
        s1.words = Some(vec![Word::new("Hello", 1.0, 1.5)]);
        let mut s2 = spoken("s2", 5.0, 10.0, "world", "Mary");
        s2.words = Some(vec![Word::new("world", 6.0, 6.5)]);
        let document = doc(vec![s1, s2]);

        let updated = engine()
            .merge_adjacent_segments(&document, &["s1".into(), "s2".into()])
            .unwrap();
        let merged = &updated.segments[0];
        assert_eq!(merged.speaker_name.as_deref(), Some("Mary"));
        assert_eq!(
            merged.words.as_ref().unwrap().iter().map(|w| w.text.as_str()).collect::<Vec<_>>(),
            ["Hello", "world"]
        );
    }

    #[test]
    fn merge_rejects_gap_in_ordinals() {
        let document = doc(vec![
            seg("s1", 0.0, 5.0, "a"),
            seg("s2", 5.0, 10.0, "b"),
            seg("s3", 10.0, 15.0, "c"),
        ]);
        let result = engine().merge_adjacent_segments(&document, &["s1".into(), "s3".into()]);
        assert!(matches!(result, Err(Error::NotAdjacent)));
    }

    #[test]
    fn merge_requires_two_ids_and_known_ids() {
        let document = doc(vec![seg("s1", 0.0, 5.0, "a"), seg("s2", 5.0, 10.0, "b")]);
        assert!(matches!(
            engine().merge_adjacent_segments(&document, &["s1".into()]),
            Err(Error::TooFewSegments)
        ));
        assert!(matches!(
            engine().merge_adjacent_segments(&document, &["s1".into(), "zz".into()]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn merge_adjacency_is_document_order_even_when_unsorted_by_time() {
        // Document order is canonical; start times deliberately reversed.
        let document = doc(vec![seg("s1", 5.0, 10.0, "world"), seg("s2", 0.0, 5.0, "Hello")]);
        let updated = engine()
            .merge_adjacent_segments(&document, &["s1".into(), "s2".into()])
            .unwrap();
        let merged = &updated.segments[0];
        assert_eq!(merged.start_time, 0.0);
        assert_eq!(merged.end_time, 10.0);
        assert_eq!(merged.text, "world Hello");
    }

    // ── split ─────────────────────────────────────────────────────────────────

    fn worded() -> CaptionsDocument {
        let mut s = seg("s1", 0.5, 3.0, "Hello world");
        s.speaker_name = Some("John".into());
        s.rating = Some(4);
        s.words = Some(vec![Word::new("Hello", 1.0, 1.5), Word::new("world", 2.0, 2.5)]);
        doc(vec![s])
    }

    #[test]
    fn split_partitions_time_range_and_words() {
        let document = worded();
        let updated = engine().split_segment_at_word(&document, "s1", 1).unwrap();

        assert_eq!(updated.segments.len(), 2);
        let (a, b) = (&updated.segments[0], &updated.segments[1]);

        assert_eq!(a.id, "s1");
        assert_eq!(a.text, "Hello");
        assert_eq!((a.start_time, a.end_time), (0.5, 2.0));
        assert_eq!(b.text, "world");
        assert_eq!((b.start_time, b.end_time), (2.0, 3.0));
        assert_ne!(b.id, a.id);

        for child in [a, b] {
            assert_eq!(child.speaker_name.as_deref(), Some("John"));
            assert_eq!(child.rating, Some(4));
        }

        let rejoined: Vec<&Word> = a
            .words
            .as_ref()
            .unwrap()
            .iter()
            .chain(b.words.as_ref().unwrap())
            .collect();
        let original = document.segments[0].words.as_ref().unwrap();
        assert_eq!(rejoined.len(), original.len());
        assert!(rejoined.iter().zip(original).all(|(x, y)| **x == *y));

        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].cue.text, "Hello world");
    }

    #[test]
    fn split_rejects_first_word_and_bad_index() {
        let document = worded();
        assert!(matches!(
            engine().split_segment_at_word(&document, "s1", 0),
            Err(Error::CannotSplitFirstWord)
        ));
        assert!(matches!(
            engine().split_segment_at_word(&document, "s1", 2),
            Err(Error::InvalidWordIndex(2))
        ));
    }

    #[test]
    fn split_requires_time_anchored_boundary() {
        let mut s = seg("s1", 0.0, 3.0, "Hello . world");
        s.words = Some(vec![
            Word::new("Hello", 1.0, 1.5),
            Word::untimed("."),
            Word::new("world", 2.0, 2.5),
        ]);
        let document = doc(vec![s]);

        // Untimed word at the boundary.
        assert!(matches!(
            engine().split_segment_at_word(&document, "s1", 1),
            Err(Error::WordHasNoTimestamp)
        ));
        // Untimed predecessor.
        assert!(matches!(
            engine().split_segment_at_word(&document, "s1", 2),
            Err(Error::WordHasNoTimestamp)
        ));
    }

    #[test]
    fn split_without_words_is_rejected() {
        let document = doc(vec![seg("s1", 0.0, 3.0, "Hello world")]);
        assert!(matches!(
            engine().split_segment_at_word(&document, "s1", 1),
            Err(Error::NoWords)
        ));
    }

    // ── history invariant ─────────────────────────────────────────────────────

    #[test]
    fn history_grows_by_one_entry_per_affected_segment() {
        let mut eng = engine();
        let d0 = doc(vec![
            spoken("s1", 0.0, 5.0, "a", "John"),
            spoken("s2", 5.0, 10.0, "b", "John"),
        ]);

        let d1 = eng
            .update_segment(&d0, "s1", &SegmentPatch { text: Some("a2".into()), ..Default::default() })
            .unwrap();
        assert_eq!(d1.history.len(), 1);

        let d2 = eng.rename_speaker_everywhere(&d1, "John", "Jonathan").unwrap();
        assert_eq!(d2.history.len(), 3);

        let d3 = eng.delete_segments(&d2, &["s2".into()]).unwrap();
        assert_eq!(d3.history.len(), 4);

        // Each entry snapshots the state immediately before its operation.
        assert_eq!(d3.history[0].cue.text, "a");
        assert_eq!(d3.history[1].cue.speaker_name.as_deref(), Some("John"));
        assert_eq!(d3.history[3].cue.speaker_name.as_deref(), Some("Jonathan"));
    }
}
