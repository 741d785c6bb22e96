//! Derived registry of speaker names, ranked by how often each name appears
//! in the segment list (ties broken by first appearance). Feeds the rename
//! candidate list and free-text speaker suggestions; recomputed whenever an
//! operation can touch speaker names.

use std::collections::HashMap;

use captions::CaptionsDocument;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SpeakerEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerIndex {
    ranked: Vec<SpeakerEntry>,
}

impl SpeakerIndex {
    pub fn from_document(document: &CaptionsDocument) -> Self {
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for (ordinal, segment) in document.segments.iter().enumerate() {
            let Some(name) = segment.speaker_name.as_deref() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let stat = stats.entry(name).or_insert((0, ordinal));
            stat.0 += 1;
        }

        let mut entries: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .map(|(name, (count, first))| (name, count, first))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        Self {
            ranked: entries
                .into_iter()
                .map(|(name, count, _)| SpeakerEntry {
                    name: name.to_string(),
                    count,
                })
                .collect(),
        }
    }

    /// Distinct speaker names, most frequent first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ranked.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[SpeakerEntry] {
        &self.ranked
    }

    /// Ranked suggestions for free-text entry: case-insensitive prefix match.
    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.ranked
            .iter()
            .filter(|e| e.name.to_lowercase().starts_with(&prefix))
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ranked.iter().any(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
