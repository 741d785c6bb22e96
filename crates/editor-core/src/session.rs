//! The single state container for an open document: current document
//! snapshot, selection, speaker index and playback state, with every change
//! funneled through typed intents. The UI emits [`EditorIntent`]s into a
//! serialized queue; the session applies them one at a time and swaps the
//! document atomically, so observers always see a complete snapshot.

use std::sync::Arc;

use captions::CaptionsDocument;

use crate::engine::{MutationEngine, SegmentPatch};
use crate::error::Error;
use crate::playback::{MediaCommand, PlaybackController, PlaybackState};
use crate::speakers::SpeakerIndex;

/// One user intent, as emitted by the UI layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorIntent {
    UpdateSegment {
        id: String,
        patch: SegmentPatch,
    },
    DeleteSegments {
        ids: Vec<String>,
    },
    BulkSetSpeaker {
        ids: Vec<String>,
        name: String,
    },
    RenameSpeaker {
        old_name: String,
        new_name: String,
    },
    MergeSegments {
        ids: Vec<String>,
    },
    SplitSegment {
        id: String,
        word_index: usize,
    },
    /// Update "current position" only. Always available; never starts
    /// playback — it drives auto-scroll and highlighting while idle.
    Select {
        id: Option<String>,
    },
    PlaySnippet {
        id: String,
    },
    PlaySegments {
        displayed_order: Vec<String>,
        from: Option<String>,
    },
    StopPlayback,
}

pub struct EditorSession {
    document: Arc<CaptionsDocument>,
    engine: MutationEngine,
    speakers: SpeakerIndex,
    selection: Option<String>,
    playback: PlaybackController,
}

impl EditorSession {
    pub fn new(document: CaptionsDocument) -> Self {
        Self::with_engine(document, MutationEngine::new())
    }

    pub fn with_engine(document: CaptionsDocument, engine: MutationEngine) -> Self {
        let speakers = SpeakerIndex::from_document(&document);
        Self {
            document: Arc::new(document),
            engine,
            speakers,
            selection: None,
            playback: PlaybackController::new(),
        }
    }

    // ── Observers ─────────────────────────────────────────────────────────────

    /// The current document snapshot. Mutations replace it wholesale; a
    /// cheap `Arc::ptr_eq` against a previously held handle tells an
    /// observer whether anything changed.
    pub fn document(&self) -> &Arc<CaptionsDocument> {
        &self.document
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn speakers(&self) -> &SpeakerIndex {
        &self.speakers
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    // ── Intents ───────────────────────────────────────────────────────────────

    /// Apply one intent. Mutation intents return no media commands; playback
    /// intents return the commands the media element should execute.
    pub fn apply(&mut self, intent: EditorIntent) -> Result<Vec<MediaCommand>, Error> {
        tracing::debug!(?intent, "applying intent");
        match intent {
            EditorIntent::UpdateSegment { id, patch } => {
                let next = self.engine.update_segment(&self.document, &id, &patch)?;
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::DeleteSegments { ids } => {
                let next = self.engine.delete_segments(&self.document, &ids)?;
                // Make the removal observable atomically with the swap: a
                // selection pointing at a removed segment is cleared here,
                // never left dangling for the UI to discover.
                if let Some(selected) = &self.selection {
                    if next.segment(selected).is_none() {
                        self.selection = None;
                    }
                }
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::BulkSetSpeaker { ids, name } => {
                let next = self.engine.bulk_set_speaker(&self.document, &ids, &name)?;
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::RenameSpeaker { old_name, new_name } => {
                let next =
                    self.engine
                        .rename_speaker_everywhere(&self.document, &old_name, &new_name)?;
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::MergeSegments { ids } => {
                let next = self.engine.merge_adjacent_segments(&self.document, &ids)?;
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::SplitSegment { id, word_index } => {
                let next = self
                    .engine
                    .split_segment_at_word(&self.document, &id, word_index)?;
                self.install(next);
                Ok(vec![])
            }
            EditorIntent::Select { id } => {
                if let Some(id) = &id {
                    if self.document.segment(id).is_none() {
                        return Err(Error::NotFound(id.clone()));
                    }
                }
                self.selection = id;
                Ok(vec![])
            }
            EditorIntent::PlaySnippet { id } => {
                let segment = self
                    .document
                    .segment(&id)
                    .ok_or_else(|| Error::NotFound(id.clone()))?;
                Ok(self.playback.play_snippet(segment))
            }
            EditorIntent::PlaySegments {
                displayed_order,
                from,
            } => Ok(self
                .playback
                .play_segments(displayed_order, from.as_deref(), &self.document)),
            EditorIntent::StopPlayback => Ok(self.playback.stop()),
        }
    }

    /// Forward a media position callback to the playback machine.
    pub fn position_changed(&mut self, position: f64) -> Vec<MediaCommand> {
        self.playback.position_changed(position, &self.document)
    }

    fn install(&mut self, next: CaptionsDocument) {
        self.document = Arc::new(next);
        self.speakers = SpeakerIndex::from_document(&self.document);
    }
}
