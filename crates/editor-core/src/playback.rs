//! Playback/playlist state machine.
//!
//! The controller never touches media itself; it turns position callbacks
//! from the external media element into [`MediaCommand`]s (seek/play/pause).
//! A segments session captures the caller's *displayed* order exactly once,
//! at start — the playlist then stays fixed for the whole session even if the
//! document is re-sorted or re-rendered underneath it.

use captions::CaptionsDocument;

/// Outbound intent for the external media element.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum MediaCommand {
    SeekTo { seconds: f64 },
    Play,
    Pause,
}

/// Public view of the machine's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum PlaybackState {
    Idle,
    SnippetPlaying,
    SegmentsPlaying,
}

/// Filter for position callbacks arriving around a pending seek.
///
/// Media elements keep reporting the pre-seek position until the seek lands,
/// so the first position outside the new entry's range is swallowed as a
/// stale duplicate. The next callback is trusted either way: an entry shorter
/// than the callback interval may never report a position inside its range,
/// and must still be able to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeekGuard {
    pending: bool,
    swallowed: bool,
}

impl SeekGuard {
    fn armed() -> Self {
        Self {
            pending: true,
            swallowed: false,
        }
    }

    /// Whether `position` should be treated as real playback progress.
    fn admit(&mut self, position: f64, start: f64, end: f64) -> bool {
        if !self.pending {
            return true;
        }
        if position >= start && position < end {
            self.pending = false;
            return true;
        }
        if !self.swallowed {
            self.swallowed = true;
            return false;
        }
        self.pending = false;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Idle,
    Snippet {
        id: String,
        start: f64,
        end: f64,
        guard: SeekGuard,
    },
    Segments {
        playlist: Vec<String>,
        index: usize,
        start: f64,
        end: f64,
        guard: SeekGuard,
    },
}

#[derive(Debug)]
pub struct PlaybackController {
    mode: Mode,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self { mode: Mode::Idle }
    }

    pub fn state(&self) -> PlaybackState {
        match self.mode {
            Mode::Idle => PlaybackState::Idle,
            Mode::Snippet { .. } => PlaybackState::SnippetPlaying,
            Mode::Segments { .. } => PlaybackState::SegmentsPlaying,
        }
    }

    /// The captured playlist of the active segments session, if any.
    pub fn playlist(&self) -> Option<&[String]> {
        match &self.mode {
            Mode::Segments { playlist, .. } => Some(playlist),
            _ => None,
        }
    }

    /// Id of the entry currently being played, in either playing state.
    pub fn current_segment_id(&self) -> Option<&str> {
        match &self.mode {
            Mode::Idle => None,
            Mode::Snippet { id, .. } => Some(id),
            Mode::Segments { playlist, index, .. } => playlist.get(*index).map(String::as_str),
        }
    }

    /// Play one segment ad hoc.
    pub fn play_snippet(&mut self, segment: &captions::Segment) -> Vec<MediaCommand> {
        self.mode = Mode::Snippet {
            id: segment.id.clone(),
            start: segment.start_time,
            end: segment.end_time,
            guard: SeekGuard::armed(),
        };
        vec![
            MediaCommand::SeekTo {
                seconds: segment.start_time,
            },
            MediaCommand::Play,
        ]
    }

    /// Start sequential playback over `displayed_order`, optionally from a
    /// given row. The order is captured here, once; later sort changes do
    /// not affect the running session. Entries that no longer resolve in the
    /// document are skipped.
    pub fn play_segments(
        &mut self,
        displayed_order: Vec<String>,
        from: Option<&str>,
        document: &CaptionsDocument,
    ) -> Vec<MediaCommand> {
        let start_index = from
            .and_then(|id| displayed_order.iter().position(|entry| entry == id))
            .unwrap_or(0);

        match resolve_from(&displayed_order, start_index, document) {
            Some((index, start, end)) => {
                self.mode = Mode::Segments {
                    playlist: displayed_order,
                    index,
                    start,
                    end,
                    guard: SeekGuard::armed(),
                };
                vec![MediaCommand::SeekTo { seconds: start }, MediaCommand::Play]
            }
            None => {
                self.mode = Mode::Idle;
                vec![]
            }
        }
    }

    /// Explicit stop/pause from any state. Immediate, no document effects.
    pub fn stop(&mut self) -> Vec<MediaCommand> {
        if matches!(self.mode, Mode::Idle) {
            return vec![];
        }
        self.mode = Mode::Idle;
        vec![MediaCommand::Pause]
    }

    /// React to a media position callback.
    ///
    /// Safe under duplicate and slightly out-of-order callbacks: after a
    /// seek is issued, one position outside the current entry's range is
    /// swallowed as a stale pre-seek duplicate, so a late position cannot
    /// advance the playlist twice — while entries shorter than the callback
    /// interval still terminate on the following callback.
    pub fn position_changed(
        &mut self,
        position: f64,
        document: &CaptionsDocument,
    ) -> Vec<MediaCommand> {
        match &mut self.mode {
            Mode::Idle => vec![],
            Mode::Snippet {
                start, end, guard, ..
            } => {
                if !guard.admit(position, *start, *end) {
                    return vec![];
                }
                if position >= *end {
                    self.mode = Mode::Idle;
                    vec![MediaCommand::Pause]
                } else {
                    vec![]
                }
            }
            Mode::Segments {
                start, end, guard, ..
            } => {
                if !guard.admit(position, *start, *end) {
                    return vec![];
                }
                if position >= *end {
                    self.advance(document)
                } else {
                    vec![]
                }
            }
        }
    }

    /// Move to the next resolvable playlist entry, or back to idle at the
    /// end of the playlist.
    fn advance(&mut self, document: &CaptionsDocument) -> Vec<MediaCommand> {
        let Mode::Segments {
            playlist, index, ..
        } = std::mem::replace(&mut self.mode, Mode::Idle)
        else {
            return vec![];
        };

        match resolve_from(&playlist, index + 1, document) {
            Some((next_index, start, end)) => {
                self.mode = Mode::Segments {
                    playlist,
                    index: next_index,
                    start,
                    end,
                    guard: SeekGuard::armed(),
                };
                vec![MediaCommand::SeekTo { seconds: start }]
            }
            None => vec![MediaCommand::Pause],
        }
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first entry at or after `from` that still resolves in the
/// document; returns its index and current time range. Stale entries
/// (deleted since capture) are skipped.
fn resolve_from(
    playlist: &[String],
    from: usize,
    document: &CaptionsDocument,
) -> Option<(usize, f64, f64)> {
    for (offset, id) in playlist[from.min(playlist.len())..].iter().enumerate() {
        match document.segment(id) {
            Some(segment) => return Some((from + offset, segment.start_time, segment.end_time)),
            None => tracing::warn!(id, "skipping playlist entry no longer in document"),
        }
    }
    None
}
