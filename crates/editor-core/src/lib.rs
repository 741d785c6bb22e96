//! Editing core for caption documents: pure mutation operations over
//! [`captions::CaptionsDocument`], a derived speaker index, the playback
//! state machine, and the session container that ties them together behind
//! typed intents.
//!
//! Every mutation is snapshot-in, snapshot-out: operations never modify the
//! input document, and untouched segments are shared between snapshots via
//! `Arc`. A failed operation returns an error and leaves no trace.

mod engine;
mod error;
mod id;
mod playback;
mod session;
mod speakers;

pub use engine::{MutationEngine, SegmentPatch};
pub use error::Error;
pub use id::{Clock, FixedClock, IdGenerator, SequentialIdGen, SystemClock, UuidIdGen};
pub use playback::{MediaCommand, PlaybackController, PlaybackState};
pub use session::{EditorIntent, EditorSession};
pub use speakers::{SpeakerEntry, SpeakerIndex};
