use chrono::{SecondsFormat, Utc};

/// Source of ids for new segments and history entries.
pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> String;
}

pub struct UuidIdGen;

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic sequential id generator for tests and golden snapshots.
pub struct SequentialIdGen(u64);

impl SequentialIdGen {
    pub fn new() -> Self {
        Self(0)
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = self.0;
        self.0 += 1;
        format!("gen-{id}")
    }
}

/// Source of ISO 8601 instants for history entries and segment
/// modification stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> String;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Fixed instant for deterministic tests.
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}
