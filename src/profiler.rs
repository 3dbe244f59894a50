//! Pluggable execution profiling.
//!
//! Every executor operation that talks to the database opens a profile
//! entry before delegating and finalizes it when the driver returns. The
//! profiler is shared by handle so the recording side can be inspected
//! while the executor owns its clone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};

use serde::Serialize;

use crate::types::Params;

/// One finalized profiling record. Never mutated after `finish`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileEntry {
    /// Name of the executor operation, e.g. `"perform"` or `"commit"`.
    pub function: String,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub duration: Duration,
    /// Statement text, when the operation carried one.
    pub statement: Option<String>,
    /// Bound values, when the operation carried them.
    pub values: Option<Params>,
}

/// Profiler contract: `start` opens an entry for the named operation,
/// `finish` closes it. Both must be safe to call when profiling is
/// disabled, and `finish` must tolerate missing optional arguments.
pub trait Profiler: Send + Sync {
    fn start(&self, function: &str);
    fn finish(&self, statement: Option<&str>, values: Option<&Params>);
}

/// The no-op policy used when profiling is not wanted.
#[derive(Debug, Default)]
pub struct NullProfiler;

impl Profiler for NullProfiler {
    fn start(&self, _function: &str) {}

    fn finish(&self, _statement: Option<&str>, _values: Option<&Params>) {}
}

struct Pending {
    function: String,
    started_at: SystemTime,
    started: Instant,
}

/// In-memory profiler appending finalized entries to a log.
#[derive(Default)]
pub struct MemoryProfiler {
    disabled: AtomicBool,
    pending: Mutex<Option<Pending>>,
    entries: Mutex<Vec<ProfileEntry>>,
}

impl MemoryProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.disabled.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.disabled.store(!active, Ordering::Relaxed);
    }

    /// Snapshot of the finalized entries, in completion order.
    pub fn entries(&self) -> Vec<ProfileEntry> {
        lock(&self.entries).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
        *lock(&self.pending) = None;
    }
}

impl Profiler for MemoryProfiler {
    fn start(&self, function: &str) {
        if !self.is_active() {
            return;
        }
        *lock(&self.pending) = Some(Pending {
            function: function.to_string(),
            started_at: SystemTime::now(),
            started: Instant::now(),
        });
    }

    fn finish(&self, statement: Option<&str>, values: Option<&Params>) {
        let Some(pending) = lock(&self.pending).take() else {
            return;
        };
        let entry = ProfileEntry {
            function: pending.function,
            started_at: pending.started_at,
            finished_at: SystemTime::now(),
            duration: pending.started.elapsed(),
            statement: statement.map(str::to_string),
            values: values.cloned(),
        };
        lock(&self.entries).push(entry);
    }
}

// The executor is single-threaded per instance; the mutexes only make the
// handle shareable. A poisoned lock still holds valid data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_finish_records_entry() {
        let profiler = MemoryProfiler::new();
        profiler.start("perform");
        profiler.finish(Some("SELECT 1"), None);

        let entries = profiler.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].function, "perform");
        assert_eq!(entries[0].statement.as_deref(), Some("SELECT 1"));
        assert!(entries[0].finished_at >= entries[0].started_at);
    }

    #[test]
    fn test_disabled_profiler_records_nothing() {
        let profiler = MemoryProfiler::new();
        profiler.set_active(false);
        profiler.start("exec");
        profiler.finish(None, None);
        assert!(profiler.is_empty());
    }

    #[test]
    fn test_finish_without_start_is_a_noop() {
        let profiler = MemoryProfiler::new();
        profiler.finish(Some("SELECT 1"), None);
        assert!(profiler.is_empty());
    }

    #[test]
    fn test_entries_are_serializable() {
        let profiler = MemoryProfiler::new();
        profiler.start("exec");
        profiler.finish(Some("DELETE FROM t"), None);
        let json = serde_json::to_string(&profiler.entries()).unwrap();
        assert!(json.contains("DELETE FROM t"));
    }
}
