use std::collections::HashMap;
use std::sync::Mutex;

use snafu::ensure;
use tracing::debug;

use seam_common::RotationIndex;

use crate::err::{Result, RotationExceededSnafu};

/// Tracks which physical file currently receives appends for each logical
/// file after corrupt-replica rotations, and caps how far a file may
/// rotate. State is deliberately local to one writer instance; two workers
/// appending to the same logical file is out of scope.
#[derive(Debug)]
pub struct RotationTracker {
    max_rotations: RotationIndex,
    log: Mutex<RotationLog>,
}

#[derive(Debug, Default)]
struct RotationLog {
    entries: HashMap<String, RotationEntry>,
    /// Set on the first rotation since the log was last cleared.
    session_active: bool,
}

#[derive(Debug, Clone)]
struct RotationEntry {
    target: String,
    index: RotationIndex,
}

/// Strip one trailing `.<index>` rotation suffix when present.
fn base_name(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, suffix))
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

fn start_chain(log: &mut RotationLog, base: &str, name: &str) -> String {
    let target = format!("{name}.0");
    log.entries
        .insert(base.to_string(), RotationEntry { target: target.clone(), index: 0 });
    target
}

impl RotationTracker {
    pub fn new(max_rotations: RotationIndex) -> Self {
        Self { max_rotations, log: Mutex::new(RotationLog::default()) }
    }

    /// Route a write to the currently active rotated name; the identity
    /// for a file that has never failed. Fails once the file's rotation
    /// index has passed the cap, after which the caller must stop
    /// retrying this file.
    pub fn resolve(&self, name: &str) -> Result<String> {
        let log = self.lock();
        match log.entries.get(base_name(name)) {
            Some(entry) => {
                ensure!(
                    entry.index <= self.max_rotations,
                    RotationExceededSnafu { filename: name }
                );
                Ok(entry.target.clone())
            }
            None => Ok(name.to_string()),
        }
    }

    /// Record a rotation-eligible append failure against `name` and return
    /// the next destination filename. Indices grow monotonically for as
    /// long as the base name stays in the log.
    pub fn record_failure(&self, name: &str) -> String {
        let mut log = self.lock();
        let base = base_name(name).to_string();
        if !log.session_active {
            // First rotation for this worker since the last clear.
            log.session_active = true;
            start_chain(&mut log, &base, name)
        } else if let Some(entry) = log.entries.get_mut(&base) {
            entry.index += 1;
            entry.target = format!("{base}.{}", entry.index);
            entry.target.clone()
        } else {
            // The worker has moved on to a different logical file while an
            // older chain is still recorded. Drop finished chains so the
            // log cannot grow without bound across a long-running worker.
            debug!("clearing {} finished rotation chains", log.entries.len());
            log.entries.clear();
            start_chain(&mut log, &base, name)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RotationLog> {
        self.log.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::Error;

    #[test]
    fn base_name_strips_one_numeric_suffix() {
        assert_eq!(base_name("/d/f"), "/d/f");
        assert_eq!(base_name("/d/f.0"), "/d/f");
        assert_eq!(base_name("/d/f.127"), "/d/f");
        assert_eq!(base_name("/d/f.bak"), "/d/f.bak");
        assert_eq!(base_name("/d/f."), "/d/f.");
    }

    #[test]
    fn clean_name_passes_through() {
        let tracker = RotationTracker::new(100);
        assert_eq!(tracker.resolve("/d/f").unwrap(), "/d/f");
        assert!(tracker.lock().entries.is_empty());
    }

    #[test]
    fn failures_build_a_rotation_chain() {
        let tracker = RotationTracker::new(100);
        assert_eq!(tracker.record_failure("/d/f"), "/d/f.0");
        assert_eq!(tracker.record_failure("/d/f.0"), "/d/f.1");
        assert_eq!(tracker.record_failure("/d/f.1"), "/d/f.2");

        // Writes to any name in the chain route to the newest target.
        assert_eq!(tracker.resolve("/d/f").unwrap(), "/d/f.2");
        assert_eq!(tracker.resolve("/d/f.0").unwrap(), "/d/f.2");
        assert_eq!(tracker.lock().entries.len(), 1);
    }

    #[test]
    fn switching_files_clears_finished_chains() {
        let tracker = RotationTracker::new(100);
        tracker.record_failure("/d/f");
        tracker.record_failure("/d/f.0");

        // Unrelated file resolves cleanly while the old chain is live.
        assert_eq!(tracker.resolve("/d/g").unwrap(), "/d/g");
        assert_eq!(tracker.resolve("/d/f").unwrap(), "/d/f.1");

        // First failure of the new file clears the old chain.
        assert_eq!(tracker.record_failure("/d/g"), "/d/g.0");
        let log = tracker.lock();
        assert_eq!(log.entries.len(), 1);
        assert!(log.entries.contains_key("/d/g"));
        assert!(log.session_active);
    }

    #[test]
    fn resolve_fails_past_the_rotation_cap() {
        let tracker = RotationTracker::new(2);
        tracker.record_failure("/d/f"); // index 0
        tracker.record_failure("/d/f.0"); // index 1
        tracker.record_failure("/d/f.1"); // index 2
        assert_eq!(tracker.resolve("/d/f").unwrap(), "/d/f.2");

        tracker.record_failure("/d/f.2"); // index 3 > cap
        let err = tracker.resolve("/d/f").unwrap_err();
        assert!(matches!(err, Error::RotationExceeded { .. }));
    }
}
