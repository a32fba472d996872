use std::{
    collections::HashSet,
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

/// Bridges webview page-load events to the startup sequence: the runtime
/// marks a window label finished from the page-load hook, and the supervisor
/// blocks on it before revealing that window.
#[derive(Default)]
pub(crate) struct PageLoadGate {
    finished: Mutex<HashSet<String>>,
    cvar: Condvar,
}

impl PageLoadGate {
    pub(crate) fn mark_finished(&self, label: &str) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.insert(label.to_string());
            self.cvar.notify_all();
        }
    }

    /// Waits until `label` has finished loading. Returns false on timeout so
    /// callers can proceed with an unfinished window instead of hanging.
    pub(crate) fn wait_finished(&self, label: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let Ok(mut finished) = self.finished.lock() else {
            return false;
        };

        while !finished.contains(label) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.cvar.wait_timeout(finished, remaining) {
                Ok((guard, _)) => finished = guard,
                Err(_) => return false,
            }
        }
        true
    }
}
