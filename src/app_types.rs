use std::{
    env,
    path::PathBuf,
    process::Child,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use url::Url;

use crate::{BACKEND_STATUS_PATH, BACKEND_URL_ENV, DEFAULT_BACKEND_URL};

/// Resolved backend invocation, computed once per startup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchPlan {
    pub(crate) cmd: String,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: PathBuf,
    pub(crate) packaged_mode: bool,
}

/// Shared supervisor state managed by Tauri. The child handle is mutated only
/// by the backend process module; everything else is flags.
#[derive(Debug)]
pub(crate) struct BackendState {
    pub(crate) child: Mutex<Option<Child>>,
    pub(crate) backend_url: String,
    pub(crate) is_starting: AtomicBool,
    pub(crate) is_quitting: AtomicBool,
    pub(crate) abort_readiness: AtomicBool,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            child: Mutex::new(None),
            backend_url: normalize_backend_url(
                &env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
                DEFAULT_BACKEND_URL,
            ),
            is_starting: AtomicBool::new(false),
            is_quitting: AtomicBool::new(false),
            abort_readiness: AtomicBool::new(false),
        }
    }
}

impl BackendState {
    pub(crate) fn is_running(&self) -> bool {
        match self.child.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(None)),
                None => false,
            },
            Err(_) => false,
        }
    }

    pub(crate) fn mark_quitting(&self) {
        self.is_quitting.store(true, Ordering::Relaxed);
        self.abort_readiness.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_quitting(&self) -> bool {
        self.is_quitting.load(Ordering::Relaxed)
    }
}

pub(crate) fn normalize_backend_url(raw: &str, default_url: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default_url.to_string();
    }

    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            if parsed.path().is_empty() {
                parsed.set_path("/");
            }
            parsed.to_string()
        }
        Err(_) => default_url.to_string(),
    }
}

pub(crate) fn status_url(backend_url: &str) -> String {
    format!("{}{}", backend_url.trim_end_matches('/'), BACKEND_STATUS_PATH)
}

/// RAII flag used to reject a second concurrent startup attempt.
pub(crate) struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub(crate) fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::{normalize_backend_url, status_url, AtomicFlagGuard};
    use crate::DEFAULT_BACKEND_URL;

    #[test]
    fn normalize_backend_url_keeps_valid_urls() {
        assert_eq!(
            normalize_backend_url("http://127.0.0.1:5000", DEFAULT_BACKEND_URL),
            "http://127.0.0.1:5000/"
        );
    }

    #[test]
    fn normalize_backend_url_rejects_garbage() {
        assert_eq!(
            normalize_backend_url("not a url", DEFAULT_BACKEND_URL),
            DEFAULT_BACKEND_URL
        );
        assert_eq!(
            normalize_backend_url("   ", DEFAULT_BACKEND_URL),
            DEFAULT_BACKEND_URL
        );
    }

    #[test]
    fn status_url_appends_health_path_once() {
        assert_eq!(
            status_url("http://localhost:5000/"),
            "http://localhost:5000/api/status"
        );
        assert_eq!(
            status_url("http://localhost:5000"),
            "http://localhost:5000/api/status"
        );
    }

    #[test]
    fn atomic_flag_guard_rejects_double_set_until_drop() {
        let flag = AtomicBool::new(false);

        let guard = AtomicFlagGuard::try_set(&flag).expect("first set should succeed");
        assert!(flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_some());
    }
}
