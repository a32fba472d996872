use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures the startup orchestrator routes through its single recovery
/// handler. Port reclamation and tray creation never produce one of these.
#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("backend executable not found; probed paths: {probed:?}")]
    ExecutableNotFound { probed: Vec<PathBuf> },

    #[error("failed to spawn backend process: {0}")]
    Spawn(String),

    #[error("readiness probe failure: {0}")]
    Probe(String),

    #[error("backend not ready after {elapsed:?} (budget {budget:?})")]
    ReadinessTimeout { elapsed: Duration, budget: Duration },

    #[error("startup aborted: {0}")]
    Aborted(String),

    #[error("main window failure: {0}")]
    Window(String),
}
