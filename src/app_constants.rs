use std::time::Duration;

pub(crate) const BACKEND_PORT: u16 = 5000;
pub(crate) const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/";
pub(crate) const BACKEND_STATUS_PATH: &str = "/api/status";

pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const SPLASH_WINDOW_LABEL: &str = "splash";
pub(crate) const TRAY_ID: &str = "facesentry-tray";

pub(crate) const READINESS_BUDGET: Duration = Duration::from_secs(30);
pub(crate) const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub(crate) const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) const PORT_SETTLE_DELAY: Duration = Duration::from_millis(500);
#[cfg(target_os = "windows")]
pub(crate) const RECLAIM_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const RECLAIM_KILL_TIMEOUT: Duration = Duration::from_secs(3);
#[cfg(not(target_os = "windows"))]
pub(crate) const TERMINATE_GRACE: Duration = Duration::from_secs(3);

pub(crate) const SPLASH_LOAD_WAIT: Duration = Duration::from_secs(5);
pub(crate) const MAIN_LOAD_WAIT: Duration = Duration::from_secs(10);
pub(crate) const MAIN_LOAD_SETTLE: Duration = Duration::from_millis(300);

pub(crate) const ROOT_ENV: &str = "FACESENTRY_ROOT";
pub(crate) const BACKEND_URL_ENV: &str = "FACESENTRY_BACKEND_URL";
pub(crate) const BACKEND_CMD_ENV: &str = "FACESENTRY_BACKEND_CMD";
pub(crate) const BACKEND_CWD_ENV: &str = "FACESENTRY_BACKEND_CWD";
pub(crate) const READINESS_BUDGET_ENV: &str = "FACESENTRY_BACKEND_TIMEOUT_MS";

pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";
pub(crate) const BACKEND_LOG_FILE: &str = "backend.log";
