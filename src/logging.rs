use std::{
    env,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{BACKEND_LOG_FILE, DESKTOP_LOG_FILE, ROOT_ENV};

/// Root directory for logs and desktop state; `FACESENTRY_ROOT` overrides the
/// per-user default.
pub(crate) fn default_root_dir() -> Option<PathBuf> {
    if let Ok(root) = env::var(ROOT_ENV) {
        let trimmed = root.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    home::home_dir().map(|home| home.join(".facesentry"))
}

pub(crate) fn resolve_log_path(root_dir: Option<&Path>, file_name: &str) -> PathBuf {
    match root_dir {
        Some(root) => root.join("logs").join(file_name),
        None => env::temp_dir().join("facesentry").join(file_name),
    }
}

fn append_line(file_name: &str, message: &str) {
    let path = resolve_log_path(default_root_dir().as_deref(), file_name);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let stamped = format!(
        "[{}] {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        message
    );
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = file.write_all(stamped.as_bytes());
    }

    #[cfg(debug_assertions)]
    eprintln!("[facesentry] {message}");
}

pub(crate) fn append_desktop_log(message: &str) {
    append_line(DESKTOP_LOG_FILE, message);
}

pub(crate) fn append_startup_log(message: &str) {
    append_desktop_log(&format!("[startup] {message}"));
}

pub(crate) fn append_shutdown_log(message: &str) {
    append_desktop_log(&format!("[shutdown] {message}"));
}

pub(crate) fn append_backend_log(message: &str) {
    append_line(BACKEND_LOG_FILE, message);
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::resolve_log_path;

    #[test]
    fn resolve_log_path_places_logs_under_root() {
        let path = resolve_log_path(Some(Path::new("/srv/facesentry")), "desktop.log");
        assert_eq!(path, Path::new("/srv/facesentry/logs/desktop.log"));
    }

    #[test]
    fn resolve_log_path_falls_back_to_temp_dir() {
        let path = resolve_log_path(None, "desktop.log");
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(Path::new("facesentry/desktop.log")));
    }
}
