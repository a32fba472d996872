use std::{
    env,
    path::{Path, PathBuf},
};

use tauri::{AppHandle, Manager};

use crate::{
    append_startup_log, errors::StartupError, LaunchPlan, BACKEND_CMD_ENV, BACKEND_CWD_ENV,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartupMode {
    Development,
    Packaged,
}

pub(crate) fn current_startup_mode() -> StartupMode {
    if cfg!(debug_assertions) {
        StartupMode::Development
    } else {
        StartupMode::Packaged
    }
}

/// Resolves how the backend is launched, in priority order: the
/// `FACESENTRY_BACKEND_CMD` override, then the mode-specific plan.
/// Development mode never probes the filesystem; packaged mode fails loudly
/// with every probed path when no candidate executable exists.
pub(crate) fn resolve_launch_plan(app_handle: &AppHandle) -> Result<LaunchPlan, StartupError> {
    if let Some(custom_cmd) = env::var(BACKEND_CMD_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        let cwd_override = env::var(BACKEND_CWD_ENV).ok().map(PathBuf::from);
        return resolve_custom_plan(&custom_cmd, cwd_override);
    }

    match current_startup_mode() {
        StartupMode::Development => Ok(development_plan(&project_root_dir())),
        StartupMode::Packaged => resolve_packaged_plan(&packaged_candidate_paths(app_handle)),
    }
}

pub(crate) fn resolve_custom_plan(
    custom_cmd: &str,
    cwd_override: Option<PathBuf>,
) -> Result<LaunchPlan, StartupError> {
    let mut pieces = shlex::split(custom_cmd)
        .ok_or_else(|| StartupError::Spawn(format!("invalid {BACKEND_CMD_ENV}: {custom_cmd}")))?;
    if pieces.is_empty() {
        return Err(StartupError::Spawn(format!("{BACKEND_CMD_ENV} is empty")));
    }

    let cmd = pieces.remove(0);
    Ok(LaunchPlan {
        cmd,
        args: pieces,
        cwd: cwd_override.unwrap_or_else(project_root_dir),
        packaged_mode: false,
    })
}

pub(crate) fn development_plan(root: &Path) -> LaunchPlan {
    let interpreter = if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    };

    LaunchPlan {
        cmd: interpreter.to_string(),
        args: vec![root
            .join("backend")
            .join("app.py")
            .to_string_lossy()
            .to_string()],
        cwd: root.to_path_buf(),
        packaged_mode: false,
    }
}

pub(crate) fn packaged_backend_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "facesentry-backend.exe"
    } else {
        "facesentry-backend"
    }
}

/// Candidate install locations, highest priority first: the bundled resource
/// directory, the directory next to the host executable, then the project
/// root as a last resort.
pub(crate) fn packaged_candidate_paths(app_handle: &AppHandle) -> Vec<PathBuf> {
    let file_name = packaged_backend_file_name();
    let mut candidates = Vec::new();

    if let Ok(resource_dir) = app_handle.path().resource_dir() {
        candidates.push(resource_dir.join("backend").join(file_name));
    }
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("backend").join(file_name));
        }
    }
    candidates.push(project_root_dir().join("backend").join(file_name));

    candidates
}

pub(crate) fn resolve_packaged_plan(candidates: &[PathBuf]) -> Result<LaunchPlan, StartupError> {
    for candidate in candidates {
        if candidate.is_file() {
            append_startup_log(&format!("backend executable found: {}", candidate.display()));
            let cwd = candidate
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(LaunchPlan {
                cmd: candidate.to_string_lossy().to_string(),
                args: Vec::new(),
                cwd,
                packaged_mode: true,
            });
        }
    }

    Err(StartupError::ExecutableNotFound {
        probed: candidates.to_vec(),
    })
}

pub(crate) fn project_root_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    candidate.canonicalize().unwrap_or(candidate)
}
