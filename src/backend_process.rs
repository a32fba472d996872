use std::{
    io::{BufRead, BufReader},
    process::{Child, Command, Stdio},
    thread,
};

use crate::{
    append_backend_log, append_shutdown_log, append_startup_log, errors::StartupError,
    BackendState, LaunchPlan,
};

/// Spawns the backend described by `plan` and stores the handle in `state`.
/// A second call while a child is live is a no-op, so a racing startup
/// attempt cannot produce two backend processes.
pub(crate) fn spawn_backend(state: &BackendState, plan: &LaunchPlan) -> Result<(), StartupError> {
    {
        let guard = state
            .child
            .lock()
            .map_err(|_| StartupError::Spawn("backend handle lock poisoned".to_string()))?;
        if guard.is_some() {
            append_startup_log("backend already running, skipping spawn");
            return Ok(());
        }
    }

    let mut command = Command::new(&plan.cmd);
    command
        .args(&plan.args)
        .current_dir(&plan.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("PYTHONUNBUFFERED", "1");

    let mut child = command.spawn().map_err(|error| {
        StartupError::Spawn(format!(
            "{:?} in {}: {}",
            debug_command(plan),
            plan.cwd.display(),
            error
        ))
    })?;

    if let Some(stdout) = child.stdout.take() {
        spawn_stream_reader("stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_stream_reader("stderr", stderr);
    }

    append_startup_log(&format!("backend spawned: pid={}", child.id()));
    *state
        .child
        .lock()
        .map_err(|_| StartupError::Spawn("backend handle lock poisoned".to_string()))? =
        Some(child);
    Ok(())
}

fn spawn_stream_reader<R>(stream_name: &'static str, stream: R)
where
    R: std::io::Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => append_backend_log(&format!("[{stream_name}] {line}")),
                Err(_) => break,
            }
        }
        append_backend_log(&format!("[{stream_name}] stream closed"));
    });
}

pub(crate) fn debug_command(plan: &LaunchPlan) -> Vec<String> {
    let mut parts = vec![plan.cmd.clone()];
    parts.extend(plan.args.clone());
    parts
}

/// Reaps the child if it already exited, returning its status. Used for
/// diagnostics only; an unexpected exit is never auto-restarted.
pub(crate) fn poll_backend_exit(state: &BackendState) -> Option<std::process::ExitStatus> {
    let mut guard = state.child.lock().ok()?;
    let child = guard.as_mut()?;
    match child.try_wait() {
        Ok(Some(status)) => {
            *guard = None;
            Some(status)
        }
        _ => None,
    }
}

/// Terminates the backend if one is running. Idempotent: the handle is taken
/// out of the state before signalling, so duplicate calls from the several
/// exit paths are no-ops.
pub(crate) fn terminate_backend(state: &BackendState) {
    let taken = match state.child.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };
    let Some(mut child) = taken else {
        return;
    };

    append_shutdown_log(&format!("terminating backend pid={}", child.id()));
    stop_child_process(&mut child);
}

#[cfg(target_os = "windows")]
fn stop_child_process(child: &mut Child) {
    // No POSIX signals here; taskkill takes the whole process tree down.
    let _ = Command::new("taskkill")
        .args(["/pid", &child.id().to_string(), "/t", "/f"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match child.wait() {
        Ok(status) => append_shutdown_log(&format!("backend exited: {status}")),
        Err(error) => append_shutdown_log(&format!("failed to reap backend: {error}")),
    }
}

#[cfg(not(target_os = "windows"))]
fn stop_child_process(child: &mut Child) {
    use std::time::{Duration, Instant};

    use crate::TERMINATE_GRACE;

    let _ = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    let deadline = Instant::now() + TERMINATE_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                append_shutdown_log(&format!("backend exited: {status}"));
                return;
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    break;
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(error) => {
                append_shutdown_log(&format!("failed to poll backend during shutdown: {error}"));
                break;
            }
        }
    }

    let _ = child.kill();
    match child.wait() {
        Ok(status) => append_shutdown_log(&format!("backend killed: {status}")),
        Err(error) => append_shutdown_log(&format!("failed to reap backend: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{debug_command, spawn_backend, terminate_backend};
    use crate::{errors::StartupError, BackendState, LaunchPlan};

    fn state_without_env_url() -> BackendState {
        BackendState::default()
    }

    #[test]
    fn debug_command_joins_cmd_and_args() {
        let plan = LaunchPlan {
            cmd: "python3".to_string(),
            args: vec!["app.py".to_string()],
            cwd: PathBuf::from("/tmp"),
            packaged_mode: false,
        };
        assert_eq!(debug_command(&plan), vec!["python3", "app.py"]);
    }

    #[test]
    fn spawn_backend_surfaces_missing_executable() {
        let state = state_without_env_url();
        let plan = LaunchPlan {
            cmd: "/nonexistent/facesentry-backend".to_string(),
            args: Vec::new(),
            cwd: std::env::temp_dir(),
            packaged_mode: true,
        };
        assert!(matches!(
            spawn_backend(&state, &plan),
            Err(StartupError::Spawn(_))
        ));
        assert!(!state.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn terminate_backend_is_idempotent() {
        let state = state_without_env_url();
        let plan = LaunchPlan {
            cmd: "/bin/sleep".to_string(),
            args: vec!["30".to_string()],
            cwd: std::env::temp_dir(),
            packaged_mode: false,
        };

        spawn_backend(&state, &plan).expect("spawn should succeed");
        assert!(state.is_running());

        terminate_backend(&state);
        assert!(!state.is_running());

        // Second call has no handle left to signal.
        terminate_backend(&state);
        assert!(!state.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn spawn_backend_refuses_second_live_child() {
        let state = state_without_env_url();
        let plan = LaunchPlan {
            cmd: "/bin/sleep".to_string(),
            args: vec!["30".to_string()],
            cwd: std::env::temp_dir(),
            packaged_mode: false,
        };

        spawn_backend(&state, &plan).expect("first spawn should succeed");
        let first_pid = state
            .child
            .lock()
            .expect("lock")
            .as_ref()
            .map(|child| child.id());

        spawn_backend(&state, &plan).expect("second spawn is a no-op");
        let second_pid = state
            .child
            .lock()
            .expect("lock")
            .as_ref()
            .map(|child| child.id());
        assert_eq!(first_pid, second_pid);

        terminate_backend(&state);
    }
}
