use std::{env, thread, time::Duration};

use tauri::{AppHandle, Manager};

use crate::{
    append_startup_log, app_types, backend_process, errors::StartupError, launch_plan,
    page_load::PageLoadGate, port_reclaim, readiness, tray_setup, ui_dispatch, window_actions,
    window_lifecycle::{self, WindowState},
    AtomicFlagGuard, BackendState, BACKEND_PORT, MAIN_LOAD_SETTLE, MAIN_LOAD_WAIT,
    MAIN_WINDOW_LABEL, PROBE_REQUEST_TIMEOUT, READINESS_BUDGET, READINESS_BUDGET_ENV,
    READINESS_POLL_INTERVAL, SPLASH_LOAD_WAIT, SPLASH_WINDOW_LABEL,
};

/// Runs the startup sequence off the event loop. At most one attempt runs at
/// a time; a duplicate request (e.g. a stray second trigger) is ignored.
pub(crate) fn spawn_startup_task(app_handle: AppHandle) {
    tauri::async_runtime::spawn_blocking(move || {
        let state = app_handle.state::<BackendState>();
        let Some(_running) = AtomicFlagGuard::try_set(&state.is_starting) else {
            append_startup_log("startup already in progress, ignoring duplicate attempt");
            return;
        };

        match run_startup_sequence(&app_handle) {
            Ok(()) => append_startup_log("startup sequence complete"),
            Err(StartupError::Aborted(reason)) => {
                append_startup_log(&format!("startup aborted: {reason}"));
            }
            Err(error) => {
                append_startup_log(&format!("startup failed: {error}"));
                recover_to_visible_window(&app_handle);
            }
        }
    });
}

fn run_startup_sequence(app_handle: &AppHandle) -> Result<(), StartupError> {
    show_splash(app_handle);

    let state = app_handle.state::<BackendState>();
    if state.is_quitting() {
        return Err(StartupError::Aborted("application is quitting".to_string()));
    }

    append_startup_log(&format!("reclaiming port {BACKEND_PORT}"));
    port_reclaim::reclaim_port(BACKEND_PORT);

    let plan = launch_plan::resolve_launch_plan(app_handle)?;
    append_startup_log(&format!(
        "launch plan ({}): {:?}",
        if plan.packaged_mode { "packaged" } else { "dev" },
        backend_process::debug_command(&plan)
    ));
    backend_process::spawn_backend(&state, &plan)?;

    let transport = readiness::HttpProbeTransport::new().map_err(StartupError::Probe)?;
    let status_url = app_types::status_url(&state.backend_url);
    append_startup_log(&format!("waiting for backend readiness at {status_url}"));
    let config = readiness::ReadinessConfig {
        budget: readiness_budget_from_env(),
        poll_interval: READINESS_POLL_INTERVAL,
        request_timeout: PROBE_REQUEST_TIMEOUT,
    };
    match readiness::await_ready(
        &transport,
        &readiness::SystemClock,
        &status_url,
        &config,
        &state.abort_readiness,
    ) {
        Ok(elapsed) => append_startup_log(&format!("backend ready after {elapsed:?}")),
        Err(readiness::ReadinessError::Aborted) => {
            return Err(StartupError::Aborted(
                "readiness wait cancelled".to_string(),
            ));
        }
        Err(readiness::ReadinessError::TimedOut { elapsed, budget }) => {
            if let Some(status) = backend_process::poll_backend_exit(&state) {
                append_startup_log(&format!("backend exited during readiness wait: {status}"));
            }
            return Err(StartupError::ReadinessTimeout { elapsed, budget });
        }
    }

    ui_dispatch::run_on_main_thread_blocking(app_handle, "create main window", |app| {
        window_lifecycle::create_main_window(app)
    })
    .and_then(|inner| inner)
    .map_err(StartupError::Window)?;

    let gate = app_handle.state::<PageLoadGate>();
    if !gate.wait_finished(MAIN_WINDOW_LABEL, MAIN_LOAD_WAIT) {
        append_startup_log("main window load wait expired, continuing");
    }
    thread::sleep(MAIN_LOAD_SETTLE);

    let tray_result =
        ui_dispatch::run_on_main_thread_blocking(app_handle, "create tray", |app| {
            tray_setup::setup_tray(app)
        })
        .and_then(|inner| inner);
    if let Err(error) = tray_result {
        append_startup_log(&format!("failed to initialize tray: {error}"));
    }

    let _ = ui_dispatch::run_on_main_thread_dispatch(app_handle, "reveal main window", |app| {
        window_lifecycle::close_splash_window(app);
        window_actions::show_main_window(app);
    });
    Ok(())
}

/// Splash failure is not fatal; startup just proceeds headless until the
/// main window exists.
fn show_splash(app_handle: &AppHandle) {
    let created = ui_dispatch::run_on_main_thread_blocking(app_handle, "create splash window", |app| {
        window_lifecycle::create_splash_window(app)
    })
    .and_then(|inner| inner);

    match created {
        Ok(()) => {
            let gate = app_handle.state::<PageLoadGate>();
            if !gate.wait_finished(SPLASH_WINDOW_LABEL, SPLASH_LOAD_WAIT) {
                append_startup_log("splash load wait expired, showing anyway");
            }
            let _ =
                ui_dispatch::run_on_main_thread_dispatch(app_handle, "show splash window", |app| {
                    window_lifecycle::show_splash_window(app);
                });
            app_handle
                .state::<window_lifecycle::LifecycleState>()
                .set_window_state(WindowState::Splash);
        }
        Err(error) => append_startup_log(&format!("splash unavailable: {error}")),
    }
}

/// Recovery after a failed startup: the user must still end up with a
/// visible main window, not a frozen splash. Failures here are logged,
/// never re-thrown.
fn recover_to_visible_window(app_handle: &AppHandle) {
    let result = ui_dispatch::run_on_main_thread_blocking(app_handle, "startup recovery", |app| {
        window_lifecycle::close_splash_window(app);
        if app.get_webview_window(MAIN_WINDOW_LABEL).is_none() {
            if let Err(error) = window_lifecycle::create_main_window(app) {
                append_startup_log(&format!("recovery could not create main window: {error}"));
                return;
            }
        }
        window_actions::show_main_window(app);
    });

    if let Err(error) = result {
        append_startup_log(&format!("recovery dispatch failed: {error}"));
    }
}

fn readiness_budget_from_env() -> Duration {
    env::var(READINESS_BUDGET_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(READINESS_BUDGET)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::readiness_budget_from_env;
    use crate::READINESS_BUDGET;

    #[test]
    fn readiness_budget_defaults_without_env_override() {
        // The env var is never set in the test environment.
        assert_eq!(readiness_budget_from_env(), READINESS_BUDGET);
        assert_eq!(READINESS_BUDGET, Duration::from_secs(30));
    }
}
