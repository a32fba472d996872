use std::{sync::mpsc, time::Duration};

use tauri::AppHandle;

const MAIN_THREAD_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Schedules `task` on the main thread without waiting for it.
pub(crate) fn run_on_main_thread_dispatch<F>(
    app_handle: &AppHandle,
    description: &str,
    task: F,
) -> Result<(), String>
where
    F: FnOnce(&AppHandle) + Send + 'static,
{
    let task_app_handle = app_handle.clone();
    app_handle
        .run_on_main_thread(move || task(&task_app_handle))
        .map_err(|error| format!("failed to dispatch {description} to main thread: {error}"))
}

/// Runs `task` on the main thread and blocks for its result. Window creation
/// must happen there on some platforms, while the startup sequence runs on a
/// worker.
pub(crate) fn run_on_main_thread_blocking<T, F>(
    app_handle: &AppHandle,
    description: &str,
    task: F,
) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&AppHandle) -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let task_app_handle = app_handle.clone();
    app_handle
        .run_on_main_thread(move || {
            let _ = sender.send(task(&task_app_handle));
        })
        .map_err(|error| format!("failed to dispatch {description} to main thread: {error}"))?;

    receiver
        .recv_timeout(MAIN_THREAD_DISPATCH_TIMEOUT)
        .map_err(|_| format!("timed out waiting for {description} on main thread"))
}
