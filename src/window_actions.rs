use tauri::{AppHandle, Manager};

use crate::{
    append_desktop_log,
    window_lifecycle::{LifecycleState, WindowState},
    MAIN_WINDOW_LABEL,
};

/// Restores, shows and focuses the main window. Used by the tray, the
/// second-instance signal and the end of the startup sequence.
pub(crate) fn show_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        append_desktop_log("show_main_window skipped: main window not found");
        return;
    };

    if window.is_minimized().unwrap_or(false) {
        let _ = window.unminimize();
    }
    let _ = window.show();
    let _ = window.set_focus();

    if let Some(lifecycle) = app_handle.try_state::<LifecycleState>() {
        lifecycle.set_window_state(WindowState::Main);
    }
}

pub(crate) fn hide_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        append_desktop_log("hide_main_window skipped: main window not found");
        return;
    };

    let _ = window.hide();
    if let Some(lifecycle) = app_handle.try_state::<LifecycleState>() {
        lifecycle.set_window_state(WindowState::MainHiddenToTray);
    }
}
