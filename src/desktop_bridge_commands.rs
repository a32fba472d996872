use serde::Serialize;
use tauri::{AppHandle, Manager, WebviewWindow};

use crate::{window_actions, BackendState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackendBridgeState {
    pub(crate) running: bool,
    pub(crate) starting: bool,
}

/// Lets the page distinguish the desktop shell from a plain browser tab.
#[tauri::command]
pub(crate) fn desktop_bridge_is_desktop_runtime() -> bool {
    true
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_backend_url(app_handle: AppHandle) -> String {
    app_handle.state::<BackendState>().backend_url.clone()
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_backend_state(app_handle: AppHandle) -> BackendBridgeState {
    let state = app_handle.state::<BackendState>();
    BackendBridgeState {
        running: state.is_running(),
        starting: state.is_starting.load(std::sync::atomic::Ordering::Acquire),
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_window_minimize(window: WebviewWindow) -> Result<(), String> {
    window
        .minimize()
        .map_err(|error| format!("failed to minimize window: {error}"))
}

#[tauri::command]
pub(crate) fn desktop_bridge_window_toggle_maximize(window: WebviewWindow) -> Result<(), String> {
    let maximized = window
        .is_maximized()
        .map_err(|error| format!("failed to query window maximize state: {error}"))?;
    if maximized {
        window
            .unmaximize()
            .map_err(|error| format!("failed to unmaximize window: {error}"))
    } else {
        window
            .maximize()
            .map_err(|error| format!("failed to maximize window: {error}"))
    }
}

/// Requests a close. The close-request hook decides whether this hides to
/// tray or quits.
#[tauri::command]
pub(crate) fn desktop_bridge_window_close(window: WebviewWindow) -> Result<(), String> {
    window
        .close()
        .map_err(|error| format!("failed to close window: {error}"))
}

#[tauri::command]
pub(crate) fn desktop_bridge_window_hide_to_tray(app_handle: AppHandle) {
    window_actions::hide_main_window(&app_handle);
}
