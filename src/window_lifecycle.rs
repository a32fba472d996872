use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};

use crate::{MAIN_WINDOW_LABEL, SPLASH_WINDOW_LABEL};

/// Application-level window state. Exactly one of the post-launch variants
/// holds at any time; splash and main coexist only during the startup
/// handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum WindowState {
    #[default]
    NoWindow,
    Splash,
    Main,
    MainHiddenToTray,
    Closed,
}

/// What the main window's close action should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseDisposition {
    HideToTray,
    Quit,
}

/// Closing the main window only hides it while a tray icon exists to bring
/// it back; once the app is quitting the close must go through.
pub(crate) fn decide_close(tray_exists: bool, quitting: bool) -> CloseDisposition {
    if quitting || !tray_exists {
        CloseDisposition::Quit
    } else {
        CloseDisposition::HideToTray
    }
}

/// Window and tray bookkeeping owned by the lifecycle controller; no other
/// component mutates these directly.
#[derive(Debug, Default)]
pub(crate) struct LifecycleState {
    window_state: Mutex<WindowState>,
    tray_exists: AtomicBool,
}

impl LifecycleState {
    pub(crate) fn window_state(&self) -> WindowState {
        self.window_state
            .lock()
            .map(|state| *state)
            .unwrap_or(WindowState::NoWindow)
    }

    pub(crate) fn set_window_state(&self, next: WindowState) {
        if let Ok(mut state) = self.window_state.lock() {
            *state = next;
        }
    }

    pub(crate) fn tray_exists(&self) -> bool {
        self.tray_exists.load(Ordering::Relaxed)
    }

    pub(crate) fn set_tray_exists(&self, exists: bool) {
        self.tray_exists.store(exists, Ordering::Relaxed);
    }
}

/// Creates the splash window hidden; it is shown only after its content
/// finishes loading so the user never sees a blank flash.
pub(crate) fn create_splash_window(app_handle: &AppHandle) -> Result<(), String> {
    if app_handle.get_webview_window(SPLASH_WINDOW_LABEL).is_some() {
        return Ok(());
    }

    WebviewWindowBuilder::new(
        app_handle,
        SPLASH_WINDOW_LABEL,
        WebviewUrl::App("splash.html".into()),
    )
    .title("FaceSentry")
    .inner_size(400.0, 300.0)
    .decorations(false)
    .resizable(false)
    .always_on_top(true)
    .skip_taskbar(true)
    .visible(false)
    .build()
    .map(|_| ())
    .map_err(|error| format!("failed to create splash window: {error}"))
}

pub(crate) fn show_splash_window(app_handle: &AppHandle) {
    if let Some(window) = app_handle.get_webview_window(SPLASH_WINDOW_LABEL) {
        let _ = window.show();
        let _ = window.center();
    }
}

pub(crate) fn close_splash_window(app_handle: &AppHandle) {
    if let Some(window) = app_handle.get_webview_window(SPLASH_WINDOW_LABEL) {
        let _ = window.close();
    }
}

/// Creates the main window hidden; the supervisor reveals it after content
/// load or from the recovery path.
pub(crate) fn create_main_window(app_handle: &AppHandle) -> Result<(), String> {
    if app_handle.get_webview_window(MAIN_WINDOW_LABEL).is_some() {
        return Ok(());
    }

    WebviewWindowBuilder::new(
        app_handle,
        MAIN_WINDOW_LABEL,
        WebviewUrl::App("index.html".into()),
    )
    .title("FaceSentry")
    .inner_size(1400.0, 900.0)
    .min_inner_size(1000.0, 700.0)
    .visible(false)
    .build()
    .map(|_| ())
    .map_err(|error| format!("failed to create main window: {error}"))
}

#[cfg(test)]
mod tests {
    use super::{decide_close, CloseDisposition, LifecycleState, WindowState};

    #[test]
    fn close_hides_to_tray_only_while_tray_exists() {
        assert_eq!(decide_close(true, false), CloseDisposition::HideToTray);
        assert_eq!(decide_close(false, false), CloseDisposition::Quit);
    }

    #[test]
    fn close_goes_through_once_quitting() {
        assert_eq!(decide_close(true, true), CloseDisposition::Quit);
        assert_eq!(decide_close(false, true), CloseDisposition::Quit);
    }

    #[test]
    fn lifecycle_state_starts_with_no_window_and_no_tray() {
        let lifecycle = LifecycleState::default();
        assert_eq!(lifecycle.window_state(), WindowState::NoWindow);
        assert!(!lifecycle.tray_exists());
    }

    #[test]
    fn lifecycle_state_tracks_startup_transitions() {
        let lifecycle = LifecycleState::default();

        lifecycle.set_window_state(WindowState::Splash);
        assert_eq!(lifecycle.window_state(), WindowState::Splash);

        lifecycle.set_window_state(WindowState::Main);
        lifecycle.set_tray_exists(true);
        assert_eq!(lifecycle.window_state(), WindowState::Main);
        assert!(lifecycle.tray_exists());

        lifecycle.set_window_state(WindowState::MainHiddenToTray);
        assert_eq!(lifecycle.window_state(), WindowState::MainHiddenToTray);
    }
}
