use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};

use crate::{
    append_shutdown_log, backend_process, tray_actions, window_actions,
    window_lifecycle::{LifecycleState, WindowState},
    BackendState, TRAY_ID,
};

/// Builds the tray icon and menu. Once this returns Ok, closing the main
/// window hides it instead of quitting.
pub(crate) fn setup_tray(app_handle: &AppHandle) -> Result<(), String> {
    let open_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_OPEN,
        "Open FaceSentry",
        true,
        None::<&str>,
    )
    .map_err(|error| format!("failed to create tray open menu item: {error}"))?;
    let quit_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_QUIT,
        "Quit",
        true,
        None::<&str>,
    )
    .map_err(|error| format!("failed to create tray quit menu item: {error}"))?;
    let separator = PredefinedMenuItem::separator(app_handle)
        .map_err(|error| format!("failed to create tray separator menu item: {error}"))?;

    let menu = Menu::with_items(app_handle, &[&open_item, &separator, &quit_item])
        .map_err(|error| format!("failed to build tray menu: {error}"))?;

    let tray_builder = TrayIconBuilder::with_id(TRAY_ID)
        .menu(&menu)
        .tooltip("FaceSentry")
        .show_menu_on_left_click(false)
        .on_menu_event(|app_handle, event| {
            handle_tray_menu_event(app_handle, event.id().as_ref())
        })
        .on_tray_icon_event(|tray, event| match event {
            TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } => window_actions::show_main_window(tray.app_handle()),
            TrayIconEvent::DoubleClick {
                button: MouseButton::Left,
                ..
            } => window_actions::show_main_window(tray.app_handle()),
            _ => {}
        });

    let tray_builder = match app_handle.default_window_icon() {
        Some(icon) => tray_builder.icon(icon.clone()),
        None => tray_builder,
    };

    #[cfg(target_os = "macos")]
    let tray_builder = tray_builder.icon_as_template(true);

    tray_builder
        .build(app_handle)
        .map_err(|error| format!("failed to create tray icon: {error}"))?;

    app_handle.state::<LifecycleState>().set_tray_exists(true);
    Ok(())
}

pub(crate) fn handle_tray_menu_event(app_handle: &AppHandle, menu_id: &str) {
    match tray_actions::action_from_menu_id(menu_id) {
        Some(tray_actions::TrayMenuAction::Open) => {
            window_actions::show_main_window(app_handle);
        }
        Some(tray_actions::TrayMenuAction::Quit) => {
            let state = app_handle.state::<BackendState>();
            state.mark_quitting();

            let lifecycle = app_handle.state::<LifecycleState>();
            lifecycle.set_tray_exists(false);
            lifecycle.set_window_state(WindowState::Closed);

            backend_process::terminate_backend(&state);
            append_shutdown_log("tray quit requested, exiting desktop process");
            app_handle.exit(0);
        }
        None => {}
    }
}
