use tauri::{webview::PageLoadEvent, Manager, RunEvent, WindowEvent};

use crate::{
    append_desktop_log, append_shutdown_log, append_startup_log, backend_process,
    desktop_bridge_commands, logging, page_load::PageLoadGate, supervisor, window_actions,
    window_lifecycle::{decide_close, CloseDisposition, LifecycleState, WindowState},
    BackendState, DESKTOP_LOG_FILE, MAIN_WINDOW_LABEL,
};

pub(crate) fn run() {
    append_startup_log("desktop process starting");
    append_startup_log(&format!(
        "desktop log file: {}",
        logging::resolve_log_path(logging::default_root_dir().as_deref(), DESKTOP_LOG_FILE)
            .display()
    ));

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, _argv, _cwd| {
            append_desktop_log("second launch attempt detected, focusing existing window");
            window_actions::show_main_window(app_handle);
        }))
        .manage(BackendState::default())
        .manage(LifecycleState::default())
        .manage(PageLoadGate::default())
        .invoke_handler(tauri::generate_handler![
            desktop_bridge_commands::desktop_bridge_is_desktop_runtime,
            desktop_bridge_commands::desktop_bridge_get_backend_url,
            desktop_bridge_commands::desktop_bridge_get_backend_state,
            desktop_bridge_commands::desktop_bridge_window_minimize,
            desktop_bridge_commands::desktop_bridge_window_toggle_maximize,
            desktop_bridge_commands::desktop_bridge_window_close,
            desktop_bridge_commands::desktop_bridge_window_hide_to_tray,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            if let WindowEvent::CloseRequested { api, .. } = event {
                let app_handle = window.app_handle();
                let state = app_handle.state::<BackendState>();
                let lifecycle = app_handle.state::<LifecycleState>();
                append_desktop_log(&format!(
                    "main window close requested in state {:?}",
                    lifecycle.window_state()
                ));
                match decide_close(lifecycle.tray_exists(), state.is_quitting()) {
                    CloseDisposition::HideToTray => {
                        api.prevent_close();
                        window_actions::hide_main_window(app_handle);
                    }
                    CloseDisposition::Quit => {
                        state.mark_quitting();
                        lifecycle.set_window_state(WindowState::Closed);
                    }
                }
            }
        })
        .on_page_load(|webview, payload| {
            if let PageLoadEvent::Finished = payload.event() {
                let label = webview.window().label().to_string();
                append_desktop_log(&format!("page-load finished in window '{label}'"));
                webview
                    .app_handle()
                    .state::<PageLoadGate>()
                    .mark_finished(&label);
            }
        })
        .setup(|app| {
            supervisor::spawn_startup_task(app.handle().clone());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        RunEvent::ExitRequested { .. } => {
            let state = app_handle.state::<BackendState>();
            state.mark_quitting();
            backend_process::terminate_backend(&state);
        }
        RunEvent::Exit => {
            let state = app_handle.state::<BackendState>();
            backend_process::terminate_backend(&state);
            append_shutdown_log("desktop process exiting");
        }
        _ => {}
    });
}
