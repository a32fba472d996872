#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod backend_process;
mod desktop_bridge_commands;
mod errors;
mod launch_plan;
mod logging;
mod page_load;
mod port_reclaim;
mod readiness;
mod supervisor;
mod tray_actions;
mod tray_setup;
mod ui_dispatch;
mod window_actions;
mod window_lifecycle;

pub(crate) use app_constants::*;
pub(crate) use app_types::{AtomicFlagGuard, BackendState, LaunchPlan};
pub(crate) use logging::{
    append_backend_log, append_desktop_log, append_shutdown_log, append_startup_log,
};

fn main() {
    app_runtime::run();
}
