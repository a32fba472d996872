use std::{
    collections::BTreeSet,
    io::Read,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::{append_startup_log, PORT_SETTLE_DELAY, RECLAIM_KILL_TIMEOUT};

/// Best-effort: frees `port` by terminating whatever currently listens on it,
/// then waits for the OS to release the socket. A stale backend from a
/// crashed session would otherwise keep the fresh spawn from binding.
/// Never fails; every problem is logged and skipped.
pub(crate) fn reclaim_port(port: u16) {
    reclaim_port_inner(port);
    thread::sleep(PORT_SETTLE_DELAY);
}

#[cfg(target_os = "windows")]
fn reclaim_port_inner(port: u16) {
    use crate::RECLAIM_DISCOVERY_TIMEOUT;

    let listing = match run_with_timeout(
        Command::new("netstat").arg("-ano"),
        RECLAIM_DISCOVERY_TIMEOUT,
    ) {
        Some(output) => String::from_utf8_lossy(&output).to_string(),
        None => {
            append_startup_log(&format!("port {port} discovery failed or timed out"));
            return;
        }
    };

    let pids = parse_listening_pids(&listing, port);
    if pids.is_empty() {
        append_startup_log(&format!("port {port} already free"));
        return;
    }

    for pid in &pids {
        match run_with_timeout(
            Command::new("taskkill").args(["/F", "/PID", &pid.to_string()]),
            RECLAIM_KILL_TIMEOUT,
        ) {
            Some(_) => append_startup_log(&format!("killed pid {pid} on port {port}")),
            // The process may have exited between discovery and kill.
            None => append_startup_log(&format!("could not kill pid {pid} on port {port}")),
        }
    }
    append_startup_log(&format!("port {port} reclaimed ({} processes)", pids.len()));
}

#[cfg(not(target_os = "windows"))]
fn reclaim_port_inner(port: u16) {
    // fuser exits nonzero when nothing holds the port; either way it is free.
    match run_with_timeout(
        Command::new("fuser").args(["-k", &format!("{port}/tcp")]),
        RECLAIM_KILL_TIMEOUT,
    ) {
        Some(_) => append_startup_log(&format!("port {port} reclaimed")),
        None => append_startup_log(&format!("fuser unavailable or timed out for port {port}")),
    }
}

/// Extracts the PIDs of LISTENING sockets bound to `port` from `netstat -ano`
/// output. Deduplicates and drops the idle-process pid 0.
pub(crate) fn parse_listening_pids(listing: &str, port: u16) -> Vec<u32> {
    let suffix = format!(":{port}");
    let mut pids = BTreeSet::new();

    for line in listing.lines() {
        if !line.contains("LISTENING") {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        let Some(local_address) = columns.get(1) else {
            continue;
        };
        if !local_address.ends_with(&suffix) {
            continue;
        }
        let Some(pid_column) = columns.last() else {
            continue;
        };
        if let Ok(pid) = pid_column.parse::<u32>() {
            if pid != 0 {
                pids.insert(pid);
            }
        }
    }

    pids.into_iter().collect()
}

/// Runs an external tool with a hard deadline so a wedged command cannot
/// stall startup. Returns captured stdout on completion, `None` on spawn
/// failure or timeout (the child is killed in that case).
pub(crate) fn run_with_timeout(command: &mut Command, timeout: Duration) -> Option<Vec<u8>> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    let mut child = command.spawn().ok()?;

    // Drain stdout off-thread; a full pipe would otherwise block the child
    // before it can exit.
    let stdout_pipe = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = stdout_pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    });

    if !wait_with_deadline(&mut child, timeout) {
        let _ = child.kill();
        let _ = child.wait();
        return None;
    }

    reader.join().ok()
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => {
                if Instant::now() >= deadline {
                    return false;
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(_) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_listening_pids, run_with_timeout};

    const NETSTAT_SAMPLE: &str = "\
  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:5000           0.0.0.0:0              LISTENING       4312
  TCP    0.0.0.0:5000           0.0.0.0:0              LISTENING       4312
  TCP    127.0.0.1:5000         127.0.0.1:52113        ESTABLISHED     4312
  TCP    0.0.0.0:50001          0.0.0.0:0              LISTENING       991
  TCP    [::]:5000              [::]:0                 LISTENING       7788
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       0
";

    #[test]
    fn parse_listening_pids_dedups_and_filters() {
        assert_eq!(parse_listening_pids(NETSTAT_SAMPLE, 5000), vec![4312, 7788]);
    }

    #[test]
    fn parse_listening_pids_matches_exact_port_suffix() {
        // 50001 must not match a :5000 search.
        assert_eq!(parse_listening_pids(NETSTAT_SAMPLE, 50001), vec![991]);
    }

    #[test]
    fn parse_listening_pids_ignores_non_listening_lines() {
        let established_only =
            "  TCP    127.0.0.1:5000   127.0.0.1:52113   ESTABLISHED   4312\n";
        assert!(parse_listening_pids(established_only, 5000).is_empty());
    }

    #[test]
    fn parse_listening_pids_skips_pid_zero() {
        assert_eq!(parse_listening_pids(NETSTAT_SAMPLE, 135), Vec::<u32>::new());
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_captures_stdout() {
        let output = run_with_timeout(
            std::process::Command::new("echo").arg("hello"),
            Duration::from_secs(5),
        )
        .expect("echo should complete");
        assert_eq!(String::from_utf8_lossy(&output).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_kills_overrunning_command() {
        let started = std::time::Instant::now();
        let output = run_with_timeout(
            std::process::Command::new("sleep").arg("10"),
            Duration::from_millis(200),
        );
        assert!(output.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_handles_missing_binary() {
        assert!(run_with_timeout(
            &mut std::process::Command::new("/nonexistent/tool"),
            Duration::from_secs(1),
        )
        .is_none());
    }
}
