use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use crate::append_startup_log;

/// Per-startup-attempt probe state. Monotonic: once `Ready` or `TimedOut` is
/// reached, no further transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadinessState {
    Polling,
    Ready,
    TimedOut,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadinessError {
    TimedOut { elapsed: Duration, budget: Duration },
    Aborted,
}

pub(crate) trait ProbeClock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub(crate) struct SystemClock;

impl ProbeClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

pub(crate) trait ProbeTransport {
    fn probe_status(&self, url: &str, request_timeout: Duration) -> Result<u16, String>;
}

pub(crate) struct HttpProbeTransport {
    client: reqwest::blocking::Client,
}

impl HttpProbeTransport {
    pub(crate) fn new() -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|error| format!("failed to build probe client: {error}"))?;
        Ok(Self { client })
    }
}

impl ProbeTransport for HttpProbeTransport {
    fn probe_status(&self, url: &str, request_timeout: Duration) -> Result<u16, String> {
        let response = self
            .client
            .get(url)
            .timeout(request_timeout)
            .send()
            .map_err(|error| error.to_string())?;
        Ok(response.status().as_u16())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadinessConfig {
    pub(crate) budget: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) request_timeout: Duration,
}

/// Polls `status_url` at a fixed interval until one 2xx response arrives,
/// the budget runs out, or `abort` is raised.
pub(crate) fn await_ready(
    transport: &dyn ProbeTransport,
    clock: &dyn ProbeClock,
    status_url: &str,
    config: &ReadinessConfig,
    abort: &AtomicBool,
) -> Result<Duration, ReadinessError> {
    let start = clock.now();
    let mut state = ReadinessState::Polling;
    let mut logged_failure = false;

    while state == ReadinessState::Polling {
        if abort.load(Ordering::Relaxed) {
            return Err(ReadinessError::Aborted);
        }

        match transport.probe_status(status_url, config.request_timeout) {
            Ok(code) if (200..300).contains(&code) => {
                state = ReadinessState::Ready;
                continue;
            }
            Ok(code) => append_startup_log(&format!("status probe returned {code}")),
            Err(error) => {
                // Connection refused repeats on every poll until the backend
                // binds; one line is enough.
                if !logged_failure {
                    append_startup_log(&format!("status probe failed: {error}"));
                    logged_failure = true;
                }
            }
        }

        if clock.now().duration_since(start) >= config.budget {
            state = ReadinessState::TimedOut;
            continue;
        }
        clock.sleep(config.poll_interval);
    }

    let elapsed = clock.now().duration_since(start);
    match state {
        ReadinessState::Ready => Ok(elapsed),
        _ => Err(ReadinessError::TimedOut {
            elapsed,
            budget: config.budget,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        collections::VecDeque,
        sync::atomic::{AtomicBool, Ordering},
        sync::Mutex,
        time::{Duration, Instant},
    };

    use super::{await_ready, ProbeClock, ProbeTransport, ReadinessConfig, ReadinessError};

    struct FakeClock {
        now: Cell<Instant>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Cell::new(Instant::now()),
            }
        }
    }

    impl ProbeClock for FakeClock {
        fn now(&self) -> Instant {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.now.set(self.now.get() + duration);
        }
    }

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<u16, String>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<u16, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }
    }

    impl ProbeTransport for ScriptedTransport {
        fn probe_status(&self, _url: &str, _timeout: Duration) -> Result<u16, String> {
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err("connection refused".to_string()))
        }
    }

    fn config() -> ReadinessConfig {
        ReadinessConfig {
            budget: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn await_ready_succeeds_once_backend_answers() {
        let transport = ScriptedTransport::new(vec![
            Err("connection refused".to_string()),
            Err("connection refused".to_string()),
            Ok(200),
        ]);
        let clock = FakeClock::new();
        let abort = AtomicBool::new(false);

        let elapsed = await_ready(&transport, &clock, "http://x/api/status", &config(), &abort)
            .expect("should become ready");
        assert_eq!(elapsed, Duration::from_millis(1000));
    }

    #[test]
    fn await_ready_treats_server_errors_as_not_ready() {
        let transport = ScriptedTransport::new(vec![Ok(503), Ok(404), Ok(204)]);
        let clock = FakeClock::new();
        let abort = AtomicBool::new(false);

        let elapsed = await_ready(&transport, &clock, "http://x/api/status", &config(), &abort)
            .expect("2xx should count as ready");
        assert_eq!(elapsed, Duration::from_millis(1000));
    }

    #[test]
    fn await_ready_times_out_within_one_interval_of_budget() {
        let transport = ScriptedTransport::new(Vec::new());
        let clock = FakeClock::new();
        let abort = AtomicBool::new(false);
        let config = config();

        match await_ready(&transport, &clock, "http://x/api/status", &config, &abort) {
            Err(ReadinessError::TimedOut { elapsed, budget }) => {
                assert_eq!(budget, config.budget);
                assert!(elapsed >= config.budget);
                assert!(elapsed < config.budget + config.poll_interval);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn await_ready_aborts_without_consuming_budget() {
        let transport = ScriptedTransport::new(vec![Ok(200)]);
        let clock = FakeClock::new();
        let abort = AtomicBool::new(true);

        assert_eq!(
            await_ready(&transport, &clock, "http://x/api/status", &config(), &abort),
            Err(ReadinessError::Aborted)
        );
        // The scripted success was never consumed.
        assert_eq!(
            transport
                .responses
                .lock()
                .expect("responses lock")
                .len(),
            1
        );
        abort.store(false, Ordering::Relaxed);
        assert!(
            await_ready(&transport, &clock, "http://x/api/status", &config(), &abort).is_ok()
        );
    }
}
