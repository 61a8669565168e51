//! Test fixtures for common types.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::dispatcher::DefaultGuard;

use tessera_orchestrator::{AppName, LoadableApp, LoadingIndicator, RegistrableApp};
use tessera_telemetry::{
    LogConfig, LogFormat, LogTarget, TelemetryResult, capture_dispatch, setup_logging,
};

use crate::mocks::EventLog;

/// A registrable app named `name`, active under `/name`.
#[must_use]
pub fn test_app(name: &str) -> RegistrableApp {
    RegistrableApp::new(
        AppName::from_static(name),
        format!("//localhost/{name}"),
        format!("/{name}"),
    )
}

/// A manually loadable app named `name`.
#[must_use]
pub fn test_loadable(name: &str) -> LoadableApp {
    LoadableApp::new(AppName::from_static(name), format!("//localhost/{name}"))
}

/// A loading indicator that records `loading:<name>:<bool>` into `events`.
#[must_use]
pub fn recording_indicator(events: &EventLog, name: &str) -> LoadingIndicator {
    let events = events.clone();
    let name = name.to_owned();
    LoadingIndicator::new(move |loading| events.push(format!("loading:{name}:{loading}")))
}

/// Install a global subscriber writing to the test harness.
///
/// The level comes from `TESSERA_LOG` or `RUST_LOG` and defaults to `warn`.
/// Safe to call more than once.
pub fn init_test_tracing() {
    let config = LogConfig::from_env("warn")
        .with_format(LogFormat::Compact)
        .with_target(LogTarget::Test)
        .without_ansi();
    let _ = setup_logging(&config);
}

#[derive(Clone)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures log output on the current thread while alive.
///
/// Works with the default single-threaded `#[tokio::test]` runtime, where
/// spawned tasks run on the test thread.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    /// Start capturing every event at `TRACE` and above.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture subscriber cannot be built.
    pub fn install() -> TelemetryResult<Self> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(Arc::clone(&buffer));
        let config = LogConfig::new("trace")
            .with_format(LogFormat::Full)
            .without_timestamps()
            .without_ansi();
        let dispatch = capture_dispatch(&config, move || writer.clone())?;

        Ok(Self {
            buffer,
            _guard: tracing::dispatcher::set_default(&dispatch),
        })
    }

    /// Everything captured so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Whether any captured line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    /// Whether a captured line at `level` (e.g. `"WARN"`) contains `needle`.
    #[must_use]
    pub fn contains_at(&self, level: &str, needle: &str) -> bool {
        self.contents()
            .lines()
            .any(|line| line.contains(level) && line.contains(needle))
    }
}

impl std::fmt::Debug for LogCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCapture").finish_non_exhaustive()
    }
}
