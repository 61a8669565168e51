//! Subscriber construction for hosts and tests.
//!
//! [`setup_logging`] installs the global subscriber for a host process.
//! [`capture_dispatch`] builds the same subscriber around an arbitrary writer
//! without installing it, for scoped use with
//! [`tracing::dispatcher::with_default`] or `set_default`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{Dispatch, Subscriber};
use tracing_appender::rolling::{Builder as RollingBuilder, RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Environment variable consulted by [`LogConfig::from_env`] before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "TESSERA_LOG";

/// Crates whose events [`LogConfig::with_orchestrator_level`] adjusts.
const ORCHESTRATOR_TARGETS: [&str; 2] = ["tessera_orchestrator", "tessera_config"];

fn init_err<E: std::fmt::Display>(e: E) -> TelemetryError {
    TelemetryError::InitError(e.to_string())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// File rotation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    /// Rotate daily.
    #[default]
    Daily,
    /// Rotate hourly.
    Hourly,
    /// Never rotate.
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Rotation::DAILY,
            FileRotation::Hourly => Rotation::HOURLY,
            FileRotation::Never => Rotation::NEVER,
        }
    }
}

/// Line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
    /// One line per event with every field and span.
    Full,
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Rolling files in the given directory.
    File(PathBuf),
    /// The libtest capture writer, so output only shows for failing tests.
    Test,
}

/// Rolling file settings, used when the target is [`LogTarget::File`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// File name prefix, e.g. `tessera` gives `tessera.2026-10-19`.
    #[serde(default = "default_file_prefix")]
    pub prefix: String,
    /// Rotation strategy.
    #[serde(default)]
    pub rotation: FileRotation,
    /// Rotated files to keep. `0` keeps all of them.
    #[serde(default)]
    pub max_files: usize,
}

fn default_file_prefix() -> String {
    "tessera".to_string()
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            prefix: default_file_prefix(),
            rotation: FileRotation::default(),
            max_files: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base filter, e.g. `info` or `warn,tessera_orchestrator=debug`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
    /// Output target.
    #[serde(default)]
    pub target: LogTarget,
    /// Rolling file settings.
    #[serde(default)]
    pub file: FileLogConfig,
    /// Prefix lines with a timestamp.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Color output.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Extra filter directives applied on top of `level`.
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            file: FileLogConfig::default(),
            timestamps: true,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// A config filtering at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Take the level from `TESSERA_LOG`, then `RUST_LOG`, then `fallback`.
    ///
    /// Empty values are skipped.
    #[must_use]
    pub fn from_env(fallback: &str) -> Self {
        let level = [LOG_ENV_VAR, "RUST_LOG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| fallback.to_owned());
        Self::new(level)
    }

    /// Set the line format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Log to rolling files. Turns ANSI colors off.
    #[must_use]
    pub fn with_file_logging(
        mut self,
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        rotation: FileRotation,
    ) -> Self {
        self.target = LogTarget::File(directory.into());
        self.file.prefix = prefix.into();
        self.file.rotation = rotation;
        self.ansi = false;
        self
    }

    /// Keep at most `max_files` rotated files.
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.file.max_files = max_files;
        self
    }

    /// Add a filter directive such as `tessera_config=trace`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Filter the orchestrator and config crates at `level`, independent of
    /// the base level.
    #[must_use]
    pub fn with_orchestrator_level(mut self, level: &str) -> Self {
        self.directives.extend(
            ORCHESTRATOR_TARGETS
                .iter()
                .map(|target| format!("{target}={level}")),
        );
        self
    }

    /// Drop timestamps.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Drop colors.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(format!("directive {directive:?}: {e}"))
                },
            )?);
        }

        Ok(filter)
    }

    fn fmt_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = fmt::layer().with_writer(writer).with_ansi(self.ansi);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
            (LogFormat::Pretty, true) => layer.pretty().boxed(),
            (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
        }
    }
}

fn subscriber<W>(
    config: &LogConfig,
    writer: W,
) -> TelemetryResult<impl Subscriber + Send + Sync + 'static>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = config.build_filter()?;
    Ok(tracing_subscriber::registry()
        .with(config.fmt_layer(writer))
        .with(filter))
}

fn rolling_appender(dir: &Path, file: &FileLogConfig) -> TelemetryResult<RollingFileAppender> {
    std::fs::create_dir_all(dir).map_err(|e| {
        TelemetryError::ConfigError(format!(
            "failed to create log directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut builder = RollingBuilder::new()
        .rotation(file.rotation.into())
        .filename_prefix(&file.prefix);
    if file.max_files > 0 {
        builder = builder.max_log_files(file.max_files);
    }
    builder.build(dir).map_err(init_err)
}

fn install<W>(config: &LogConfig, writer: W) -> TelemetryResult<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    subscriber(config, writer)?.try_init().map_err(init_err)
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    match &config.target {
        LogTarget::Stdout => install(config, std::io::stdout),
        LogTarget::Stderr => install(config, std::io::stderr),
        LogTarget::Test => install(config, fmt::TestWriter::new),
        LogTarget::File(dir) => install(config, rolling_appender(dir, &config.file)?),
    }
}

/// Install the default subscriber: `info` and above, pretty, to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

/// Build the subscriber for `config` around `writer` without installing it.
///
/// `config.target` is ignored.
///
/// # Errors
///
/// Returns an error if the filter is invalid.
pub fn capture_dispatch<W>(config: &LogConfig, writer: W) -> TelemetryResult<Dispatch>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Ok(Dispatch::new(subscriber(config, writer)?))
}
