use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file appender in {dir}: {message}")]
    Appender { dir: PathBuf, message: String },

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for log files. If None, no file logging.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(default = "default_prefix")]
    pub file_prefix: String,

    /// Log rotation: "hourly", "daily", "never".
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Whether to output JSON format.
    #[serde(default)]
    pub json_format: bool,

    /// Whether to also output to console (stdout).
    #[serde(default = "default_true")]
    pub console_output: bool,
}

fn default_level() -> String {
    "info".into()
}

fn default_prefix() -> String {
    "namenode-exporter".into()
}

fn default_rotation() -> String {
    "daily".into()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            log_dir: None,
            file_prefix: default_prefix(),
            rotation: default_rotation(),
            json_format: false,
            console_output: true,
        }
    }
}

/// Map a rotation name onto the appender's rotation policy.
///
/// Unknown names fall back to daily rotation.
pub fn parse_rotation(rotation: &str) -> rolling::Rotation {
    match rotation.to_ascii_lowercase().as_str() {
        "hourly" => rolling::Rotation::HOURLY,
        "never" => rolling::Rotation::NEVER,
        "minutely" => rolling::Rotation::MINUTELY,
        _ => rolling::Rotation::DAILY,
    }
}

fn file_appender(config: &LogConfig, log_dir: &Path) -> Result<RollingFileAppender, LoggingError> {
    RollingFileAppender::builder()
        .rotation(parse_rotation(&config.rotation))
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| LoggingError::Appender {
            dir: log_dir.to_path_buf(),
            message: e.to_string(),
        })
}

/// Initialize the logging system. Should be called once at program startup.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns a guard that must
/// be held alive for the duration of the program when file logging is on.
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let console_layer: Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> =
        if config.console_output {
            if config.json_format {
                Some(Box::new(fmt::layer().json()))
            } else {
                Some(Box::new(fmt::layer()))
            }
        } else {
            None
        };

    let (file_layer, guard): (
        Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>>,
        Option<tracing_appender::non_blocking::WorkerGuard>,
    ) = match config.log_dir {
        Some(ref log_dir) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config, log_dir)?);

            let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json_format {
                Box::new(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            } else {
                Box::new(fmt::layer().with_ansi(false).with_writer(non_blocking))
            };

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    registry
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        log_dir = ?config.log_dir,
        json = config.json_format,
        "logging initialized"
    );
    Ok(guard)
}
