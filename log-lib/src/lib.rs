//! Log setup shared by the scorum binaries.
//!
//! Settings come from the node settings file and from the command line,
//! the command line taking precedence:
//!
//! ```
//! use log_lib::*;
//! use structopt::StructOpt;
//!
//! let cli = CliSettings::from_iter(&["scorum-replay", "--log-level", "debug"]);
//! let file: FileSettings = serde_yaml::from_str("format: json").unwrap();
//!
//! let settings = LogSettings::new(&cli, Some(file));
//! assert_eq!(settings.config.format, LogFormat::Json);
//! assert_eq!(settings.overrides.len(), 1);
//! ```

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::util::TryInitError;

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Clone, Debug, PartialEq)]
pub struct LogSettingsEntry {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub output: LogOutput,
}

impl Default for LogSettingsEntry {
    fn default() -> Self {
        LogSettingsEntry {
            level: LevelFilter::INFO,
            format: LogFormat::Default,
            output: LogOutput::Stderr,
        }
    }
}

/// Merged settings, plus a note for every file setting the command line
/// replaced. The notes can only be logged once logging is up.
pub struct LogSettings {
    pub config: LogSettingsEntry,
    pub overrides: Vec<String>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, colored.
    Default,
    Plain,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Default => "default",
            LogFormat::Plain => "plain",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.trim().to_lowercase() {
            "default" => Ok(LogFormat::Default),
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl FromStr for LogOutput {
    type Err = String;

    /// `stdout`, `stderr` or `file:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("file:") {
            return Ok(LogOutput::File(path.into()));
        }
        match s.to_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(format!("unknown log output '{}'", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open the log file `{}`", .path.to_string_lossy())]
    File {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
    #[error("failed to set global subscriber")]
    SetGlobalSubscriber(#[source] TryInitError),
}

impl LogSettings {
    pub fn new(command_line: &CliSettings, file: Option<FileSettings>) -> LogSettings {
        let mut config = LogSettingsEntry::default();
        let mut overrides = Vec::new();

        if let Some(file) = file {
            if let Some(level) = file.level {
                config.level = level;
            }
            if let Some(format) = file.format {
                config.format = format;
            }
            if let Some(output) = file.output {
                config.output = output;
            }
        }

        if let Some(level) = command_line.log_level {
            if config.level != level {
                overrides.push(format!(
                    "log level overriden from command line: {} replaced with {}",
                    config.level, level
                ));
            }
            config.level = level;
        }
        if let Some(format) = command_line.log_format {
            if config.format != format {
                overrides.push(format!(
                    "log format overriden from command line: {} replaced with {}",
                    config.format, format
                ));
            }
            config.format = format;
        }
        if let Some(output) = &command_line.log_output {
            if &config.output != output {
                overrides.push(format!(
                    "log output overriden from command line: {:?} replaced with {:?}",
                    config.output, output
                ));
            }
            config.output = output.clone();
        }

        LogSettings { config, overrides }
    }

    /// Install the global subscriber. Events are written by a background
    /// worker which flushes when the returned guard is dropped.
    pub fn init_log(self) -> Result<WorkerGuard, Error> {
        let (writer, guard) = match &self.config.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|cause| Error::File {
                        path: path.clone(),
                        cause,
                    })?;
                tracing_appender::non_blocking(file)
            }
        };
        install(self.config.level, self.config.format, writer)?;
        for message in self.overrides.iter() {
            tracing::info!("{}", message);
        }
        Ok(guard)
    }
}

fn install(level: LevelFilter, format: LogFormat, writer: NonBlocking) -> Result<(), Error> {
    use tracing_subscriber::prelude::*;

    let layer = tracing_subscriber::fmt::Layer::new()
        .with_level(true)
        .with_writer(writer);
    let registry = tracing_subscriber::registry().with(level);
    match format {
        LogFormat::Default => registry.with(layer).try_init(),
        LogFormat::Plain => registry.with(layer.with_ansi(false)).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    }
    .map_err(Error::SetGlobalSubscriber)
}

/// Logging section of a settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default, with = "filter_level_opt_serde")]
    pub level: Option<LevelFilter>,
    #[serde(default)]
    pub format: Option<LogFormat>,
    #[serde(default)]
    pub output: Option<LogOutput>,
}

mod filter_level_opt_serde {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<LevelFilter>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|variant| {
                variant
                    .parse()
                    .map_err(|_| D::Error::unknown_variant(&variant, &LEVELS))
            })
            .transpose()
    }

    pub fn serialize<S: Serializer>(
        data: &Option<LevelFilter>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        data.map(|level| level.to_string().to_lowercase())
            .serialize(serializer)
    }
}

fn log_level_parse(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("Unknown log level value: '{}'", level))
}

#[derive(Debug, Default, StructOpt)]
pub struct CliSettings {
    /// Minimum severity of log messages. Defaults to "info".
    #[structopt(
        long = "log-level",
        parse(try_from_str = log_level_parse),
        possible_values = &LEVELS
    )]
    pub log_level: Option<LevelFilter>,

    /// Format of log messages: "default", "plain" or "json".
    #[structopt(long = "log-format", parse(try_from_str))]
    pub log_format: Option<LogFormat>,

    /// Where logs go: "stdout", "stderr" or "file:<path>". Defaults to
    /// "stderr".
    #[structopt(long = "log-output", parse(try_from_str))]
    pub log_output: Option<LogOutput>,
}
