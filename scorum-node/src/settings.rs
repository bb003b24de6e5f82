use log_lib::{CliSettings, FileSettings, LogSettings};
use scorum_chain::config::{ChainConfig, ConfigError};
use serde_derive::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read the settings file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    #[error("malformed settings file")]
    Format(#[from] serde_yaml::Error),
    #[error("invalid chain configuration")]
    Chain(#[from] ConfigError),
    #[error("exactly one of --genesis and --from-snapshot is required")]
    StartingPoint,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "scorum-replay")]
pub struct CommandLine {
    /// Node settings (in YAML format): logging and chain configuration.
    #[structopt(long = "config", parse(from_os_str))]
    pub node_config: Option<PathBuf>,

    /// Genesis state (in YAML format) to start from.
    #[structopt(long = "genesis", parse(from_os_str))]
    pub genesis: Option<PathBuf>,

    /// Snapshot to start from instead of a genesis state.
    #[structopt(long = "from-snapshot", parse(from_os_str))]
    pub from_snapshot: Option<PathBuf>,

    /// Blocks to apply. A YAML list, or one JSON block per line when the
    /// file name ends with `.jsonl`.
    #[structopt(long = "blocks", parse(from_os_str))]
    pub blocks: PathBuf,

    /// Save a snapshot of the final state.
    #[structopt(long = "snapshot", parse(from_os_str))]
    pub snapshot: Option<PathBuf>,

    /// Write the virtual operations of every block, one JSON object per line.
    #[structopt(long = "virtual-ops", parse(from_os_str))]
    pub virtual_ops: Option<PathBuf>,

    /// Use the test network parameters unless the settings file sets its own.
    #[structopt(long = "testnet")]
    pub testnet: bool,

    #[structopt(flatten)]
    pub log: CliSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    log: Option<FileSettings>,
    #[serde(default)]
    chain: Option<ChainConfig>,
}

impl RawSettings {
    fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|cause| Error::Io {
            path: path.to_owned(),
            cause,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

pub enum StartingPoint {
    Genesis(PathBuf),
    Snapshot(PathBuf),
}

pub struct Settings {
    pub start: StartingPoint,
    pub blocks: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub virtual_ops: Option<PathBuf>,
    pub chain: ChainConfig,
}

impl Settings {
    /// Merge the command line with the settings file, if any. Logging
    /// settings are returned apart as they are installed first.
    pub fn load(command_line: CommandLine) -> Result<(Settings, LogSettings), Error> {
        let raw = match &command_line.node_config {
            Some(path) => RawSettings::load(path)?,
            None => RawSettings::default(),
        };
        let log = LogSettings::new(&command_line.log, raw.log);

        let chain = match raw.chain {
            Some(chain) => chain,
            None if command_line.testnet => ChainConfig::testnet(),
            None => ChainConfig::default(),
        };
        chain.validate()?;

        let start = match (command_line.genesis, command_line.from_snapshot) {
            (Some(genesis), None) => StartingPoint::Genesis(genesis),
            (None, Some(snapshot)) => StartingPoint::Snapshot(snapshot),
            _ => return Err(Error::StartingPoint),
        };

        let settings = Settings {
            start,
            blocks: command_line.blocks,
            snapshot: command_line.snapshot,
            virtual_ops: command_line.virtual_ops,
            chain,
        };
        Ok((settings, log))
    }
}
