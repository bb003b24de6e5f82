//! Offline replay of scorum blocks.
//!
//! Starts from a genesis state or a snapshot, applies a file of blocks and
//! reports the resulting head. The final state can be saved as a snapshot.

pub mod replay;
pub mod settings;

use crate::replay::Summary;
use crate::settings::{CommandLine, Settings, StartingPoint};
use scorum_chain::genesis::Genesis;
use scorum_chain::virtual_ops::JsonLinesSink;
use scorum_chain::ChainState;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid settings")]
    Settings(#[from] settings::Error),
    #[error("cannot set up logging")]
    Log(#[from] log_lib::Error),
    #[error("cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    #[error("cannot build the initial state")]
    Start(#[source] scorum_chain::Error),
    #[error("replay failed")]
    Replay(#[from] replay::Error),
    #[error("cannot save the snapshot")]
    Snapshot(#[source] scorum_chain::Error),
    #[error("cannot print the summary")]
    Report(#[from] serde_yaml::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |cause| Error::Io {
        path: path.to_owned(),
        cause,
    }
}

fn initial_state(settings: &Settings) -> Result<ChainState, Error> {
    let config = Arc::new(settings.chain.clone());
    match &settings.start {
        StartingPoint::Genesis(path) => {
            let genesis = Genesis::from_yaml_file(path)
                .map_err(|error| Error::Start(error.into()))?;
            ChainState::from_genesis(config, &genesis).map_err(Error::Start)
        }
        StartingPoint::Snapshot(path) => {
            let file = File::open(path).map_err(io_error(path))?;
            ChainState::from_snapshot(config, &mut BufReader::new(file)).map_err(Error::Start)
        }
    }
}

/// Run a replay without touching the global logger.
pub fn run(settings: &Settings) -> Result<Summary, Error> {
    let mut state = initial_state(settings)?;
    if let Some(path) = &settings.virtual_ops {
        let file = File::create(path).map_err(io_error(path))?;
        state.add_sink(JsonLinesSink::new(BufWriter::new(file)));
    }

    let blocks = replay::read_blocks(&settings.blocks)?;
    tracing::info!(blocks = blocks.len(), "replaying");
    let summary = replay::replay(&mut state, &blocks)?;

    if let Some(path) = &settings.snapshot {
        let file = File::create(path).map_err(io_error(path))?;
        state
            .save_snapshot(&mut BufWriter::new(file))
            .map_err(Error::Snapshot)?;
    }
    Ok(summary)
}

/// Entry point of the binary: settings, logging, replay, then the summary
/// on stdout as YAML.
pub fn start(command_line: CommandLine) -> Result<(), Error> {
    let (settings, log) = Settings::load(command_line)?;
    let _guard = log.init_log()?;
    let summary = run(&settings)?;
    print!("{}", serde_yaml::to_string(&summary)?);
    Ok(())
}
