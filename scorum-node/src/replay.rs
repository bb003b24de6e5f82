//! Feeding blocks from a file to the chain state.

use scorum_chain::block::Block;
use scorum_chain::services::DynamicGlobalPropertyService;
use scorum_chain::ChainState;
use serde_derive::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read blocks from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    #[error("malformed block list")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed block on line {line}")]
    Json {
        line: usize,
        #[source]
        cause: serde_json::Error,
    },
    #[error("block {block_num} cannot be applied")]
    Chain {
        block_num: u32,
        #[source]
        cause: scorum_chain::Error,
    },
    #[error("cannot read the head state")]
    State(#[source] scorum_chain::Error),
}

/// Read every block of `path`: a YAML sequence, or JSON lines for
/// `.jsonl` files. Blank lines are skipped.
pub fn read_blocks(path: &Path) -> Result<Vec<Block>, Error> {
    let io_error = |cause: std::io::Error| Error::Io {
        path: path.to_owned(),
        cause,
    };
    let file = File::open(path).map_err(io_error)?;
    if path.extension().map_or(false, |ext| ext == "jsonl") {
        let mut blocks = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let block = serde_json::from_str(&line).map_err(|cause| Error::Json {
                line: index + 1,
                cause,
            })?;
            blocks.push(block);
        }
        Ok(blocks)
    } else {
        Ok(serde_yaml::from_reader(file)?)
    }
}

/// What the replay did, printed once done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub blocks_applied: usize,
    pub virtual_operations: usize,
    pub head_block_num: u32,
    pub last_irreversible_block_num: u32,
    pub hardfork: String,
    pub circulating_capital: String,
    pub total_scorumpower: String,
}

pub fn replay(state: &mut ChainState, blocks: &[Block]) -> Result<Summary, Error> {
    let mut virtual_operations = 0;
    for block in blocks {
        let operations = state.apply_block(block).map_err(|cause| Error::Chain {
            block_num: block.block_num,
            cause,
        })?;
        virtual_operations += operations.len();
    }
    let props = state
        .database()
        .dynamic_global_properties()
        .map_err(Error::State)?;
    Ok(Summary {
        blocks_applied: blocks.len(),
        virtual_operations,
        head_block_num: props.head_block_number,
        last_irreversible_block_num: props.last_irreversible_block_num,
        hardfork: props.hardfork.to_string(),
        circulating_capital: props.circulating_capital.to_string(),
        total_scorumpower: props.total_scorumpower.to_string(),
    })
}
