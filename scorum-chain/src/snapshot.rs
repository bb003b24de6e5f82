//! Binary dump of the whole database.
//!
//! A snapshot is a header followed by one section per index, in the order
//! of [`IndexSet::indices`]. Sections are written and read by the indices
//! themselves, loading reconciles the records in place.

use crate::database::Database;
use crate::error::Result;
use crate::services::DynamicGlobalPropertyService;
use chainbase::IndexSet;
use serde_derive::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAGIC: [u8; 8] = *b"SCRSNAP\0";
pub const VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotFileError {
    #[error("cannot access snapshot")]
    Io(#[from] io::Error),
    #[error("malformed snapshot header")]
    Codec(#[from] bincode::Error),
    #[error("malformed snapshot section")]
    Section(#[from] chainbase::SnapshotError),
    #[error("not a snapshot file")]
    BadMagic,
    #[error("snapshot version {0} is not supported")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub head_block_number: u32,
}

fn write_header(writer: &mut dyn Write, header: &SnapshotHeader) -> Result<()> {
    bincode::serialize_into(writer, header).map_err(SnapshotFileError::from)?;
    Ok(())
}

fn read_header(reader: &mut dyn Read) -> Result<SnapshotHeader> {
    let header: SnapshotHeader =
        bincode::deserialize_from(reader).map_err(SnapshotFileError::from)?;
    if header.magic != MAGIC {
        return Err(SnapshotFileError::BadMagic.into());
    }
    if header.version != VERSION {
        return Err(SnapshotFileError::UnsupportedVersion(header.version).into());
    }
    Ok(header)
}

pub fn save<W: Write>(db: &Database, writer: &mut W) -> Result<()> {
    let header = SnapshotHeader {
        magic: MAGIC,
        version: VERSION,
        head_block_number: db.head_block_num()?,
    };
    write_header(writer, &header)?;
    for index in db.indices() {
        index
            .save_section(writer)
            .map_err(SnapshotFileError::from)?;
    }
    writer.flush().map_err(SnapshotFileError::from)?;
    tracing::info!(
        head_block_num = header.head_block_number,
        "snapshot saved"
    );
    Ok(())
}

/// Bring `db` to the saved state. Changes are recorded in the current undo
/// session if one is open. Returns the head block number of the snapshot.
pub fn load<R: Read>(db: &mut Database, reader: &mut R) -> Result<u32> {
    let header = read_header(reader)?;
    for index in db.indices_mut() {
        let name = index.type_name();
        index.load_section(reader).map_err(|error| {
            tracing::warn!(section = name, %error, "snapshot section rejected");
            SnapshotFileError::from(error)
        })?;
    }
    tracing::info!(
        head_block_num = header.head_block_number,
        "snapshot loaded"
    );
    Ok(header.head_block_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::error::Error;
    use crate::operations::{Operation, Transfer};
    use crate::services::AccountService;
    use crate::testing::{apply_operation, ChainStateBuilder};
    use crate::ChainState;
    use chainbase::Undoable;
    use std::sync::Arc;

    fn state() -> ChainState {
        ChainStateBuilder::new()
            .with_account("alice", Asset::scr(1_000), Asset::sp(500))
            .with_account("bob", Asset::scr(0), Asset::sp(0))
            .with_witness("alice")
            .build()
            .unwrap()
    }

    fn dump(db: &Database) -> Vec<u8> {
        let mut bytes = Vec::new();
        save(db, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn every_record_survives_a_round_trip() {
        let state = state();
        let bytes = dump(state.database());

        let config = Arc::new(state.config().clone());
        let restored = ChainState::from_snapshot(config, &mut bytes.as_slice()).unwrap();
        assert_eq!(dump(restored.database()), bytes);
        assert_eq!(restored.database().revision(), 0);
        assert_eq!(
            restored
                .database()
                .get_account(&"alice".parse().unwrap())
                .unwrap(),
            state
                .database()
                .get_account(&"alice".parse().unwrap())
                .unwrap()
        );
    }

    #[test]
    fn loading_inside_a_session_can_be_undone() {
        let mut state = state();
        let saved = dump(state.database());
        apply_operation(
            &mut state,
            Operation::Transfer(Transfer {
                from: "alice".parse().unwrap(),
                to: "bob".parse().unwrap(),
                amount: Asset::scr(400),
                memo: String::new(),
            }),
        )
        .unwrap();
        let changed = dump(state.database());

        let db = state.database_mut();
        {
            let mut session = db.start_undo_session(true);
            load(&mut *session, &mut saved.as_slice()).unwrap();
            assert_eq!(dump(&session), saved);
        }
        assert_eq!(dump(db), changed);
    }

    #[test]
    fn foreign_files_are_rejected() {
        let mut state = state();
        let mut bytes = dump(state.database());
        bytes[0] = b'X';
        assert_err_match!(
            Error::Snapshot(SnapshotFileError::BadMagic),
            load(state.database_mut(), &mut bytes.as_slice())
        );

        let mut bytes = dump(state.database());
        bytes[8] = 2;
        assert_err_match!(
            Error::Snapshot(SnapshotFileError::UnsupportedVersion(2)),
            load(state.database_mut(), &mut bytes.as_slice())
        );
    }
}
