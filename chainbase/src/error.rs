use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{type_name} {id}: unique key `{key_name}` {key} is already taken")]
    ConstraintViolation {
        type_name: &'static str,
        key_name: &'static str,
        key: String,
        id: u64,
    },
    #[error("{type_name} {id} does not exist")]
    ObjectNotFound { type_name: &'static str, id: u64 },
    #[error("{type_name} {id}: record identity cannot change")]
    IdentityChanged { type_name: &'static str, id: u64 },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot section holds `{found}` records, `{expected}` expected")]
    SectionMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("cannot encode or decode snapshot records")]
    Codec(#[from] bincode::Error),
    #[error("cannot apply snapshot record")]
    Store(#[from] Error),
}
