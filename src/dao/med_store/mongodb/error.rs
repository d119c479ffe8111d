use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Result alias for MongoDB data-access operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures raised by the MongoDB store, before mapping to [`StorageError`].
///
/// [`StorageError`]: crate::dao::storage::StorageError
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as supplied.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings attempted before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Creating an index failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection involved.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The id counter could not be advanced.
    #[error("failed to allocate the next id for `{collection}`")]
    NextId {
        /// Collection involved.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A unique index rejected the write.
    #[error("duplicate key in collection `{collection}`")]
    DuplicateKey {
        /// Collection involved.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An upsert failed.
    #[error("failed to save `{id}` into `{collection}`")]
    Save {
        /// Collection involved.
        collection: &'static str,
        /// Record identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A lookup by id failed.
    #[error("failed to load `{id}` from `{collection}`")]
    Load {
        /// Collection involved.
        collection: &'static str,
        /// Record identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A collection scan failed.
    #[error("failed to list `{collection}`")]
    List {
        /// Collection involved.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A delete by id failed.
    #[error("failed to delete `{id}` from `{collection}`")]
    Delete {
        /// Collection involved.
        collection: &'static str,
        /// Record identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// True when the driver reports a unique index violation.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}
