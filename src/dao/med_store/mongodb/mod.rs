mod config;
mod connection;
mod error;
mod models;
/// [`MedStore`](crate::dao::med_store::MedStore) implementation on MongoDB.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoMedStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateKey { collection, .. } => {
                StorageError::duplicate(format!("unique constraint violated in `{collection}`"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
