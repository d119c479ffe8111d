use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "medapp";

/// Parsed driver options plus the database to use.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the URI.
    pub options: ClientOptions,
    /// Database name, `medapp` unless overridden.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse the connection URI; the database defaults to `medapp`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| "medapp-back".to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }
}
