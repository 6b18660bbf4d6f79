use mongodb::options::ClientOptions;
use mongodb::Client;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::credentials::Credentials;
use crate::config::ConfigError;
use crate::services::mongo::MongoStore;
use crate::services::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<mongodb::error::Error> for ConnectError {
    fn from(e: mongodb::error::Error) -> Self {
        ConnectError::Store(StoreError::Database(e))
    }
}

/// Session object owning the authenticated store handle.
///
/// The first successful `connect` builds the client; later calls hand back
/// the same handle without re-reading credentials.
#[derive(Debug)]
pub struct Connector {
    credentials_path: PathBuf,
    store: OnceCell<MongoStore>,
}

impl Connector {
    pub fn new(credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            store: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.initialized()
    }

    pub async fn connect(&self) -> Result<&MongoStore, ConnectError> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }

        // Checked before any network work so a missing file never reaches the store.
        let creds = Credentials::load(&self.credentials_path)?;

        self.store
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(&creds.connection_uri).await?;
                if let Some(name) = &creds.app_name {
                    options.app_name = Some(name.clone());
                }

                let client = Client::with_options(options)?;
                info!(database = %creds.database, "connected to document store");
                Ok::<_, ConnectError>(MongoStore::new(client.database(&creds.database)))
            })
            .await
    }
}
