use crate::SqliteConnection;
use dbwrap_core::{Credentials, DatabaseError, Driver, Result};
use std::{future::Future, time::Duration};

/// Opens connections to SQLite databases.
///
/// Urls have the form `sqlite://<path>[?<parameters>]`, the part after the scheme is handed to
/// SQLite as a `file:` URI, so parameters such as `mode=ro` or `cache=shared` apply.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout: Duration,
}

impl SqliteDriver {
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    pub const fn new() -> Self {
        Self {
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long a statement waits on a locked database before failing.
    pub const fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    const NAME: &'static str = "sqlite";

    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Connection>> + Send {
        let url = credentials.url.clone();
        let busy_timeout = self.busy_timeout;
        async move {
            let Some(url) = url else {
                return Err(DatabaseError::Connection("The sqlite url is missing".into()).into());
            };
            SqliteConnection::open(&url, busy_timeout).await
        }
    }
}
