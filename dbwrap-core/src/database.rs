use crate::{
    Authenticator, Connection, Context, Credentials, DatabaseAction, DatabaseError, Driver, Error,
    Mapper, MultiDatabaseAction, Query, Result, ServiceSupplier, SingleDatabaseAction,
    SpawnExecutor, Table, TaskExecutor, default_service, identity, log_error, truncate_long,
    url_scheme,
};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};

struct Inner<D> {
    driver: D,
    credentials: Credentials,
}

/// A driver together with validated credentials.
///
/// This is the entry point to build actions. Cloning is cheap, clones share the driver.
/// ```rust,ignore
/// let database = Database::authenticate(SqliteDriver::new(), &ConfigAuthenticator::default()).await?;
/// let count = database
///     .action_mapped("SELECT COUNT(*) FROM users", to_primitive::<i64>())
///     .query()
///     .await?;
/// ```
pub struct Database<D: Driver> {
    inner: Arc<Inner<D>>,
    executor: Arc<dyn TaskExecutor>,
    service: ServiceSupplier,
}

impl<D: Driver> Clone for Database<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            executor: self.executor.clone(),
            service: self.service.clone(),
        }
    }
}

impl<D: Driver> Debug for Database<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &D::NAME)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Database<D> {
    /// Validates `credentials` for `driver`.
    ///
    /// The url is required. The driver named by the credentials (or the url scheme when none is
    /// named) must be `D`.
    pub fn new(driver: D, credentials: Credentials) -> Result<Self> {
        let Some(url) = credentials.url.as_deref() else {
            return Err(log_error!(Error::new(DatabaseError::Configuration(
                "url cannot be null".into()
            ))));
        };
        let name = credentials.driver.as_deref().or_else(|| url_scheme(url));
        if name != Some(D::NAME) {
            return Err(log_error!(Error::new(DatabaseError::Configuration(format!(
                "The driver `{}` is not loaded, this database uses `{}` (url `{}`)",
                name.unwrap_or_default(),
                D::NAME,
                truncate_long!(url)
            )))));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                driver,
                credentials,
            }),
            executor: Arc::new(SpawnExecutor::new()),
            service: default_service(),
        })
    }

    /// Loads the credentials from `authenticator`, validates them and checks that a connection
    /// can be opened.
    pub async fn authenticate<A>(driver: D, authenticator: &A) -> Result<Self>
    where
        A: Authenticator + ?Sized,
    {
        let credentials = authenticator
            .credentials()
            .map_err(|e| log_error!(e))?;
        let database = Self::new(driver, credentials)?;
        let mut connection = database
            .connect()
            .await
            .context("While checking the database credentials")?;
        connection.close().await?;
        log::debug!("Authenticated to {}", D::NAME);
        Ok(database)
    }

    pub fn driver(&self) -> &D {
        &self.inner.driver
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    pub fn url(&self) -> &str {
        self.inner.credentials.url.as_deref().unwrap_or_default()
    }

    /// Same database, actions built from it run on `executor`.
    pub fn with_executor(&self, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            executor,
            ..self.clone()
        }
    }

    /// Same database, composite actions built from it create their sub-executors with `service`.
    pub fn with_service(&self, service: ServiceSupplier) -> Self {
        Self {
            service,
            ..self.clone()
        }
    }

    pub fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.executor
    }

    /// Whether `other` was derived from the same [`Database::new`] call, and so connects with
    /// the same driver and credentials.
    pub(crate) fn same_source(&self, other: &Database<D>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Opens a new connection.
    pub async fn connect(&self) -> Result<D::Connection> {
        log::trace!("Connecting to {}", truncate_long!(self.url()));
        self.inner
            .driver
            .connect(&self.inner.credentials)
            .await
            .map_err(|e| {
                log_error!(e.context(format!(
                    "While connecting to `{}`",
                    truncate_long!(self.url())
                )))
            })
    }

    /// Opens a new connection with a transaction already started.
    ///
    /// Nothing run on it is visible to other connections until [`Connection::commit`].
    pub async fn begin(&self) -> Result<D::Connection> {
        let mut connection = self.connect().await?;
        if let Err(e) = connection.begin().await {
            if let Err(close) = connection.close().await {
                log::error!("{:#}", close);
            }
            return Err(log_error!(e.context("While starting a transaction")));
        }
        Ok(connection)
    }

    /// An action returning the raw result of `query`.
    pub fn action(&self, query: impl Into<Query>) -> SingleDatabaseAction<D, Table> {
        self.action_mapped(query, identity())
    }

    /// An action returning the result of `query` converted by `mapper`.
    pub fn action_mapped<T, M>(&self, query: impl Into<Query>, mapper: M) -> SingleDatabaseAction<D, T>
    where
        T: Send + 'static,
        M: Mapper<T> + 'static,
    {
        SingleDatabaseAction::new(
            self.clone(),
            query.into(),
            Arc::new(mapper),
            self.executor.clone(),
        )
    }

    /// A composite action returning the results of `actions`, in the same order.
    pub fn all_of<T, I>(&self, actions: I) -> MultiDatabaseAction<D, T, T>
    where
        T: Send + 'static,
        I: IntoIterator<Item = Arc<dyn DatabaseAction<D, T>>>,
    {
        self.all_of_mapped(actions, |v| v)
    }

    /// A composite action returning the results of `actions` converted by `mapper`, in the same
    /// order.
    pub fn all_of_mapped<B, T, I, F>(&self, actions: I, mapper: F) -> MultiDatabaseAction<D, B, T>
    where
        B: Send + 'static,
        T: Send + 'static,
        I: IntoIterator<Item = Arc<dyn DatabaseAction<D, B>>>,
        F: Fn(B) -> T + Send + Sync + 'static,
    {
        MultiDatabaseAction::new(
            self.clone(),
            actions.into_iter().collect(),
            Arc::new(mapper),
            self.executor.clone(),
            self.service.clone(),
        )
    }
}
