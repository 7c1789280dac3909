use dbwrap::{
    Connection, Credentials, Database, DatabaseError, Driver, Query, Result, Table, truncate_long,
};
use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Table),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Script {
    outcome: Outcome,
    delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            outcome: Outcome::Rows(Table::default()),
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    scripts: Mutex<HashMap<String, Script>>,
    statements: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    fail_connect: AtomicBool,
}

/// In-memory driver answering statements from a script and recording what happens.
///
/// Statements are matched by their exact SQL text. A statement without a script succeeds and
/// returns a table without columns. Clones share the script and the counters.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<State>,
}

impl MockDriver {
    pub const URL: &'static str = "mock://memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// A database using this driver.
    pub fn database(&self) -> Result<Database<MockDriver>> {
        Database::new(self.clone(), Credentials::from_url(Self::URL))
    }

    fn script(&self, sql: impl Into<String>, update: impl FnOnce(&mut Script)) -> &Self {
        let mut scripts = self
            .state
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        update(scripts.entry(sql.into()).or_default());
        self
    }

    /// `sql` returns `table`.
    pub fn returns(&self, sql: impl Into<String>, table: Table) -> &Self {
        self.script(sql, |script| script.outcome = Outcome::Rows(table))
    }

    /// `sql` fails with an execution error.
    pub fn fails(&self, sql: impl Into<String>, message: impl Into<String>) -> &Self {
        let message = message.into();
        self.script(sql, |script| script.outcome = Outcome::Fail(message))
    }

    /// `sql` takes at least `delay` to complete.
    pub fn delays(&self, sql: impl Into<String>, delay: Duration) -> &Self {
        self.script(sql, |script| script.delay = delay)
    }

    /// Makes every following connection attempt fail.
    pub fn fail_connect(&self, fail: bool) -> &Self {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
        self
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of close calls so far.
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Every statement received by any connection, in arrival order.
    pub fn statements(&self) -> Vec<String> {
        self.state
            .statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    const NAME: &'static str = "mock";

    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Connection>> + Send {
        let state = self.state.clone();
        let url = credentials.url.clone().unwrap_or_default();
        async move {
            if state.fail_connect.load(Ordering::SeqCst) {
                return Err(DatabaseError::Connection(format!(
                    "Connection refused by `{}`",
                    truncate_long!(url)
                ))
                .into());
            }
            let id = state.opened.fetch_add(1, Ordering::SeqCst);
            log::trace!("Opened the mock connection {}", id);
            Ok(MockConnection {
                state,
                id,
                closed: false,
                transaction: false,
            })
        }
    }
}

#[derive(Debug)]
pub struct MockConnection {
    state: Arc<State>,
    id: usize,
    closed: bool,
    transaction: bool,
}

impl MockConnection {
    /// Fails when closed, otherwise records `statement`.
    fn record(&self, statement: String) -> Result<()> {
        if self.closed {
            return Err(DatabaseError::Execution(format!(
                "The mock connection {} is closed",
                self.id
            ))
            .into());
        }
        self.state
            .statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement);
        Ok(())
    }

    /// Records `statement` and moves the transaction state from `active` to `!active`.
    fn transaction(&mut self, statement: &str, active: bool) -> Result<()> {
        self.record(statement.to_string())?;
        if self.transaction != active {
            return Err(DatabaseError::Execution(if active {
                format!("`{}` without an active transaction", statement)
            } else {
                "A transaction is already active".to_string()
            })
            .into());
        }
        self.transaction = !active;
        Ok(())
    }

    /// Whether a transaction was started and not yet committed or rolled back.
    pub fn in_transaction(&self) -> bool {
        self.transaction
    }

    async fn run(&mut self, query: &Query) -> Result<Table> {
        self.record(query.printable())?;
        let script = self
            .state
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query.sql())
            .cloned()
            .unwrap_or_default();
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        match script.outcome {
            Outcome::Rows(table) => Ok(table),
            Outcome::Fail(message) => Err(DatabaseError::Execution(message).into()),
        }
    }
}

impl Connection for MockConnection {
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send {
        let query = Query::new(sql);
        async move { self.run(&query).await.map(|_| ()) }
    }

    fn query(&mut self, sql: &str) -> impl Future<Output = Result<Table>> + Send {
        let query = Query::new(sql);
        async move { self.run(&query).await }
    }

    fn query_statement(&mut self, query: &Query) -> impl Future<Output = Result<Table>> + Send {
        self.run(query)
    }

    fn execute_statement(&mut self, query: &Query) -> impl Future<Output = Result<()>> + Send {
        async move { self.run(query).await.map(|_| ()) }
    }

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send {
        let result = self.transaction("BEGIN", false);
        async move { result }
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        let result = self.transaction("COMMIT", true);
        async move { result }
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        let result = self.transaction("ROLLBACK", true);
        async move { result }
    }

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.transaction = false;
        if !self.closed {
            log::trace!("Closed the mock connection {}", self.id);
        }
        self.closed = true;
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    }
}
