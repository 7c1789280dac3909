use crate::{
    CBox, SqliteDriver, bind::bind_args, error_message, extract::collect_rows, last_error,
};
use dbwrap_core::{
    Connection, DatabaseError, Driver, Error, Query, Result, Table, log_error,
    truncate_long,
};
use libsqlite3_sys::{
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, sqlite3,
    sqlite3_busy_timeout, sqlite3_close, sqlite3_finalize, sqlite3_open_v2, sqlite3_prepare_v2,
    sqlite3_stmt,
};
use std::{
    ffi::{CStr, CString, c_char, c_int},
    future::Future,
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
    time::Duration,
};
use tokio::task::spawn_blocking;

fn close_connection(connection: *mut sqlite3) {
    unsafe {
        sqlite3_close(connection);
    }
}

fn finalize_statement(statement: *mut sqlite3_stmt) {
    unsafe {
        sqlite3_finalize(statement);
    }
}

pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
    url: String,
}

impl SqliteConnection {
    pub(crate) async fn open(url: &str, busy_timeout: Duration) -> Result<Self> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(path) = url.strip_prefix(&prefix) else {
            return Err(log_error!(Error::new(DatabaseError::Connection(format!(
                "Expected the sqlite url to start with `{}`, found `{}`",
                prefix,
                truncate_long!(url)
            )))));
        };
        let uri = CString::new(format!("file:{}", path))
            .map_err(|e| DatabaseError::Connection(format!("Invalid sqlite url: {}", e)))?;
        let timeout = busy_timeout.as_millis().min(c_int::MAX as u128) as c_int;
        let connection = spawn_blocking(move || unsafe {
            let mut connection = CBox::null(close_connection);
            let rc = sqlite3_open_v2(
                uri.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    format!("sqlite3_open_v2 returned {}", rc)
                } else {
                    error_message(*connection)
                };
                return Err(Error::new(DatabaseError::Connection(message)));
            }
            sqlite3_busy_timeout(*connection, timeout);
            Ok(connection)
        })
        .await
        .map_err(Error::new)
        .and_then(|v| v)
        .map_err(|e| log_error!(e.context(format!("While opening `{}`", truncate_long!(url)))))?;
        log::debug!("Opened the sqlite database `{}`", truncate_long!(url));
        Ok(Self {
            connection,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_null()
    }

    fn handle(&self) -> Result<AtomicPtr<sqlite3>> {
        if self.connection.is_null() {
            return Err(DatabaseError::Execution(format!(
                "The connection to `{}` is closed",
                truncate_long!(self.url)
            ))
            .into());
        }
        Ok(AtomicPtr::new(*self.connection))
    }

    /// Runs every statement of `query.sql()`, the arguments bind to the first one.
    ///
    /// Returns the rows of the last statement.
    async fn run(&mut self, query: Query) -> Result<Table> {
        let context = format!("While running the query:\n{}", query.printable());
        let connection = match self.handle() {
            Ok(v) => v,
            Err(e) => return Err(log_error!(e.context(context))),
        };
        spawn_blocking(move || run_statements(connection.load(Ordering::Relaxed), &query))
            .await
            .map_err(Error::new)
            .and_then(|v| v)
            .map_err(|e| log_error!(e.context(context)))
    }

    async fn transaction(&mut self, sql: &'static str) -> Result<()> {
        self.run(Query::new(sql)).await.map(|_| ())
    }
}

fn run_statements(connection: *mut sqlite3, query: &Query) -> Result<Table> {
    let sql = CString::new(query.sql()).map_err(|e| {
        DatabaseError::Execution(format!("The query contains a nul character: {}", e))
    })?;
    let mut tail: *const c_char = sql.as_ptr();
    let mut args = query.args();
    let mut table = Table::default();
    loop {
        if unsafe { CStr::from_ptr(tail) }.to_bytes().is_empty() {
            break;
        }
        let mut statement = CBox::null(finalize_statement);
        let mut next = ptr::null();
        let rc = unsafe { sqlite3_prepare_v2(connection, tail, -1, &mut *statement, &mut next) };
        if rc != SQLITE_OK {
            return Err(last_error(connection));
        }
        tail = next;
        if statement.is_null() {
            // Whitespace or comment
            continue;
        }
        bind_args(*statement, args)?;
        args = &[];
        table = collect_rows(*statement)?;
    }
    Ok(table)
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send {
        let query = Query::new(sql);
        async move { self.run(query).await.map(|_| ()) }
    }

    fn query(&mut self, sql: &str) -> impl Future<Output = Result<Table>> + Send {
        self.run(Query::new(sql))
    }

    fn query_statement(&mut self, query: &Query) -> impl Future<Output = Result<Table>> + Send {
        self.run(query.clone())
    }

    fn execute_statement(&mut self, query: &Query) -> impl Future<Output = Result<()>> + Send {
        let query = query.clone();
        async move { self.run(query).await.map(|_| ()) }
    }

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.transaction("BEGIN")
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.transaction("COMMIT")
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.transaction("ROLLBACK")
    }

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            let connection = self.handle().map_err(|e| log_error!(e))?;
            self.connection.take();
            let result = spawn_blocking(move || {
                let connection = connection.into_inner();
                let rc = unsafe { sqlite3_close(connection) };
                if rc != SQLITE_OK {
                    return Err((last_error(connection), AtomicPtr::new(connection)));
                }
                Ok(())
            })
            .await
            .map_err(|e| log_error!(Error::new(e).context("While closing the connection")))?;
            if let Err((error, connection)) = result {
                // Still open, it stays owned by this connection
                self.connection = CBox::new(connection.into_inner(), close_connection);
                return Err(log_error!(error.context("While closing the connection")));
            }
            log::debug!("Closed the sqlite database `{}`", truncate_long!(self.url));
            Ok(())
        }
    }
}
