use crate::{Query, Result, Table, Value};
use std::future::Future;

/// An open connection to a database.
///
/// A connection is used by one task at a time. After [`Connection::close`] every other method
/// fails.
pub trait Connection: Send + 'static {
    /// Runs one or more statements that return no rows.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send;

    /// Runs a statement and collects its rows.
    fn query(&mut self, sql: &str) -> impl Future<Output = Result<Table>> + Send;

    /// Runs a parameterized statement and collects its rows.
    fn query_statement(&mut self, query: &Query) -> impl Future<Output = Result<Table>> + Send;

    /// Runs a parameterized statement that returns no rows.
    fn execute_statement(&mut self, query: &Query) -> impl Future<Output = Result<()>> + Send;

    /// Runs the parameterized statement `sql` once per argument row, in order.
    ///
    /// Stops at the first failure, rows already executed are not rolled back.
    fn execute_batch(
        &mut self,
        sql: &str,
        rows: Vec<Vec<Value>>,
    ) -> impl Future<Output = Result<()>> + Send {
        let query = Query::new(sql);
        async move {
            for args in rows {
                self.execute_statement(&query.with_args(args)).await?;
            }
            Ok(())
        }
    }

    /// Starts a transaction. The following statements are not visible to other connections
    /// until [`Connection::commit`], closing the connection before that rolls them back.
    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Makes the statements run since [`Connection::begin`] permanent.
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Discards the statements run since [`Connection::begin`].
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
