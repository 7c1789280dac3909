//! Deferred units of database work.
//!
//! An action binds a query (or a list of child actions) to a mapper and to the executor its
//! body runs on. Nothing happens until [`DatabaseAction::query`] or
//! [`DatabaseAction::execute`] is called, each call runs the whole unit of work again on a
//! fresh connection.
mod executor;
mod future;
mod multi;
mod single;

pub use executor::*;
pub use future::*;
pub use multi::*;
pub use single::*;

use crate::Driver;
use std::sync::Arc;

pub trait DatabaseAction<D: Driver, T>: Send + Sync {
    /// Runs the action and resolves with its mapped result.
    fn query(&self) -> ActionFuture<T>;

    /// Runs the action as a statement returning no rows.
    fn execute(&self) -> ActionFuture<()>;

    /// Executor running the body of this action.
    fn executor(&self) -> &Arc<dyn TaskExecutor>;

    /// The same action bound to another executor, `self` is left unchanged.
    fn with_executor(&self, executor: Arc<dyn TaskExecutor>) -> Arc<dyn DatabaseAction<D, T>>;

    /// The leaf action behind this one, if it is a single query.
    fn as_single(&self) -> Option<&SingleDatabaseAction<D, T>> {
        None
    }
}
