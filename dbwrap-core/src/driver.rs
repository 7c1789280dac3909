use crate::{Connection, Credentials, Result};
use std::future::Future;

/// A database backend able to open [`Connection`]s.
pub trait Driver: Send + Sync + 'static {
    type Connection: Connection;

    /// Identifier matched against [`Credentials::driver`] (or the url scheme).
    const NAME: &'static str;

    /// Opens a new connection, every call returns a distinct one.
    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Connection>> + Send;
}
