mod action;
mod connection;
mod credentials;
mod database;
mod driver;
mod error;
mod mapper;
mod object_mapper;
mod query;
mod string_mapper;
mod table;
mod util;
mod value;

pub use ::anyhow::Context;
pub use action::*;
pub use connection::*;
pub use credentials::*;
pub use database::*;
pub use driver::*;
pub use error::*;
pub use mapper::*;
pub use object_mapper::*;
pub use query::*;
pub use string_mapper::*;
pub use table::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
