//! Typed convenience layer over relational database drivers.
//!
//! Queries run through a [`Driver`] and come back as a [`Table`] of nullable text cells, which a
//! [`Mapper`] turns into application values. Actions wrap a query (or a list of actions) into a
//! deferred unit of work resolving to an [`ActionFuture`].
pub use dbwrap_core::*;
