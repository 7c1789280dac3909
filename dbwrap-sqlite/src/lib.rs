mod bind;
mod cbox;
mod connection;
mod driver;
mod extract;

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;

use dbwrap_core::{DatabaseError, Error};
use libsqlite3_sys::{sqlite3, sqlite3_errmsg};
use std::ffi::CStr;

pub(crate) fn error_message(connection: *mut sqlite3) -> String {
    unsafe {
        let message = sqlite3_errmsg(connection);
        if message.is_null() {
            "Unknown error (could not extract the error message)".to_string()
        } else {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    }
}

/// The last error reported by `connection` as an execution error.
pub(crate) fn last_error(connection: *mut sqlite3) -> Error {
    DatabaseError::Execution(error_message(connection)).into()
}
