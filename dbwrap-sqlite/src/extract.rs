use crate::last_error;
use dbwrap_core::{Result, Table};
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_NULL, SQLITE_ROW, sqlite3_column_bytes,
    sqlite3_column_count, sqlite3_column_name, sqlite3_column_text, sqlite3_column_type,
    sqlite3_db_handle, sqlite3_step, sqlite3_stmt,
};
use std::{
    ffi::{CStr, c_int},
    slice,
};

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> String {
    unsafe {
        let name = sqlite3_column_name(statement, index);
        if name.is_null() {
            return format!("column{}", index);
        }
        CStr::from_ptr(name).to_string_lossy().into_owned()
    }
}

/// The cell rendered as text, `None` for NULL.
pub(crate) fn extract_cell(statement: *mut sqlite3_stmt, index: c_int) -> Option<String> {
    unsafe {
        if sqlite3_column_type(statement, index) == SQLITE_NULL {
            return None;
        }
        let text = sqlite3_column_text(statement, index);
        let len = sqlite3_column_bytes(statement, index) as usize;
        if text.is_null() || len == 0 {
            return Some(String::new());
        }
        Some(String::from_utf8_lossy(slice::from_raw_parts(text, len)).into_owned())
    }
}

/// Steps `statement` to completion and collects the rows it produces.
pub(crate) fn collect_rows(statement: *mut sqlite3_stmt) -> Result<Table> {
    let count = unsafe { sqlite3_column_count(statement) };
    let labels = (0..count)
        .map(|i| extract_name(statement, i))
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    loop {
        match unsafe { sqlite3_step(statement) } {
            SQLITE_ROW => rows.push(
                (0..count)
                    .map(|i| extract_cell(statement, i))
                    .collect::<Vec<_>>(),
            ),
            SQLITE_DONE => break,
            SQLITE_BUSY => {
                return Err(unsafe { last_error(sqlite3_db_handle(statement)) }
                    .context("The database stayed locked past the busy timeout"));
            }
            _ => return Err(unsafe { last_error(sqlite3_db_handle(statement)) }),
        }
    }
    Table::new(labels, rows)
}
