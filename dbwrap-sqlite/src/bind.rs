use crate::last_error;
use dbwrap_core::{DatabaseError, Result, Value};
use libsqlite3_sys::{
    SQLITE_OK, SQLITE_TRANSIENT, sqlite3_bind_double, sqlite3_bind_int, sqlite3_bind_int64,
    sqlite3_bind_null, sqlite3_bind_parameter_count, sqlite3_bind_text, sqlite3_db_handle,
    sqlite3_stmt,
};
use std::ffi::{c_char, c_int};

fn bind_text(statement: *mut sqlite3_stmt, index: c_int, value: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            value.as_ptr() as *const c_char,
            value.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

/// Binds `args` to the positional parameters of `statement`, in order.
pub(crate) fn bind_args(statement: *mut sqlite3_stmt, args: &[Value]) -> Result<()> {
    let expected = unsafe { sqlite3_bind_parameter_count(statement) } as usize;
    if expected != args.len() {
        return Err(DatabaseError::Execution(format!(
            "The statement expects {} arguments but {} were provided",
            expected,
            args.len()
        ))
        .into());
    }
    for (i, value) in args.iter().enumerate() {
        let index = (i + 1) as c_int;
        let rc = unsafe {
            match value {
                Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v),
                Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
                Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, *v as f64),
                Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
                Value::Char(Some(v)) => bind_text(statement, index, v.encode_utf8(&mut [0; 4])),
                Value::Varchar(Some(v)) => bind_text(statement, index, v),
                _ => sqlite3_bind_null(statement, index),
            }
        };
        if rc != SQLITE_OK {
            return Err(unsafe { last_error(sqlite3_db_handle(statement)) }
                .context(format!("While binding the argument {} (`{}`)", index, value)));
        }
    }
    Ok(())
}
