use crate::{AsValue, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A SQL template together with its positional arguments.
///
/// The template is treated as opaque text: placeholders are interpreted by the driver that
/// executes it. The number of arguments is not checked here, a mismatch surfaces as an
/// execution failure.
///
/// Queries are immutable: [`Query::with_args`] returns a new query sharing the same template.
/// ```rust
/// use dbwrap_core::{Query, Value};
/// let insert = Query::new("INSERT INTO t VALUES (?, ?)");
/// let first = insert.with_args([Value::from(1), Value::from("a")]);
/// assert!(insert.args().is_empty());
/// assert_eq!(first.args().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: Arc<str>,
    args: Arc<[Value]>,
}

impl Query {
    pub fn new(sql: impl Into<Arc<str>>) -> Self {
        Self {
            sql: sql.into(),
            args: Arc::new([]),
        }
    }

    /// A new query with the same template and the given arguments.
    pub fn with_args<I>(&self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            sql: self.sql.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends one argument.
    pub fn bind(self, value: impl AsValue) -> Self {
        let args = self
            .args
            .iter()
            .cloned()
            .chain([value.as_value()])
            .collect();
        Self {
            sql: self.sql,
            args,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Template and arguments, shortened for log messages.
    pub fn printable(&self) -> String {
        let mut result = truncate_long!(self.sql).to_string();
        if self.has_args() {
            result.push_str(" [");
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    result.push_str(", ");
                }
                result.push_str(&arg.to_string());
            }
            result.push(']');
        }
        result
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::new(value)
    }
}

impl From<&Query> for Query {
    fn from(value: &Query) -> Self {
        value.clone()
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
