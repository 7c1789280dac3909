use std::fmt::{self, Display};

/// A typed scalar bound to a positional query parameter.
///
/// Every variant carries an `Option` so that a typed NULL (for example an absent `i32`)
/// can be told apart from an untyped [`Value::Null`].
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Char(Option<char>),
    Varchar(Option<String>),
}

impl Value {
    /// True for [`Value::Null`] and every typed variant holding `None`.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Char(None)
            | Value::Varchar(None) => true,
            _ => false,
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(Some(v)) => v.fmt(f),
            Value::Int8(Some(v)) => v.fmt(f),
            Value::Int16(Some(v)) => v.fmt(f),
            Value::Int32(Some(v)) => v.fmt(f),
            Value::Int64(Some(v)) => v.fmt(f),
            Value::Float32(Some(v)) => v.fmt(f),
            Value::Float64(Some(v)) => v.fmt(f),
            Value::Char(Some(v)) => v.fmt(f),
            Value::Varchar(Some(v)) => v.fmt(f),
            _ => f.write_str("NULL"),
        }
    }
}

/// Conversion of native Rust types into a query argument.
pub trait AsValue {
    /// The NULL of this type, used for `Option::None`.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
        }
    };
}
impl_as_value!(bool, Value::Boolean);
impl_as_value!(i8, Value::Int8);
impl_as_value!(i16, Value::Int16);
impl_as_value!(i32, Value::Int32);
impl_as_value!(i64, Value::Int64);
impl_as_value!(f32, Value::Float32);
impl_as_value!(f64, Value::Float64);
impl_as_value!(char, Value::Char);
impl_as_value!(String, Value::Varchar);

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}
