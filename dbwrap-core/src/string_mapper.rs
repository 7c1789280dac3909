use crate::{DatabaseError, Result};
use std::{
    any,
    fmt::{self, Display},
    str::FromStr,
};

/// Conversion of a single non-null cell into a Rust value.
///
/// Implementations exist for the scalar types a driver commonly hands back as text. A type
/// can opt in without providing a conversion, in which case [`FromCell::from_cell`] fails with
/// [`DatabaseError::UnsupportedConversion`] naming the type.
pub trait FromCell: Sized {
    fn from_cell(cell: &str) -> Result<Self> {
        let _ = cell;
        Err(DatabaseError::UnsupportedConversion(any::type_name::<Self>()).into())
    }
}

fn parse<T>(cell: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    cell.parse::<T>()
        .map_err(|e| DatabaseError::coercion(cell, any::type_name::<T>(), e).into())
}

macro_rules! impl_from_cell_parse {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromCell for $ty {
                fn from_cell(cell: &str) -> Result<Self> {
                    parse(cell)
                }
            }
        )+
    };
}
impl_from_cell_parse!(i16, i32, i64, f32, f64);

impl FromCell for String {
    fn from_cell(cell: &str) -> Result<Self> {
        Ok(cell.to_owned())
    }
}

/// `true`, `t` and `1` are true, drivers disagree on how booleans are rendered as text.
/// Everything else is false.
impl FromCell for bool {
    fn from_cell(cell: &str) -> Result<Self> {
        Ok(cell.eq_ignore_ascii_case("true") || cell == "t" || cell == "1")
    }
}

/// The first character of the cell.
impl FromCell for char {
    fn from_cell(cell: &str) -> Result<Self> {
        cell.chars().next().ok_or_else(|| {
            DatabaseError::coercion(cell, any::type_name::<char>(), "the string is empty").into()
        })
    }
}

/// A single nullable cell with conversions to the supported scalar types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMapper {
    string: Option<String>,
}

impl StringMapper {
    pub fn new(string: Option<impl Into<String>>) -> Self {
        Self {
            string: string.map(Into::into),
        }
    }

    /// Converts the cell, a NULL cell converts to `None`.
    pub fn to<T: FromCell>(&self) -> Result<Option<T>> {
        self.string.as_deref().map(T::from_cell).transpose()
    }

    /// Converts the cell, NULL is an error.
    pub fn to_required<T: FromCell>(&self) -> Result<T> {
        match self.string.as_deref() {
            Some(v) => T::from_cell(v),
            None => Err(
                DatabaseError::coercion("null", any::type_name::<T>(), "the value is null").into(),
            ),
        }
    }

    pub fn apply<T>(&self, f: impl FnOnce(Option<&str>) -> T) -> T {
        f(self.string.as_deref())
    }

    pub fn apply_if_not_null<T>(&self, f: impl FnOnce(&str) -> T) -> Option<T> {
        self.string.as_deref().map(f)
    }

    /// Converts the cell, or returns `fallback` when it is NULL.
    pub fn as_or_default<T: FromCell>(&self, fallback: T) -> Result<T> {
        Ok(self.to()?.unwrap_or(fallback))
    }

    pub fn to_nullable_string(&self) -> Option<&str> {
        self.string.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.string
    }

    pub fn is_null(&self) -> bool {
        self.string.is_none()
    }

    pub fn to_int(&self) -> Result<i32> {
        self.to_required()
    }
    pub fn to_bool(&self) -> Result<bool> {
        self.to_required()
    }
    pub fn to_double(&self) -> Result<f64> {
        self.to_required()
    }
    pub fn to_long(&self) -> Result<i64> {
        self.to_required()
    }
    pub fn to_float(&self) -> Result<f32> {
        self.to_required()
    }
    pub fn to_char(&self) -> Result<char> {
        self.to_required()
    }
    pub fn to_short(&self) -> Result<i16> {
        self.to_required()
    }
}

impl From<Option<&str>> for StringMapper {
    fn from(value: Option<&str>) -> Self {
        StringMapper::new(value)
    }
}

impl From<&str> for StringMapper {
    fn from(value: &str) -> Self {
        StringMapper::new(Some(value))
    }
}

impl Display for StringMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string.as_deref().unwrap_or("null"))
    }
}
