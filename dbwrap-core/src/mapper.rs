//! Transformations from a query result [`Table`] to an application value.
//!
//! A mapper never keeps state between calls, the same instance is shared by every action
//! (and every thread) it is bound to.
use crate::{FromCell, ObjectMapper, Result, StringMapper, Table, Tuple, stream};
use std::vec;

pub trait Mapper<T>: Send + Sync {
    fn map(&self, table: Table) -> Result<T>;
}

impl<T, F> Mapper<T> for F
where
    F: Fn(Table) -> Result<T> + Send + Sync,
{
    fn map(&self, table: Table) -> Result<T> {
        self(table)
    }
}

pub trait MapperExt<T>: Mapper<Option<T>> + Sized {
    /// Substitutes `default` whenever this mapper yields `None`.
    fn or_default(self, default: T) -> OrDefault<Self, T>
    where
        T: Clone + Send + Sync,
    {
        OrDefault {
            mapper: self,
            default,
        }
    }
}

impl<T, M: Mapper<Option<T>>> MapperExt<T> for M {}

pub struct OrDefault<M, T> {
    mapper: M,
    default: T,
}

impl<M, T> Mapper<T> for OrDefault<M, T>
where
    M: Mapper<Option<T>>,
    T: Clone + Send + Sync,
{
    fn map(&self, table: Table) -> Result<T> {
        Ok(self
            .mapper
            .map(table)?
            .unwrap_or_else(|| self.default.clone()))
    }
}

fn first_cell(table: &Table) -> Option<&str> {
    table.get(0).and_then(|row| row.get(0))
}

/// The cell at (0, 0), `None` when the table has no rows or the cell is NULL.
pub fn string_value() -> impl Mapper<Option<String>> {
    |table: Table| -> Result<Option<String>> { Ok(first_cell(&table).map(str::to_owned)) }
}

/// The cell at (0, 0) converted by `f`.
///
/// An empty table (or a NULL cell) maps to `None` without calling `f`, so `f` always
/// receives a value.
pub fn single_value<T, F>(f: F) -> impl Mapper<Option<T>>
where
    F: Fn(&str) -> Result<T> + Send + Sync,
{
    move |table: Table| -> Result<Option<T>> { first_cell(&table).map(&f).transpose() }
}

/// The cell at (0, 0) converted by `f`, which is called even when the table is empty.
pub fn single_nullable_value<T, F>(f: F) -> impl Mapper<T>
where
    F: Fn(Option<&str>) -> Result<T> + Send + Sync,
{
    move |table: Table| -> Result<T> { f(first_cell(&table)) }
}

/// The cells of the first column, in row order.
pub fn string_list() -> impl Mapper<Vec<Option<String>>> {
    value_list(|v| Ok(v.map(str::to_owned)))
}

/// The cells of the first column converted by `f`, in row order. Empty for an empty table.
pub fn value_list<T, F>(f: F) -> impl Mapper<Vec<T>>
where
    F: Fn(Option<&str>) -> Result<T> + Send + Sync,
{
    move |table: Table| -> Result<Vec<T>> { table.iter().map(|row| f(row.get(0))).collect() }
}

pub fn from_fn<T, F>(f: F) -> impl Mapper<T>
where
    F: Fn(Table) -> Result<T> + Send + Sync,
{
    f
}

/// Returns the table unchanged.
pub fn identity() -> impl Mapper<Table> {
    |table: Table| -> Result<Table> { Ok(table) }
}

/// The cell at (0, 0) wrapped in a [`StringMapper`].
pub fn to_mapping() -> impl Mapper<StringMapper> {
    single_nullable_value(|v| Ok(StringMapper::new(v)))
}

/// The cell at (0, 0) converted to `T`, `None` when absent or NULL.
pub fn to_primitive<T: FromCell>() -> impl Mapper<Option<T>> {
    |table: Table| -> Result<Option<T>> { StringMapper::new(first_cell(&table)).to::<T>() }
}

/// The first row mapped by `mapper`, `None` for an empty table.
pub fn to_object<T>(mapper: ObjectMapper<T>) -> impl Mapper<Option<T>> {
    move |table: Table| -> Result<Option<T>> { mapper.apply(&table) }
}

/// Every row mapped by `mapper`, in row order.
pub fn to_objects<T>(mapper: ObjectMapper<T>) -> impl Mapper<Vec<T>> {
    move |table: Table| -> Result<Vec<T>> { mapper.apply_all(&table) }
}

pub fn first_row() -> impl Mapper<Option<Tuple>> {
    |table: Table| -> Result<Option<Tuple>> { Ok(table.into_rows().into_iter().next()) }
}

pub fn all_rows() -> impl Mapper<Vec<Tuple>> {
    |table: Table| -> Result<Vec<Tuple>> { Ok(table.into_rows()) }
}

/// The rows as a stream, in row order.
pub fn row_stream() -> impl Mapper<stream::Iter<vec::IntoIter<Tuple>>> {
    |table: Table| -> Result<stream::Iter<vec::IntoIter<Tuple>>> {
        Ok(stream::iter(table.into_rows()))
    }
}
