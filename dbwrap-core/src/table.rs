use crate::{DatabaseError, Error, Result};
use std::{
    collections::HashMap,
    fmt::{self, Display},
    slice,
    sync::Arc,
    vec,
};

/// Column names of a table and the reverse name to position index.
#[derive(Debug, Default)]
pub struct Labels {
    names: Box<[String]>,
    index: HashMap<String, usize>,
}

impl Labels {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let names: Box<[String]> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(DatabaseError::Execution(format!(
                    "The attribute `{}` appears more than once in the result, alias the columns \
                     so that every name is unique",
                    name
                ))
                .into());
            }
        }
        Ok(Self { names, index })
    }
    pub fn names(&self) -> &[String] {
        &self.names
    }
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
    pub fn len(&self) -> usize {
        self.names.len()
    }
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Shared label index, every row of a table points to the same one.
pub type RowNames = Arc<Labels>;

/// One row of a [`Table`].
///
/// A tuple shares the name index of the table it was read from, so cells can be looked up by
/// position or by attribute name.
#[derive(Debug, Clone)]
pub struct Tuple {
    labels: RowNames,
    values: Box<[Option<String>]>,
}

impl Tuple {
    pub fn labels(&self) -> &[String] {
        self.labels.names()
    }
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
    /// The cell at `index`, `None` when the cell is NULL or the index is out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Option::as_deref)
    }
    /// The cell of the attribute `name`, `None` when the cell is NULL or the name is unknown.
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        self.labels.index_of(name).and_then(|i| self.get(i))
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(value.as_deref().unwrap_or("null"))?;
        }
        Ok(())
    }
}

/// Immutable result of one query: attribute names and rows of nullable string cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    labels: RowNames,
    rows: Vec<Tuple>,
}

impl Table {
    /// Builds a table, every row must have exactly one cell per attribute.
    ///
    /// ```rust
    /// use dbwrap_core::Table;
    /// let table = Table::new(["id", "name"], [[Some("1"), Some("a")], [Some("2"), None]]).unwrap();
    /// assert_eq!(table.row_count(), 2);
    /// assert_eq!(table[1].get_by_name("name"), None);
    /// ```
    pub fn new<A, R, C, S>(attributes: A, rows: R) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let labels = Arc::new(Labels::new(attributes)?);
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let values: Box<[Option<String>]> =
                    row.into_iter().map(|v| v.map(Into::into)).collect();
                if values.len() != labels.len() {
                    return Err(Error::msg(format!(
                        "Row {} has {} values but the table has {} attributes",
                        i,
                        values.len(),
                        labels.len()
                    )));
                }
                Ok(Tuple {
                    labels: labels.clone(),
                    values,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { labels, rows })
    }

    /// A table with the given attributes and no rows.
    pub fn empty(attributes: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        Ok(Self {
            labels: Arc::new(Labels::new(attributes)?),
            rows: Vec::new(),
        })
    }

    pub fn attributes(&self) -> &[String] {
        self.labels.names()
    }
    pub fn attribute(&self, index: usize) -> Option<&str> {
        self.labels.names().get(index).map(String::as_str)
    }
    pub fn index_of(&self, attribute: &str) -> Option<usize> {
        self.labels.index_of(attribute)
    }
    /// The cells of the column at `index`, in row order.
    pub fn column(&self, index: usize) -> Option<Vec<Option<&str>>> {
        if index >= self.column_count() {
            return None;
        }
        Some(self.rows.iter().map(|row| row.get(index)).collect())
    }
    /// The cells of the column named `attribute`, empty when there is no such column.
    pub fn column_by_name(&self, attribute: &str) -> Vec<Option<&str>> {
        self.index_of(attribute)
            .and_then(|i| self.column(i))
            .unwrap_or_default()
    }
    pub fn get(&self, index: usize) -> Option<&Tuple> {
        self.rows.get(index)
    }
    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }
    pub fn into_rows(self) -> Vec<Tuple> {
        self.rows
    }
    pub fn iter(&self) -> slice::Iter<'_, Tuple> {
        self.rows.iter()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
    pub fn column_count(&self) -> usize {
        self.labels.len()
    }

    /// Prints the table followed by the number of rows.
    pub fn print(&self) {
        if self.column_count() == 0 {
            println!("Number of rows: 0");
            return;
        }
        println!("{}", self);
        println!("Number of rows: {}", self.row_count());
    }
}

impl std::ops::Index<usize> for Table {
    type Output = Tuple;
    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attributes().join(", "))?;
        for row in &self.rows {
            write!(f, "\n{}", row)?;
        }
        Ok(())
    }
}

impl IntoIterator for Table {
    type Item = Tuple;
    type IntoIter = vec::IntoIter<Tuple>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Tuple;
    type IntoIter = slice::Iter<'a, Tuple>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
