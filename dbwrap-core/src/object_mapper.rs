use crate::{Context, DatabaseError, FromCell, Result, StringMapper, Table, Tuple};
use std::{any, collections::HashSet, sync::Arc};

type Setter<T> = dyn Fn(&mut T, StringMapper) -> Result<()> + Send + Sync;

struct FieldBinding<T> {
    column: String,
    setter: Box<Setter<T>>,
}

/// Builds one `T` per row from an explicit list of column bindings.
///
/// Each binding reads the cell of its column, converts it with the [`FromCell`] rules and hands
/// it to a setter. Columns that are missing from the result read as NULL.
/// ```rust
/// use dbwrap_core::{ObjectMapper, Table};
/// #[derive(Default)]
/// struct Item {
///     id: i32,
///     value: Option<String>,
/// }
/// let mapper = ObjectMapper::builder(Item::default)
///     .field("id", |item: &mut Item, v| item.id = v)
///     .optional_field("text", |item: &mut Item, v| item.value = v)
///     .build()
///     .unwrap();
/// let table = Table::new(["id", "text"], [[Some("12"), Some("test")]]).unwrap();
/// let item = mapper.apply(&table).unwrap().unwrap();
/// assert_eq!(item.id, 12);
/// assert_eq!(item.value.as_deref(), Some("test"));
/// ```
pub struct ObjectMapper<T> {
    factory: Arc<dyn Fn() -> T + Send + Sync>,
    bindings: Arc<[FieldBinding<T>]>,
}

impl<T> Clone for ObjectMapper<T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            bindings: self.bindings.clone(),
        }
    }
}

impl<T> ObjectMapper<T> {
    /// Starts a mapper creating its instances with `factory`.
    pub fn builder<F>(factory: F) -> ObjectMapperBuilder<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        ObjectMapperBuilder {
            factory: Arc::new(factory),
            bindings: Vec::new(),
        }
    }

    /// The bound column names, in binding order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|v| v.column.as_str())
    }

    pub fn row_to_instance(&self, row: &Tuple) -> Result<T> {
        let mut instance = (self.factory)();
        for binding in self.bindings.iter() {
            let value = StringMapper::new(row.get_by_name(&binding.column));
            (binding.setter)(&mut instance, value)
                .with_context(|| format!("While reading the column `{}`", binding.column))?;
        }
        Ok(instance)
    }

    /// Maps the first row, `None` for an empty table.
    pub fn apply(&self, table: &Table) -> Result<Option<T>> {
        table.get(0).map(|row| self.row_to_instance(row)).transpose()
    }

    /// Maps every row, in row order.
    pub fn apply_all(&self, table: &Table) -> Result<Vec<T>> {
        table
            .iter()
            .enumerate()
            .map(|(i, row)| {
                self.row_to_instance(row).with_context(|| {
                    format!("While mapping the row {} to {}", i, any::type_name::<T>())
                })
            })
            .collect()
    }
}

pub struct ObjectMapperBuilder<T> {
    factory: Arc<dyn Fn() -> T + Send + Sync>,
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> ObjectMapperBuilder<T> {
    /// Binds a column that must not be NULL.
    pub fn field<V, F>(mut self, column: impl Into<String>, setter: F) -> Self
    where
        V: FromCell + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bindings.push(FieldBinding {
            column: column.into(),
            setter: Box::new(move |instance: &mut T, value: StringMapper| -> Result<()> {
                setter(instance, value.to_required::<V>()?);
                Ok(())
            }),
        });
        self
    }

    /// Binds a nullable column.
    pub fn optional_field<V, F>(mut self, column: impl Into<String>, setter: F) -> Self
    where
        V: FromCell + 'static,
        F: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        self.bindings.push(FieldBinding {
            column: column.into(),
            setter: Box::new(move |instance: &mut T, value: StringMapper| -> Result<()> {
                setter(instance, value.to::<V>()?);
                Ok(())
            }),
        });
        self
    }

    /// Fails when nothing is bound or a column is bound twice.
    pub fn build(self) -> Result<ObjectMapper<T>> {
        if self.bindings.is_empty() {
            return Err(DatabaseError::MappingConstruction(format!(
                "{} does not bind any column",
                any::type_name::<T>()
            ))
            .into());
        }
        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.column.as_str()) {
                return Err(DatabaseError::MappingConstruction(format!(
                    "The column `{}` is bound more than once for {}",
                    binding.column,
                    any::type_name::<T>()
                ))
                .into());
            }
        }
        Ok(ObjectMapper {
            factory: self.factory,
            bindings: self.bindings.into(),
        })
    }
}
