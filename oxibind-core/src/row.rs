use crate::{
    AsValue, Error, NativeLob, NativeStatement, Record, Result, SharedRecord, StatementError,
    Value,
};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};

/// One slot of a fetched row.
///
/// The native layer decides at fetch time what a slot holds: a terminal value,
/// a large object descriptor that still has to be loaded, or a nested cursor
/// that yields rows of its own.
pub enum Field<S: NativeStatement> {
    Value(Value),
    Lob(S::Lob),
    Cursor(S),
}

impl<S: NativeStatement> Field<S> {
    pub fn is_cursor(&self) -> bool {
        matches!(self, Field::Cursor(..))
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, Field::Lob(..))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Value(v) if v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Field::Value(v) if v.is_empty())
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Replace a large object with its loaded content, other fields are returned as they are.
    pub fn loaded(self) -> Result<Self> {
        Ok(match self {
            Field::Lob(mut lob) => Field::Value(lob.load()?),
            v => v,
        })
    }

    /// The terminal value, loading large objects. Fails on cursors.
    pub fn into_value(self) -> Result<Value> {
        match self.loaded()? {
            Field::Value(v) => Ok(v),
            _ => Err(Error::new(StatementError::InvalidArgument(
                "A nested cursor cannot be converted into a value".into(),
            ))),
        }
    }

    pub fn get<T: AsValue>(self) -> Result<T> {
        T::try_from_value(self.into_value()?)
    }
}

impl<S: NativeStatement> From<Value> for Field<S> {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl<S: NativeStatement> Debug for Field<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Field::Lob(lob) => write!(f, "Lob({})", lob.kind()),
            Field::Cursor(..) => f.write_str("Cursor(..)"),
        }
    }
}

impl<S: NativeStatement> PartialEq<Value> for Field<S> {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, Field::Value(v) if v == other)
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;

/// A row as produced by the native fetch, before any shaping.
pub struct NativeRow<S: NativeStatement> {
    pub labels: RowNames,
    pub fields: Vec<Field<S>>,
}

impl<S: NativeStatement> NativeRow<S> {
    pub fn new(labels: RowNames, fields: Vec<Field<S>>) -> Self {
        Self { labels, fields }
    }
}

/// A result row with its column labels, addressable by name and by position.
pub struct RowLabeled<S: NativeStatement> {
    pub labels: RowNames,
    pub values: Box<[Field<S>]>,
}

impl<S: NativeStatement> RowLabeled<S> {
    pub fn new(labels: RowNames, values: Box<[Field<S>]>) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Field<S>] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&Field<S>> {
        self.values.get(index)
    }
    pub fn get_column(&self, name: &str) -> Option<&Field<S>> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

impl<S: NativeStatement> Debug for RowLabeled<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.labels.iter().zip(self.values.iter()))
            .finish()
    }
}

/// A fetched row shaped by the active fetch mode.
pub enum FetchedRow<S: NativeStatement> {
    Associative(RowLabeled<S>),
    Numeric(Box<[Field<S>]>),
    Both(RowLabeled<S>),
    Column(Field<S>),
    Object(Box<dyn Record<S>>),
    Into(SharedRecord<S>),
}

impl<S: NativeStatement> FetchedRow<S> {
    /// The labeled row of the associative shapes.
    pub fn labeled(&self) -> Option<&RowLabeled<S>> {
        match self {
            FetchedRow::Associative(v) | FetchedRow::Both(v) => Some(v),
            _ => None,
        }
    }

    /// Field at `index` for the shapes that keep the column order.
    pub fn get(&self, index: usize) -> Option<&Field<S>> {
        match self {
            FetchedRow::Associative(v) | FetchedRow::Both(v) => v.get(index),
            FetchedRow::Numeric(v) => v.get(index),
            FetchedRow::Column(v) if index == 0 => Some(v),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Box<dyn Record<S>>> {
        match self {
            FetchedRow::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl<S: NativeStatement> Debug for FetchedRow<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchedRow::Associative(v) => f.debug_tuple("Associative").field(v).finish(),
            FetchedRow::Numeric(v) => f.debug_tuple("Numeric").field(v).finish(),
            FetchedRow::Both(v) => f.debug_tuple("Both").field(v).finish(),
            FetchedRow::Column(v) => f.debug_tuple("Column").field(v).finish(),
            FetchedRow::Object(..) => f.write_str("Object(..)"),
            FetchedRow::Into(..) => f.write_str("Into(..)"),
        }
    }
}
