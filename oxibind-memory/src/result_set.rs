use oxibind_core::{LobKind, RowNames, Value};

/// One cell of a scripted result set.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    /// Content returned behind a large object descriptor.
    Lob(Value),
    /// Rows returned behind a nested cursor.
    Cursor(ResultSet),
}

impl Cell {
    pub fn lob(value: impl Into<Value>) -> Self {
        Cell::Lob(value.into())
    }

    pub fn lob_kind(&self) -> Option<LobKind> {
        match self {
            Cell::Lob(v) => Some(LobKind::of(v)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Value(v) if v.is_null())
    }
}

macro_rules! impl_cell_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Cell {
                fn from(value: $source) -> Self {
                    Cell::Value(value.into())
                }
            }
        )+
    };
}

impl_cell_from!(
    Value,
    &str,
    String,
    bool,
    i32,
    i64,
    f64,
    Vec<u8>,
    Option<i32>,
    Option<i64>,
    Option<String>,
);

impl From<ResultSet> for Cell {
    fn from(value: ResultSet) -> Self {
        Cell::Cursor(value)
    }
}

/// Rows returned by a scripted procedure, with their column names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub labels: RowNames,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, missing trailing cells are NULL and extra cells are dropped.
    pub fn row<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let mut row: Vec<Cell> = cells
            .into_iter()
            .map(Into::into)
            .take(self.labels.len())
            .collect();
        row.resize(self.labels.len(), Cell::Value(Value::Null));
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
