use crate::{
    Cell, Invocation, MemoryLob, ResultSet, connection::Shared, invocation::normalize_name,
};
use oxibind_core::{
    Bound, ColumnMeta, ExecuteMode, FetchFlags, Field, NativeError, NativeLob, NativeRow,
    NativeStatement, Result, RowNames, Value, Variable, native_error, truncate_long,
};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindKind {
    Scalar,
    Lob,
    Cursor,
}

pub(crate) struct Bind {
    pub(crate) kind: BindKind,
    pub(crate) variable: Variable<MemoryStatement>,
    pub(crate) max_length: Option<usize>,
}

enum Source {
    Query { sql: String, markers: Vec<String> },
    Cursor,
}

/// One recorded execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    /// Bound values by lowercase name without the colon, cursors excluded.
    pub params: BTreeMap<String, Value>,
    pub mode: ExecuteMode,
}

/// Statement handle of the memory backend.
pub struct MemoryStatement {
    source: Source,
    shared: Arc<Shared>,
    binds: BTreeMap<String, Bind>,
    result: Option<ResultSet>,
    position: usize,
    rows_affected: u64,
    error: Option<NativeError>,
}

/// Names of the `:name` markers outside quoted literals, lowercase.
pub(crate) fn markers(sql: &str) -> Vec<String> {
    let mut result = Vec::<String>::new();
    let mut literal = None;
    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (literal, c) {
            (None, '\'' | '"') => literal = Some(c),
            (Some(q), c) if q == c => literal = None,
            (None, ':') => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, c)) = chars.peek().copied()
                    && (c.is_alphanumeric() || c == '_')
                {
                    end = j + c.len_utf8();
                    chars.next();
                }
                let name = sql[start..end].to_lowercase();
                if !name.is_empty() && !result.contains(&name) {
                    result.push(name);
                }
            }
            _ => {}
        }
    }
    result
}

impl MemoryStatement {
    pub(crate) fn query(shared: Arc<Shared>, sql: &str) -> Self {
        Self::new(
            shared,
            Source::Query {
                sql: sql.to_string(),
                markers: markers(sql),
            },
            None,
        )
    }

    pub(crate) fn cursor(shared: Arc<Shared>, rows: Option<ResultSet>) -> Self {
        Self::new(shared, Source::Cursor, rows)
    }

    fn new(shared: Arc<Shared>, source: Source, result: Option<ResultSet>) -> Self {
        Self {
            source,
            shared,
            binds: Default::default(),
            result,
            position: 0,
            rows_affected: 0,
            error: None,
        }
    }

    /// Reset the cursor over `rows`.
    pub(crate) fn open(&mut self, rows: ResultSet) {
        self.result = Some(rows);
        self.position = 0;
    }

    pub fn sql(&self) -> Option<&str> {
        match &self.source {
            Source::Query { sql, .. } => Some(sql),
            Source::Cursor => None,
        }
    }

    fn fail(&mut self, error: NativeError) -> oxibind_core::Error {
        self.error = Some(error.clone());
        self.shared.set_last_error(error.clone());
        let error = native_error(error);
        log::error!("{:#}", error);
        error
    }

    fn bind(
        &mut self,
        name: &str,
        kind: BindKind,
        variable: &Variable<Self>,
        max_length: Option<usize>,
    ) -> Result<()> {
        let key = normalize_name(name);
        let known = match &self.source {
            Source::Query { markers, .. } => markers.contains(&key),
            Source::Cursor => false,
        };
        if !known {
            return Err(self.fail(NativeError::new(
                1036,
                format!("illegal variable name/number: {name}"),
            )));
        }
        log::trace!("Bound `{key}` as {kind:?}");
        self.binds.insert(
            key,
            Bind {
                kind,
                variable: variable.clone(),
                max_length,
            },
        );
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, Value> {
        self.binds
            .iter()
            .filter_map(|(name, bind)| {
                let value = match &mut *bind.variable.lock() {
                    Bound::Value(v) => v.clone(),
                    Bound::Lob(lob) => match lob.load() {
                        Ok(v) => v,
                        Err(e) => {
                            log::warn!("Leaving `{name}` out of the execution log: {e:#}");
                            return None;
                        }
                    },
                    Bound::Cursor(..) => return None,
                };
                Some((name.clone(), value))
            })
            .collect()
    }
}

impl NativeStatement for MemoryStatement {
    type Lob = MemoryLob;

    fn bind_by_name(
        &mut self,
        name: &str,
        variable: &Variable<Self>,
        max_length: Option<usize>,
    ) -> Result<()> {
        self.bind(name, BindKind::Scalar, variable, max_length)
    }

    fn bind_lob(&mut self, name: &str, variable: &Variable<Self>) -> Result<()> {
        self.bind(name, BindKind::Lob, variable, None)
    }

    fn bind_cursor(&mut self, name: &str, variable: &Variable<Self>) -> Result<()> {
        self.bind(name, BindKind::Cursor, variable, None)
    }

    fn execute(&mut self, mode: ExecuteMode) -> Result<()> {
        self.error = None;
        let (sql, missing) = match &self.source {
            Source::Query { sql, markers } => (
                sql.clone(),
                markers
                    .iter()
                    .find(|v| !self.binds.contains_key(*v))
                    .cloned(),
            ),
            Source::Cursor => {
                self.position = 0;
                return Ok(());
            }
        };
        if let Some(missing) = missing {
            let error = NativeError::new(1008, format!("not all variables bound: {missing}"));
            return Err(self.fail(error));
        }
        let Some(procedure) = self.shared.procedure(&sql) else {
            let error = NativeError::new(
                942,
                format!("table or view does not exist: {}", truncate_long!(sql)),
            );
            return Err(self.fail(error));
        };
        let mut invocation = Invocation {
            binds: &self.binds,
            mode,
            result: None,
            affected: 0,
        };
        let outcome = procedure(&mut invocation);
        let Invocation {
            result, affected, ..
        } = invocation;
        if let Err(error) = outcome {
            self.result = None;
            return Err(self.fail(error));
        }
        self.result = result;
        self.position = 0;
        self.rows_affected = affected;
        self.shared.record(Execution {
            sql,
            params: self.snapshot(),
            mode,
        });
        Ok(())
    }

    fn fetch_row(&mut self, flags: FetchFlags) -> Result<Option<NativeRow<Self>>> {
        let Some(result) = &self.result else {
            return Ok(None);
        };
        let Some(row) = result.rows.get(self.position) else {
            return Ok(None);
        };
        let keep = |cell: &Cell| flags.nulls || !cell.is_null();
        let labels: RowNames = if row.iter().all(keep) {
            result.labels.clone()
        } else {
            result
                .labels
                .iter()
                .zip(row)
                .filter(|(_, cell)| keep(cell))
                .map(|(label, _)| label.clone())
                .collect()
        };
        let fields = row
            .iter()
            .filter(|cell| keep(cell))
            .map(|cell| match cell {
                Cell::Value(v) => Field::Value(v.clone()),
                Cell::Lob(v) if flags.lobs => Field::Value(v.clone()),
                Cell::Lob(v) => Field::Lob(MemoryLob::stored(v.clone())),
                Cell::Cursor(rows) => Field::Cursor(MemoryStatement::cursor(
                    self.shared.clone(),
                    Some(rows.clone()),
                )),
            })
            .collect();
        self.position += 1;
        Ok(Some(NativeRow::new(labels, fields)))
    }

    fn column_count(&self) -> Result<usize> {
        Ok(self.result.as_ref().map(|v| v.labels.len()).unwrap_or(0))
    }

    fn column_meta(&self, index: usize) -> Result<Option<ColumnMeta>> {
        let Some(result) = &self.result else {
            return Ok(None);
        };
        let Some(name) = result.labels.get(index) else {
            return Ok(None);
        };
        let cells = result.rows.iter().filter_map(|row| row.get(index));
        let native_type = cells
            .clone()
            .find(|cell| !cell.is_null())
            .map(|cell| match cell {
                Cell::Value(v) => v.type_name().to_string(),
                Cell::Lob(v) => oxibind_core::LobKind::of(v).to_string(),
                Cell::Cursor(..) => "REF CURSOR".to_string(),
            })
            .unwrap_or_else(|| "VARCHAR".into());
        let len = cells
            .clone()
            .filter_map(|cell| match cell {
                Cell::Value(v) | Cell::Lob(v) => v.byte_len(),
                Cell::Cursor(..) => None,
            })
            .max();
        Ok(Some(ColumnMeta {
            name: name.clone(),
            native_type,
            len,
            precision: None,
            scale: None,
            nullable: result.rows.is_empty() || cells.clone().any(Cell::is_null),
        }))
    }

    fn rows_affected(&self) -> Result<u64> {
        Ok(self.rows_affected)
    }

    fn free_result(&mut self) -> Result<()> {
        self.result = None;
        self.position = 0;
        Ok(())
    }

    fn last_error(&self) -> Option<NativeError> {
        self.error.clone()
    }
}
