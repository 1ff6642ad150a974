use crate::{
    CBox, SqliteLob,
    extract::{extract_decltype, extract_field, extract_name},
    native_error_of,
};
use libsqlite3_sys::*;
use oxibind_core::{
    Bound, ColumnMeta, Error, ExecuteMode, FetchFlags, NativeError, NativeRow, NativeStatement,
    Result, RowNames, Value, Variable, bind_name, native_error, truncate_long,
};
use rust_decimal::prelude::ToPrimitive;
use std::{
    collections::BTreeMap,
    ffi::{CStr, CString, c_char, c_int, c_void},
    ptr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Idle,
    Row,
    Done,
}

/// Prepared statement of the sqlite backend.
///
/// Variables are attached by parameter index and their current content is
/// bound right before each execution.
pub struct SqliteStatement {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    db: CBox<*mut sqlite3>,
    binds: BTreeMap<c_int, Variable<SqliteStatement>>,
    step: Step,
    labels: Option<RowNames>,
    rows_affected: u64,
    error: Option<NativeError>,
}

impl SqliteStatement {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>, db: *mut sqlite3) -> Self {
        Self {
            statement,
            db: CBox::borrowed(db),
            binds: Default::default(),
            step: Step::Idle,
            labels: None,
            rows_affected: 0,
            error: None,
        }
    }

    /// The statement text as prepared.
    pub fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }

    fn fail(&mut self, error: NativeError) -> Error {
        self.error = Some(error.clone());
        let error = native_error(error);
        log::error!("{:#}", error);
        error
    }

    fn fail_native(&mut self) -> Error {
        let error = native_error_of(*self.db);
        self.fail(error)
    }

    fn attach(&mut self, name: &str, variable: &Variable<Self>) -> Result<()> {
        let marker = format!(":{}", bind_name(name));
        let index = match CString::new(marker.as_str()) {
            Ok(v) => unsafe { sqlite3_bind_parameter_index(*self.statement, v.as_ptr()) },
            Err(..) => 0,
        };
        if index == 0 {
            let sql = self.sql();
            return Err(self.fail(NativeError::new(
                SQLITE_RANGE,
                format!(
                    "Unknown parameter `{}` in:\n{}",
                    marker,
                    truncate_long!(sql)
                ),
            )));
        }
        log::trace!("Attached `{}` to the parameter {}", marker, index);
        self.binds.insert(index, variable.clone());
        Ok(())
    }

    fn bind_value(&mut self, index: c_int, value: &Value) -> Result<()> {
        let statement = *self.statement;
        let rc = unsafe {
            match value {
                v if v.is_null() => sqlite3_bind_null(statement, index),
                Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
                Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
                Value::Decimal(Some(v)) => match v.to_f64() {
                    Some(v) => sqlite3_bind_double(statement, index, v),
                    None => {
                        return Err(self.fail(NativeError::new(
                            SQLITE_MISMATCH,
                            format!("Cannot convert the Decimal value `{}` to f64", v),
                        )));
                    }
                },
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Varchar(Some(v)) => bind_text(statement, index, v),
                Value::Date(Some(v)) => bind_text(statement, index, &v.to_string()),
                Value::Time(Some(v)) => bind_text(statement, index, &v.to_string()),
                Value::Timestamp(Some(v)) => bind_text(statement, index, &v.to_string()),
                Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
                v => {
                    return Err(self.fail(NativeError::new(
                        SQLITE_MISMATCH,
                        format!("Cannot use a {:?} as a query parameter", v),
                    )));
                }
            }
        };
        if rc != SQLITE_OK {
            return Err(self.fail_native());
        }
        Ok(())
    }

    /// Locks are waited for by the busy handler set when connecting.
    fn step_once(&mut self) -> Result<Step> {
        match unsafe { sqlite3_step(*self.statement) } {
            SQLITE_ROW => Ok(Step::Row),
            SQLITE_DONE => Ok(Step::Done),
            _ => Err(self.fail_native()),
        }
    }

    fn run(&mut self, sql: &CStr) -> Result<()> {
        let rc = unsafe {
            sqlite3_exec(
                *self.db,
                sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(self.fail_native());
        }
        Ok(())
    }

    fn labels(&mut self) -> Result<RowNames> {
        if let Some(labels) = &self.labels {
            return Ok(labels.clone());
        }
        let count = unsafe { sqlite3_column_count(*self.statement) };
        let labels = (0..count)
            .map(|i| extract_name(*self.statement, i))
            .collect::<Result<RowNames>>()?;
        self.labels = Some(labels.clone());
        Ok(labels)
    }
}

unsafe fn bind_text(statement: *mut sqlite3_stmt, index: c_int, value: &str) -> c_int {
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

impl NativeStatement for SqliteStatement {
    type Lob = SqliteLob;

    fn bind_by_name(
        &mut self,
        name: &str,
        variable: &Variable<Self>,
        _max_length: Option<usize>,
    ) -> Result<()> {
        self.attach(name, variable)
    }

    fn bind_lob(&mut self, name: &str, variable: &Variable<Self>) -> Result<()> {
        self.attach(name, variable)
    }

    fn bind_cursor(&mut self, name: &str, _variable: &Variable<Self>) -> Result<()> {
        Err(self.fail(NativeError::new(
            SQLITE_MISUSE,
            format!("Cannot bind `{name}`: sqlite has no cursor parameters"),
        )))
    }

    fn execute(&mut self, mode: ExecuteMode) -> Result<()> {
        self.error = None;
        self.step = Step::Idle;
        self.labels = None;
        self.rows_affected = 0;
        unsafe {
            sqlite3_reset(*self.statement);
            sqlite3_clear_bindings(*self.statement);
        }
        let mut values = Vec::with_capacity(self.binds.len());
        for (index, variable) in &self.binds {
            let value = match &*variable.lock() {
                Bound::Value(v) => Ok(v.clone()),
                Bound::Lob(lob) => Ok(lob.content()),
                Bound::Cursor(..) => Err(*index),
            };
            values.push((*index, value));
        }
        for (index, value) in values {
            let value = match value {
                Ok(v) => v,
                Err(index) => {
                    return Err(self.fail(NativeError::new(
                        SQLITE_MISUSE,
                        format!("The parameter {index} holds a cursor"),
                    )));
                }
            };
            self.bind_value(index, &value)?;
        }
        let autocommit = unsafe { sqlite3_get_autocommit(*self.db) != 0 };
        if mode == ExecuteMode::NoAutoCommit && autocommit {
            log::debug!("Opening a transaction");
            self.run(c"BEGIN")?;
        }
        self.step = self.step_once()?;
        if self.step == Step::Done {
            if unsafe { sqlite3_column_count(*self.statement) } == 0 {
                self.rows_affected = unsafe { sqlite3_changes(*self.db) } as u64;
            }
            let autocommit = unsafe { sqlite3_get_autocommit(*self.db) != 0 };
            if mode == ExecuteMode::AutoCommit && !autocommit {
                log::debug!("Committing the open transaction");
                self.run(c"COMMIT")?;
            }
        }
        Ok(())
    }

    fn fetch_row(&mut self, flags: FetchFlags) -> Result<Option<NativeRow<Self>>> {
        if self.step != Step::Row {
            return Ok(None);
        }
        let labels = self.labels()?;
        let mut names = Vec::with_capacity(labels.len());
        let mut fields = Vec::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let field = extract_field(*self.statement, i as c_int, flags.lobs)?;
            if !flags.nulls && field.is_null() {
                continue;
            }
            names.push(label.clone());
            fields.push(field);
        }
        let labels = if names.len() == labels.len() {
            labels
        } else {
            names.into()
        };
        self.step = self.step_once()?;
        Ok(Some(NativeRow::new(labels, fields)))
    }

    fn column_count(&self) -> Result<usize> {
        Ok(unsafe { sqlite3_column_count(*self.statement) } as usize)
    }

    fn column_meta(&self, index: usize) -> Result<Option<ColumnMeta>> {
        if index >= self.column_count()? {
            return Ok(None);
        }
        let index = index as c_int;
        Ok(Some(ColumnMeta {
            name: extract_name(*self.statement, index)?,
            native_type: extract_decltype(*self.statement, index),
            len: None,
            precision: None,
            scale: None,
            nullable: true,
        }))
    }

    fn rows_affected(&self) -> Result<u64> {
        Ok(self.rows_affected)
    }

    fn free_result(&mut self) -> Result<()> {
        unsafe {
            sqlite3_reset(*self.statement);
        }
        self.step = Step::Idle;
        Ok(())
    }

    fn last_error(&self) -> Option<NativeError> {
        self.error.clone()
    }
}
