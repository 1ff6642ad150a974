use crate::{Bind, BindKind, ResultSet};
use oxibind_core::{AsValue, Bound, ExecuteMode, NativeError, Value};
use std::{collections::BTreeMap, sync::Arc};

/// Scripted body of a statement, run on every execution.
pub type Procedure =
    Arc<dyn Fn(&mut Invocation<'_>) -> Result<(), NativeError> + Send + Sync + 'static>;

/// View over one execution handed to a [`Procedure`].
///
/// Parameter names are case insensitive and may be given with or without the leading colon.
pub struct Invocation<'a> {
    pub(crate) binds: &'a BTreeMap<String, Bind>,
    pub(crate) mode: ExecuteMode,
    pub(crate) result: Option<ResultSet>,
    pub(crate) affected: u64,
}

pub(crate) fn normalize_name(name: &str) -> String {
    oxibind_core::bind_name(name).to_lowercase()
}

impl<'a> Invocation<'a> {
    pub fn mode(&self) -> ExecuteMode {
        self.mode
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.binds.contains_key(&normalize_name(name))
    }

    fn bind(&self, name: &str) -> Result<&Bind, NativeError> {
        self.binds
            .get(&normalize_name(name))
            .ok_or_else(|| NativeError::new(1008, format!("not all variables bound: {name}")))
    }

    /// Value bound to `name`, large objects are read.
    pub fn get(&self, name: &str) -> Result<Value, NativeError> {
        let bind = self.bind(name)?;
        bind.variable.value().map_err(|e| {
            NativeError::new(932, format!("inconsistent datatypes for {name}: {e:#}"))
        })
    }

    pub fn get_as<T: AsValue>(&self, name: &str) -> Result<T, NativeError> {
        T::try_from_value(self.get(name)?)
            .map_err(|e| NativeError::new(1722, format!("invalid value for {name}: {e:#}")))
    }

    /// Write an output value, checked against the maximum length of the bind.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), NativeError> {
        let bind = self.bind(name)?;
        let value = value.into();
        if let (Some(max), Some(len)) = (bind.max_length, value.byte_len())
            && len > max
        {
            return Err(NativeError::new(
                6502,
                format!("character string buffer too small for {name}: {len} > {max}"),
            ));
        }
        bind.variable.set(value);
        Ok(())
    }

    /// Fill the output cursor bound to `name` with `rows`.
    pub fn open_cursor(&self, name: &str, rows: ResultSet) -> Result<(), NativeError> {
        let bind = self.bind(name)?;
        if bind.kind != BindKind::Cursor {
            return Err(NativeError::new(
                932,
                format!("inconsistent datatypes: {name} is not a cursor"),
            ));
        }
        match &mut *bind.variable.lock() {
            Bound::Cursor(cursor) => {
                cursor.open(rows);
                Ok(())
            }
            _ => Err(NativeError::new(
                1001,
                format!("invalid cursor bound to {name}"),
            )),
        }
    }

    /// Rows returned by this execution.
    pub fn rows(&mut self, rows: ResultSet) {
        self.result = Some(rows);
    }

    pub fn affected(&mut self, rows: u64) {
        self.affected = rows;
    }
}
