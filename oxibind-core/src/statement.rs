use crate::{
    Attribute, AttributeValue, Attributes, BindKey, BindType, Binding, ClassDescriptor,
    ColumnMeta, Error, ExecuteMode, FetchArg, FetchFlags, FetchMode, FetchModeController,
    FetchStyle, FetchedRow, NativeConnection, NativeError, NativeRow, NativeStatement, ParamMap,
    Policies, Record, Result, StatementError, Value, ValueStore, Variable, bind_variable,
    log_error, materialize, translate, truncate_long,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display},
};

/// Text reported as the query of a statement built over a cursor.
const CURSOR_QUERY: &str = "<cursor>";

/// A prepared statement over a native statement handle.
///
/// The placeholders are translated once when preparing. Parameters are bound
/// through [`Statement::bind_value`] or [`Statement::bind_param`], the rows are
/// read with the fetch family of methods, shaped by the current fetch mode.
/// Dropping the statement releases the native handle.
pub struct Statement<'c, C: NativeConnection> {
    connection: &'c C,
    native: C::Statement,
    sql: String,
    query: String,
    params: ParamMap,
    values: ValueStore<C::Statement>,
    bound: BTreeMap<String, (BindKey, BindType, Variable<C::Statement>)>,
    controller: FetchModeController<C::Statement>,
    overrides: Attributes,
    row_count: u64,
    error: Option<NativeError>,
}

impl<'c, C: NativeConnection> Statement<'c, C> {
    /// Translate the placeholders of `sql` and parse it on `connection`.
    pub fn prepare(connection: &'c C, sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        let (query, params) = translate(&sql);
        log::debug!(
            "Preparing with {} ordinal parameters:\n{}",
            params.len(),
            truncate_long!(query)
        );
        let mode = match connection.attribute(Attribute::DefaultFetchMode) {
            Some(AttributeValue::FetchStyle(style)) => FetchMode::resolve(style, Vec::new())
                .map_err(|e| e.context("The default fetch mode of the connection is not usable"))?,
            _ => FetchMode::default(),
        };
        let native = connection.parse(&query).map_err(|e| {
            log_error!(e.context(format!("While preparing:\n{}", truncate_long!(query))))
        })?;
        Ok(Self::build(
            connection,
            native,
            sql,
            query,
            params,
            mode,
            Attributes::new(),
        ))
    }

    /// Wrap a cursor handle, it inherits the fetch mode and the attribute overrides given.
    pub fn from_cursor(
        connection: &'c C,
        cursor: C::Statement,
        mode: FetchMode<C::Statement>,
        overrides: Attributes,
    ) -> Self {
        Self::build(
            connection,
            cursor,
            CURSOR_QUERY.into(),
            CURSOR_QUERY.into(),
            Default::default(),
            mode,
            overrides,
        )
    }

    fn build(
        connection: &'c C,
        native: C::Statement,
        sql: String,
        query: String,
        params: ParamMap,
        mode: FetchMode<C::Statement>,
        overrides: Attributes,
    ) -> Self {
        Self {
            connection,
            native,
            sql,
            query,
            params,
            values: Default::default(),
            bound: Default::default(),
            controller: FetchModeController::new(mode),
            overrides,
            row_count: 0,
            error: None,
        }
    }

    pub fn connection(&self) -> &'c C {
        self.connection
    }

    /// The statement text as given.
    pub fn query_string(&self) -> &str {
        &self.sql
    }

    /// The statement text sent to the native layer.
    pub fn native_query(&self) -> &str {
        &self.query
    }

    pub fn param_map(&self) -> &ParamMap {
        &self.params
    }

    pub fn fetch_mode(&self) -> &FetchMode<C::Statement> {
        self.controller.mode()
    }

    /// Native name a key binds to: ordinals go through the parameter map, names are kept verbatim.
    pub fn resolve_key(&self, key: &BindKey) -> String {
        match key {
            BindKey::Ordinal(n) => match self.params.get(*n) {
                Some(marker) => marker.to_string(),
                None => format!(":{n}"),
            },
            BindKey::Name(name) => name.clone(),
        }
    }

    /// Bind a copy of `value`, kept by the statement until it is dropped.
    pub fn bind_value<K>(
        &mut self,
        key: K,
        value: impl Into<Value>,
        bind_type: BindType,
    ) -> Result<&mut Self>
    where
        K: TryInto<BindKey>,
        K::Error: Into<Error>,
    {
        let key = key.try_into().map_err(Into::into)?;
        let variable = self.values.store(key.clone(), value.into());
        self.bind_param(key, &variable, bind_type, 0)
    }

    /// Bind `variable` by reference: it is read when executing and output
    /// values are written into it.
    ///
    /// A scalar with a `max_length` greater than zero is bound with that explicit length.
    pub fn bind_param<K>(
        &mut self,
        key: K,
        variable: &Variable<C::Statement>,
        bind_type: BindType,
        max_length: usize,
    ) -> Result<&mut Self>
    where
        K: TryInto<BindKey>,
        K::Error: Into<Error>,
    {
        let key = key.try_into().map_err(Into::into)?;
        let name = self.resolve_key(&key);
        let binding = Binding::new(bind_type, max_length);
        log::trace!("Binding {key} to `{name}` as {binding:?}");
        if let Err(e) = bind_variable(
            self.connection,
            &mut self.native,
            &name,
            variable,
            binding,
        ) {
            let context = format!(
                "Cannot bind the parameter `{}` of:\n{}",
                name,
                truncate_long!(self.query)
            );
            return Err(self.failed(e, context));
        }
        self.bound.insert(name, (key, bind_type, variable.clone()));
        Ok(self)
    }

    /// Shorthand for a scalar [`Statement::bind_value`].
    pub fn bind<K>(&mut self, key: K, value: impl Into<Value>) -> Result<&mut Self>
    where
        K: TryInto<BindKey>,
        K::Error: Into<Error>,
    {
        self.bind_value(key, value, BindType::Scalar)
    }

    /// Run the statement with the commit mode of the connection.
    pub fn execute(&mut self) -> Result<()> {
        let mode = match self.attribute(Attribute::Autocommit) {
            Some(AttributeValue::Flag(false)) => ExecuteMode::NoAutoCommit,
            Some(..) => ExecuteMode::AutoCommit,
            None => self.connection.execute_mode(),
        };
        log::debug!("Executing ({:?}):\n{}", mode, truncate_long!(self.query));
        let result = self.native.execute(mode);
        match result.and_then(|_| self.native.rows_affected()) {
            Ok(rows) => {
                self.row_count = rows;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.row_count = 0;
                let context = format!("While executing:\n{}", truncate_long!(self.query));
                Err(self.failed(e, context))
            }
        }
    }

    /// Bind every value to the ordinals 1, 2, ... then execute.
    pub fn execute_with<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.bind_value(i + 1, value, BindType::Scalar)?;
        }
        self.execute()
    }

    /// Select the fetch mode used by the following fetches.
    pub fn set_fetch_mode<M>(
        &mut self,
        style: M,
        args: Vec<FetchArg<C::Statement>>,
    ) -> Result<()>
    where
        M: TryInto<FetchStyle>,
        M::Error: Into<Error>,
    {
        self.controller.set_fetch_mode(style, args)
    }

    /// Fetch the next row in the current mode, `None` when there are no more rows.
    pub fn fetch(&mut self) -> Result<Option<FetchedRow<C::Statement>>> {
        let mode = self.controller.mode().clone();
        self.fetch_as(&mode)
    }

    fn fetch_as(
        &mut self,
        mode: &FetchMode<C::Statement>,
    ) -> Result<Option<FetchedRow<C::Statement>>> {
        let Some(row) = self.fetch_native(FetchFlags::DEFAULT)? else {
            return Ok(None);
        };
        let policies = self.policies();
        materialize::shape(row, mode, &policies)
            .map(Some)
            .map_err(|e| log_error!(e))
    }

    /// Fetch every remaining row in the current mode.
    ///
    /// A row whose leading field (the selected column in the column mode) is a
    /// nested cursor is replaced by the rows of that cursor, in place.
    pub fn fetch_all(&mut self) -> Result<Vec<FetchedRow<C::Statement>>> {
        let mode = self.controller.mode().clone();
        let mut result = Vec::new();
        self.collect_into(&mode, &mut result)?;
        Ok(result)
    }

    /// Select the fetch mode, then [`Statement::fetch_all`].
    pub fn fetch_all_with<M>(
        &mut self,
        style: M,
        args: Vec<FetchArg<C::Statement>>,
    ) -> Result<Vec<FetchedRow<C::Statement>>>
    where
        M: TryInto<FetchStyle>,
        M::Error: Into<Error>,
    {
        self.set_fetch_mode(style, args)?;
        self.fetch_all()
    }

    fn collect_into(
        &mut self,
        mode: &FetchMode<C::Statement>,
        result: &mut Vec<FetchedRow<C::Statement>>,
    ) -> Result<()> {
        let policies = self.policies();
        while let Some(mut row) = self.fetch_native(FetchFlags::DEFAULT)? {
            if let Some(cursor) = materialize::take_nested(&mut row, mode) {
                log::trace!("Flattening a nested cursor of:\n{}", truncate_long!(self.query));
                let mut child = self.child(cursor, mode.clone());
                child.execute()?;
                child.collect_into(mode, result)?;
                continue;
            }
            let row = materialize::shape(row, mode, &policies).map_err(|e| log_error!(e))?;
            result.push(row);
        }
        Ok(())
    }

    /// The field at `index` of the next row, loaded. NULL when the row has no
    /// such column, `None` when there are no more rows.
    pub fn fetch_column(&mut self, index: usize) -> Result<Option<Value>> {
        let Some(row) = self.fetch_native(FetchFlags::RAW)? else {
            return Ok(None);
        };
        materialize::column(row.fields, index)
            .and_then(|v| v.into_value())
            .map(Some)
            .map_err(|e| log_error!(e.context(format!("While reading the column {index}"))))
    }

    /// Fetch the next row as an object, leaving the current mode unchanged.
    pub fn fetch_object(
        &mut self,
        class: Option<ClassDescriptor<C::Statement>>,
        args: Vec<Value>,
    ) -> Result<Option<Box<dyn Record<C::Statement>>>> {
        let mode = FetchMode::Object { class, args };
        Ok(self.fetch_as(&mode)?.and_then(FetchedRow::into_record))
    }

    /// Execute the output cursor held by `variable` as a new statement.
    ///
    /// `variable` is left holding a fresh cursor for the next execution.
    pub fn open_cursor(&self, variable: &Variable<C::Statement>) -> Result<Statement<'c, C>> {
        if !variable.is_cursor() {
            return Err(log_error!(Error::new(StatementError::InvalidArgument(
                "The variable does not hold a cursor".into()
            ))));
        }
        let fresh = self.connection.new_cursor()?;
        let Some(cursor) = variable.swap_cursor(fresh) else {
            return Err(log_error!(Error::new(StatementError::InvalidArgument(
                "The variable does not hold a cursor".into()
            ))));
        };
        let mut child = self.child(cursor, self.controller.mode().clone());
        child.execute()?;
        Ok(child)
    }

    fn child(&self, cursor: C::Statement, mode: FetchMode<C::Statement>) -> Statement<'c, C> {
        Statement::from_cursor(self.connection, cursor, mode, self.overrides.clone())
    }

    fn fetch_native(&mut self, flags: FetchFlags) -> Result<Option<NativeRow<C::Statement>>> {
        match self.native.fetch_row(flags) {
            Ok(row) => Ok(row),
            Err(e) => {
                let context = format!("While fetching from:\n{}", truncate_long!(self.query));
                Err(self.failed(e, context))
            }
        }
    }

    /// Rows affected by the last execution.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn column_count(&self) -> Result<usize> {
        self.native.column_count()
    }

    pub fn column_meta(&self, index: usize) -> Result<Option<ColumnMeta>> {
        self.native.column_meta(index)
    }

    /// Drop the pending rows, the statement can be executed again.
    pub fn close_cursor(&mut self) -> Result<()> {
        if let Err(e) = self.native.free_result() {
            return Err(self.failed(e, "While closing the cursor".into()));
        }
        Ok(())
    }

    /// Native code of the last failure of this statement.
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|v| v.code)
    }

    pub fn error_info(&self) -> Option<&NativeError> {
        self.error.as_ref()
    }

    /// Attribute value, the statement overrides come before the connection store.
    pub fn attribute(&self, key: Attribute) -> Option<AttributeValue> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| self.connection.attribute(key))
    }

    pub fn set_attribute(
        &mut self,
        key: Attribute,
        value: impl Into<AttributeValue>,
    ) -> &mut Self {
        self.overrides.set(key, value);
        self
    }

    pub fn policies(&self) -> Policies {
        Policies::resolve(|k| self.attribute(k))
    }

    /// Human readable description of the statement and of its bound parameters.
    pub fn debug_dump_params(&self) -> String {
        ParamsDump(self).to_string()
    }

    fn failed(&mut self, error: Error, context: String) -> Error {
        self.error = error
            .downcast_ref::<StatementError>()
            .and_then(StatementError::native)
            .cloned()
            .or_else(|| self.native.last_error());
        log_error!(error.context(context))
    }
}

impl<'c, C: NativeConnection> Debug for Statement<'c, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("mode", self.controller.mode())
            .field("row_count", &self.row_count)
            .finish()
    }
}

struct ParamsDump<'s, 'c, C: NativeConnection>(&'s Statement<'c, C>);

impl<'s, 'c, C: NativeConnection> Display for ParamsDump<'s, 'c, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statement = self.0;
        writeln!(f, "SQL: [{}] {}", statement.sql.len(), statement.sql)?;
        writeln!(f, "Sent SQL: [{}] {}", statement.query.len(), statement.query)?;
        writeln!(f, "Params: {} {}", statement.bound.len(), statement.params)?;
        for (name, (key, bind_type, variable)) in &statement.bound {
            writeln!(
                f,
                "Key: {} name=[{}] {} type={} value={:?}",
                key,
                name.len(),
                name,
                bind_type,
                *variable.lock()
            )?;
        }
        Ok(())
    }
}
