use crate::{
    Attribute, AttributeValue, NativeError, NativeRow, Result, StatementError, Value, Variable,
};
use std::fmt::{self, Display};

/// Commit behaviour requested from the native layer when executing.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    /// Commit after every successful execution.
    #[default]
    AutoCommit,
    /// Leave the transaction open, the caller commits.
    NoAutoCommit,
}

/// Flags passed down to the native row fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchFlags {
    /// Keep NULL fields in the row instead of omitting them.
    pub nulls: bool,
    /// Return large objects already loaded as plain values.
    pub lobs: bool,
}

impl FetchFlags {
    pub const DEFAULT: FetchFlags = FetchFlags {
        nulls: true,
        lobs: false,
    };
    pub const RAW: FetchFlags = FetchFlags {
        nulls: true,
        lobs: true,
    };
}

impl Default for FetchFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    Binary,
    Character,
}

impl LobKind {
    /// Storage kind able to hold `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Varchar(..) => LobKind::Character,
            _ => LobKind::Binary,
        }
    }
}

impl Display for LobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LobKind::Binary => "BLOB",
            LobKind::Character => "CLOB",
        })
    }
}

/// Description of a result column.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub native_type: String,
    pub len: Option<usize>,
    pub precision: Option<u32>,
    pub scale: Option<i32>,
    pub nullable: bool,
}

/// A backend able to open connections.
pub trait Driver {
    type Connection: NativeConnection;

    /// Scheme expected at the start of connection urls.
    const NAME: &'static str;

    fn connect(&self, url: &str) -> Result<Self::Connection>;
}

/// The native connection handle.
///
/// Statements only ever borrow it: it allocates statement, cursor and large
/// object resources and holds the configuration store read by
/// [`crate::Statement::attribute`].
pub trait NativeConnection: Sized {
    type Statement: NativeStatement;

    /// Parse the statement text into a new native statement handle.
    fn parse(&self, sql: &str) -> Result<Self::Statement>;
    /// Allocate a cursor handle, to be bound as an output cursor parameter.
    fn new_cursor(&self) -> Result<Self::Statement>;
    /// Allocate an empty large object descriptor.
    fn new_lob(&self, kind: LobKind) -> Result<<Self::Statement as NativeStatement>::Lob>;
    fn last_error(&self) -> Option<NativeError>;
    /// Version string as reported by the server.
    fn version_string(&self) -> Result<String>;
    fn attribute(&self, key: Attribute) -> Option<AttributeValue>;
    fn set_attribute(&mut self, key: Attribute, value: AttributeValue) -> Result<()>;

    fn execute_mode(&self) -> ExecuteMode {
        match self.attribute(Attribute::Autocommit) {
            Some(AttributeValue::Flag(false)) => ExecuteMode::NoAutoCommit,
            _ => ExecuteMode::AutoCommit,
        }
    }
}

/// The native statement handle, exclusively owned by one [`crate::Statement`].
///
/// Dropping it must release the native resource.
pub trait NativeStatement: Sized + Send + 'static {
    type Lob: NativeLob;

    /// Bind a scalar variable. The value is read when executing and, for
    /// output parameters, written back into the same variable.
    fn bind_by_name(
        &mut self,
        name: &str,
        variable: &Variable<Self>,
        max_length: Option<usize>,
    ) -> Result<()>;
    /// Bind the large object descriptor held by `variable`.
    fn bind_lob(&mut self, name: &str, variable: &Variable<Self>) -> Result<()>;
    /// Bind the cursor handle held by `variable` as an output cursor.
    fn bind_cursor(&mut self, name: &str, variable: &Variable<Self>) -> Result<()>;
    fn execute(&mut self, mode: ExecuteMode) -> Result<()>;
    /// Fetch the next row, `None` when there are no more rows.
    fn fetch_row(&mut self, flags: FetchFlags) -> Result<Option<NativeRow<Self>>>;
    fn column_count(&self) -> Result<usize>;
    fn column_meta(&self, index: usize) -> Result<Option<ColumnMeta>>;
    fn rows_affected(&self) -> Result<u64>;
    /// Discard the pending rows, the handle stays usable for another execution.
    fn free_result(&mut self) -> Result<()>;
    fn last_error(&self) -> Option<NativeError>;
}

/// A large object descriptor.
pub trait NativeLob: Send + 'static {
    fn kind(&self) -> LobKind;
    /// Store `value` in temporary storage owned by the descriptor.
    fn write_temporary(&mut self, value: &Value) -> Result<()>;
    /// Read the whole content.
    fn load(&mut self) -> Result<Value>;
    fn len(&self) -> Result<u64>;
}

/// Bind variable name without the leading colon.
pub fn bind_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

/// Wraps a native error into the error returned by every native call.
pub fn native_error(error: NativeError) -> crate::Error {
    crate::Error::new(StatementError::ExecutionFailure(error))
}
