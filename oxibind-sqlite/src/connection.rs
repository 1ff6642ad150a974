use crate::{
    CBox, SqliteDriver, SqliteLob, SqliteStatement, error_message_from_ptr, native_error_of,
};
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_MISUSE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_busy_timeout, sqlite3_errcode, sqlite3_errmsg,
    sqlite3_exec, sqlite3_get_autocommit, sqlite3_libversion, sqlite3_open_v2,
    sqlite3_prepare_v2,
};
use oxibind_core::{
    Attribute, AttributeValue, Attributes, Context, Driver, Error, LobKind, NativeConnection,
    NativeError, Result, native_error, truncate_long,
};
use std::{
    ffi::{CStr, CString, c_int},
    ptr,
};
use url::form_urlencoded;
use urlencoding::decode;

/// Milliseconds a locked database is waited for before failing with `SQLITE_BUSY`.
const DEFAULT_BUSY_TIMEOUT: c_int = 5000;

pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
    attributes: Attributes,
}

impl SqliteConnection {
    /// Open the database named by an url like `sqlite://path/to/file.db?mode=rwc&case=lower`.
    ///
    /// Attribute keys configure the connection and `busy_timeout` sets how long a locked
    /// database is waited for, in milliseconds. The other parameters are handed to sqlite as
    /// uri parameters.
    pub fn connect(url: &str) -> Result<Self> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let decoded = decode(url).with_context(context)?;
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(rest) = decoded.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let mut attributes = Attributes::new();
        let mut pairs = attributes
            .extract_pairs(form_urlencoded::parse(query.as_bytes()))
            .with_context(context)?;
        let mut busy_timeout = DEFAULT_BUSY_TIMEOUT;
        if let Some(i) = pairs.iter().position(|(k, _)| k == "busy_timeout") {
            let (_, value) = pairs.remove(i);
            busy_timeout = match value.parse::<c_int>() {
                Ok(v) if v >= 0 => v,
                _ => {
                    let error = Error::msg(format!(
                        "Invalid busy_timeout `{}`, expected milliseconds",
                        value
                    ))
                    .context(context());
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
        }
        let filename = if pairs.is_empty() {
            format!("file:{}", path)
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.iter())
                .finish();
            format!("file:{}?{}", path, query)
        };
        let filename = CString::new(filename).with_context(context)?;
        let mut connection = CBox::database();
        let rc = unsafe {
            sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Could not allocate the database connection".to_string()
            } else {
                unsafe { error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string() }
            };
            let error = native_error(NativeError::new(rc, message)).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        unsafe {
            sqlite3_busy_timeout(*connection, busy_timeout);
        }
        log::debug!("Connected to {}", truncate_long!(url));
        Ok(Self {
            connection,
            attributes,
        })
    }

    /// Run one or more statements without parameters nor results.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let context = || format!("While executing:\n{}", truncate_long!(sql));
        let sql = CString::new(sql).with_context(context)?;
        let rc = unsafe {
            sqlite3_exec(
                *self.connection,
                sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            let error = native_error(native_error_of(*self.connection)).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        unsafe { sqlite3_get_autocommit(*self.connection) == 0 }
    }

    pub fn commit(&self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.execute_batch("COMMIT")
    }

    pub fn rollback(&self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.execute_batch("ROLLBACK")
    }
}

impl NativeConnection for SqliteConnection {
    type Statement = SqliteStatement;

    fn parse(&self, sql: &str) -> Result<SqliteStatement> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let query = CString::new(sql)
            .context("Could not create a CString from the query String")
            .with_context(context)?;
        let mut statement = CBox::statement();
        let mut tail = ptr::null();
        let rc = unsafe {
            sqlite3_prepare_v2(
                *self.connection,
                query.as_ptr(),
                sql.len() as c_int,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            let error = native_error(native_error_of(*self.connection)).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let remaining = if tail.is_null() {
            ""
        } else {
            unsafe { CStr::from_ptr(tail) }.to_str().unwrap_or_default()
        };
        if !remaining.trim().is_empty() {
            let error =
                Error::msg("Cannot prepare more than one statement at a time").context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(SqliteStatement::new(statement, *self.connection))
    }

    fn new_cursor(&self) -> Result<SqliteStatement> {
        let error = native_error(NativeError::new(
            SQLITE_MISUSE,
            "Sqlite does not support cursor parameters",
        ));
        log::error!("{:#}", error);
        Err(error)
    }

    fn new_lob(&self, kind: LobKind) -> Result<SqliteLob> {
        Ok(SqliteLob::new(kind))
    }

    fn last_error(&self) -> Option<NativeError> {
        let code = unsafe { sqlite3_errcode(*self.connection) };
        match code {
            SQLITE_OK | SQLITE_ROW | SQLITE_DONE => None,
            _ => Some(native_error_of(*self.connection)),
        }
    }

    fn version_string(&self) -> Result<String> {
        let version = unsafe { CStr::from_ptr(sqlite3_libversion()) };
        Ok(format!("SQLite {}", version.to_str()?))
    }

    fn attribute(&self, key: Attribute) -> Option<AttributeValue> {
        self.attributes.get(key).cloned()
    }

    fn set_attribute(&mut self, key: Attribute, value: AttributeValue) -> Result<()> {
        self.attributes.set(key, value);
        Ok(())
    }
}
