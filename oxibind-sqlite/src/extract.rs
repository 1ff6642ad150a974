use crate::SqliteLob;
use libsqlite3_sys::*;
use oxibind_core::{AsValue, Error, Field, Result, Value};
use std::ffi::{CStr, c_int};

pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<Value> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => sqlite3_column_int64(statement, index).as_value(),
            SQLITE_FLOAT => sqlite3_column_double(statement, index).as_value(),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() {
                    Value::Blob(Some(Box::default()))
                } else {
                    Value::Blob(Some(std::slice::from_raw_parts(ptr, len).into()))
                }
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() {
                    String::new().as_value()
                } else {
                    String::from_utf8_lossy(std::slice::from_raw_parts(ptr, len))
                        .into_owned()
                        .as_value()
                }
            }
            _ => {
                let error = Error::msg(format!("Unexpected column type {}", column_type));
                log::error!("{:#}", error);
                return Err(error);
            }
        })
    }
}

/// The value at `index`, blobs are left behind a large object unless `lobs` is set.
pub(crate) fn extract_field<S>(
    statement: *mut sqlite3_stmt,
    index: c_int,
    lobs: bool,
) -> Result<Field<S>>
where
    S: oxibind_core::NativeStatement<Lob = SqliteLob>,
{
    let value = extract_value(statement, index)?;
    Ok(match value {
        Value::Blob(..) if !lobs => Field::Lob(SqliteLob::stored(value)),
        v => Field::Value(v),
    })
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    unsafe {
        let name = sqlite3_column_name(statement, index);
        if name.is_null() {
            return Ok(format!("column{index}"));
        }
        Ok(CStr::from_ptr(name).to_str()?.into())
    }
}

/// Declared type of the column, empty for expressions.
pub(crate) fn extract_decltype(statement: *mut sqlite3_stmt, index: c_int) -> String {
    unsafe {
        let decltype = sqlite3_column_decltype(statement, index);
        if decltype.is_null() {
            String::new()
        } else {
            CStr::from_ptr(decltype).to_string_lossy().into_owned()
        }
    }
}
