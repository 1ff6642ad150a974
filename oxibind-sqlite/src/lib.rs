mod cbox;
mod connection;
mod driver;
mod extract;
mod lob;
mod statement;

use libsqlite3_sys::{sqlite3, sqlite3_errmsg, sqlite3_error_offset, sqlite3_extended_errcode};
use oxibind_core::NativeError;
use std::{
    ffi::{CStr, c_char},
    ptr,
};

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;
pub use lob::*;
pub use statement::*;

pub(crate) fn error_message_from_ptr(ptr: &'_ *const c_char) -> &'_ str {
    unsafe {
        if *ptr != ptr::null() {
            CStr::from_ptr(*ptr)
                .to_str()
                .unwrap_or("Unknown error (the error message was not a valid C string)")
        } else {
            "Unknown error (could not extract the error message)"
        }
    }
}

/// Last error reported on `db`.
pub(crate) fn native_error_of(db: *mut sqlite3) -> NativeError {
    unsafe {
        let error = NativeError::new(
            sqlite3_extended_errcode(db),
            error_message_from_ptr(&sqlite3_errmsg(db)),
        );
        match usize::try_from(sqlite3_error_offset(db)) {
            Ok(offset) => error.with_offset(offset),
            Err(..) => error,
        }
    }
}
