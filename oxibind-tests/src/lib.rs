mod binding;
mod failures;
mod fetch_modes;
#[cfg(not(feature = "disable-lobs"))]
mod lobs;
mod policies;
mod simple;

use crate::{
    binding::binding, failures::failures, fetch_modes::fetch_modes, policies::policies,
    simple::simple,
};
#[cfg(not(feature = "disable-lobs"))]
use lobs::lobs;
use log::LevelFilter;
use oxibind::{AsValue, ConnectionExt, FetchedRow, Field, NativeConnection, NativeStatement};
use std::env;

pub use ::log;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the common suite. The backend must execute real SQL (tables, inserts, selects).
pub fn execute_tests<C: NativeConnection>(connection: &C) {
    simple(connection);
    binding(connection);
    fetch_modes(connection);
    policies(connection);
    #[cfg(not(feature = "disable-lobs"))]
    lobs(connection);
    failures(connection);
}

/// Prepare and execute a statement without parameters.
pub fn run<C: NativeConnection>(connection: &C, sql: &str) {
    connection
        .prepare(sql)
        .and_then(|mut v| v.execute())
        .unwrap_or_else(|e| panic!("Could not run `{sql}`: {e:#}"));
}

/// The terminal value at `index` of a fetched row, converted.
pub fn get<T: AsValue, S: NativeStatement>(row: &FetchedRow<S>, index: usize) -> T {
    let value = row
        .get(index)
        .and_then(Field::as_value)
        .cloned()
        .unwrap_or_else(|| panic!("The row {row:?} has no value at {index}"));
    T::try_from_value(value.clone())
        .unwrap_or_else(|e| panic!("Unexpected value {value:?} at {index}: {e:#}"))
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = $crate::log::max_level();
        $crate::log::set_max_level($crate::log::LevelFilter::Off);
        $($code)+
        $crate::log::set_max_level(level);
    }};
}
