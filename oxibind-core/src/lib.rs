mod as_value;
mod attribute;
mod bind;
mod connection;
mod error;
mod fetch_mode;
pub mod materialize;
mod native;
mod placeholder;
mod record;
mod row;
mod statement;
mod util;
mod value;

pub use ::anyhow::Context;
pub use ::log;
pub use as_value::*;
pub use attribute::*;
pub use bind::*;
pub use connection::*;
pub use error::*;
pub use fetch_mode::*;
pub use native::*;
pub use placeholder::*;
pub use record::*;
pub use row::*;
pub use statement::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
