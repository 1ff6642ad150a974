//! Oxibind: prepared statements over named-bind native database interfaces.
//!
//! Statements are written with `?` placeholders or `:name` markers, parameters
//! are bound by value or by reference and rows are fetched in the shape
//! selected by the fetch mode. A backend implements [`NativeConnection`] and
//! [`NativeStatement`], everything else is shared.
//!
//! ```rust,ignore
//! use oxibind::{ConnectionExt, FetchStyle};
//!
//! let mut statement = connection.prepare("SELECT name FROM planet WHERE moons > ?")?;
//! statement.execute_with([0])?;
//! for row in statement.fetch_all_with(FetchStyle::Column, vec![])? {
//!     println!("{row:?}");
//! }
//! ```

pub use oxibind_core::*;
