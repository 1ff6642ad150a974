mod connection;
mod driver;
mod invocation;
mod lob;
mod result_set;
mod statement;

pub use connection::*;
pub use driver::*;
pub use invocation::*;
pub use lob::*;
pub use result_set::*;
pub use statement::*;
