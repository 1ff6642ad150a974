use crate::MemoryConnection;
use oxibind_core::{Driver, Result};

#[derive(Debug, Default)]
pub struct MemoryDriver {}

impl MemoryDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;

    const NAME: &'static str = "memory";

    fn connect(&self, url: &str) -> Result<MemoryConnection> {
        MemoryConnection::connect(url)
    }
}
