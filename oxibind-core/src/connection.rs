use crate::{Error, NativeConnection, Result, Statement, StatementError, log_error};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Statement level operations available on every native connection.
pub trait ConnectionExt: NativeConnection {
    /// Translate and parse `sql` into a new statement borrowing this connection.
    fn prepare(&self, sql: impl Into<String>) -> Result<Statement<'_, Self>> {
        Statement::prepare(self, sql)
    }

    /// Version of the server, parsed from the text it reports.
    fn server_version(&self) -> Result<ServerVersion> {
        self.version_string()?.parse()
    }
}

impl<C: NativeConnection> ConnectionExt for C {}

/// Dotted numeric version, for example `19.3.0.0.0` out of a banner like
/// `Oracle Database 19c Release 19.3.0.0.0 - Production`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    components: Vec<u32>,
}

impl ServerVersion {
    pub fn major(&self) -> u32 {
        self.components[0]
    }
    pub fn minor(&self) -> u32 {
        self.components[1]
    }
    pub fn patch(&self) -> Option<u32> {
        self.components.get(2).copied()
    }
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    /// Takes the first run of at least two dot separated numbers.
    fn from_str(value: &str) -> Result<Self> {
        let found = value
            .split(|c: char| !c.is_ascii_digit() && c != '.')
            .filter_map(|run| {
                let components = run
                    .trim_matches('.')
                    .split('.')
                    .map(str::parse::<u32>)
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .ok()?;
                (components.len() >= 2).then_some(components)
            })
            .next();
        match found {
            Some(components) => Ok(Self { components }),
            None => Err(log_error!(Error::new(
                StatementError::MalformedEnvironmentValue {
                    what: "server version",
                    value: value.to_string(),
                }
            ))),
        }
    }
}

impl Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
