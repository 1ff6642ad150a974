use crate::{Execution, Invocation, MemoryDriver, MemoryLob, MemoryStatement, Procedure, ResultSet};
use oxibind_core::{
    Attribute, AttributeValue, Attributes, Context, Driver, Error, LobKind, NativeConnection,
    NativeError, Result, translate, truncate_long,
};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use url::Url;
use urlencoding::decode;

const DEFAULT_VERSION: &str = "Oxibind Memory Release 1.0.0 - Production";

#[derive(Default)]
pub(crate) struct Shared {
    procedures: Mutex<HashMap<String, Procedure>>,
    executions: Mutex<Vec<Execution>>,
    last_error: Mutex<Option<NativeError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Statement text as used to look up procedures: placeholders translated, whitespace collapsed.
fn procedure_key(sql: &str) -> String {
    translate(sql)
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Shared {
    pub(crate) fn procedure(&self, sql: &str) -> Option<Procedure> {
        lock(&self.procedures).get(&procedure_key(sql)).cloned()
    }

    pub(crate) fn record(&self, execution: Execution) {
        lock(&self.executions).push(execution);
    }

    pub(crate) fn set_last_error(&self, error: NativeError) {
        *lock(&self.last_error) = Some(error);
    }
}

/// Connection of the memory backend.
///
/// Statements are scripted: each statement text is registered with the
/// procedure run when it is executed, see [`MemoryConnection::register`].
pub struct MemoryConnection {
    shared: Arc<Shared>,
    attributes: Attributes,
    version: String,
}

impl fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("procedures", &lock(&self.shared.procedures).len())
            .field("attributes", &self.attributes)
            .field("version", &self.version)
            .finish()
    }
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            shared: Default::default(),
            attributes: Attributes::new(),
            version: DEFAULT_VERSION.into(),
        }
    }

    /// Connect using an url like `memory://?case=lower&fetch=assoc`.
    ///
    /// Attribute keys configure the connection, `version` replaces the reported server version.
    pub fn connect(url: &str) -> Result<Self> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let decoded = decode(url).with_context(context)?;
        let prefix = format!("{}://", MemoryDriver::NAME);
        if !decoded.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Memory connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let parsed = Url::parse(&decoded).with_context(context)?;
        let mut result = Self::new();
        let rest = result
            .attributes
            .extract_pairs(parsed.query_pairs())
            .with_context(context)?;
        for (key, value) in rest {
            match key.as_str() {
                "version" => result.version = value,
                _ => log::warn!("Ignoring the unknown connection parameter `{key}`"),
            }
        }
        log::debug!("Connected to {}", truncate_long!(url));
        Ok(result)
    }

    /// Run `procedure` whenever `sql` is executed. Both `?` and `:paramN` forms match.
    pub fn register<F>(&self, sql: &str, procedure: F) -> &Self
    where
        F: Fn(&mut Invocation<'_>) -> std::result::Result<(), NativeError> + Send + Sync + 'static,
    {
        lock(&self.shared.procedures).insert(procedure_key(sql), Arc::new(procedure));
        self
    }

    /// Register a statement always returning `rows`.
    pub fn register_rows(&self, sql: &str, rows: ResultSet) -> &Self {
        self.register(sql, move |invocation| {
            invocation.rows(rows.clone());
            Ok(())
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Executions recorded so far, oldest first.
    pub fn executions(&self) -> Vec<Execution> {
        lock(&self.shared.executions).clone()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeConnection for MemoryConnection {
    type Statement = MemoryStatement;

    fn parse(&self, sql: &str) -> Result<MemoryStatement> {
        Ok(MemoryStatement::query(self.shared.clone(), sql))
    }

    fn new_cursor(&self) -> Result<MemoryStatement> {
        Ok(MemoryStatement::cursor(self.shared.clone(), None))
    }

    fn new_lob(&self, kind: LobKind) -> Result<MemoryLob> {
        Ok(MemoryLob::new(kind))
    }

    fn last_error(&self) -> Option<NativeError> {
        lock(&self.shared.last_error).clone()
    }

    fn version_string(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    fn attribute(&self, key: Attribute) -> Option<AttributeValue> {
        self.attributes.get(key).cloned()
    }

    fn set_attribute(&mut self, key: Attribute, value: AttributeValue) -> Result<()> {
        self.attributes.set(key, value);
        Ok(())
    }
}
