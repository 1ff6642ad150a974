use crate::{
    Error, LobKind, NativeConnection, NativeLob, NativeStatement, Result, StatementError, Value,
    log_error,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Key a parameter is bound under: the 1-based position of a `?` or a marker name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindKey {
    Ordinal(usize),
    Name(String),
}

impl From<usize> for BindKey {
    fn from(value: usize) -> Self {
        BindKey::Ordinal(value)
    }
}

impl TryFrom<i32> for BindKey {
    type Error = Error;
    fn try_from(value: i32) -> Result<Self> {
        match usize::try_from(value) {
            Ok(v) => Ok(BindKey::Ordinal(v)),
            Err(..) => Err(log_error!(Error::new(StatementError::InvalidArgument(
                format!("Invalid parameter position {value}")
            )))),
        }
    }
}

impl From<&str> for BindKey {
    fn from(value: &str) -> Self {
        BindKey::Name(value.to_string())
    }
}

impl From<String> for BindKey {
    fn from(value: String) -> Self {
        BindKey::Name(value)
    }
}

impl Display for BindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindKey::Ordinal(v) => write!(f, "{v}"),
            BindKey::Name(v) => f.write_str(v),
        }
    }
}

/// Logical type of a bound parameter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    #[default]
    Scalar,
    LargeObject,
    OutputCursor,
}

impl Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindType::Scalar => "scalar",
            BindType::LargeObject => "lob",
            BindType::OutputCursor => "cursor",
        })
    }
}

/// The native binding strategy selected for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Bind by name, with an explicit maximum length or letting the native layer infer it.
    Scalar { max_length: Option<usize> },
    LargeObject,
    OutputCursor,
}

impl Binding {
    pub fn new(bind_type: BindType, max_length: usize) -> Self {
        match bind_type {
            BindType::Scalar => Binding::Scalar {
                max_length: (max_length > 0).then_some(max_length),
            },
            BindType::LargeObject => Binding::LargeObject,
            BindType::OutputCursor => Binding::OutputCursor,
        }
    }
}

/// Content of a bind variable.
pub enum Bound<S: NativeStatement> {
    Value(Value),
    Lob(S::Lob),
    Cursor(S),
}

impl<S: NativeStatement> Debug for Bound<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Value(v) => write!(f, "{v:?}"),
            Bound::Lob(v) => write!(f, "{}", v.kind()),
            Bound::Cursor(..) => f.write_str("CURSOR"),
        }
    }
}

/// A bind variable shared between the caller and the native statement.
///
/// Binding never copies the content: the native layer keeps a clone of the
/// variable, reads it when executing and writes output parameters back into
/// it. Rebinding is only needed to change the strategy.
pub struct Variable<S: NativeStatement>(Arc<Mutex<Bound<S>>>);

impl<S: NativeStatement> Variable<S> {
    pub fn new(value: impl Into<Value>) -> Self {
        Self::from_bound(Bound::Value(value.into()))
    }

    pub fn from_bound(bound: Bound<S>) -> Self {
        Self(Arc::new(Mutex::new(bound)))
    }

    /// Exclusive access to the content.
    pub fn lock(&self) -> MutexGuard<'_, Bound<S>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value, loading the large object if the variable holds one.
    pub fn value(&self) -> Result<Value> {
        match &mut *self.lock() {
            Bound::Value(v) => Ok(v.clone()),
            Bound::Lob(lob) => lob.load(),
            Bound::Cursor(..) => Err(Error::new(StatementError::InvalidArgument(
                "The variable holds a cursor, not a value".into(),
            ))),
        }
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.lock() = Bound::Value(value.into());
    }

    pub fn replace(&self, bound: Bound<S>) -> Bound<S> {
        std::mem::replace(&mut *self.lock(), bound)
    }

    pub fn is_cursor(&self) -> bool {
        matches!(*self.lock(), Bound::Cursor(..))
    }

    /// Hands out the cursor held by the variable, leaving `fresh` bound in its place.
    ///
    /// The variable keeps holding a cursor, so the statement it is bound to can run again.
    pub fn swap_cursor(&self, fresh: S) -> Option<S> {
        let mut guard = self.lock();
        match &mut *guard {
            Bound::Cursor(cursor) => Some(std::mem::replace(cursor, fresh)),
            _ => None,
        }
    }

    /// Whether both handles point to the same variable.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<S: NativeStatement> Default for Bound<S> {
    fn default() -> Self {
        Bound::Value(Value::Null)
    }
}

impl<S: NativeStatement> Clone for Variable<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: NativeStatement> Debug for Variable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({:?})", *self.lock())
    }
}

impl<S: NativeStatement> From<Value> for Variable<S> {
    fn from(value: Value) -> Self {
        Variable::new(value)
    }
}

/// Values bound by value, kept alive for as long as the statement.
///
/// Binding the same key again replaces the previous slot.
pub struct ValueStore<S: NativeStatement> {
    slots: BTreeMap<BindKey, Variable<S>>,
}

impl<S: NativeStatement> ValueStore<S> {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Store `value` under `key` and return the slot holding it.
    pub fn store(&mut self, key: BindKey, value: Value) -> Variable<S> {
        let variable = Variable::new(value);
        self.slots.insert(key, variable.clone());
        variable
    }

    pub fn get(&self, key: &BindKey) -> Option<&Variable<S>> {
        self.slots.get(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BindKey, &Variable<S>)> {
        self.slots.iter()
    }
}

impl<S: NativeStatement> Default for ValueStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach `variable` to the native statement under `name` using `binding`.
pub fn bind_variable<C: NativeConnection>(
    connection: &C,
    statement: &mut C::Statement,
    name: &str,
    variable: &Variable<C::Statement>,
    binding: Binding,
) -> Result<()> {
    match binding {
        Binding::OutputCursor => {
            let cursor = connection.new_cursor()?;
            variable.replace(Bound::Cursor(cursor));
            statement.bind_cursor(name, variable)
        }
        Binding::LargeObject => {
            let value = variable.value()?;
            let mut lob = connection.new_lob(LobKind::of(&value))?;
            lob.write_temporary(&value)?;
            variable.replace(Bound::Lob(lob));
            statement.bind_lob(name, variable)
        }
        Binding::Scalar { max_length } => statement.bind_by_name(name, variable, max_length),
    }
}
