use crate::{
    AsValue, ClassDescriptor, Error, NativeStatement, Record, Result, SharedRecord,
    StatementError, Value, log_error,
};
use std::{
    fmt::{self, Debug, Display},
    sync::{Arc, Mutex},
};

/// The recognized fetch modes, without their arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStyle {
    Associative,
    Numeric,
    Both,
    Column,
    Object,
    Into,
    Positional,
}

impl FetchStyle {
    pub const ALL: [FetchStyle; 7] = [
        FetchStyle::Associative,
        FetchStyle::Numeric,
        FetchStyle::Both,
        FetchStyle::Column,
        FetchStyle::Object,
        FetchStyle::Into,
        FetchStyle::Positional,
    ];

    /// Stable numeric code, for callers selecting the mode with an integer.
    pub fn code(&self) -> u32 {
        match self {
            FetchStyle::Associative => 1,
            FetchStyle::Numeric => 2,
            FetchStyle::Both => 3,
            FetchStyle::Column => 4,
            FetchStyle::Object => 5,
            FetchStyle::Into => 6,
            FetchStyle::Positional => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FetchStyle::Associative => "assoc",
            FetchStyle::Numeric => "num",
            FetchStyle::Both => "both",
            FetchStyle::Column => "column",
            FetchStyle::Object => "object",
            FetchStyle::Into => "into",
            FetchStyle::Positional => "positional",
        }
    }
}

impl Display for FetchStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for FetchStyle {
    type Error = Error;
    fn try_from(value: u32) -> Result<Self> {
        FetchStyle::ALL
            .into_iter()
            .find(|v| v.code() == value)
            .ok_or_else(|| {
                log_error!(Error::new(StatementError::UnsupportedMode(
                    value.to_string()
                )))
            })
    }
}

impl TryFrom<i32> for FetchStyle {
    type Error = Error;
    fn try_from(value: i32) -> Result<Self> {
        match u32::try_from(value) {
            Ok(v) => v.try_into(),
            Err(..) => Err(log_error!(Error::new(StatementError::UnsupportedMode(
                value.to_string()
            )))),
        }
    }
}

impl TryFrom<&str> for FetchStyle {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        let lower = value.trim().to_ascii_lowercase();
        let found = match lower.as_str() {
            "associative" => Some(FetchStyle::Associative),
            "numeric" => Some(FetchStyle::Numeric),
            "class" => Some(FetchStyle::Object),
            v => FetchStyle::ALL.into_iter().find(|s| s.name() == v),
        };
        found.ok_or_else(|| {
            log_error!(Error::new(StatementError::UnsupportedMode(
                value.to_string()
            )))
        })
    }
}

/// Argument of a fetch mode selection.
pub enum FetchArg<S: NativeStatement> {
    /// Column index of the `Column` mode, or a single constructor argument of the `Object` mode.
    Value(Value),
    Class(ClassDescriptor<S>),
    /// Constructor arguments of the `Object` mode.
    Args(Vec<Value>),
    /// Existing record of the `Into` mode.
    Target(SharedRecord<S>),
}

impl<S: NativeStatement> FetchArg<S> {
    fn kind(&self) -> &'static str {
        match self {
            FetchArg::Value(..) => "value",
            FetchArg::Class(..) => "class descriptor",
            FetchArg::Args(..) => "argument list",
            FetchArg::Target(..) => "target object",
        }
    }

    /// Wraps a record into the target argument of the `Into` mode.
    pub fn target<R: Record<S>>(record: &Arc<Mutex<R>>) -> Self {
        FetchArg::Target(record.clone())
    }
}

impl<S: NativeStatement> From<Value> for FetchArg<S> {
    fn from(value: Value) -> Self {
        FetchArg::Value(value)
    }
}

macro_rules! impl_fetch_arg_value {
    ($($source:ty),+ $(,)?) => {
        $(
            impl<S: NativeStatement> From<$source> for FetchArg<S> {
                fn from(value: $source) -> Self {
                    FetchArg::Value(value.into())
                }
            }
        )+
    };
}

impl_fetch_arg_value!(i32, i64, usize, &str, String);

impl<S: NativeStatement> From<ClassDescriptor<S>> for FetchArg<S> {
    fn from(value: ClassDescriptor<S>) -> Self {
        FetchArg::Class(value)
    }
}

impl<S: NativeStatement> From<Vec<Value>> for FetchArg<S> {
    fn from(value: Vec<Value>) -> Self {
        FetchArg::Args(value)
    }
}

impl<S: NativeStatement> From<SharedRecord<S>> for FetchArg<S> {
    fn from(value: SharedRecord<S>) -> Self {
        FetchArg::Target(value)
    }
}

impl<S: NativeStatement> Debug for FetchArg<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchArg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FetchArg::Class(v) => f.debug_tuple("Class").field(v).finish(),
            FetchArg::Args(v) => f.debug_tuple("Args").field(v).finish(),
            FetchArg::Target(..) => f.write_str("Target(..)"),
        }
    }
}

/// The active fetch mode together with its own parameters.
pub enum FetchMode<S: NativeStatement> {
    Associative,
    Numeric,
    Both,
    Positional,
    Column(usize),
    Object {
        /// `None` builds an [`crate::AnonymousRecord`].
        class: Option<ClassDescriptor<S>>,
        args: Vec<Value>,
    },
    Into(SharedRecord<S>),
}

impl<S: NativeStatement> FetchMode<S> {
    /// Validate `args` for `style` and build the mode, nothing is retained on failure.
    pub fn resolve(style: FetchStyle, args: Vec<FetchArg<S>>) -> Result<Self> {
        let invalid = |message: String| {
            log_error!(Error::new(StatementError::InvalidArgument(message)))
        };
        let mut args = args.into_iter();
        let result = match style {
            FetchStyle::Associative => FetchMode::Associative,
            FetchStyle::Numeric => FetchMode::Numeric,
            FetchStyle::Both => FetchMode::Both,
            FetchStyle::Positional => FetchMode::Positional,
            FetchStyle::Column => match args.next() {
                None => FetchMode::Column(0),
                Some(FetchArg::Value(v)) => {
                    let index = usize::try_from_value(v.clone()).map_err(|e| {
                        invalid(format!("Column index {v} is not a non negative integer: {e:#}"))
                    })?;
                    FetchMode::Column(index)
                }
                Some(other) => {
                    return Err(invalid(format!(
                        "The column mode expects a column index, got a {}",
                        other.kind()
                    )));
                }
            },
            FetchStyle::Object => {
                let mut class = None;
                let mut ctor_args = Vec::new();
                for (i, arg) in args.by_ref().enumerate() {
                    match arg {
                        FetchArg::Class(v) if i == 0 => class = Some(v),
                        FetchArg::Value(Value::Null) if i == 0 => {}
                        FetchArg::Args(v) => ctor_args.extend(v),
                        FetchArg::Value(v) => ctor_args.push(v),
                        other => {
                            return Err(invalid(format!(
                                "The object mode does not accept a {} as argument {}",
                                other.kind(),
                                i + 1
                            )));
                        }
                    }
                }
                FetchMode::Object {
                    class,
                    args: ctor_args,
                }
            }
            FetchStyle::Into => match args.next() {
                Some(FetchArg::Target(target)) => FetchMode::Into(target),
                Some(other) => {
                    return Err(invalid(format!(
                        "The into mode expects an existing object, got a {}",
                        other.kind()
                    )));
                }
                None => {
                    return Err(invalid("The into mode expects an existing object".into()));
                }
            },
        };
        if let Some(extra) = args.next() {
            return Err(invalid(format!(
                "Unexpected {} argument for the {} mode",
                extra.kind(),
                style
            )));
        }
        Ok(result)
    }

    pub fn style(&self) -> FetchStyle {
        match self {
            FetchMode::Associative => FetchStyle::Associative,
            FetchMode::Numeric => FetchStyle::Numeric,
            FetchMode::Both => FetchStyle::Both,
            FetchMode::Positional => FetchStyle::Positional,
            FetchMode::Column(..) => FetchStyle::Column,
            FetchMode::Object { .. } => FetchStyle::Object,
            FetchMode::Into(..) => FetchStyle::Into,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            FetchMode::Column(v) => Some(*v),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&ClassDescriptor<S>> {
        match self {
            FetchMode::Object { class, .. } => class.as_ref(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&SharedRecord<S>> {
        match self {
            FetchMode::Into(v) => Some(v),
            _ => None,
        }
    }
}

impl<S: NativeStatement> Default for FetchMode<S> {
    fn default() -> Self {
        FetchMode::Both
    }
}

impl<S: NativeStatement> Clone for FetchMode<S> {
    fn clone(&self) -> Self {
        match self {
            FetchMode::Associative => FetchMode::Associative,
            FetchMode::Numeric => FetchMode::Numeric,
            FetchMode::Both => FetchMode::Both,
            FetchMode::Positional => FetchMode::Positional,
            FetchMode::Column(v) => FetchMode::Column(*v),
            FetchMode::Object { class, args } => FetchMode::Object {
                class: class.clone(),
                args: args.clone(),
            },
            FetchMode::Into(v) => FetchMode::Into(v.clone()),
        }
    }
}

impl<S: NativeStatement> Debug for FetchMode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Column(v) => write!(f, "Column({v})"),
            FetchMode::Object { class, args } => f
                .debug_struct("Object")
                .field("class", class)
                .field("args", args)
                .finish(),
            FetchMode::Into(..) => f.write_str("Into(..)"),
            v => write!(f, "{:?}", v.style()),
        }
    }
}

/// Holds the fetch mode of a statement.
///
/// Every transition is allowed, only the arguments are checked.
pub struct FetchModeController<S: NativeStatement> {
    mode: FetchMode<S>,
}

impl<S: NativeStatement> FetchModeController<S> {
    pub fn new(mode: FetchMode<S>) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &FetchMode<S> {
        &self.mode
    }

    /// Replace the current mode, leaving it untouched if `style` or `args` are rejected.
    pub fn set_fetch_mode<M>(&mut self, style: M, args: Vec<FetchArg<S>>) -> Result<()>
    where
        M: TryInto<FetchStyle>,
        M::Error: Into<Error>,
    {
        let style = style.try_into().map_err(Into::into)?;
        self.mode = FetchMode::resolve(style, args)?;
        log::trace!("Fetch mode set to {:?}", self.mode);
        Ok(())
    }
}

impl<S: NativeStatement> Default for FetchModeController<S> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<S: NativeStatement> Debug for FetchModeController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchModeController")
            .field("mode", &self.mode)
            .finish()
    }
}
