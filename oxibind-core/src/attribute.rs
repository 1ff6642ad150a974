use crate::{AsValue, Error, FetchStyle, Result, StatementError, Value, log_error};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

/// Configuration keys understood by the statement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    /// Case folding applied to fetched column names.
    Case,
    /// Null and empty string conversions applied to fetched values.
    Nulls,
    /// Fetch mode a new statement starts with.
    DefaultFetchMode,
    /// Load large objects into plain values while fetching.
    ReturnLobs,
    /// Apply the `Nulls` policy to every fetch shape instead of only the object shapes.
    UniformNulls,
    /// Commit after every successful execution.
    Autocommit,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Case,
        Attribute::Nulls,
        Attribute::DefaultFetchMode,
        Attribute::ReturnLobs,
        Attribute::UniformNulls,
        Attribute::Autocommit,
    ];

    /// Name used in connection urls.
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::Case => "case",
            Attribute::Nulls => "nulls",
            Attribute::DefaultFetchMode => "fetch",
            Attribute::ReturnLobs => "lobs",
            Attribute::UniformNulls => "uniform_nulls",
            Attribute::Autocommit => "autocommit",
        }
    }

    pub fn from_key(key: &str) -> Option<Attribute> {
        Self::ALL
            .into_iter()
            .find(|v| v.key().eq_ignore_ascii_case(key))
    }

    /// Parse the textual form of a value for this attribute.
    pub fn parse_value(&self, value: &str) -> Result<AttributeValue> {
        let invalid = || {
            log_error!(Error::new(StatementError::InvalidArgument(format!(
                "`{}` is not a valid value for the attribute `{}`",
                value,
                self.key()
            ))))
        };
        Ok(match self {
            Attribute::Case => AttributeValue::Case(match value.to_ascii_lowercase().as_str() {
                "natural" => Case::Natural,
                "lower" => Case::Lower,
                "upper" => Case::Upper,
                _ => return Err(invalid()),
            }),
            Attribute::Nulls => AttributeValue::Nulls(match value.to_ascii_lowercase().as_str() {
                "natural" => Nulls::Natural,
                "empty" | "empty_string" => Nulls::EmptyToNull,
                "string" | "to_string" => Nulls::NullToString,
                _ => return Err(invalid()),
            }),
            Attribute::DefaultFetchMode => AttributeValue::FetchStyle(value.try_into()?),
            Attribute::ReturnLobs | Attribute::UniformNulls | Attribute::Autocommit => {
                AttributeValue::Flag(bool::parse(value).map_err(|_| invalid())?)
            }
        })
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Case folding policy for column names.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    #[default]
    Natural,
    Lower,
    Upper,
}

impl Case {
    pub fn fold(&self, name: &str) -> String {
        match self {
            Case::Natural => name.to_string(),
            Case::Lower => name.to_lowercase(),
            Case::Upper => name.to_uppercase(),
        }
    }
}

/// Null handling policy for fetched values.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    #[default]
    Natural,
    /// Empty text becomes NULL.
    EmptyToNull,
    /// NULL becomes empty text.
    NullToString,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Case(Case),
    Nulls(Nulls),
    FetchStyle(FetchStyle),
    Flag(bool),
}

impl From<Case> for AttributeValue {
    fn from(value: Case) -> Self {
        AttributeValue::Case(value)
    }
}

impl From<Nulls> for AttributeValue {
    fn from(value: Nulls) -> Self {
        AttributeValue::Nulls(value)
    }
}

impl From<FetchStyle> for AttributeValue {
    fn from(value: FetchStyle) -> Self {
        AttributeValue::FetchStyle(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Case(v) => format!("{v:?}").as_value(),
            AttributeValue::Nulls(v) => format!("{v:?}").as_value(),
            AttributeValue::FetchStyle(v) => Value::from(v.name()),
            AttributeValue::Flag(v) => v.as_value(),
        }
    }
}

/// Connection level configuration store.
#[derive(Default, Debug, Clone)]
pub struct Attributes {
    values: BTreeMap<Attribute, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, key: Attribute) -> Option<&AttributeValue> {
        self.values.get(&key)
    }

    pub fn set(&mut self, key: Attribute, value: impl Into<AttributeValue>) -> &mut Self {
        self.values.insert(key, value.into());
        self
    }

    /// Consumes the query pairs naming a known attribute and returns the others untouched.
    pub fn extract_pairs<K, V>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Vec<(String, String)>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut rest = Vec::new();
        for (k, v) in pairs {
            match Attribute::from_key(k.as_ref()) {
                Some(key) => {
                    let value = key.parse_value(v.as_ref())?;
                    self.values.insert(key, value);
                }
                None => rest.push((k.as_ref().to_string(), v.as_ref().to_string())),
            }
        }
        Ok(rest)
    }
}

/// Effective fetch policies, resolved once per fetched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policies {
    pub case: Case,
    pub nulls: Nulls,
    pub return_lobs: bool,
    pub uniform_nulls: bool,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            case: Case::Natural,
            nulls: Nulls::Natural,
            return_lobs: true,
            uniform_nulls: false,
        }
    }
}

impl Policies {
    /// Build the policies from an attribute lookup, missing keys keep their defaults.
    pub fn resolve(lookup: impl Fn(Attribute) -> Option<AttributeValue>) -> Self {
        let mut result = Self::default();
        if let Some(AttributeValue::Case(v)) = lookup(Attribute::Case) {
            result.case = v;
        }
        if let Some(AttributeValue::Nulls(v)) = lookup(Attribute::Nulls) {
            result.nulls = v;
        }
        if let Some(AttributeValue::Flag(v)) = lookup(Attribute::ReturnLobs) {
            result.return_lobs = v;
        }
        if let Some(AttributeValue::Flag(v)) = lookup(Attribute::UniformNulls) {
            result.uniform_nulls = v;
        }
        result
    }
}
