use crate::{Error, Result, Value, consume_while, truncate_long};
use anyhow::Context;
use atoi::FromRadix10Signed;
use fast_float::parse_partial;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow};
use time::format_description::parse_borrowed;
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// used for bound parameters and fetched fields.
///
/// # Parsing contract
/// - `parse` delegates to `extract` then verifies the slice is exhausted.
/// - `extract` MUST update the input slice only on success.
///
/// # Examples
/// ```rust
/// use oxibind_core::{AsValue, Value};
/// let v = 42i64.as_value();
/// assert!(matches!(v, Value::Int64(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`. Text values are
    /// parsed, which is how loosely typed arguments (a column index given as
    /// `"2"`) get coerced.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        let mut value = input.as_ref();
        let result = Self::extract(&mut value)?;
        if !value.is_empty() {
            return Err(Error::msg(format!(
                "Value `{}` parsed correctly as {} but it did not consume all the input (remaining: `{}`)",
                truncate_long!(input.as_ref()),
                any::type_name::<Self>(),
                truncate_long!(value),
            )));
        }
        Ok(result)
    }
    fn extract(value: &mut &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse '{value}' as {}",
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(Some(value.into()))
    }
}

macro_rules! extract_integer {
    ($input:expr, $source:ty) => {{
        let value = $input.trim_start();
        let (num, tail) = i128::from_radix_10_signed(value.as_bytes());
        if tail == 0 {
            return Err(Error::msg(format!(
                "Cannot extract {} from `{}`",
                any::type_name::<$source>(),
                truncate_long!(value),
            )));
        }
        if num < <$source>::MIN as i128 || num > <$source>::MAX as i128 {
            return Err(Error::msg(format!(
                "Parsed integer {} is out of range for {}",
                &value[..tail],
                any::type_name::<$source>(),
            )));
        }
        *$input = &value[tail..];
        Ok(num as $source)
    }};
}

impl AsValue for i64 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as _),
            Value::Boolean(Some(v)) => Ok(v as _),
            Value::Float64(Some(v)) if v.fract() == 0.0 => Ok(v as _),
            Value::Decimal(Some(v)) => {
                let error = Error::msg(format!("Value {v}: Decimal does not fit into i64"));
                if !v.is_integer() {
                    return Err(error.context("The value is not a integer"));
                }
                v.to_i64().ok_or(error)
            }
            Value::Varchar(Some(ref v)) => Self::parse(v.trim()),
            _ => Err(Error::msg(format!(
                "Cannot convert {value:?} to {}",
                any::type_name::<Self>(),
            ))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        extract_integer!(input, i64)
    }
}

impl AsValue for i32 {
    fn as_empty_value() -> Value {
        Value::Int32(None)
    }
    fn as_value(self) -> Value {
        Value::Int32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int32(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Self::parse(v.trim()),
            v => {
                let wide = i64::try_from_value(v)?;
                i32::try_from(wide)
                    .map_err(|_| Error::msg(format!("Value {wide}: i64 is out of range for i32")))
            }
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        extract_integer!(input, i32)
    }
}

macro_rules! impl_as_value_narrow {
    ($source:ty, $destination:path, $wide:ty) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self as _))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                let wide = <$wide>::try_from_value(value)?;
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}
impl_as_value_narrow!(i8, Value::Int32, i32);
impl_as_value_narrow!(i16, Value::Int32, i32);
impl_as_value_narrow!(u8, Value::Int32, i32);
impl_as_value_narrow!(u16, Value::Int32, i32);
impl_as_value_narrow!(u32, Value::Int64, i64);

impl AsValue for usize {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self as _))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let wide = i64::try_from_value(value)?;
        usize::try_from(wide)
            .map_err(|_| Error::msg(format!("Value {wide} is out of range for usize")))
    }
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to bool"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let mut value = *input;
        let result = consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
        let result = match result {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x.eq("1") => {
                true
            }
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x.eq("0") => {
                false
            }
            _ => return Err(Error::msg(format!("Cannot parse boolean from '{input}'"))),
        };
        *input = value;
        Ok(result)
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as _),
            Value::Int64(Some(v)) => Ok(v as _),
            Value::Decimal(Some(v)) => Ok(v.try_into()?),
            Value::Varchar(Some(ref v)) => Self::parse(v.trim()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to f64"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let value = *input;
        let (num, tail) = parse_partial::<f64, _>(value).with_context(|| {
            format!(
                "Cannot extract a floating point value from `{}`",
                truncate_long!(value)
            )
        })?;
        *input = &value[tail..];
        Ok(num)
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self as _))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        f64::try_from_value(value).map(|v| v as _)
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(Decimal::new(v as i64, 0)),
            Value::Int64(Some(v)) => Ok(Decimal::new(v, 0)),
            Value::Float64(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Cannot convert {value:?} to Decimal"))),
            Value::Varchar(Some(ref v)) => v
                .trim()
                .parse::<Decimal>()
                .with_context(|| format!("Cannot parse `{}` as Decimal", truncate_long!(v))),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Decimal"))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec())
                .map_err(|e| Error::new(e).context("Binary content is not valid UTF-8 text")),
            v if !v.is_null() => Ok(match v {
                Value::Boolean(Some(v)) => (if v { "1" } else { "0" }).into(),
                Value::Int32(Some(v)) => v.to_string(),
                Value::Int64(Some(v)) => v.to_string(),
                Value::Float64(Some(v)) => v.to_string(),
                Value::Decimal(Some(v)) => v.to_string(),
                Value::Date(Some(v)) => v.to_string(),
                Value::Time(Some(v)) => v.to_string(),
                Value::Timestamp(Some(v)) => v.to_string(),
                Value::Uuid(Some(v)) => v.to_string(),
                _ => unreachable!("every non null variant is covered above"),
            }),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to String"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let result = input.to_string();
        *input = "";
        Ok(result)
    }
}

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to binary"))),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v.trim())
                .with_context(|| format!("Cannot parse `{}` as uuid", truncate_long!(v))),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Uuid"))),
        }
    }
}

macro_rules! parse_time {
    ($value:ident, $($formats:literal),+ $(,)?) => {
        'value: {
            for format in [$($formats,)+] {
                let format = parse_borrowed::<2>(format)?;
                let mut parsed = time::parsing::Parsed::new();
                let remaining = parsed.parse_items($value.as_bytes(), &format);
                if let Ok(remaining) = remaining {
                    let result = parsed.try_into()?;
                    *$value = &$value[($value.len() - remaining.len())..];
                    break 'value Ok(result);
                }
            }
            Err(Error::msg(format!(
                "Cannot extract from `{}` as {}",
                $value,
                any::type_name::<Self>()
            )))
        }
    }
}

macro_rules! impl_as_value_temporal {
    ($source:ty, $destination:path, $($formats:literal),+ $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v.trim()),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn extract(v: &mut &str) -> Result<Self> {
                parse_time!(v, $($formats),+)
            }
        }
    };
}
impl_as_value_temporal!(time::Date, Value::Date, "[year]-[month]-[day]");
impl_as_value_temporal!(
    time::Time,
    Value::Time,
    "[hour]:[minute]:[second].[subsecond]",
    "[hour]:[minute]:[second]",
    "[hour]:[minute]",
);
impl_as_value_temporal!(
    time::PrimitiveDateTime,
    Value::Timestamp,
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
    "[year]-[month]-[day]T[hour]:[minute]:[second]",
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
    "[year]-[month]-[day] [hour]:[minute]:[second]",
);

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
}
