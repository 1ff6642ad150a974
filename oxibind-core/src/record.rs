use crate::{Error, Field, NativeStatement, Result, StatementError, Value};
use std::{
    any::Any,
    fmt::{self, Debug},
    sync::{Arc, Mutex},
};

/// Destination of the object fetch shapes.
///
/// Every fetched column is assigned by name, after the name was folded and the
/// value normalized. Implementations decide what to do with unknown names.
pub trait Record<S: NativeStatement>: Any + Send {
    fn assign(&mut self, name: &str, field: Field<S>) -> Result<()>;
}

impl<S: NativeStatement> dyn Record<S> {
    pub fn downcast_ref<T: Record<S>>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    pub fn downcast_mut<T: Record<S>>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}

/// A record shared with the caller, target of the `Into` fetch mode.
pub type SharedRecord<S> = Arc<Mutex<dyn Record<S>>>;

/// Record created when no class is requested: the columns in fetch order.
pub struct AnonymousRecord<S: NativeStatement> {
    fields: Vec<(String, Field<S>)>,
}

impl<S: NativeStatement> AnonymousRecord<S> {
    pub fn new() -> Self {
        Self {
            fields: Default::default(),
        }
    }
    pub fn get(&self, name: &str) -> Option<&Field<S>> {
        self.fields
            .iter()
            .find_map(|(k, v)| if k == name { Some(v) } else { None })
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn into_fields(self) -> Vec<(String, Field<S>)> {
        self.fields
    }
}

impl<S: NativeStatement> Default for AnonymousRecord<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NativeStatement> Record<S> for AnonymousRecord<S> {
    fn assign(&mut self, name: &str, field: Field<S>) -> Result<()> {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = field,
            None => self.fields.push((name.to_string(), field)),
        }
        Ok(())
    }
}

impl<S: NativeStatement> Debug for AnonymousRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

type Constructor<S> = dyn Fn(&[Value]) -> Result<Box<dyn Record<S>>> + Send + Sync;

/// Builds the record of each row fetched in the `Object` mode, receiving the constructor arguments.
pub struct ClassDescriptor<S: NativeStatement> {
    name: Arc<str>,
    construct: Arc<Constructor<S>>,
}

impl<S: NativeStatement> ClassDescriptor<S> {
    pub fn new<F, R>(name: impl Into<Arc<str>>, construct: F) -> Self
    where
        F: Fn(&[Value]) -> Result<R> + Send + Sync + 'static,
        R: Record<S>,
    {
        Self {
            name: name.into(),
            construct: Arc::new(move |args: &[Value]| {
                Ok(Box::new(construct(args)?) as Box<dyn Record<S>>)
            }),
        }
    }

    /// Descriptor building `T::default()`, it refuses constructor arguments.
    pub fn of<T: Record<S> + Default>() -> Self {
        Self::new(std::any::type_name::<T>(), |args: &[Value]| {
            if !args.is_empty() {
                return Err(Error::new(StatementError::InvalidArgument(format!(
                    "{} takes no constructor arguments, {} given",
                    std::any::type_name::<T>(),
                    args.len()
                ))));
            }
            Ok(T::default())
        })
    }

    pub fn anonymous() -> Self {
        Self::of::<AnonymousRecord<S>>()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self, args: &[Value]) -> Result<Box<dyn Record<S>>> {
        (self.construct)(args)
    }
}

impl<S: NativeStatement> Clone for ClassDescriptor<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            construct: self.construct.clone(),
        }
    }
}

impl<S: NativeStatement> Debug for ClassDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassDescriptor({})", self.name)
    }
}
