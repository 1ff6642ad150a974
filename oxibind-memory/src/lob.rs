use oxibind_core::{LobKind, NativeError, NativeLob, Result, Value, native_error};

/// Large object descriptor holding its content in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLob {
    kind: LobKind,
    content: Option<Value>,
    temporary: bool,
}

impl MemoryLob {
    pub fn new(kind: LobKind) -> Self {
        Self {
            kind,
            content: None,
            temporary: false,
        }
    }

    /// Descriptor over content already stored, as returned by a fetch.
    pub fn stored(value: Value) -> Self {
        Self {
            kind: LobKind::of(&value),
            content: Some(value),
            temporary: false,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl NativeLob for MemoryLob {
    fn kind(&self) -> LobKind {
        self.kind
    }

    fn write_temporary(&mut self, value: &Value) -> Result<()> {
        let value = match (self.kind, value) {
            (_, v) if v.is_null() => v.clone(),
            (LobKind::Character, Value::Varchar(..)) | (LobKind::Binary, Value::Blob(..)) => {
                value.clone()
            }
            (LobKind::Binary, Value::Varchar(Some(v))) => Value::Blob(Some(v.as_bytes().into())),
            (kind, v) => {
                let error = native_error(NativeError::new(
                    932,
                    format!("inconsistent datatypes: expected {} got {}", kind, v.type_name()),
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        self.content = Some(value);
        self.temporary = true;
        Ok(())
    }

    fn load(&mut self) -> Result<Value> {
        match &self.content {
            Some(v) => Ok(v.clone()),
            None => {
                let error = native_error(NativeError::new(22922, "nonexistent LOB value"));
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }

    fn len(&self) -> Result<u64> {
        Ok(self
            .content
            .as_ref()
            .and_then(Value::byte_len)
            .unwrap_or_default() as u64)
    }
}
