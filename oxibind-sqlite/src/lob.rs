use oxibind_core::{LobKind, NativeError, NativeLob, Result, Value, native_error};

/// Large object of the sqlite backend: sqlite has no locators, the content is kept in memory
/// and bound as a text or blob value.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteLob {
    kind: LobKind,
    content: Option<Value>,
}

impl SqliteLob {
    pub fn new(kind: LobKind) -> Self {
        Self {
            kind,
            content: None,
        }
    }

    pub(crate) fn stored(value: Value) -> Self {
        Self {
            kind: LobKind::of(&value),
            content: Some(value),
        }
    }

    pub(crate) fn content(&self) -> Value {
        self.content.clone().unwrap_or_default()
    }
}

impl NativeLob for SqliteLob {
    fn kind(&self) -> LobKind {
        self.kind
    }

    fn write_temporary(&mut self, value: &Value) -> Result<()> {
        self.content = Some(match (self.kind, value) {
            (LobKind::Binary, Value::Varchar(Some(v))) => Value::Blob(Some(v.as_bytes().into())),
            (LobKind::Character, Value::Blob(Some(v))) => {
                match String::from_utf8(v.to_vec()) {
                    Ok(v) => Value::Varchar(Some(v)),
                    Err(e) => {
                        let error = native_error(NativeError::new(
                            libsqlite3_sys::SQLITE_MISMATCH,
                            format!("Character large object is not valid UTF-8: {e}"),
                        ));
                        log::error!("{:#}", error);
                        return Err(error);
                    }
                }
            }
            (_, v) => v.clone(),
        });
        Ok(())
    }

    fn load(&mut self) -> Result<Value> {
        Ok(self.content())
    }

    fn len(&self) -> Result<u64> {
        Ok(self
            .content
            .as_ref()
            .and_then(Value::byte_len)
            .unwrap_or_default() as u64)
    }
}
