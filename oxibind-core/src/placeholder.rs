use std::{
    collections::BTreeMap,
    fmt::{self, Display, Write},
};

/// Ordinal position (1-based) of each rewritten `?` mapped to the marker that replaced it.
///
/// Built once per statement and never modified afterwards. Keys are dense and start at 1.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ParamMap {
    markers: BTreeMap<usize, String>,
}

impl ParamMap {
    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.markers.get(&ordinal).map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.markers.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl Display for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('{')?;
        for (i, (ordinal, marker)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ordinal}: {marker}")?;
        }
        f.write_char('}')
    }
}

/// Name of the marker generated for the `?` at `ordinal`.
pub fn marker_name(ordinal: usize) -> String {
    format!(":param{ordinal}")
}

/// Rewrites every `?` outside a quoted literal into `:paramN`, N counting from 1.
///
/// A single flag tracks whether the scan is inside a literal, and both `'` and
/// `"` toggle it. The quote that opened the literal is not remembered, so text
/// mixing the two styles (`'it"s'`) can leave the flag in the wrong state for
/// the rest of the statement.
///
/// ```rust
/// use oxibind_core::translate;
/// let (sql, params) = translate("SELECT * FROM t WHERE a = '?' AND b = ?");
/// assert_eq!(sql, "SELECT * FROM t WHERE a = '?' AND b = :param1");
/// assert_eq!(params.get(1), Some(":param1"));
/// ```
pub fn translate(sql: &str) -> (String, ParamMap) {
    let mut result = sql.to_string();
    let mut params = ParamMap::default();
    let mut literal = false;
    let mut position = 0;
    while let Some(c) = result[position..].chars().next() {
        match c {
            '\'' | '"' => literal = !literal,
            '?' if !literal => {
                let ordinal = params.len() + 1;
                let marker = marker_name(ordinal);
                result.replace_range(position..position + 1, &marker);
                position += marker.len();
                params.markers.insert(ordinal, marker);
                continue;
            }
            _ => {}
        }
        position += c.len_utf8();
    }
    (result, params)
}
