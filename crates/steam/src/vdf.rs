//! Binary KeyValues codec for the subset used by `shortcuts.vdf`.
//!
//! A document is a sequence of entries `type key\0 payload`, closed by an
//! end marker. Objects nest the same structure recursively.

use crate::SteamError;

/// Binary VDF type markers used in shortcuts.vdf.
pub const VDF_TYPE_OBJECT: u8 = 0x00;
pub const VDF_TYPE_STRING: u8 = 0x01;
pub const VDF_TYPE_INT32: u8 = 0x02;
pub const VDF_TYPE_END: u8 = 0x08;

/// Nesting limit for decoding. Steam's own files never exceed 3 levels.
const MAX_DEPTH: usize = 32;

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    String(String),
    Int32(i32),
    Object(KvMap),
}

impl KvValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an int32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            KvValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the nested mapping, if this is an object.
    pub fn as_object(&self) -> Option<&KvMap> {
        match self {
            KvValue::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Coerces a loosely-typed JSON value into something the codec can write.
    ///
    /// Strings, objects and numbers that fit in an `i32` keep their shape.
    /// Every other scalar is written as its canonical text: booleans become
    /// `"true"`/`"false"`, wider or fractional numbers their decimal form,
    /// `null` the empty string. Arrays become objects keyed `"0".."N-1"`,
    /// the same shape Steam uses for `tags`.
    pub fn coerce_json(value: &serde_json::Value) -> KvValue {
        use serde_json::Value;

        match value {
            Value::String(s) => KvValue::String(s.clone()),
            Value::Number(n) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
                Some(v) => KvValue::Int32(v),
                None => KvValue::String(n.to_string()),
            },
            Value::Bool(b) => KvValue::String(b.to_string()),
            Value::Null => KvValue::String(String::new()),
            Value::Array(items) => KvValue::Object(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), KvValue::coerce_json(v)))
                    .collect(),
            ),
            Value::Object(map) => KvValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), KvValue::coerce_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for KvValue {
    fn from(s: &str) -> Self {
        KvValue::String(s.to_string())
    }
}

impl From<String> for KvValue {
    fn from(s: String) -> Self {
        KvValue::String(s)
    }
}

impl From<i32> for KvValue {
    fn from(v: i32) -> Self {
        KvValue::Int32(v)
    }
}

impl From<KvMap> for KvValue {
    fn from(m: KvMap) -> Self {
        KvValue::Object(m)
    }
}

/// Insertion-ordered mapping with unique keys.
///
/// Inserting an existing key replaces its value in place (last write wins)
/// and keeps the key at its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvMap {
    entries: Vec<(String, KvValue)>,
}

impl KvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces a value. Returns the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<KvValue>) -> Option<KvValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a key exactly.
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a key ignoring ASCII case.
    pub fn get_ignore_case(&self, key: &str) -> Option<&KvValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Iterates entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KvValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, KvValue)> for KvMap {
    fn from_iter<I: IntoIterator<Item = (String, KvValue)>>(iter: I) -> Self {
        let mut map = KvMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for KvMap {
    type Item = (String, KvValue);
    type IntoIter = std::vec::IntoIter<(String, KvValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Decodes a binary VDF document.
///
/// The whole input must be consumed: bytes after the closing end marker are
/// rejected.
pub fn decode(data: &[u8]) -> Result<KvMap, SteamError> {
    let mut reader = Reader { data, pos: 0 };
    let map = reader.read_object(0)?;
    if reader.pos != data.len() {
        return Err(SteamError::Format(format!(
            "{} trailing byte(s) after end of document at pos {}",
            data.len() - reader.pos,
            reader.pos
        )));
    }
    tracing::trace!(entries = map.len(), bytes = data.len(), "decoded vdf document");
    Ok(map)
}

/// Encodes a mapping as a binary VDF document.
///
/// Keys and strings cannot contain NUL bytes since NUL terminates them on disk.
pub fn encode(map: &KvMap) -> Result<Vec<u8>, SteamError> {
    let mut out = Vec::new();
    write_object(&mut out, map)?;
    Ok(out)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn read_object(&mut self, depth: usize) -> Result<KvMap, SteamError> {
        if depth > MAX_DEPTH {
            return Err(SteamError::Format(format!(
                "objects nested deeper than {MAX_DEPTH} levels at pos {}",
                self.pos
            )));
        }

        let mut map = KvMap::new();
        loop {
            let type_byte = self.read_u8().map_err(|_| {
                SteamError::Format(format!("unterminated object at pos {}", self.pos))
            })?;
            if type_byte == VDF_TYPE_END {
                return Ok(map);
            }

            let key = self.read_string()?;
            let value = match type_byte {
                VDF_TYPE_OBJECT => KvValue::Object(self.read_object(depth + 1)?),
                VDF_TYPE_STRING => KvValue::String(self.read_string()?),
                VDF_TYPE_INT32 => KvValue::Int32(self.read_i32(&key)?),
                other => {
                    return Err(SteamError::Format(format!(
                        "unknown type marker 0x{other:02x} for key '{key}' at pos {}",
                        self.pos
                    )));
                }
            };

            if map.insert(key.clone(), value).is_some() {
                tracing::debug!(key = %key, "duplicate key in vdf object, keeping last value");
            }
        }
    }

    fn read_u8(&mut self) -> Result<u8, SteamError> {
        let byte = *self.data.get(self.pos).ok_or_else(|| {
            SteamError::Format(format!("unexpected end of data at pos {}", self.pos))
        })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_i32(&mut self, key: &str) -> Result<i32, SteamError> {
        let end = self.pos + 4;
        let bytes = self.data.get(self.pos..end).ok_or_else(|| {
            SteamError::Format(format!("unexpected end of data reading int32 for '{key}'"))
        })?;
        let val = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.pos = end;
        Ok(val)
    }

    /// Reads a NUL-terminated UTF-8 string.
    fn read_string(&mut self) -> Result<String, SteamError> {
        let start = self.pos;
        let rest = self.data.get(start..).unwrap_or_default();
        let len = rest.iter().position(|&b| b == 0x00).ok_or_else(|| {
            SteamError::Format(format!("unterminated string starting at pos {start}"))
        })?;
        let s = std::str::from_utf8(&rest[..len])
            .map_err(|e| SteamError::Format(format!("invalid UTF-8 at pos {start}: {e}")))?;
        self.pos = start + len + 1;
        Ok(s.to_string())
    }
}

fn write_object(out: &mut Vec<u8>, map: &KvMap) -> Result<(), SteamError> {
    for (key, value) in map.iter() {
        match value {
            KvValue::Object(inner) => {
                out.push(VDF_TYPE_OBJECT);
                write_string(out, key)?;
                write_object(out, inner)?;
            }
            KvValue::String(s) => {
                out.push(VDF_TYPE_STRING);
                write_string(out, key)?;
                write_string(out, s)?;
            }
            KvValue::Int32(v) => {
                out.push(VDF_TYPE_INT32);
                write_string(out, key)?;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    out.push(VDF_TYPE_END);
    Ok(())
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<(), SteamError> {
    if s.as_bytes().contains(&0x00) {
        return Err(SteamError::Format(format!(
            "string contains a NUL byte and cannot be encoded: {s:?}"
        )));
    }
    out.extend_from_slice(s.as_bytes());
    out.push(0x00);
    Ok(())
}
