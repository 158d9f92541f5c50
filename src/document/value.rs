use crate::error::WorkloadError;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Sorted map so that every encoding of a document is byte-stable.
pub type FastMap<K, V> = BTreeMap<K, V>;

/// A document is the interior mapping at the root of a [`DocValue`] tree.
pub type Document = FastMap<SmolStr, DocValue>;

// ─── DocNumber ──────────────────────────────────────────────────────────────

/// Integers compare by value whichever variant holds them, since CBOR
/// does not record whether a non-negative integer was signed. NaN equals
/// NaN so that stored documents compare equal to what was inserted.
#[derive(Debug, Clone, Copy)]
pub enum DocNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl PartialEq for DocNumber {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (DocNumber::I64(a), DocNumber::I64(b)) => a == b,
            (DocNumber::U64(a), DocNumber::U64(b)) => a == b,
            (DocNumber::I64(i), DocNumber::U64(u)) | (DocNumber::U64(u), DocNumber::I64(i)) => {
                u64::try_from(i).is_ok_and(|i| i == u)
            }
            (DocNumber::F64(a), DocNumber::F64(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

impl DocNumber {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            DocNumber::I64(i) => Some(i),
            DocNumber::U64(u) => i64::try_from(u).ok(),
            DocNumber::F64(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }
}

// ─── DocValue ───────────────────────────────────────────────────────────────

/// One node of a document tree. `Object` is the only interior node; every
/// other variant is a leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocValue {
    #[default]
    Null,
    Bool(bool),
    Number(DocNumber),
    Str(SmolStr),
    Array(Vec<DocValue>),
    Object(Document),
}

impl DocValue {
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, DocValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            DocValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.as_object()?.get(key)
    }

    /// Turn this node into an interior mapping, discarding any leaf value
    /// it held, and return the mapping.
    pub fn coerce_object(&mut self) -> &mut Document {
        if !self.is_object() {
            *self = DocValue::Object(Document::new());
        }
        match self {
            DocValue::Object(map) => map,
            _ => unreachable!("coerced to object above"),
        }
    }

    /// Canonical text form used as an index key component.
    ///
    /// Non-finite floats have no JSON form and are written as `NaN`, `inf`
    /// or `-inf`, which no other value produces.
    pub fn canonical_key(&self) -> String {
        match self {
            DocValue::Number(DocNumber::F64(f)) if !f.is_finite() => f.to_string(),
            other => serde_json::Value::from(other.clone()).to_string(),
        }
    }
}

// ─── Serialize ──────────────────────────────────────────────────────────────

impl Serialize for DocValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocValue::Null => serializer.serialize_none(),
            DocValue::Bool(b) => serializer.serialize_bool(*b),
            DocValue::Number(n) => match n {
                DocNumber::I64(i) => serializer.serialize_i64(*i),
                DocNumber::U64(u) => serializer.serialize_u64(*u),
                DocNumber::F64(f) => serializer.serialize_f64(*f),
            },
            DocValue::Str(s) => serializer.serialize_str(s.as_str()),
            DocValue::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for v in arr {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            DocValue::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k.as_str(), v)?;
                }
                m.end()
            }
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<i64> for DocValue {
    fn from(n: i64) -> Self {
        DocValue::Number(DocNumber::I64(n))
    }
}

impl From<u64> for DocValue {
    fn from(n: u64) -> Self {
        DocValue::Number(DocNumber::U64(n))
    }
}

impl From<usize> for DocValue {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(i) => DocValue::Number(DocNumber::I64(i)),
            Err(_) => DocValue::Number(DocNumber::U64(n as u64)),
        }
    }
}

impl From<f64> for DocValue {
    fn from(n: f64) -> Self {
        DocValue::Number(DocNumber::F64(n))
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Bool(b)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::Str(SmolStr::from(s))
    }
}

impl From<Document> for DocValue {
    fn from(map: Document) -> Self {
        DocValue::Object(map)
    }
}

// ─── From/Into serde_json::Value ────────────────────────────────────────────

impl From<serde_json::Value> for DocValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => DocValue::Null,
            serde_json::Value::Bool(b) => DocValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DocValue::Number(DocNumber::I64(i))
                } else if let Some(u) = n.as_u64() {
                    DocValue::Number(DocNumber::U64(u))
                } else {
                    DocValue::Number(DocNumber::F64(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => DocValue::Str(SmolStr::from(s)),
            serde_json::Value::Array(arr) => {
                DocValue::Array(arr.into_iter().map(DocValue::from).collect())
            }
            serde_json::Value::Object(obj) => DocValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (SmolStr::from(k), DocValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DocValue> for serde_json::Value {
    fn from(val: DocValue) -> Self {
        match val {
            DocValue::Null => serde_json::Value::Null,
            DocValue::Bool(b) => serde_json::Value::Bool(b),
            DocValue::Number(n) => match n {
                DocNumber::I64(i) => serde_json::json!(i),
                DocNumber::U64(u) => serde_json::json!(u),
                DocNumber::F64(f) => serde_json::json!(f),
            },
            DocValue::Str(s) => serde_json::Value::String(s.to_string()),
            DocValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(|v| v.into()).collect())
            }
            DocValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k.to_string(), v.into()))
                    .collect(),
            ),
        }
    }
}

// ─── TryFrom<cbor4ii::core::Value> ──────────────────────────────────────────

impl TryFrom<cbor4ii::core::Value> for DocValue {
    type Error = WorkloadError;

    fn try_from(v: cbor4ii::core::Value) -> Result<Self, Self::Error> {
        use cbor4ii::core::Value;

        Ok(match v {
            Value::Null => DocValue::Null,
            Value::Bool(b) => DocValue::Bool(b),
            Value::Integer(i) => {
                if let Ok(val) = i64::try_from(i) {
                    DocValue::Number(DocNumber::I64(val))
                } else if let Ok(val) = u64::try_from(i) {
                    DocValue::Number(DocNumber::U64(val))
                } else {
                    return Err(WorkloadError::Codec(format!("integer {i} out of range")));
                }
            }
            Value::Float(f) => DocValue::Number(DocNumber::F64(f)),
            Value::Text(s) => DocValue::Str(SmolStr::from(s)),
            Value::Array(arr) => DocValue::Array(
                arr.into_iter()
                    .map(DocValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => DocValue::Object(
                map.into_iter()
                    .map(|(k, v)| -> Result<(SmolStr, DocValue), WorkloadError> {
                        match k {
                            Value::Text(key) => Ok((SmolStr::from(key), DocValue::try_from(v)?)),
                            other => Err(WorkloadError::Codec(format!("non-text key {other:?}"))),
                        }
                    })
                    .collect::<Result<_, _>>()?,
            ),
            other => return Err(WorkloadError::Codec(format!("unsupported CBOR item {other:?}"))),
        })
    }
}

/// Build a [`Document`] literal. Nested braces become nested objects.
///
/// ```
/// use allpaths_workload::doc;
/// let d = doc!({ "a" => 1i64, "b" => { "c" => "x" }, "n" => -2i64 });
/// assert_eq!(d.len(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    ({ $($body:tt)* }) => {{
        #[allow(unused_mut)]
        let mut map = $crate::document::Document::new();
        $crate::doc!(@entries map; $($body)*);
        map
    }};

    (@entries $map:ident;) => {};

    (@entries $map:ident; $key:expr => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $map.insert(
            $crate::SmolStr::new($key),
            $crate::document::DocValue::from($crate::doc!({ $($inner)* })),
        );
        $crate::doc!(@entries $map; $($($rest)*)?);
    };

    (@entries $map:ident; $key:expr => $val:expr $(, $($rest:tt)*)?) => {
        $map.insert(
            $crate::SmolStr::new($key),
            $crate::document::DocValue::from($val),
        );
        $crate::doc!(@entries $map; $($($rest)*)?);
    };
}
