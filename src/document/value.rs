//! The scalar conversion table: bool/int/uint/double/string coerce into
//! each other the way the document's `get<T>`/`set<T>` contract expects.
//!
//! Conversions never panic. A conversion that cannot produce a sensible
//! value (e.g. parsing `"abc"` as a double) returns `None`; callers fall
//! back to the default they were already holding rather than poisoning
//! the cache with a bogus value.

use serde_json::Value as Json;

/// The last value written through `set<T>`, kept in its native shape so
/// later `get<U>` calls of a different type can re-derive `U` from it.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

impl Scalar {
    /// The value as a double, if it has one. Used to refresh stable
    /// double views and for arithmetic assignment operators.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::I64(i) => Some(*i as f64),
            Scalar::U64(u) => Some(*u as f64),
            Scalar::F64(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn from_json(value: &Json) -> Option<Scalar> {
        match value {
            Json::Bool(b) => Some(Scalar::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Scalar::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Scalar::U64(u))
                } else {
                    n.as_f64().map(Scalar::F64)
                }
            }
            Json::String(s) => Some(Scalar::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Scalar::Bool(b) => Json::Bool(*b),
            Scalar::I64(i) => Json::from(*i),
            Scalar::U64(u) => Json::from(*u),
            Scalar::F64(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Scalar::Str(s) => Json::String(s.clone()),
        }
    }
}

/// A type that can be read from / written to a document leaf.
///
/// `cached`/`cache_into` address one of the per-path derived-conversion
/// slots on [`super::cache::PathCache`] so repeated `get::<T>` calls for a
/// type other than the one last `set` don't redo the conversion every time.
pub trait ScalarValue: Sized + Clone {
    fn into_scalar(self) -> Scalar;
    fn try_from_scalar(scalar: &Scalar) -> Option<Self>;
    fn cached(entry: &super::cache::PathCache) -> Option<Self>;
    fn cache_into(entry: &mut super::cache::PathCache, value: Self);
}

impl ScalarValue for bool {
    fn into_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }
    fn try_from_scalar(scalar: &Scalar) -> Option<Self> {
        Some(match scalar {
            Scalar::Bool(b) => *b,
            Scalar::I64(i) => *i != 0,
            Scalar::U64(u) => *u != 0,
            Scalar::F64(f) => *f != 0.0,
            Scalar::Str(s) => s == "true" || s == "1",
        })
    }
    fn cached(entry: &super::cache::PathCache) -> Option<Self> {
        entry.cached_bool()
    }
    fn cache_into(entry: &mut super::cache::PathCache, value: Self) {
        entry.cache_bool(value)
    }
}

macro_rules! impl_scalar_int {
    ($t:ty, $variant:ident, $cached:ident, $cache_into:ident) => {
        impl ScalarValue for $t {
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self as _)
            }
            fn try_from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::Bool(b) => Some(if *b { 1 } else { 0 }),
                    Scalar::I64(i) => Some(*i as $t),
                    Scalar::U64(u) => Some(*u as $t),
                    Scalar::F64(f) => Some(f.trunc() as $t),
                    Scalar::Str(s) => s.trim().parse::<$t>().ok(),
                }
            }
            fn cached(entry: &super::cache::PathCache) -> Option<Self> {
                entry.$cached().map(|v| v as $t)
            }
            fn cache_into(entry: &mut super::cache::PathCache, value: Self) {
                entry.$cache_into(value as _)
            }
        }
    };
}

impl_scalar_int!(i64, I64, cached_i64, cache_i64);
impl_scalar_int!(i32, I64, cached_i64, cache_i64);
impl_scalar_int!(u64, U64, cached_u64, cache_u64);
impl_scalar_int!(u32, U64, cached_u64, cache_u64);

impl ScalarValue for f64 {
    fn into_scalar(self) -> Scalar {
        Scalar::F64(self)
    }
    fn try_from_scalar(scalar: &Scalar) -> Option<Self> {
        scalar.as_f64()
    }
    fn cached(entry: &super::cache::PathCache) -> Option<Self> {
        entry.cached_f64()
    }
    fn cache_into(entry: &mut super::cache::PathCache, value: Self) {
        entry.cache_f64(value)
    }
}

impl ScalarValue for String {
    fn into_scalar(self) -> Scalar {
        Scalar::Str(self)
    }
    fn try_from_scalar(scalar: &Scalar) -> Option<Self> {
        Some(match scalar {
            Scalar::Bool(b) => b.to_string(),
            Scalar::I64(i) => i.to_string(),
            Scalar::U64(u) => u.to_string(),
            Scalar::F64(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{:.0}", f)
                } else {
                    f.to_string()
                }
            }
            Scalar::Str(s) => s.clone(),
        })
    }
    fn cached(entry: &super::cache::PathCache) -> Option<Self> {
        entry.cached_string().map(|s| s.to_string())
    }
    fn cache_into(entry: &mut super::cache::PathCache, value: Self) {
        entry.cache_string(value)
    }
}

/// Coarse shape of a document member, mirroring the three JSON shapes the
/// engine distinguishes when walking a document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    Null,
    Value,
    Array,
    Document,
}

pub fn classify(value: &Json) -> MemberType {
    match value {
        Json::Null => MemberType::Null,
        Json::Array(_) => MemberType::Array,
        Json::Object(_) => MemberType::Document,
        _ => MemberType::Value,
    }
}
