//! JSON document model: typed/cached leaf access over a `serde_json::Value`
//! tree, plus a shared cache of read-only documents loaded from disk.

mod cache;
mod document;
mod path;
mod resource_cache;
mod value;

pub use cache::{new_stable_double, StableDouble};
pub use document::Document;
pub use resource_cache::DocumentCache;
pub use value::{classify, MemberType, Scalar, ScalarValue};
