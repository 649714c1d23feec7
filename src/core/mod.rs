//! Shared numeric helpers used across the document, expression, and
//! invoke subsystems.

pub mod precision;

pub use precision::{ApproxEq, EPSILON, EPSILON_NORMAL, EPSILON_ROUGH};
