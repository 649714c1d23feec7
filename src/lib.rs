//! # Nebulite Core
//!
//! A declarative interaction core: entities are JSON documents, behavior
//! is authored as guarded arithmetic rules instead of compiled code, and
//! a tile-partitioned environment drives only what the camera can see.
//!
//! ## Architecture
//!
//! - `document`: typed/cached JSON leaf access and the shared read-only
//!   document cache rules read from.
//! - `expression`: the arithmetic compiler/evaluator behind `$( ... )`
//!   blocks, and the self/other/global variable bridge.
//! - `invoke`: invoke entries, the topic-based pairing dispatcher, and
//!   the per-object command queues their `functioncalls_*` feed.
//! - `object`: render objects, the generational arena that stores them,
//!   and the command dispatch table that runs queued commands.
//! - `environment`: the tile/layer spatial container, the virtual clock,
//!   and the frame loop that ties them together.
//! - `config`: engine tunables loaded from TOML.

#![warn(missing_docs)]

pub mod config;
pub mod core;
pub mod document;
pub mod environment;
pub mod error;
pub mod expression;
pub mod invoke;
pub mod object;

pub use config::EngineConfig;
pub use error::{CommandOutcome, CriticalError, ErrorCode, NonCriticalError};

/// Crate version, as declared in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, as declared in `Cargo.toml`.
pub const NAME: &str = env!("CARGO_PKG_NAME");
