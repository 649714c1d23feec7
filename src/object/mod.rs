//! Render objects: entity documents, their compiled invoke entries, and
//! the command dispatch/queue machinery that drives them, all stored in a
//! generational arena so handles stay valid across the object's lifetime.

mod arena;
mod commands;
mod render_object;

pub use arena::{Arena, ObjectHandle};
pub use commands::{CommandArgs, CommandRegistry, CommandRegistryBuilder, Handler};
pub use render_object::RenderObject;
