//! Invoke entries and the topic-based dispatcher that pairs and evaluates
//! them, plus the per-object command queues that absorb their output.

mod command_queue;
mod dispatcher;
mod entry;
mod queue;

pub use command_queue::{load_task_file, parse_task_commands};
pub use dispatcher::{CallTarget, Dispatcher, PendingCall, ALL_TOPIC};
pub use entry::{AssignOp, Assignment, CompiledEntry, EntryDef};
pub use queue::{Channel, CommandQueues, CHANNELS};
