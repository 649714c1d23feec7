//! Arithmetic expression compiler/evaluator and the variable-resolution
//! bridge ("virtual doubles") that connects expression text to live
//! document state.

mod eval;
mod instr;
mod lexer;
mod parser;
mod pool;
mod template;
mod virtual_double;

pub use eval::{NullResolver, VariableResolver};
pub use instr::{BinOp, Func, Instr, Program};
pub use parser::compile;
pub use pool::{ExpressionPool, POOL_SIZE};
pub use template::Template;
pub use virtual_double::VirtualDouble;
