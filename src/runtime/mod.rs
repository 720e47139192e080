//! # Bytecode interpreter
//!
//! Executes the text bytecode format on an integer operand stack with one
//! activation record per active call.

pub mod interpreter;
pub mod runtime_error;

pub use interpreter::{Interpreter, InterpreterConfig};
pub use runtime_error::{Fault, RuntimeError};
