use std::fmt;
use std::io;

use thiserror::Error;

/// Why execution stopped abnormally.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    #[error("malformed instruction '{line}': {reason}")]
    MalformedInstruction { line: String, reason: String },

    #[error("label '{0}' not found")]
    LabelNotFound(String),

    #[error("variable '{0}' not found")]
    VariableNotFound(String),

    #[error("malformed literal '{0}'")]
    MalformedLiteral(String),

    #[error("stack underflow in '{0}'")]
    StackUnderflow(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{0}' is not supported by this interpreter")]
    Unsupported(&'static str),

    #[error("program counter {0} is past the end of the program")]
    ProgramCounterOutOfBounds(usize),

    #[error("'ireturn' with an empty call stack")]
    CallStackUnderflow,

    #[error("execution step limit exceeded ({0})")]
    StepLimitExceeded(usize),

    #[error("cannot write output")]
    Output(#[source] io::Error),
}

/// A [`Fault`] with the call stack active when it happened, innermost last.
#[derive(Debug)]
pub struct RuntimeError {
    pub fault: Fault,
    pub call_stack: Vec<String>,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runtime error: {}", self.fault)?;

        if !self.call_stack.is_empty() {
            write!(f, "\n  call stack:")?;

            for (i, frame) in self.call_stack.iter().rev().enumerate() {
                write!(f, "\n    {}: {}", i, frame)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.fault)
    }
}

impl RuntimeError {
    pub fn new(fault: Fault) -> Self {
        RuntimeError {
            fault,
            call_stack: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.call_stack.push(context.to_string());
        self
    }
}

impl From<Fault> for RuntimeError {
    fn from(fault: Fault) -> Self {
        RuntimeError::new(fault)
    }
}
