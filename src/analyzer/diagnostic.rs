use std::fmt;

use thiserror::Error;

use super::symbol_table::SymbolKind;
use crate::lang::Type;

/// Problems found while checking a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("redeclaration of {kind} '{name}'")]
    Redeclaration { kind: SymbolKind, name: String },

    #[error("undefined {kind} '{name}'")]
    Undefined { kind: SymbolKind, name: String },

    #[error("'{name}' is used before its declaration on line {declared}")]
    UseBeforeDeclaration { name: String, declared: usize },

    #[error("cannot assign a value of type '{found}' to '{name}' of type '{expected}'")]
    AssignmentMismatch {
        name: String,
        expected: Type,
        found: Type,
    },

    #[error("{context} must be of type '{expected}', found '{found}'")]
    TypeMismatch {
        context: &'static str,
        expected: Type,
        found: Type,
    },

    #[error("operator '{op}' applied to operands of different types '{lhs}' and '{rhs}'")]
    OperandMismatch { op: String, lhs: Type, rhs: Type },

    #[error("operator '{op}' cannot be applied to operands of type '{found}'")]
    InvalidOperand { op: String, found: Type },

    #[error("unknown operator '{op}'")]
    UnknownOperator { op: String },

    #[error("type '{found}' has no methods")]
    NotAnObject { found: Type },

    #[error("method '{method}' expects {expected} arguments, found {found}")]
    ArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} of method '{method}' must be of type '{expected}', found '{found}'")]
    ArgumentMismatch {
        method: String,
        position: usize,
        expected: Type,
        found: Type,
    },

    #[error("method '{method}' returns '{found}' but is declared to return '{expected}'")]
    ReturnMismatch {
        method: String,
        expected: Type,
        found: Type,
    },

    #[error("method '{method}' returns no value")]
    VoidValue { method: String },

    #[error("method '{method}' has no return expression")]
    MissingReturn { method: String },

    #[error("malformed {what}")]
    Malformed { what: &'static str },
}

/// A [`SemanticError`] tied to a source line and the scope it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    /// Scope description such as `global::Fac::run()`.
    pub scope: String,
    pub error: SemanticError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} in scope '{}'", self.line, self.error, self.scope)
    }
}

impl std::error::Error for Diagnostic {}
