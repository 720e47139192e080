use std::fmt;

use crate::lang::{BinaryOperator, UnaryOperator};

/// Statically known target of a call's receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `this`: dispatch on the caller's own class.
    SelfRef,
    /// The receiver's class is known at compile time.
    Named(String),
    /// No class could be determined; the operand text is used as is.
    Unknown,
}

/// Where a pushed call argument came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamOrigin {
    /// Implicit argument 0 of a call.
    Receiver(Receiver),
    Argument,
}

/// Three-address code.
///
/// Operands are symbolic names: a variable, a temporary, a literal or the
/// `this` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tac {
    Binary {
        result: String,
        lhs: String,
        op: BinaryOperator,
        rhs: String,
    },
    Unary {
        result: String,
        op: UnaryOperator,
        operand: String,
    },
    /// `argc` counts the receiver.
    Call {
        result: String,
        method: String,
        argc: usize,
    },
    Param {
        value: String,
        origin: ParamOrigin,
    },
    New {
        result: String,
        class: String,
    },
    NewArray {
        result: String,
        size: String,
    },
    Index {
        result: String,
        array: String,
        index: String,
    },
    Length {
        result: String,
        array: String,
    },
    Assign {
        target: String,
        value: String,
    },
    IndexedAssign {
        array: String,
        index: String,
        value: String,
    },
    /// Pop one incoming argument into a parameter.
    ArgBind {
        name: String,
    },
    Jump {
        label: String,
    },
    IfFalse {
        condition: String,
        label: String,
    },
    Return {
        value: Option<String>,
    },
    Print {
        value: String,
    },
    Stop,
}

impl Tac {
    /// Ends the program or the current method.
    pub fn is_exit(&self) -> bool {
        matches!(self, Tac::Return { .. } | Tac::Stop)
    }
}

impl fmt::Display for Tac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tac::Binary { result, lhs, op, rhs } => write!(f, "{} := {} {} {}", result, lhs, op, rhs),
            Tac::Unary { result, op, operand } => write!(f, "{} := {}{}", result, op, operand),
            Tac::Call { result, method, argc } => write!(f, "{} := call {}, {}", result, method, argc),
            Tac::Param { value, origin } => match origin {
                ParamOrigin::Receiver(_) => write!(f, "param {} (receiver)", value),
                ParamOrigin::Argument => write!(f, "param {}", value),
            },
            Tac::New { result, class } => write!(f, "{} := new {}", result, class),
            Tac::NewArray { result, size } => write!(f, "{} := new int[{}]", result, size),
            Tac::Index { result, array, index } => write!(f, "{} := {}[{}]", result, array, index),
            Tac::Length { result, array } => write!(f, "{} := length {}", result, array),
            Tac::Assign { target, value } => write!(f, "{} := {}", target, value),
            Tac::IndexedAssign { array, index, value } => write!(f, "{}[{}] := {}", array, index, value),
            Tac::ArgBind { name } => write!(f, "arg {}", name),
            Tac::Jump { label } => write!(f, "goto {}", label),
            Tac::IfFalse { condition, label } => write!(f, "iffalse {} goto {}", condition, label),
            Tac::Return { value: Some(value) } => write!(f, "return {}", value),
            Tac::Return { value: None } => write!(f, "return"),
            Tac::Print { value } => write!(f, "print {}", value),
            Tac::Stop => write!(f, "stop"),
        }
    }
}
