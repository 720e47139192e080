use std::fmt;

use super::Type;

/// Binary operators of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

/// Operator families sharing operand and result typing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    /// `&&` `||`: boolean operands, boolean result.
    Logical,
    /// `+ - * /`: int operands, int result.
    Arithmetic,
    /// `< > <= >=`: int operands, boolean result.
    Comparison,
    /// `== !=`: int or boolean operands, boolean result.
    Equality,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "&&" => Self::And,
            "||" => Self::Or,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::And => "&&",
            Self::Or => "||",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    pub fn category(self) -> OperatorCategory {
        match self {
            Self::And | Self::Or => OperatorCategory::Logical,
            Self::Add | Self::Sub | Self::Mul | Self::Div => OperatorCategory::Arithmetic,
            Self::Lt | Self::Gt | Self::Le | Self::Ge => OperatorCategory::Comparison,
            Self::Eq | Self::Ne => OperatorCategory::Equality,
        }
    }
}

impl OperatorCategory {
    pub fn accepts(self, operand: &Type) -> bool {
        match self {
            Self::Logical => *operand == Type::Boolean,
            Self::Arithmetic | Self::Comparison => *operand == Type::Int,
            Self::Equality => matches!(operand, Type::Int | Type::Boolean),
        }
    }

    pub fn result(self) -> Type {
        match self {
            Self::Arithmetic => Type::Int,
            Self::Logical | Self::Comparison | Self::Equality => Type::Boolean,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators. The language only has logical negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "!" => Some(Self::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => f.write_str("!"),
        }
    }
}
