//! # MiniJava syntax tree
//!
//! The tree consumed by the backend and the semantic type model shared by
//! the analyzer and the CFG builder. Trees are produced by an external parser
//! and arrive as JSON (see [`node::Node::from_json`]).

pub mod node;
pub mod operator;
pub mod types;

pub use node::{Node, NodeKind};
pub use operator::{BinaryOperator, OperatorCategory, UnaryOperator};
pub use types::Type;
