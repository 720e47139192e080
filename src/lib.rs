//! Backend of a small class-based language.
//!
//! A validated syntax tree ([`lang::Node`]) is checked by the
//! [`analyzer`], lowered into per-method control-flow graphs ([`cfg`]),
//! flattened into label-addressed text bytecode ([`bytecode`]) and executed
//! by a stack machine ([`runtime`]).

pub mod analyzer;
pub mod bytecode;
pub mod cfg;
pub mod lang;
pub mod runtime;
