//! # Control-flow graphs
//!
//! Each method is lowered into an arena [`ControlFlowGraph`] of basic blocks
//! holding three-address code ([`Tac`]). Blocks branch through optional
//! true/false exits; loops introduce back-edges.

pub mod builder;
pub mod dot;
pub mod graph;
pub mod tac;

pub use builder::{CfgBuilder, EntryPoint, SELF_TOKEN};
pub use dot::to_dot;
pub use graph::{Block, ControlFlowGraph, ControlFlowNode, NameGen, NodeId};
pub use tac::{ParamOrigin, Receiver, Tac};
