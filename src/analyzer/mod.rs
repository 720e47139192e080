//! # Scope resolution and type checking
//!
//! [`SymbolTable`] mirrors class and method nesting. [`ScopeResolver`] is a
//! scope stack over it, and [`SemanticAnalyzer`] walks the syntax tree once,
//! collecting a [`Diagnostic`] for every problem it finds.

pub mod diagnostic;
pub mod scope;
pub mod semantic;
pub mod symbol_table;

pub use diagnostic::{Diagnostic, SemanticError};
pub use scope::ScopeResolver;
pub use semantic::{SemanticAnalyzer, analyze};
pub use symbol_table::{Identifier, ScopeId, Symbol, SymbolInfo, SymbolKind, SymbolTable, SymbolTableNode, THIS};
