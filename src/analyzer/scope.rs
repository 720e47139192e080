use std::collections::HashMap;

use super::diagnostic::{Diagnostic, SemanticError};
use super::symbol_table::{Identifier, ScopeId, SymbolKind, SymbolTable};

/// Lookup key of the flat symbol map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    name: String,
    kind: SymbolKind,
    depth: usize,
}

impl SymbolKey {
    fn new(name: &str, kind: SymbolKind, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            depth,
        }
    }
}

/// A scope stack over a [`SymbolTable`].
///
/// Every pushed scope installs its symbols into a flat map keyed by
/// `(name, kind, depth)`, where `depth` is the scope's index on the stack.
/// Lookups walk depths from the top of the stack down to 0, so the nearest
/// enclosing declaration wins. Callers push the global scope first, which
/// keeps it at index 0.
pub struct ScopeResolver<'t, 'a> {
    table: &'t SymbolTable<'a>,
    stack: Vec<ScopeId>,
    lookup: HashMap<SymbolKey, &'t Identifier>,
}

impl<'t, 'a> ScopeResolver<'t, 'a> {
    pub fn new(table: &'t SymbolTable<'a>) -> Self {
        Self {
            table,
            stack: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn table(&self) -> &'t SymbolTable<'a> {
        self.table
    }

    /// Install a scope on top of the stack.
    ///
    /// A symbol already declared with the same name and kind in this scope
    /// is reported; the later declaration replaces the earlier one.
    pub fn push(&mut self, scope: ScopeId) -> Vec<Diagnostic> {
        let depth = self.depth();
        self.stack.push(scope);

        let mut diagnostics = Vec::new();
        for identifier in self.symbols_of(scope) {
            let key = SymbolKey::new(identifier.name(), identifier.kind(), depth);
            if self.lookup.insert(key, identifier).is_some() {
                tracing::debug!(name = identifier.name(), depth, "redeclaration");
                diagnostics.push(Diagnostic {
                    line: identifier.info.line,
                    scope: self.scope_string(),
                    error: SemanticError::Redeclaration {
                        kind: identifier.kind(),
                        name: identifier.name().to_string(),
                    },
                });
            }
        }

        tracing::debug!(scope = %self.scope_string(), "push scope");
        diagnostics
    }

    /// Remove the top scope and its symbols.
    pub fn pop(&mut self) -> Option<ScopeId> {
        let Some(scope) = self.current() else {
            tracing::warn!("pop from an empty scope stack");
            return None;
        };
        let depth = self.depth() - 1;

        for identifier in self.symbols_of(scope) {
            self.lookup
                .remove(&SymbolKey::new(identifier.name(), identifier.kind(), depth));
        }

        tracing::debug!(scope = %self.scope_string(), "pop scope");
        self.stack.pop()
    }

    /// Declarations a scope brings into view: nested classes and methods,
    /// then variables.
    fn symbols_of(&self, scope: ScopeId) -> Vec<&'t Identifier> {
        let table = self.table;
        let node = table.get(scope);
        node.children
            .iter()
            .map(|&child| table.identifier(child))
            .chain(node.variables.iter())
            .collect()
    }

    /// Nearest enclosing declaration of `name` with the given kind.
    pub fn resolve(&self, name: &str, kind: SymbolKind) -> Option<&'t Identifier> {
        (0..self.stack.len())
            .rev()
            .find_map(|depth| self.lookup.get(&SymbolKey::new(name, kind, depth)).copied())
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.resolve(name, SymbolKind::Class).is_some()
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Describe the stack as `global::Class::method()`.
    pub fn scope_string(&self) -> String {
        self.stack
            .iter()
            .map(|&id| {
                let identifier = self.table.identifier(id);
                if identifier.kind() == SymbolKind::Method {
                    format!("{}()", identifier.name())
                } else {
                    identifier.name().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{Node, NodeKind, Type};

    fn ident(name: &str, line: usize) -> Node {
        Node::new(NodeKind::Identifier, name, line)
    }

    fn var(ty: &str, name: &str, line: usize) -> Node {
        Node::new(NodeKind::VarDecl, ty, line).with_child(ident(name, line))
    }

    fn program(locals: Vec<Node>) -> Node {
        let method = Node::new(NodeKind::MethodDecl, "int", 3).with_children(vec![
            ident("run", 3),
            Node::new(NodeKind::MethodBody, "", 4).with_children(locals),
        ]);
        Node::new(NodeKind::Program, "", 1).with_children(vec![
            Node::new(NodeKind::ClassDecl, "", 2).with_children(vec![
                ident("Box", 2),
                var("boolean", "x", 2),
                method,
            ]),
        ])
    }

    fn scopes<'t, 'a>(table: &'t SymbolTable<'a>) -> (ScopeId, ScopeId) {
        let class = table.find_class("Box").unwrap();
        let method = table.find_method(class, "run").unwrap();
        (class, method)
    }

    #[test]
    fn test_nearest_scope_wins() {
        let ast = program(vec![var("int", "x", 5)]);
        let table = SymbolTable::build(&ast);
        let (class, method) = scopes(&table);
        let mut resolver = ScopeResolver::new(&table);

        assert!(resolver.push(table.root()).is_empty());
        assert!(resolver.push(class).is_empty());
        assert_eq!(resolver.resolve("x", SymbolKind::Variable).unwrap().ty(), Some(&Type::Boolean));

        assert!(resolver.push(method).is_empty());
        assert_eq!(resolver.resolve("x", SymbolKind::Variable).unwrap().ty(), Some(&Type::Int));
        assert_eq!(resolver.scope_string(), "global::Box::run()");

        resolver.pop();
        assert_eq!(resolver.resolve("x", SymbolKind::Variable).unwrap().ty(), Some(&Type::Boolean));
        assert_eq!(resolver.depth(), 2);
    }

    #[test]
    fn test_kind_is_part_of_the_key() {
        let ast = program(vec![]);
        let table = SymbolTable::build(&ast);
        let (class, _) = scopes(&table);
        let mut resolver = ScopeResolver::new(&table);
        resolver.push(table.root());
        resolver.push(class);

        assert!(resolver.resolve("run", SymbolKind::Method).is_some());
        assert!(resolver.resolve("run", SymbolKind::Variable).is_none());
        assert!(resolver.class_exists("Box"));
        assert!(!resolver.class_exists("run"));
    }

    #[test]
    fn test_redeclaration_reported_once_and_replaced() {
        let ast = program(vec![var("int", "y", 5), var("boolean", "y", 6)]);
        let table = SymbolTable::build(&ast);
        let (class, method) = scopes(&table);
        let mut resolver = ScopeResolver::new(&table);
        resolver.push(table.root());
        resolver.push(class);

        let diagnostics = resolver.push(method);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 6);
        assert_eq!(
            diagnostics[0].error,
            SemanticError::Redeclaration {
                kind: SymbolKind::Variable,
                name: "y".to_string()
            }
        );
        assert_eq!(resolver.resolve("y", SymbolKind::Variable).unwrap().ty(), Some(&Type::Boolean));

        resolver.pop();
        assert!(resolver.resolve("y", SymbolKind::Variable).is_none());
    }

    #[test]
    fn test_pop_empty_stack() {
        let ast = program(vec![]);
        let table = SymbolTable::build(&ast);
        let mut resolver = ScopeResolver::new(&table);
        assert_eq!(resolver.pop(), None);
        assert_eq!(resolver.current(), None);
    }
}
