use std::fmt::{self, Write};

use crate::lang::{Node, NodeKind, Type};

/// What a name was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Method,
    Class,
    Temporary,
    Unknown,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Temporary => "temporary",
            SymbolKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A declared name.
///
/// `depth` is the nesting depth of the declaring scope (global is 0) and
/// tells apart same-named symbols of nested scopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    /// Source line of the declaration.
    pub line: usize,
    /// Declared type; the return type for methods.
    pub ty: Option<Type>,
    /// Parameter types, in declaration order (methods only).
    pub params: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub symbol: Symbol,
    pub info: SymbolInfo,
}

impl Identifier {
    pub fn new(name: &str, kind: SymbolKind, depth: usize, line: usize, ty: Option<Type>) -> Self {
        Self {
            symbol: Symbol {
                name: name.to_string(),
                kind,
                depth,
            },
            info: SymbolInfo {
                line,
                ty,
                params: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.symbol.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind
    }

    pub fn ty(&self) -> Option<&Type> {
        self.info.ty.as_ref()
    }
}

/// Index of a node in the [`SymbolTable`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// One scope of the program: the global scope, a class or a method.
#[derive(Debug)]
pub struct SymbolTableNode<'a> {
    pub identifier: Identifier,
    /// Declaration that opened this scope.
    pub node: &'a Node,
    pub parent: Option<ScopeId>,
    pub variables: Vec<Identifier>,
    pub children: Vec<ScopeId>,
}

/// Tree of scopes mirroring class and method nesting, rooted at a synthetic
/// `global` scope. Built once from the syntax tree and read-only afterwards.
#[derive(Debug)]
pub struct SymbolTable<'a> {
    nodes: Vec<SymbolTableNode<'a>>,
}

/// Name of the implicit receiver variable seeded into every class scope.
pub const THIS: &str = "this";

impl<'a> SymbolTable<'a> {
    pub fn build(program: &'a Node) -> Self {
        let root = SymbolTableNode {
            identifier: Identifier::new("global", SymbolKind::Unknown, 0, 0, None),
            node: program,
            parent: None,
            variables: Vec::new(),
            children: Vec::new(),
        };
        let mut table = Self { nodes: vec![root] };
        table.build_from(program, table.root(), 0);

        tracing::debug!(scopes = table.nodes.len(), "symbol table built");
        table
    }

    fn build_from(&mut self, node: &'a Node, scope: ScopeId, depth: usize) {
        for child in &node.children {
            match child.kind {
                NodeKind::MainClass | NodeKind::ClassDecl => {
                    let Some(name) = child.declared_name() else {
                        continue;
                    };
                    let class_type = Type::Class(name.to_string());
                    let identifier = Identifier::new(
                        name,
                        SymbolKind::Class,
                        depth,
                        child.line,
                        Some(class_type.clone()),
                    );
                    let class_scope = self.add_scope(scope, identifier, child);

                    // `this` is visible from line 0 so it never trips the
                    // use-before-declaration check.
                    let this = Identifier::new(THIS, SymbolKind::Variable, depth + 1, 0, Some(class_type));
                    self.nodes[class_scope.0].variables.push(this);

                    self.build_from(child, class_scope, depth + 1);
                }
                NodeKind::MethodDecl => {
                    let Some(name) = child.declared_name() else {
                        continue;
                    };
                    let mut identifier = Identifier::new(
                        name,
                        SymbolKind::Method,
                        depth,
                        child.line,
                        Some(Type::from_name(&child.value)),
                    );
                    identifier.info.params = child
                        .parameters()
                        .iter()
                        .map(|p| Type::from_name(&p.value))
                        .collect();

                    let method_scope = self.add_scope(scope, identifier, child);
                    self.build_from(child, method_scope, depth + 1);
                }
                NodeKind::VarDecl => {
                    let Some(name) = child.declared_name() else {
                        continue;
                    };
                    let variable = Identifier::new(
                        name,
                        SymbolKind::Variable,
                        depth,
                        child.line,
                        Some(Type::from_name(&child.value)),
                    );
                    self.nodes[scope.0].variables.push(variable);
                }
                _ => self.build_from(child, scope, depth),
            }
        }
    }

    fn add_scope(&mut self, parent: ScopeId, identifier: Identifier, node: &'a Node) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(SymbolTableNode {
            identifier,
            node,
            parent: Some(parent),
            variables: Vec::new(),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn get(&self, id: ScopeId) -> &SymbolTableNode<'a> {
        &self.nodes[id.0]
    }

    pub fn identifier(&self, id: ScopeId) -> &Identifier {
        &self.nodes[id.0].identifier
    }

    pub fn children(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    /// Class scopes in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.children(self.root())
    }

    /// Method scopes of a class in declaration order.
    pub fn methods(&self, class: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.children(class)
            .filter(|&id| self.identifier(id).kind() == SymbolKind::Method)
    }

    pub fn find_class(&self, name: &str) -> Option<ScopeId> {
        self.classes().find(|&id| self.identifier(id).name() == name)
    }

    pub fn find_method(&self, class: ScopeId, name: &str) -> Option<ScopeId> {
        self.methods(class)
            .find(|&id| self.identifier(id).name() == name)
    }

    /// Method `method` of the class named `class`.
    pub fn class_method(&self, class: &str, method: &str) -> Option<&Identifier> {
        let class_scope = self.find_class(class)?;
        let method_scope = self.find_method(class_scope, method)?;
        Some(self.identifier(method_scope))
    }

    /// Nearest-enclosing variable named `name`, walking parent links.
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<&Identifier> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = self.get(id);
            if let Some(var) = node.variables.iter().rev().find(|v| v.name() == name) {
                return Some(var);
            }
            current = node.parent;
        }
        None
    }

    /// The class holding the program's entry method.
    pub fn main_class(&self) -> Option<ScopeId> {
        self.classes()
            .find(|&id| self.get(id).node.kind == NodeKind::MainClass)
    }

    /// Indented dump of the whole tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_scope(self.root(), 0, &mut out);
        out
    }

    fn render_scope(&self, id: ScopeId, depth: usize, out: &mut String) {
        let node = self.get(id);
        let prefix = match node.identifier.kind() {
            SymbolKind::Method => "FUNC",
            SymbolKind::Class => "CLASS",
            _ => "SCOPE",
        };
        render_identifier(out, depth, prefix, &node.identifier);

        for var in &node.variables {
            render_identifier(out, depth + 1, "VAR", var);
        }
        for child in &node.children {
            self.render_scope(*child, depth + 1, out);
        }
    }
}

fn render_identifier(out: &mut String, depth: usize, prefix: &str, identifier: &Identifier) {
    let ty = identifier
        .ty()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "(typeless)".to_string());
    let _ = writeln!(
        out,
        "{}{}: {} - {} {}",
        "|  ".repeat(depth),
        prefix,
        identifier.info.line,
        ty,
        identifier.name()
    );
}
