use serde::{Deserialize, Serialize};

/// Kind tag of an AST node.
///
/// The parser lives outside this crate; these tags are the contract between
/// it and the backend. On the wire they are written in `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // ───────────────────────────── Structure ─────────────────────────────
    /// Root. Children: `MainClass`, then any number of `ClassDecl`.
    Program,
    /// The class holding the entry method. Same shape as `ClassDecl`.
    MainClass,
    /// Children: `Identifier` (name), then `VarDecl` fields and `MethodDecl`s.
    ClassDecl,
    /// `value` is the return type. Children: `Identifier` (name), then
    /// optional `ParameterList`, `MethodBody` and `Return`.
    MethodDecl,
    /// Children: `VarDecl`, one per parameter in declaration order.
    ParameterList,
    /// Children: local `VarDecl`s and statements.
    MethodBody,
    /// Child 0 is the returned expression.
    Return,
    /// `value` is the declared type name. Child 0 is the `Identifier`.
    VarDecl,

    // ───────────────────────────── Statements ────────────────────────────
    /// `{ ... }`
    Statements,
    /// `x = e;` Children: `Identifier`, expression.
    Assign,
    /// `a[i] = e;` Children: `Identifier`, index, value.
    IndexAssign,
    /// Children: condition, then-branch, optional else-branch.
    If,
    /// Children: condition, body.
    While,
    /// `System.out.println(e);`
    Print,

    // ──────────────────────────── Expressions ────────────────────────────
    /// `value` is the operator. Children: lhs, rhs.
    BinaryOp,
    /// `value` is the operator (`!`). Child 0 is the operand.
    UnaryOp,
    IntLiteral,
    BoolLiteral,
    StringLiteral,
    Identifier,
    This,
    /// Children: receiver, `Identifier` (method), optional `ArgumentList`.
    MethodCall,
    ArgumentList,
    /// `a[i]`. Children: array, index.
    Index,
    /// `a.length`
    Length,
    /// `new C()`. Child 0 is the class `Identifier`.
    New,
    /// `new int[n]`. Child 0 is the size expression.
    NewArray,
}

/// A node of the validated syntax tree handed over by the front end.
///
/// Read-only to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub line: usize,
}

impl Node {
    pub fn new(kind: NodeKind, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            children: Vec::new(),
            line,
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Load a tree from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.child(0)
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Name carried by the leading `Identifier` child of a declaration.
    pub fn declared_name(&self) -> Option<&str> {
        self.first_child()
            .filter(|c| c.kind == NodeKind::Identifier)
            .map(|c| c.value.as_str())
    }

    // ───────────────────────── Method declarations ───────────────────────

    /// Parameter declarations in declaration order.
    pub fn parameters(&self) -> &[Node] {
        self.child_of_kind(NodeKind::ParameterList)
            .map(|p| p.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn body(&self) -> &[Node] {
        self.child_of_kind(NodeKind::MethodBody)
            .map(|b| b.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn return_expression(&self) -> Option<&Node> {
        self.child_of_kind(NodeKind::Return)
            .and_then(|r| r.first_child())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let node = Node::from_json(r#"{ "kind": "this" }"#).unwrap();
        assert_eq!(node.kind, NodeKind::This);
        assert_eq!(node.value, "");
        assert!(node.children.is_empty());
        assert_eq!(node.line, 0);
    }

    #[test]
    fn test_from_json_nested() {
        let node = Node::from_json(
            r#"{
                "kind": "method_decl", "value": "int", "line": 3,
                "children": [
                    { "kind": "identifier", "value": "run", "line": 3 },
                    { "kind": "return", "children": [ { "kind": "int_literal", "value": "1" } ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(node.declared_name(), Some("run"));
        assert_eq!(node.return_expression().map(|n| n.value.as_str()), Some("1"));
        assert!(node.parameters().is_empty());
        assert!(node.body().is_empty());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Node::from_json(r#"{ "kind": "lambda" }"#).is_err());
    }
}
