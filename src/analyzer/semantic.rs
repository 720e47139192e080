use super::diagnostic::{Diagnostic, SemanticError};
use super::scope::ScopeResolver;
use super::symbol_table::{ScopeId, SymbolKind, SymbolTable, THIS};
use crate::lang::{BinaryOperator, Node, NodeKind, Type, UnaryOperator};

/// Check a whole program. Returns every diagnostic found; an empty list
/// means the program is well-formed.
pub fn analyze(table: &SymbolTable<'_>) -> Vec<Diagnostic> {
    let mut analyzer = SemanticAnalyzer::new(table);
    analyzer.analyze_structure();
    analyzer.into_diagnostics()
}

/// Single-pass checker over the syntax tree.
///
/// Problems are collected rather than returned early so one run reports as
/// many of them as possible.
pub struct SemanticAnalyzer<'t, 'a> {
    resolver: ScopeResolver<'t, 'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t, 'a> SemanticAnalyzer<'t, 'a> {
    pub fn new(table: &'t SymbolTable<'a>) -> Self {
        Self {
            resolver: ScopeResolver::new(table),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    // =========================================================================
    // Structure: program -> class -> method
    // =========================================================================

    /// Walk program, classes and methods, keeping the scope stack in step.
    /// Returns `true` when no diagnostic was raised.
    pub fn analyze_structure(&mut self) -> bool {
        let table = self.resolver.table();
        let root = table.root();
        let program = table.get(root).node;

        self.push(root);
        for class_node in &program.children {
            if !matches!(class_node.kind, NodeKind::MainClass | NodeKind::ClassDecl) {
                continue;
            }
            match scope_for(table, table.classes(), class_node) {
                Some(class) => self.analyze_class(class),
                None => self.report(class_node.line, SemanticError::Malformed { what: "class declaration" }),
            }
        }
        self.resolver.pop();

        self.diagnostics.is_empty()
    }

    fn analyze_class(&mut self, class: ScopeId) {
        let table = self.resolver.table();
        let class_node = table.get(class).node;

        self.push(class);
        for member in &class_node.children {
            match member.kind {
                NodeKind::VarDecl => {
                    self.check_var_decl(member);
                }
                NodeKind::MethodDecl => match scope_for(table, table.methods(class), member) {
                    Some(method) => self.analyze_method(method, class_node.kind == NodeKind::MainClass),
                    None => self.report(member.line, SemanticError::Malformed { what: "method declaration" }),
                },
                _ => {}
            }
        }
        self.resolver.pop();
    }

    fn analyze_method(&mut self, method: ScopeId, in_main_class: bool) {
        let table = self.resolver.table();
        let identifier = table.identifier(method);
        let node = table.get(method).node;
        let declared = identifier.ty().cloned().unwrap_or(Type::Void);

        let return_expr = node.return_expression();
        if return_expr.is_none() && declared != Type::Void && !in_main_class {
            self.push(method);
            self.report(
                node.line,
                SemanticError::MissingReturn {
                    method: identifier.name().to_string(),
                },
            );
            self.resolver.pop();
            return;
        }

        self.push(method);
        for param in node.parameters() {
            self.check_var_decl(param);
        }
        for statement in node.body() {
            self.analyze_statement(statement);
        }
        if let Some(expr) = return_expr
            && let Some(found) = self.analyze_expression(expr)
            && found != declared
        {
            self.report(
                expr.line,
                SemanticError::ReturnMismatch {
                    method: identifier.name().to_string(),
                    expected: declared,
                    found,
                },
            );
        }
        self.resolver.pop();
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Check one statement and everything nested in it.
    pub fn analyze_statement(&mut self, node: &Node) -> bool {
        match node.kind {
            NodeKind::Statements => node
                .children
                .iter()
                .fold(true, |ok, child| self.analyze_statement(child) && ok),

            NodeKind::VarDecl => self.check_var_decl(node),

            NodeKind::Assign => {
                let (Some(target), Some(value)) = (node.child(0), node.child(1)) else {
                    return self.malformed(node, "assignment");
                };
                let expected = self.variable_type(target);
                let found = self.analyze_expression(value);
                match (expected, found) {
                    (Some(expected), Some(found)) if expected != found => {
                        self.report(
                            node.line,
                            SemanticError::AssignmentMismatch {
                                name: target.value.clone(),
                                expected,
                                found,
                            },
                        );
                        false
                    }
                    (Some(_), Some(_)) => true,
                    _ => false,
                }
            }

            NodeKind::IndexAssign => {
                let (Some(target), Some(index), Some(value)) = (node.child(0), node.child(1), node.child(2))
                else {
                    return self.malformed(node, "indexed assignment");
                };
                let array_ok = match self.variable_type(target) {
                    Some(found) if found != Type::IntArray => {
                        self.report(
                            target.line,
                            SemanticError::TypeMismatch {
                                context: "indexed assignment target",
                                expected: Type::IntArray,
                                found,
                            },
                        );
                        false
                    }
                    Some(_) => true,
                    None => false,
                };
                let index_ok = self.expect_type(index, Type::Int, "array index");
                let value_ok = self.expect_type(value, Type::Int, "array element");
                array_ok && index_ok && value_ok
            }

            NodeKind::If => {
                let (Some(condition), Some(then_branch)) = (node.child(0), node.child(1)) else {
                    return self.malformed(node, "if statement");
                };
                let mut ok = self.expect_type(condition, Type::Boolean, "if condition");
                ok &= self.analyze_statement(then_branch);
                if let Some(else_branch) = node.child(2) {
                    ok &= self.analyze_statement(else_branch);
                }
                ok
            }

            NodeKind::While => {
                let (Some(condition), Some(body)) = (node.child(0), node.child(1)) else {
                    return self.malformed(node, "while loop");
                };
                let condition_ok = self.expect_type(condition, Type::Boolean, "while condition");
                self.analyze_statement(body) && condition_ok
            }

            NodeKind::Print => match node.first_child() {
                Some(expr) => self.analyze_expression(expr).is_some(),
                None => self.malformed(node, "print statement"),
            },

            _ => self.malformed(node, "statement"),
        }
    }

    /// A declared type must be built in or name a known class.
    fn check_var_decl(&mut self, node: &Node) -> bool {
        if Type::from_name(&node.value).is_literal() || self.resolver.class_exists(&node.value) {
            return true;
        }
        self.report(
            node.line,
            SemanticError::Undefined {
                kind: SymbolKind::Class,
                name: node.value.clone(),
            },
        );
        false
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Infer the type of an expression. `None` means checking failed and a
    /// diagnostic has already been raised for the cause.
    pub fn analyze_expression(&mut self, node: &Node) -> Option<Type> {
        match node.kind {
            NodeKind::IntLiteral => Some(Type::Int),
            NodeKind::BoolLiteral => Some(Type::Boolean),
            NodeKind::StringLiteral => Some(Type::String),

            NodeKind::Identifier => self.variable_type(node),

            NodeKind::This => match self.resolver.resolve(THIS, SymbolKind::Variable) {
                Some(this) => this.ty().cloned(),
                None => {
                    self.report(
                        node.line,
                        SemanticError::Undefined {
                            kind: SymbolKind::Variable,
                            name: THIS.to_string(),
                        },
                    );
                    None
                }
            },

            NodeKind::BinaryOp => self.analyze_binary(node),
            NodeKind::UnaryOp => self.analyze_unary(node),
            NodeKind::MethodCall => self.analyze_call(node),

            NodeKind::Index => {
                let (Some(array), Some(index)) = (node.child(0), node.child(1)) else {
                    self.malformed(node, "array index expression");
                    return None;
                };
                let array_ok = self.expect_type(array, Type::IntArray, "indexed expression");
                let index_ok = self.expect_type(index, Type::Int, "array index");
                (array_ok && index_ok).then_some(Type::Int)
            }

            NodeKind::Length => {
                let Some(array) = node.first_child() else {
                    self.malformed(node, "length expression");
                    return None;
                };
                self.expect_type(array, Type::IntArray, "length receiver")
                    .then_some(Type::Int)
            }

            NodeKind::New => {
                let Some(class) = node.declared_name() else {
                    self.malformed(node, "object construction");
                    return None;
                };
                if self.resolver.class_exists(class) {
                    Some(Type::Class(class.to_string()))
                } else {
                    self.report(
                        node.line,
                        SemanticError::Undefined {
                            kind: SymbolKind::Class,
                            name: class.to_string(),
                        },
                    );
                    None
                }
            }

            NodeKind::NewArray => {
                let Some(size) = node.first_child() else {
                    self.malformed(node, "array construction");
                    return None;
                };
                self.expect_type(size, Type::Int, "array size")
                    .then_some(Type::IntArray)
            }

            _ => {
                self.malformed(node, "expression");
                None
            }
        }
    }

    fn analyze_binary(&mut self, node: &Node) -> Option<Type> {
        let (Some(lhs), Some(rhs)) = (node.child(0), node.child(1)) else {
            self.malformed(node, "binary operation");
            return None;
        };
        let lhs_type = self.analyze_expression(lhs);
        let rhs_type = self.analyze_expression(rhs);

        let Some(op) = BinaryOperator::from_symbol(&node.value) else {
            self.report(node.line, SemanticError::UnknownOperator { op: node.value.clone() });
            return None;
        };
        let (lhs_type, rhs_type) = (lhs_type?, rhs_type?);

        if lhs_type != rhs_type {
            self.report(
                node.line,
                SemanticError::OperandMismatch {
                    op: op.to_string(),
                    lhs: lhs_type,
                    rhs: rhs_type,
                },
            );
            return None;
        }

        let category = op.category();
        if !category.accepts(&lhs_type) {
            self.report(
                node.line,
                SemanticError::InvalidOperand {
                    op: op.to_string(),
                    found: lhs_type,
                },
            );
            return None;
        }

        Some(category.result())
    }

    fn analyze_unary(&mut self, node: &Node) -> Option<Type> {
        let Some(operand) = node.first_child() else {
            self.malformed(node, "unary operation");
            return None;
        };
        let operand_type = self.analyze_expression(operand);

        let Some(op) = UnaryOperator::from_symbol(&node.value) else {
            self.report(node.line, SemanticError::UnknownOperator { op: node.value.clone() });
            return None;
        };
        let operand_type = operand_type?;
        if operand_type != Type::Boolean {
            self.report(
                node.line,
                SemanticError::InvalidOperand {
                    op: op.to_string(),
                    found: operand_type,
                },
            );
            return None;
        }

        Some(Type::Boolean)
    }

    /// Arity and argument mismatches are reported, but the declared return
    /// type is still produced so enclosing expressions keep being checked.
    fn analyze_call(&mut self, node: &Node) -> Option<Type> {
        let (Some(receiver), Some(method)) = (node.child(0), node.child(1)) else {
            self.malformed(node, "method call");
            return None;
        };
        let receiver_type = self.analyze_expression(receiver);
        let arguments: Vec<(usize, Option<Type>)> = node
            .child_of_kind(NodeKind::ArgumentList)
            .map(|list| list.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|arg| (arg.line, self.analyze_expression(arg)))
            .collect();

        let receiver_type = receiver_type?;
        let Some(class) = receiver_type.class_name() else {
            self.report(receiver.line, SemanticError::NotAnObject { found: receiver_type });
            return None;
        };
        if !self.resolver.class_exists(class) {
            self.report(
                receiver.line,
                SemanticError::Undefined {
                    kind: SymbolKind::Class,
                    name: class.to_string(),
                },
            );
            return None;
        }

        let Some(declaration) = self.resolver.table().class_method(class, &method.value) else {
            self.report(
                method.line,
                SemanticError::Undefined {
                    kind: SymbolKind::Method,
                    name: format!("{}.{}", class, method.value),
                },
            );
            return None;
        };

        let params = &declaration.info.params;
        if params.len() != arguments.len() {
            self.report(
                node.line,
                SemanticError::ArityMismatch {
                    method: method.value.clone(),
                    expected: params.len(),
                    found: arguments.len(),
                },
            );
        }
        for (position, (expected, (line, found))) in params.iter().zip(&arguments).enumerate() {
            match found {
                Some(found) if found != expected => self.report(
                    *line,
                    SemanticError::ArgumentMismatch {
                        method: method.value.clone(),
                        position: position + 1,
                        expected: expected.clone(),
                        found: found.clone(),
                    },
                ),
                _ => {}
            }
        }

        // Every call is consumed as a value; a void callee leaves nothing on
        // the stack to consume.
        match declaration.ty() {
            Some(Type::Void) => {
                self.report(
                    node.line,
                    SemanticError::VoidValue {
                        method: format!("{}.{}", class, method.value),
                    },
                );
                None
            }
            ty => ty.cloned(),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolve an identifier node to its declared variable type.
    fn variable_type(&mut self, node: &Node) -> Option<Type> {
        let Some(identifier) = self.resolver.resolve(&node.value, SymbolKind::Variable) else {
            self.report(
                node.line,
                SemanticError::Undefined {
                    kind: SymbolKind::Variable,
                    name: node.value.clone(),
                },
            );
            return None;
        };

        if node.line < identifier.info.line {
            self.report(
                node.line,
                SemanticError::UseBeforeDeclaration {
                    name: node.value.clone(),
                    declared: identifier.info.line,
                },
            );
        }
        identifier.ty().cloned()
    }

    /// Infer `node` and require it to be `expected`.
    fn expect_type(&mut self, node: &Node, expected: Type, context: &'static str) -> bool {
        match self.analyze_expression(node) {
            Some(found) if found == expected => true,
            Some(found) => {
                self.report(
                    node.line,
                    SemanticError::TypeMismatch {
                        context,
                        expected,
                        found,
                    },
                );
                false
            }
            None => false,
        }
    }

    fn push(&mut self, scope: ScopeId) {
        let diagnostics = self.resolver.push(scope);
        self.diagnostics.extend(diagnostics);
    }

    fn malformed(&mut self, node: &Node, what: &'static str) -> bool {
        self.report(node.line, SemanticError::Malformed { what });
        false
    }

    fn report(&mut self, line: usize, error: SemanticError) {
        let diagnostic = Diagnostic {
            line,
            scope: self.resolver.scope_string(),
            error,
        };
        tracing::debug!(%diagnostic, "semantic error");
        self.diagnostics.push(diagnostic);
    }
}

/// The scope among `candidates` opened by `node`.
fn scope_for(
    table: &SymbolTable<'_>,
    mut candidates: impl Iterator<Item = ScopeId>,
    node: &Node,
) -> Option<ScopeId> {
    candidates.find(|&id| std::ptr::eq(table.get(id).node, node))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn ident(name: &str, line: usize) -> Node {
        Node::new(NodeKind::Identifier, name, line)
    }

    fn var(ty: &str, name: &str, line: usize) -> Node {
        Node::new(NodeKind::VarDecl, ty, line).with_child(ident(name, line))
    }

    fn int(value: i32, line: usize) -> Node {
        Node::new(NodeKind::IntLiteral, value.to_string(), line)
    }

    fn boolean(value: bool, line: usize) -> Node {
        Node::new(NodeKind::BoolLiteral, value.to_string(), line)
    }

    fn binary(op: &str, lhs: Node, rhs: Node) -> Node {
        let line = lhs.line;
        Node::new(NodeKind::BinaryOp, op, line).with_children(vec![lhs, rhs])
    }

    fn assign(name: &str, value: Node) -> Node {
        let line = value.line;
        Node::new(NodeKind::Assign, "", line).with_children(vec![ident(name, line), value])
    }

    fn call(receiver: Node, method: &str, args: Vec<Node>) -> Node {
        let line = receiver.line;
        Node::new(NodeKind::MethodCall, "", line).with_children(vec![
            receiver,
            ident(method, line),
            Node::new(NodeKind::ArgumentList, "", line).with_children(args),
        ])
    }

    fn this(line: usize) -> Node {
        Node::new(NodeKind::This, "", line)
    }

    fn method(ret: &str, name: &str, params: Vec<Node>, body: Vec<Node>, result: Node) -> Node {
        Node::new(NodeKind::MethodDecl, ret, 10).with_children(vec![
            ident(name, 10),
            Node::new(NodeKind::ParameterList, "", 10).with_children(params),
            Node::new(NodeKind::MethodBody, "", 11).with_children(body),
            Node::new(NodeKind::Return, "", 30).with_child(result),
        ])
    }

    /// Program with an empty main class and one class `Calc` holding `methods`.
    fn program(methods: Vec<Node>) -> Node {
        let mut class = Node::new(NodeKind::ClassDecl, "", 5).with_child(ident("Calc", 5));
        class.children.extend(methods);
        Node::new(NodeKind::Program, "", 1).with_children(vec![
            Node::new(NodeKind::MainClass, "", 1).with_child(ident("Main", 1)),
            class,
        ])
    }

    fn diagnostics_of(ast: &Node) -> Vec<SemanticError> {
        let table = SymbolTable::build(ast);
        analyze(&table).into_iter().map(|d| d.error).collect()
    }

    /// Infer the type of `expr` placed as the return expression of a method
    /// with int locals `a`, `b` and boolean locals `p`, `q`.
    fn infer(expr: Node) -> (Option<Type>, Vec<SemanticError>) {
        let body = vec![
            var("int", "a", 11),
            var("int", "b", 11),
            var("boolean", "p", 12),
            var("boolean", "q", 12),
        ];
        let ast = program(vec![method("int", "subject", vec![], body, int(0, 30))]);
        let table = SymbolTable::build(&ast);
        let mut analyzer = SemanticAnalyzer::new(&table);

        let class = table.find_class("Calc").unwrap();
        let subject = table.find_method(class, "subject").unwrap();
        analyzer.push(table.root());
        analyzer.push(class);
        analyzer.push(subject);
        let ty = analyzer.analyze_expression(&expr);
        (ty, analyzer.into_diagnostics().into_iter().map(|d| d.error).collect())
    }

    // ============================================================
    // Expressions
    // ============================================================

    #[test]
    fn test_arithmetic_yields_int() {
        for op in ["+", "-", "*", "/"] {
            let (ty, errors) = infer(binary(op, ident("a", 20), ident("b", 20)));
            assert_eq!(ty, Some(Type::Int), "operator {}", op);
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_comparisons_yield_boolean() {
        for op in ["<", ">", "<=", ">=", "==", "!="] {
            let (ty, errors) = infer(binary(op, ident("a", 20), int(3, 20)));
            assert_eq!(ty, Some(Type::Boolean), "operator {}", op);
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_logical_and_boolean_equality() {
        let (ty, _) = infer(binary("&&", ident("p", 20), ident("q", 20)));
        assert_eq!(ty, Some(Type::Boolean));
        let (ty, _) = infer(binary("==", ident("p", 20), boolean(true, 20)));
        assert_eq!(ty, Some(Type::Boolean));
    }

    #[test]
    fn test_mismatched_operands_rejected() {
        for op in ["+", "-", "*", "/", "<", ">", "<=", ">=", "==", "!=", "&&", "||"] {
            let (ty, errors) = infer(binary(op, ident("a", 20), ident("p", 20)));
            assert_eq!(ty, None, "operator {}", op);
            assert!(
                matches!(errors.as_slice(), [SemanticError::OperandMismatch { .. }]),
                "operator {}: {:?}",
                op,
                errors
            );
        }
    }

    #[test]
    fn test_operator_category_rejects_wrong_operand_type() {
        let (ty, errors) = infer(binary("&&", ident("a", 20), ident("b", 20)));
        assert_eq!(ty, None);
        assert!(matches!(errors.as_slice(), [SemanticError::InvalidOperand { .. }]));

        let (ty, errors) = infer(binary("<", ident("p", 20), ident("q", 20)));
        assert_eq!(ty, None);
        assert!(matches!(errors.as_slice(), [SemanticError::InvalidOperand { .. }]));
    }

    #[test]
    fn test_negation() {
        let not = |operand| Node::new(NodeKind::UnaryOp, "!", 20).with_child(operand);
        assert_eq!(infer(not(ident("p", 20))).0, Some(Type::Boolean));

        let (ty, errors) = infer(not(ident("a", 20)));
        assert_eq!(ty, None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_undefined_identifier_propagates_none() {
        let (ty, errors) = infer(binary("+", ident("missing", 20), int(1, 20)));
        assert_eq!(ty, None);
        assert_eq!(
            errors,
            vec![SemanticError::Undefined {
                kind: SymbolKind::Variable,
                name: "missing".to_string()
            }]
        );
    }

    #[test]
    fn test_use_before_declaration() {
        let (ty, errors) = infer(ident("p", 5));
        assert_eq!(ty, Some(Type::Boolean));
        assert_eq!(
            errors,
            vec![SemanticError::UseBeforeDeclaration {
                name: "p".to_string(),
                declared: 12
            }]
        );
    }

    #[test]
    fn test_this_and_new() {
        assert_eq!(infer(this(20)).0, Some(Type::Class("Calc".to_string())));

        let new = |class: &str| Node::new(NodeKind::New, "", 20).with_child(ident(class, 20));
        assert_eq!(infer(new("Main")).0, Some(Type::Class("Main".to_string())));

        let (ty, errors) = infer(new("Ghost"));
        assert_eq!(ty, None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_array_expressions() {
        let new_array = Node::new(NodeKind::NewArray, "", 20).with_child(int(4, 20));
        assert_eq!(infer(new_array).0, Some(Type::IntArray));

        let bad_size = Node::new(NodeKind::NewArray, "", 20).with_child(boolean(true, 20));
        assert_eq!(infer(bad_size).0, None);

        let length = Node::new(NodeKind::Length, "", 20).with_child(ident("a", 20));
        let (ty, errors) = infer(length);
        assert_eq!(ty, None);
        assert!(matches!(errors.as_slice(), [SemanticError::TypeMismatch { .. }]));
    }

    // ============================================================
    // Calls
    // ============================================================

    fn add_method() -> Node {
        method(
            "int",
            "add",
            vec![var("int", "x", 10), var("int", "y", 10)],
            vec![],
            binary("+", ident("x", 30), ident("y", 30)),
        )
    }

    #[test]
    fn test_call_resolves_return_type() {
        let ast = program(vec![
            add_method(),
            method("int", "run", vec![], vec![], call(this(30), "add", vec![int(1, 30), int(2, 30)])),
        ]);
        assert!(diagnostics_of(&ast).is_empty());
    }

    #[test]
    fn test_void_call_has_no_value() {
        let noop = Node::new(NodeKind::MethodDecl, "void", 10).with_child(ident("noop", 10));
        let printed = Node::new(NodeKind::Print, "", 20).with_child(call(this(20), "noop", vec![]));
        let ast = program(vec![noop, method("int", "run", vec![], vec![printed], int(0, 30))]);
        assert_eq!(
            diagnostics_of(&ast),
            vec![SemanticError::VoidValue {
                method: "Calc.noop".to_string()
            }]
        );
    }

    #[test]
    fn test_void_call_as_operand_reported_once() {
        let noop = Node::new(NodeKind::MethodDecl, "void", 10).with_child(ident("noop", 10));
        let sum = binary("+", call(this(30), "noop", vec![]), int(1, 30));
        let ast = program(vec![noop, method("int", "run", vec![], vec![], sum)]);
        assert_eq!(
            diagnostics_of(&ast),
            vec![SemanticError::VoidValue {
                method: "Calc.noop".to_string()
            }]
        );
    }

    #[test]
    fn test_call_arity_mismatch_keeps_return_type() {
        let ast = program(vec![
            add_method(),
            method(
                "boolean",
                "run",
                vec![],
                vec![],
                binary("<", call(this(30), "add", vec![int(1, 30)]), int(2, 30)),
            ),
        ]);
        let errors = diagnostics_of(&ast);
        assert_eq!(
            errors,
            vec![SemanticError::ArityMismatch {
                method: "add".to_string(),
                expected: 2,
                found: 1
            }]
        );
    }

    #[test]
    fn test_call_argument_type_mismatch() {
        let ast = program(vec![
            add_method(),
            method("int", "run", vec![], vec![], call(this(30), "add", vec![int(1, 30), boolean(true, 30)])),
        ]);
        let errors = diagnostics_of(&ast);
        assert!(matches!(
            errors.as_slice(),
            [SemanticError::ArgumentMismatch { position: 2, .. }]
        ));
    }

    #[test]
    fn test_undeclared_method_is_unresolved_not_fatal() {
        // The failed call feeds a binary operation, which must stay unresolved
        // without a second diagnostic.
        let ast = program(vec![method(
            "int",
            "run",
            vec![],
            vec![],
            binary("+", call(this(30), "nothing", vec![]), int(1, 30)),
        )]);
        let errors = diagnostics_of(&ast);
        assert_eq!(
            errors,
            vec![SemanticError::Undefined {
                kind: SymbolKind::Method,
                name: "Calc.nothing".to_string()
            }]
        );
    }

    #[test]
    fn test_call_on_non_object() {
        let ast = program(vec![method(
            "int",
            "run",
            vec![],
            vec![var("int", "n", 11)],
            call(ident("n", 30), "add", vec![]),
        )]);
        assert!(matches!(
            diagnostics_of(&ast).as_slice(),
            [SemanticError::NotAnObject { .. }]
        ));
    }

    // ============================================================
    // Statements and structure
    // ============================================================

    #[test]
    fn test_redeclared_local_reported_once_and_body_still_checked() {
        let body = vec![
            var("int", "x", 11),
            var("int", "x", 12),
            assign("x", boolean(true, 13)),
        ];
        let ast = program(vec![method("int", "run", vec![], body, int(0, 30))]);
        let errors = diagnostics_of(&ast);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert_eq!(
            errors[0],
            SemanticError::Redeclaration {
                kind: SymbolKind::Variable,
                name: "x".to_string()
            }
        );
        assert!(matches!(errors[1], SemanticError::AssignmentMismatch { .. }));
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        let if_stmt = Node::new(NodeKind::If, "", 13).with_children(vec![
            int(1, 13),
            Node::new(NodeKind::Statements, "", 13),
        ]);
        let while_stmt = Node::new(NodeKind::While, "", 14).with_children(vec![
            ident("n", 14),
            Node::new(NodeKind::Statements, "", 14),
        ]);
        let ast = program(vec![method(
            "int",
            "run",
            vec![],
            vec![var("int", "n", 11), if_stmt, while_stmt],
            int(0, 30),
        )]);
        let errors = diagnostics_of(&ast);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, SemanticError::TypeMismatch { .. })));
    }

    #[test]
    fn test_index_assignment() {
        let index_assign = |target: &str, value: Node| {
            Node::new(NodeKind::IndexAssign, "", 13).with_children(vec![
                ident(target, 13),
                int(0, 13),
                value,
            ])
        };
        let body = vec![
            var("int[]", "arr", 11),
            var("int", "n", 11),
            index_assign("arr", int(5, 13)),
            index_assign("n", int(5, 13)),
            index_assign("arr", boolean(false, 13)),
        ];
        let ast = program(vec![method("int", "run", vec![], body, int(0, 30))]);
        let errors = diagnostics_of(&ast);
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_unknown_class_in_declaration() {
        let ast = program(vec![method(
            "int",
            "run",
            vec![var("Ghost", "g", 10)],
            vec![],
            int(0, 30),
        )]);
        assert_eq!(
            diagnostics_of(&ast),
            vec![SemanticError::Undefined {
                kind: SymbolKind::Class,
                name: "Ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_return_type_mismatch() {
        let ast = program(vec![method("boolean", "run", vec![], vec![], int(0, 30))]);
        assert!(matches!(
            diagnostics_of(&ast).as_slice(),
            [SemanticError::ReturnMismatch { .. }]
        ));
    }

    #[test]
    fn test_missing_return_skips_method() {
        let broken = Node::new(NodeKind::MethodDecl, "int", 10).with_children(vec![
            ident("run", 10),
            Node::new(NodeKind::MethodBody, "", 11).with_child(assign("nope", int(1, 12))),
        ]);
        let ast = program(vec![broken]);
        assert_eq!(
            diagnostics_of(&ast),
            vec![SemanticError::MissingReturn {
                method: "run".to_string()
            }]
        );
    }

    #[test]
    fn test_diagnostic_carries_scope() {
        let ast = program(vec![method("int", "run", vec![], vec![], ident("ghost", 30))]);
        let table = SymbolTable::build(&ast);
        let diagnostics = analyze(&table);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].scope, "global::Calc::run()");
        assert_eq!(
            diagnostics[0].to_string(),
            "line 30: undefined variable 'ghost' in scope 'global::Calc::run()'"
        );
    }
}
