use super::graph::{ControlFlowGraph, NameGen, NodeId};
use super::tac::{ParamOrigin, Receiver, Tac};
use crate::analyzer::{ScopeId, SymbolTable};
use crate::bytecode::CompileError;
use crate::lang::{BinaryOperator, Node, NodeKind, Type, UnaryOperator};

/// Token standing for the receiver inside its own class.
pub const SELF_TOKEN: &str = "this";

/// A method's lowered body with the declaration it came from.
#[derive(Debug)]
pub struct EntryPoint<'a> {
    pub class: String,
    pub method: String,
    pub declaration: &'a Node,
    pub is_entry: bool,
    pub graph: ControlFlowGraph,
}

impl EntryPoint<'_> {
    /// `Class.method`, the method's label in the instruction stream.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class, self.method)
    }
}

type Result<T> = std::result::Result<T, CompileError>;

/// Lowers analyzed methods into control-flow graphs of three-address code.
pub struct CfgBuilder<'t, 'a> {
    table: &'t SymbolTable<'a>,
    names: NameGen,
}

/// Per-method lowering state.
struct Lowering<'g> {
    graph: &'g mut ControlFlowGraph,
    class: ScopeId,
    method: ScopeId,
}

impl<'t, 'a> CfgBuilder<'t, 'a> {
    pub fn new(table: &'t SymbolTable<'a>, names: NameGen) -> Self {
        Self { table, names }
    }

    /// Build one entry point per declared method, in declaration order.
    ///
    /// `entry_method` names the program's entry method in the main class; it
    /// ends in `stop` instead of returning.
    pub fn build_all(&mut self, entry_method: &str) -> Result<Vec<EntryPoint<'a>>> {
        let table = self.table;
        let main_class = table.main_class();
        let mut entry_points = Vec::new();

        for class in table.classes() {
            for method in table.methods(class) {
                let is_entry =
                    Some(class) == main_class && table.identifier(method).name() == entry_method;
                entry_points.push(self.build_method(class, method, is_entry)?);
            }
        }

        tracing::info!(methods = entry_points.len(), "control-flow graphs built");
        Ok(entry_points)
    }

    pub fn build_method(&mut self, class: ScopeId, method: ScopeId, is_entry: bool) -> Result<EntryPoint<'a>> {
        let table = self.table;
        let declaration = table.get(method).node;
        let mut graph = ControlFlowGraph::new(&mut self.names);
        let entry = graph.entry();

        // Arguments arrive pushed left to right; bind them back last first.
        // Nothing is pushed for the entry method, so its parameters stay
        // unbound.
        let params = if is_entry { &[][..] } else { declaration.parameters() };
        for param in params.iter().rev() {
            let name = param
                .declared_name()
                .ok_or_else(|| CompileError::malformed(param, "parameter"))?;
            graph.push(entry, Tac::ArgBind { name: name.to_string() });
        }

        let mut lowering = Lowering {
            graph: &mut graph,
            class,
            method,
        };
        let mut current = entry;
        for statement in declaration.body() {
            if statement.kind == NodeKind::VarDecl {
                continue;
            }
            current = self.lower_statement(&mut lowering, current, statement)?;
        }

        let exit = if is_entry {
            Tac::Stop
        } else {
            let value = match declaration.return_expression() {
                Some(expr) => Some(self.lower_expression(&mut lowering, current, expr)?),
                None => None,
            };
            Tac::Return { value }
        };
        graph.push(current, exit);

        let entry_point = EntryPoint {
            class: table.identifier(class).name().to_string(),
            method: table.identifier(method).name().to_string(),
            declaration,
            is_entry,
            graph,
        };
        tracing::debug!(
            method = %entry_point.qualified_name(),
            nodes = entry_point.graph.len(),
            "method lowered"
        );
        Ok(entry_point)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Lower a statement starting in `current`; returns the node that
    /// control reaches afterwards.
    fn lower_statement(&mut self, cx: &mut Lowering<'_>, current: NodeId, node: &Node) -> Result<NodeId> {
        match node.kind {
            NodeKind::Statements => node
                .children
                .iter()
                .try_fold(current, |current, child| self.lower_statement(cx, current, child)),

            NodeKind::VarDecl => Ok(current),

            NodeKind::Assign => {
                let (Some(target), Some(value)) = (node.child(0), node.child(1)) else {
                    return Err(CompileError::malformed(node, "assignment"));
                };
                let value = self.lower_expression(cx, current, value)?;
                cx.graph.push(
                    current,
                    Tac::Assign {
                        target: target.value.clone(),
                        value,
                    },
                );
                Ok(current)
            }

            NodeKind::IndexAssign => {
                let (Some(array), Some(index), Some(value)) = (node.child(0), node.child(1), node.child(2))
                else {
                    return Err(CompileError::malformed(node, "indexed assignment"));
                };
                let index = self.lower_expression(cx, current, index)?;
                let value = self.lower_expression(cx, current, value)?;
                cx.graph.push(
                    current,
                    Tac::IndexedAssign {
                        array: array.value.clone(),
                        index,
                        value,
                    },
                );
                Ok(current)
            }

            NodeKind::If => {
                let (Some(condition), Some(then_branch)) = (node.child(0), node.child(1)) else {
                    return Err(CompileError::malformed(node, "if statement"));
                };
                let else_branch = node.child(2);

                let on_true = cx.graph.add_node(&mut self.names);
                let on_false = else_branch.map(|_| cx.graph.add_node(&mut self.names));
                let join = cx.graph.add_node(&mut self.names);

                let condition = self.lower_expression(cx, current, condition)?;
                cx.graph.branch(current, condition, on_true, on_false.unwrap_or(join));

                let tail = self.lower_statement(cx, on_true, then_branch)?;
                cx.graph.jump(tail, join);

                if let (Some(on_false), Some(else_branch)) = (on_false, else_branch) {
                    let tail = self.lower_statement(cx, on_false, else_branch)?;
                    cx.graph.jump(tail, join);
                }
                Ok(join)
            }

            NodeKind::While => {
                let (Some(condition), Some(body)) = (node.child(0), node.child(1)) else {
                    return Err(CompileError::malformed(node, "while loop"));
                };

                let test = cx.graph.add_node(&mut self.names);
                cx.graph.jump(current, test);
                let condition = self.lower_expression(cx, test, condition)?;

                let on_true = cx.graph.add_node(&mut self.names);
                let join = cx.graph.add_node(&mut self.names);
                cx.graph.branch(test, condition, on_true, join);

                let tail = self.lower_statement(cx, on_true, body)?;
                cx.graph.jump(tail, test);
                Ok(join)
            }

            NodeKind::Print => {
                let Some(expr) = node.first_child() else {
                    return Err(CompileError::malformed(node, "print statement"));
                };
                let value = self.lower_expression(cx, current, expr)?;
                cx.graph.push(current, Tac::Print { value });
                Ok(current)
            }

            _ => Err(CompileError::malformed(node, "statement")),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Lower an expression into `current` and return the operand holding its
    /// value.
    fn lower_expression(&mut self, cx: &mut Lowering<'_>, current: NodeId, node: &Node) -> Result<String> {
        match node.kind {
            NodeKind::IntLiteral | NodeKind::BoolLiteral | NodeKind::StringLiteral | NodeKind::Identifier => {
                Ok(node.value.clone())
            }

            NodeKind::This => Ok(SELF_TOKEN.to_string()),

            NodeKind::BinaryOp => {
                let (Some(lhs), Some(rhs)) = (node.child(0), node.child(1)) else {
                    return Err(CompileError::malformed(node, "binary operation"));
                };
                let op = BinaryOperator::from_symbol(&node.value)
                    .ok_or_else(|| CompileError::malformed(node, "binary operator"))?;
                let lhs = self.lower_expression(cx, current, lhs)?;
                let rhs = self.lower_expression(cx, current, rhs)?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::Binary {
                        result: result.clone(),
                        lhs,
                        op,
                        rhs,
                    },
                );
                Ok(result)
            }

            NodeKind::UnaryOp => {
                let operand = node
                    .first_child()
                    .ok_or_else(|| CompileError::malformed(node, "unary operation"))?;
                let op = UnaryOperator::from_symbol(&node.value)
                    .ok_or_else(|| CompileError::malformed(node, "unary operator"))?;
                let operand = self.lower_expression(cx, current, operand)?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::Unary {
                        result: result.clone(),
                        op,
                        operand,
                    },
                );
                Ok(result)
            }

            NodeKind::MethodCall => self.lower_call(cx, current, node),

            NodeKind::Index => {
                let (Some(array), Some(index)) = (node.child(0), node.child(1)) else {
                    return Err(CompileError::malformed(node, "array index expression"));
                };
                let array = self.lower_expression(cx, current, array)?;
                let index = self.lower_expression(cx, current, index)?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::Index {
                        result: result.clone(),
                        array,
                        index,
                    },
                );
                Ok(result)
            }

            NodeKind::Length => {
                let array = node
                    .first_child()
                    .ok_or_else(|| CompileError::malformed(node, "length expression"))?;
                let array = self.lower_expression(cx, current, array)?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::Length {
                        result: result.clone(),
                        array,
                    },
                );
                Ok(result)
            }

            NodeKind::New => {
                let class = node
                    .declared_name()
                    .ok_or_else(|| CompileError::malformed(node, "object construction"))?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::New {
                        result: result.clone(),
                        class: class.to_string(),
                    },
                );
                Ok(result)
            }

            NodeKind::NewArray => {
                let size = node
                    .first_child()
                    .ok_or_else(|| CompileError::malformed(node, "array construction"))?;
                let size = self.lower_expression(cx, current, size)?;
                let result = self.names.temp();
                cx.graph.push(
                    current,
                    Tac::NewArray {
                        result: result.clone(),
                        size,
                    },
                );
                Ok(result)
            }

            _ => Err(CompileError::malformed(node, "expression")),
        }
    }

    /// Receiver and arguments are lowered first, then pushed left to right
    /// with the receiver as argument 0.
    fn lower_call(&mut self, cx: &mut Lowering<'_>, current: NodeId, node: &Node) -> Result<String> {
        let (Some(receiver), Some(method)) = (node.child(0), node.child(1)) else {
            return Err(CompileError::malformed(node, "method call"));
        };
        let arguments = node
            .child_of_kind(NodeKind::ArgumentList)
            .map(|list| list.children.as_slice())
            .unwrap_or(&[]);

        let target = self.receiver_of(cx, receiver);
        let receiver = self.lower_expression(cx, current, receiver)?;
        let arguments = arguments
            .iter()
            .map(|arg| self.lower_expression(cx, current, arg))
            .collect::<Result<Vec<_>>>()?;

        cx.graph.push(
            current,
            Tac::Param {
                value: receiver,
                origin: ParamOrigin::Receiver(target),
            },
        );
        for value in &arguments {
            cx.graph.push(
                current,
                Tac::Param {
                    value: value.clone(),
                    origin: ParamOrigin::Argument,
                },
            );
        }

        let result = self.names.temp();
        cx.graph.push(
            current,
            Tac::Call {
                result: result.clone(),
                method: method.value.clone(),
                argc: arguments.len() + 1,
            },
        );
        Ok(result)
    }

    fn receiver_of(&self, cx: &Lowering<'_>, receiver: &Node) -> Receiver {
        if receiver.kind == NodeKind::This {
            return Receiver::SelfRef;
        }
        match self.static_type(cx, receiver) {
            Some(Type::Class(class)) => Receiver::Named(class),
            _ => Receiver::Unknown,
        }
    }

    /// Declared type of an expression, as far as the call protocol needs it.
    fn static_type(&self, cx: &Lowering<'_>, node: &Node) -> Option<Type> {
        let table = self.table;
        match node.kind {
            NodeKind::This => Some(Type::Class(table.identifier(cx.class).name().to_string())),
            NodeKind::New => node.declared_name().map(|class| Type::Class(class.to_string())),
            NodeKind::Identifier => table
                .lookup_variable(cx.method, &node.value)
                .and_then(|variable| variable.ty().cloned()),
            NodeKind::MethodCall => {
                let receiver = node.child(0)?;
                let method = node.child(1)?;
                let receiver_type = self.static_type(cx, receiver)?;
                let class = receiver_type.class_name()?;
                table.class_method(class, &method.value)?.ty().cloned()
            }
            _ => None,
        }
    }
}
