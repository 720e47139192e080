use super::ir::BytecodeContainer;
use super::op::Instruction;
use crate::cfg::{EntryPoint, ParamOrigin, Receiver, SELF_TOKEN, Tac};
use crate::lang::{BinaryOperator, UnaryOperator};

/// An emitted `invokevirtual` and the operand that was its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub invoke: usize,
    pub method: String,
    pub receiver: String,
}

/// An emitted `new` together with the store of its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construction {
    pub class: String,
    pub result: String,
    pub new_index: usize,
    pub store_index: usize,
}

/// What the emitter recorded while flattening one method.
#[derive(Debug, Default)]
pub struct MethodEmission {
    pub call_sites: Vec<CallSite>,
    pub constructions: Vec<Construction>,
}

/// Flatten one method's graph into `out`.
///
/// Blocks are laid out depth first, true exit before false exit, so the
/// block following a conditional branch is always its fall-through.
/// Receiver pushes are marked dead: the operand stack only carries integers,
/// and the callee is addressed by name instead.
pub fn emit_method(out: &mut BytecodeContainer, entry_point: &EntryPoint<'_>) -> MethodEmission {
    let mut emitter = Emitter {
        out,
        receiver: None,
        emission: MethodEmission::default(),
    };
    let graph = &entry_point.graph;

    emitter.out.push(Instruction::MethodLabel(entry_point.qualified_name()));
    for id in graph.depth_first() {
        let node = graph.node(id);
        emitter.out.push(Instruction::BlockLabel(node.block.label.clone()));
        for tac in &node.block.instructions {
            emitter.emit(tac);
        }
        if let Some(terminator) = graph.terminator(id) {
            emitter.emit(&terminator);
        }
    }

    tracing::debug!(
        method = %entry_point.qualified_name(),
        calls = emitter.emission.call_sites.len(),
        "method emitted"
    );
    emitter.emission
}

struct Emitter<'o> {
    out: &'o mut BytecodeContainer,
    /// Receiver of the call whose arguments are being pushed.
    receiver: Option<(String, Receiver)>,
    emission: MethodEmission,
}

impl Emitter<'_> {
    fn emit(&mut self, tac: &Tac) {
        match tac {
            Tac::Binary { result, lhs, op, rhs } => {
                self.load(lhs);
                self.load(rhs);
                for instruction in binary_ops(*op) {
                    self.out.push(instruction);
                }
                self.store(result);
            }

            Tac::Unary { result, op, operand } => {
                self.load(operand);
                match op {
                    UnaryOperator::Not => self.out.push(Instruction::Inot),
                };
                self.store(result);
            }

            Tac::Param { value, origin } => {
                let index = self.load(value);
                if let ParamOrigin::Receiver(receiver) = origin {
                    self.out.mark_dead(index);
                    self.receiver = Some((value.clone(), receiver.clone()));
                }
            }

            Tac::Call { result, method, .. } => {
                let (operand, receiver) = self
                    .receiver
                    .take()
                    .unwrap_or_else(|| (SELF_TOKEN.to_string(), Receiver::SelfRef));
                let class = match &receiver {
                    Receiver::SelfRef => SELF_TOKEN,
                    Receiver::Named(class) => class.as_str(),
                    Receiver::Unknown => operand.as_str(),
                };
                let invoke = self
                    .out
                    .push(Instruction::InvokeVirtual(format!("{}.{}", class, method)));
                self.emission.call_sites.push(CallSite {
                    invoke,
                    method: method.clone(),
                    receiver: operand,
                });
                self.store(result);
            }

            Tac::New { result, class } => {
                let new_index = self.out.push(Instruction::New(class.clone()));
                let store_index = self.store(result);
                self.emission.constructions.push(Construction {
                    class: class.clone(),
                    result: result.clone(),
                    new_index,
                    store_index,
                });
            }

            Tac::NewArray { result, size } => {
                self.load(size);
                self.out.push(Instruction::NewArray);
                self.store(result);
            }

            Tac::Index { result, array, index } => {
                self.load(array);
                self.load(index);
                self.out.push(Instruction::ArrayLoad);
                self.store(result);
            }

            Tac::Length { result, array } => {
                self.load(array);
                self.out.push(Instruction::ArrayLength);
                self.store(result);
            }

            Tac::Assign { target, value } => {
                self.load(value);
                self.store(target);
            }

            Tac::IndexedAssign { array, index, value } => {
                self.load(array);
                self.load(index);
                self.load(value);
                self.out.push(Instruction::ArrayStore);
            }

            Tac::ArgBind { name } => {
                self.store(name);
            }

            Tac::Jump { label } => {
                self.out.push(Instruction::Goto(label.clone()));
            }

            Tac::IfFalse { condition, label } => {
                self.load(condition);
                self.out.push(Instruction::IfFalseGoto(label.clone()));
            }

            Tac::Return { value } => {
                if let Some(value) = value {
                    self.load(value);
                }
                self.out.push(Instruction::Ireturn);
            }

            Tac::Print { value } => {
                self.load(value);
                self.out.push(Instruction::Print);
            }

            Tac::Stop => {
                self.out.push(Instruction::Stop);
            }
        }
    }

    /// Literals go through `iconst`, names through `iload`.
    fn load(&mut self, operand: &str) -> usize {
        let instruction = if is_literal(operand) {
            Instruction::Iconst(operand.to_string())
        } else {
            Instruction::Iload(operand.to_string())
        };
        self.out.push(instruction)
    }

    fn store(&mut self, name: &str) -> usize {
        self.out.push(Instruction::Istore(name.to_string()))
    }
}

/// Names and temporaries never start with a digit, a sign or a quote, so the
/// first character is enough to tell a literal apart. Whether the literal is
/// a valid value is left to the interpreter.
fn is_literal(operand: &str) -> bool {
    operand == "true"
        || operand == "false"
        || operand
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '"')
}

/// `<=`, `>=` and `!=` have no opcode of their own and are emitted as the
/// negation of the opposite comparison.
fn binary_ops(op: BinaryOperator) -> Vec<Instruction> {
    match op {
        BinaryOperator::Add => vec![Instruction::Iadd],
        BinaryOperator::Sub => vec![Instruction::Isub],
        BinaryOperator::Mul => vec![Instruction::Imul],
        BinaryOperator::Div => vec![Instruction::Idiv],
        BinaryOperator::And => vec![Instruction::Iand],
        BinaryOperator::Or => vec![Instruction::Ior],
        BinaryOperator::Lt => vec![Instruction::Ilt],
        BinaryOperator::Gt => vec![Instruction::Igt],
        BinaryOperator::Eq => vec![Instruction::Ieq],
        BinaryOperator::Le => vec![Instruction::Igt, Instruction::Inot],
        BinaryOperator::Ge => vec![Instruction::Ilt, Instruction::Inot],
        BinaryOperator::Ne => vec![Instruction::Ieq, Instruction::Inot],
    }
}
