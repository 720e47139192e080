use std::collections::HashMap;
use std::io::Write;

use super::runtime_error::{Fault, RuntimeError};
use crate::bytecode::{Instruction, InstructionParseError};

/// Receiver token of a call on the caller's own class.
const SELF_RECEIVER: &str = "this";

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Method name whose label marks where execution starts.
    pub entry_method: String,
    pub max_steps: Option<usize>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            entry_method: "main".to_string(),
            max_steps: None,
        }
    }
}

/// Per-call state.
#[derive(Debug, Clone, Default)]
struct Activation {
    pc: usize,
    /// Class that declared the running method; `this.m` resolves against it.
    class: String,
    /// Label of the running method, for error context.
    method: String,
    locals: HashMap<String, i32>,
}

/// Stack machine over the bytecode text format.
///
/// Lines are kept as text and decoded when fetched, so a program only fails
/// on a bad line if execution actually reaches it.
pub struct Interpreter {
    program: Vec<String>,
    labels: HashMap<String, usize>,
    stack: Vec<i32>,
    call_stack: Vec<Activation>,
    current: Activation,
    config: InterpreterConfig,
    steps: usize,
    halted: bool,
}

impl Interpreter {
    pub fn new(text: &str) -> Self {
        Self::with_config(text, InterpreterConfig::default())
    }

    pub fn with_config(text: &str, config: InterpreterConfig) -> Self {
        let mut interpreter = Self {
            program: text.lines().map(str::to_string).collect(),
            labels: HashMap::new(),
            stack: Vec::new(),
            call_stack: Vec::new(),
            current: Activation::default(),
            config,
            steps: 0,
            halted: false,
        };
        interpreter.setup();
        interpreter
    }

    /// Index every label and position the root activation at the entry
    /// method's first block. Without an entry label execution starts at the
    /// first line.
    fn setup(&mut self) {
        for (index, line) in self.program.iter().enumerate() {
            if let Ok(instruction) = Instruction::parse(line)
                && let Some(label) = instruction.label()
            {
                self.labels.entry(label.to_string()).or_insert(index);
            }
        }

        let entry_method = self.config.entry_method.as_str();
        let entry = self.program.iter().enumerate().find_map(|(index, line)| {
            let Ok(Instruction::MethodLabel(name)) = Instruction::parse(line) else {
                return None;
            };
            let (class, method) = name.split_once('.')?;
            (method == entry_method).then(|| (index, class.to_string(), name.clone()))
        });

        self.current = match entry {
            Some((index, class, method)) => Activation {
                pc: index + 1,
                class,
                method,
                locals: HashMap::new(),
            },
            None => {
                tracing::debug!(entry = entry_method, "no entry label, starting at line 0");
                Activation::default()
            }
        };
        tracing::debug!(labels = self.labels.len(), pc = self.current.pc, "interpreter loaded");
    }

    pub fn stack(&self) -> &[i32] {
        &self.stack
    }

    /// A local of the running activation.
    pub fn local(&self, name: &str) -> Option<i32> {
        self.current.locals.get(name).copied()
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run until `stop`, writing printed values to `out`, one per line.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), RuntimeError> {
        tracing::info!(class = %self.current.class, pc = self.current.pc, "interpreter started");

        while !self.halted {
            if let Err(fault) = self.step(out) {
                tracing::debug!(%fault, pc = self.current.pc, "interpreter fault");
                return Err(self.fault_with_context(fault));
            }
        }

        tracing::info!(steps = self.steps, "interpreter halted");
        Ok(())
    }

    fn check_limits(&mut self) -> Result<(), Fault> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps
            && self.steps > max
        {
            return Err(Fault::StepLimitExceeded(max));
        }
        Ok(())
    }

    /// Fetch, decode and execute one line.
    fn step<W: Write>(&mut self, out: &mut W) -> Result<(), Fault> {
        self.check_limits()?;

        let pc = self.current.pc;
        let line = self
            .program
            .get(pc)
            .ok_or(Fault::ProgramCounterOutOfBounds(pc))?
            .trim();
        self.current.pc += 1;
        if line.is_empty() {
            return Ok(());
        }

        let instruction = Instruction::parse(line).map_err(|e| match e {
            InstructionParseError::UnknownOpcode(opcode) => Fault::UnknownOpcode(opcode),
            other => Fault::MalformedInstruction {
                line: line.to_string(),
                reason: other.to_string(),
            },
        })?;
        tracing::trace!(pc, %instruction, depth = self.call_stack.len(), "dispatch");

        self.execute(instruction, out)
    }

    fn execute<W: Write>(&mut self, instruction: Instruction, out: &mut W) -> Result<(), Fault> {
        match instruction {
            Instruction::MethodLabel(_) | Instruction::BlockLabel(_) => {}

            // Locals and literals
            Instruction::Iload(name) => {
                let value = self
                    .current
                    .locals
                    .get(&name)
                    .copied()
                    .ok_or(Fault::VariableNotFound(name))?;
                self.stack.push(value);
            }
            Instruction::Iconst(text) => {
                let value = parse_literal(&text)?;
                self.stack.push(value);
            }
            Instruction::Istore(name) => {
                let value = self.pop("istore")?;
                self.current.locals.insert(name, value);
            }

            // Arithmetic
            Instruction::Iadd => self.binary("iadd", |l, r| Ok(l.wrapping_add(r)))?,
            Instruction::Isub => self.binary("isub", |l, r| Ok(l.wrapping_sub(r)))?,
            Instruction::Imul => self.binary("imul", |l, r| Ok(l.wrapping_mul(r)))?,
            Instruction::Idiv => self.binary("idiv", |l, r| {
                if r == 0 {
                    Err(Fault::DivisionByZero)
                } else {
                    Ok(l.wrapping_div(r))
                }
            })?,

            // Logic and comparison
            Instruction::Iand => self.binary("iand", |l, r| Ok((l != 0 && r != 0) as i32))?,
            Instruction::Ior => self.binary("ior", |l, r| Ok((l != 0 || r != 0) as i32))?,
            Instruction::Ieq => self.binary("ieq", |l, r| Ok((l == r) as i32))?,
            Instruction::Ilt => self.binary("ilt", |l, r| Ok((l < r) as i32))?,
            Instruction::Igt => self.binary("igt", |l, r| Ok((l > r) as i32))?,
            Instruction::Inot => {
                let value = self.pop("inot")?;
                self.stack.push((value == 0) as i32);
            }

            // Control flow
            Instruction::Goto(label) => {
                self.current.pc = self.label_index(&label)?;
            }
            Instruction::IfFalseGoto(label) => {
                if self.pop("iffalse")? == 0 {
                    self.current.pc = self.label_index(&label)?;
                }
            }
            Instruction::InvokeVirtual(target) => self.invoke(&target)?,
            Instruction::Ireturn => {
                let caller = self.call_stack.pop().ok_or(Fault::CallStackUnderflow)?;
                self.current = caller;
            }
            Instruction::Print => {
                let value = self.pop("print")?;
                writeln!(out, "{}", value).map_err(Fault::Output)?;
            }
            Instruction::Stop => self.halted = true,

            // Heap
            Instruction::New(_)
            | Instruction::NewArray
            | Instruction::ArrayLoad
            | Instruction::ArrayStore
            | Instruction::ArrayLength => return Err(Fault::Unsupported(instruction.opcode())),
        }
        Ok(())
    }

    /// Save the caller and enter `Class.method` (or `this.method`) with an
    /// empty set of locals. Arguments stay on the operand stack.
    fn invoke(&mut self, target: &str) -> Result<(), Fault> {
        let (class, method) = target
            .split_once('.')
            .ok_or_else(|| Fault::MalformedInstruction {
                line: format!("invokevirtual {}", target),
                reason: "call target must be 'Class.method'".to_string(),
            })?;
        let class = if class == SELF_RECEIVER {
            self.current.class.clone()
        } else {
            class.to_string()
        };
        let label = format!("{}.{}", class, method);
        let start = self.label_index(&label)? + 1;

        let callee = Activation {
            pc: start,
            class,
            method: label,
            locals: HashMap::new(),
        };
        let caller = std::mem::replace(&mut self.current, callee);
        self.call_stack.push(caller);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn pop(&mut self, opcode: &'static str) -> Result<i32, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow(opcode))
    }

    /// Pop the right operand, then the left, and push the result.
    fn binary(
        &mut self,
        opcode: &'static str,
        apply: impl FnOnce(i32, i32) -> Result<i32, Fault>,
    ) -> Result<(), Fault> {
        let rhs = self.pop(opcode)?;
        let lhs = self.pop(opcode)?;
        self.stack.push(apply(lhs, rhs)?);
        Ok(())
    }

    fn label_index(&self, label: &str) -> Result<usize, Fault> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| Fault::LabelNotFound(label.to_string()))
    }

    fn fault_with_context(&self, fault: Fault) -> RuntimeError {
        self.call_stack
            .iter()
            .chain(std::iter::once(&self.current))
            .fold(RuntimeError::new(fault), |err, frame| {
                let method = if frame.method.is_empty() { "<top>" } else { frame.method.as_str() };
                err.with_context(&format!("{} (pc {})", method, frame.pc))
            })
    }
}

/// `true`/`false` are 1/0; anything else must be a 32-bit integer.
fn parse_literal(text: &str) -> Result<i32, Fault> {
    match text {
        "true" => Ok(1),
        "false" => Ok(0),
        _ => text
            .parse::<i32>()
            .map_err(|_| Fault::MalformedLiteral(text.to_string())),
    }
}
