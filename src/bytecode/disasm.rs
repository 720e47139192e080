use std::fmt::Write;

use super::ir::BytecodeContainer;
use super::op::Instruction;

/// Indented listing of a container.
///
/// A method label starts at the left margin, block labels sit one level in
/// and their instructions one level further. `goto`, `ireturn` and `stop`
/// close a block and drop back to block level.
pub fn disassemble(container: &BytecodeContainer) -> String {
    let mut out = String::new();
    let mut level = 0usize;

    for (index, instruction) in container.instructions().iter().enumerate() {
        match instruction {
            Instruction::MethodLabel(_) => {
                if index > 0 {
                    out.push('\n');
                }
                level = 0;
                push_line(&mut out, index, level, instruction);
                level = 1;
            }
            Instruction::BlockLabel(_) => {
                push_line(&mut out, index, 1, instruction);
                level = 2;
            }
            Instruction::Goto(_) | Instruction::Ireturn | Instruction::Stop => {
                push_line(&mut out, index, level, instruction);
                level = level.min(1);
            }
            _ => push_line(&mut out, index, level, instruction),
        }
    }
    out
}

fn push_line(out: &mut String, index: usize, level: usize, instruction: &Instruction) {
    let _ = writeln!(out, "{:04}  {}{}", index, "    ".repeat(level), instruction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_indentation() {
        let text = "Main.main:\nL0:\niconst 1\niffalse goto L1\nL2:\ngoto L1\nL1:\nstop\nFac.run:\nL3:\nireturn\n";
        let container = BytecodeContainer::from_text(text).unwrap();
        let listing = disassemble(&container);

        let expected = "\
0000  Main.main:
0001      L0:
0002          iconst 1
0003          iffalse goto L1
0004      L2:
0005          goto L1
0006      L1:
0007          stop

0008  Fac.run:
0009      L3:
0010          ireturn
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(disassemble(&BytecodeContainer::new()), "");
    }
}
