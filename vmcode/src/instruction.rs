use core::fmt;

use crate::op::{Op, Segment};

/// One stack-machine instruction.
///
/// `Display` renders the exact textual line the downstream translators
/// consume, e.g. `push constant 7` or `call Math.multiply 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push {
        segment: Segment,
        index: u16,
    },
    Pop {
        segment: Segment,
        index: u16,
    },
    Arithmetic(Op),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function {
        name: String,
        locals: u16,
    },
    Call {
        name: String,
        args: u16,
    },
    Return,
}

impl Instruction {
    /// Net change in stack depth when this instruction executes.
    ///
    /// `function` and `return` manage whole frames; they report `0` and
    /// `-1` respectively, i.e. their effect on the callee's working stack.
    pub fn stack_effect(&self) -> isize {
        match self {
            Self::Push { .. } => 1,
            Self::Pop { .. } => -1,
            Self::Arithmetic(op) => 1 - op.arity() as isize,
            Self::Label(_) | Self::Goto(_) | Self::Function { .. } => 0,
            Self::IfGoto(_) => -1,
            Self::Call { args, .. } => 1 - *args as isize,
            Self::Return => -1,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push { segment, index } => {
                write!(f, "push {} {index}", segment.name())
            }
            Self::Pop { segment, index } => {
                write!(f, "pop {} {index}", segment.name())
            }
            Self::Arithmetic(op) => f.write_str(op.mnemonic()),
            Self::Label(name) => write!(f, "label {name}"),
            Self::Goto(name) => write!(f, "goto {name}"),
            Self::IfGoto(name) => write!(f, "if-goto {name}"),
            Self::Function { name, locals } => {
                write!(f, "function {name} {locals}")
            }
            Self::Call { name, args } => write!(f, "call {name} {args}"),
            Self::Return => f.write_str("return"),
        }
    }
}
