/// Arithmetic and logical commands of the stack machine.
///
/// Binary commands pop two operands (`x` below `y`) and push one result;
/// unary commands replace the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `x + y`
    Add,
    /// `x - y`
    Sub,
    /// `-y`
    Neg,
    /// `x == y`, true is all ones.
    Eq,
    /// `x > y`
    Gt,
    /// `x < y`
    Lt,
    /// Bitwise `x & y`
    And,
    /// Bitwise `x | y`
    Or,
    /// Bitwise `!y`
    Not,
    /// `y << 1`
    ShiftLeft,
    /// `y >> 1`
    ShiftRight,
}

impl Op {
    pub const ALL: [Op; 11] = [
        Op::Add,
        Op::Sub,
        Op::Neg,
        Op::Eq,
        Op::Gt,
        Op::Lt,
        Op::And,
        Op::Or,
        Op::Not,
        Op::ShiftLeft,
        Op::ShiftRight,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Neg => "neg",
            Op::Eq => "eq",
            Op::Gt => "gt",
            Op::Lt => "lt",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
            Op::ShiftLeft => "shiftleft",
            Op::ShiftRight => "shiftright",
        }
    }

    pub fn from_mnemonic(word: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.mnemonic() == word)
    }

    /// Number of operands popped.
    pub fn arity(self) -> usize {
        match self {
            Op::Neg | Op::Not | Op::ShiftLeft | Op::ShiftRight => 1,
            _ => 2,
        }
    }
}

/// Virtual memory segments addressed by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Constant,
        Segment::Argument,
        Segment::Local,
        Segment::Static,
        Segment::This,
        Segment::That,
        Segment::Pointer,
        Segment::Temp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }

    pub fn from_name(word: &str) -> Option<Segment> {
        Segment::ALL.into_iter().find(|seg| seg.name() == word)
    }
}
