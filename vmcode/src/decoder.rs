use crate::instruction::Instruction;
use crate::op::{Op, Segment};

/// A malformed line in VM text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Decodes VM text into [`Instruction`]s, one per non-blank line.
///
/// `//` comments and surrounding whitespace are ignored.
pub struct VmDecoder<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> VmDecoder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> DecodeError {
        DecodeError {
            line: self.line,
            message: message.into(),
        }
    }

    fn decode_line(&self, line: &str) -> Result<Instruction, DecodeError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let instruction = match words.as_slice() {
            ["push", seg, idx] => Instruction::Push {
                segment: self.segment(seg)?,
                index: self.number(idx)?,
            },
            ["pop", seg, idx] => {
                let segment = self.segment(seg)?;
                if segment == Segment::Constant {
                    return Err(self.error("cannot pop into constant"));
                }
                Instruction::Pop {
                    segment,
                    index: self.number(idx)?,
                }
            }
            ["label", name] => Instruction::Label((*name).to_string()),
            ["goto", name] => Instruction::Goto((*name).to_string()),
            ["if-goto", name] => Instruction::IfGoto((*name).to_string()),
            ["function", name, n] => Instruction::Function {
                name: (*name).to_string(),
                locals: self.number(n)?,
            },
            ["call", name, n] => Instruction::Call {
                name: (*name).to_string(),
                args: self.number(n)?,
            },
            ["return"] => Instruction::Return,
            [word] => match Op::from_mnemonic(word) {
                Some(op) => Instruction::Arithmetic(op),
                None => {
                    return Err(self.error(format!("unknown command `{word}`")));
                }
            },
            _ => return Err(self.error(format!("malformed command `{line}`"))),
        };
        Ok(instruction)
    }

    fn segment(&self, word: &str) -> Result<Segment, DecodeError> {
        Segment::from_name(word)
            .ok_or_else(|| self.error(format!("unknown segment `{word}`")))
    }

    fn number(&self, word: &str) -> Result<u16, DecodeError> {
        word.parse()
            .map_err(|_| self.error(format!("invalid number `{word}`")))
    }
}

impl Iterator for VmDecoder<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            self.line += 1;
            let code = match raw.find("//") {
                Some(i) => &raw[..i],
                None => raw,
            };
            let code = code.trim();
            if !code.is_empty() {
                return Some(self.decode_line(code));
            }
        }
    }
}
