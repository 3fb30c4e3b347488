use crate::instruction::Instruction;
use crate::op::{Op, Segment};

/// Destination for emitted instructions.
///
/// A sink receives instructions in exactly the order they are emitted.
/// Whoever owns the sink also owns any partial output left behind by a
/// failed compilation.
pub trait InstructionSink {
    fn emit(&mut self, instruction: Instruction);
}

impl InstructionSink for Vec<Instruction> {
    fn emit(&mut self, instruction: Instruction) {
        self.push(instruction);
    }
}

/// Appends the textual form, one instruction per line.
impl InstructionSink for String {
    fn emit(&mut self, instruction: Instruction) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = writeln!(self, "{instruction}");
    }
}

impl<S: InstructionSink + ?Sized> InstructionSink for &mut S {
    fn emit(&mut self, instruction: Instruction) {
        (**self).emit(instruction);
    }
}

/// Emits stack-machine instructions into a sink.
///
/// One method per instruction family. Operands are not validated; range
/// and kind checks belong to the caller.
pub struct VmWriter<S: InstructionSink> {
    sink: S,
    emitted: usize,
}

impl<S: InstructionSink> VmWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, emitted: 0 }
    }

    /// Number of instructions emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self, instruction: Instruction) {
        log::trace!("emit {instruction}");
        self.emitted += 1;
        self.sink.emit(instruction);
    }

    /// `push <segment> <index>`
    pub fn push(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Push { segment, index });
    }

    /// `pop <segment> <index>`
    pub fn pop(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Pop { segment, index });
    }

    /// `add`, `sub`, `not`, …
    pub fn arithmetic(&mut self, op: Op) {
        self.emit(Instruction::Arithmetic(op));
    }

    pub fn label(&mut self, name: impl Into<String>) {
        self.emit(Instruction::Label(name.into()));
    }

    pub fn goto(&mut self, name: impl Into<String>) {
        self.emit(Instruction::Goto(name.into()));
    }

    /// `if-goto <name>`: pops the condition, jumps when it is non-zero.
    pub fn if_goto(&mut self, name: impl Into<String>) {
        self.emit(Instruction::IfGoto(name.into()));
    }

    /// `call <name> <args>`
    pub fn call(&mut self, name: impl Into<String>, args: u16) {
        self.emit(Instruction::Call {
            name: name.into(),
            args,
        });
    }

    /// `function <name> <locals>`
    pub fn function(&mut self, name: impl Into<String>, locals: u16) {
        self.emit(Instruction::Function {
            name: name.into(),
            locals,
        });
    }

    pub fn return_(&mut self) {
        self.emit(Instruction::Return);
    }
}
