//! Stack-machine VM code: instructions, an emitter and a text decoder.

mod decoder;
mod instruction;
mod op;
mod writer;

pub use decoder::{DecodeError, VmDecoder};
pub use instruction::Instruction;
pub use op::{Op, Segment};
pub use writer::{InstructionSink, VmWriter};

/// Render instructions as VM text, one per line.
pub fn to_text<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.emit(instruction.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(text: &str) -> Vec<Instruction> {
        VmDecoder::new(text)
            .collect::<Result<_, _>>()
            .expect("valid vm text")
    }

    #[test]
    fn writer_emits_in_call_order() {
        let mut w = VmWriter::new(Vec::new());
        w.function("Main.main", 2);
        w.push(Segment::Constant, 7);
        w.push(Segment::Local, 1);
        w.arithmetic(Op::Add);
        w.pop(Segment::That, 0);
        w.label("L0");
        w.if_goto("L0");
        w.goto("L0");
        w.call("Math.multiply", 2);
        w.return_();
        assert_eq!(w.emitted(), 10);

        let text = to_text(&w.into_sink());
        assert_eq!(
            text,
            "function Main.main 2\n\
             push constant 7\n\
             push local 1\n\
             add\n\
             pop that 0\n\
             label L0\n\
             if-goto L0\n\
             goto L0\n\
             call Math.multiply 2\n\
             return\n"
        );
    }

    #[test]
    fn string_sink_matches_display() {
        let mut text = String::new();
        {
            let mut w = VmWriter::new(&mut text);
            w.push(Segment::Pointer, 0);
            w.arithmetic(Op::ShiftRight);
        }
        assert_eq!(text, "push pointer 0\nshiftright\n");
    }

    #[test]
    fn decoder_reads_writer_output() {
        let mut w = VmWriter::new(String::new());
        w.function("Foo.bar", 0);
        w.push(Segment::Argument, 3);
        w.arithmetic(Op::Not);
        w.pop(Segment::Static, 4);
        w.call("Foo.baz", 1);
        w.return_();
        let text = w.into_sink();

        assert_eq!(
            decode_all(&text),
            vec![
                Instruction::Function {
                    name: "Foo.bar".into(),
                    locals: 0
                },
                Instruction::Push {
                    segment: Segment::Argument,
                    index: 3
                },
                Instruction::Arithmetic(Op::Not),
                Instruction::Pop {
                    segment: Segment::Static,
                    index: 4
                },
                Instruction::Call {
                    name: "Foo.baz".into(),
                    args: 1
                },
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn decoder_skips_comments_and_blank_lines() {
        let text = "// header\n\n  push constant 1   // one\n\tneg\n";
        assert_eq!(
            decode_all(text),
            vec![
                Instruction::Push {
                    segment: Segment::Constant,
                    index: 1
                },
                Instruction::Arithmetic(Op::Neg),
            ]
        );
    }

    #[test]
    fn decoder_reports_line_numbers() {
        let err = VmDecoder::new("push constant 1\n\npush nowhere 2\n")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("nowhere"));
    }

    #[test]
    fn decoder_rejects_pop_constant() {
        let err = VmDecoder::new("pop constant 0").next().unwrap().unwrap_err();
        assert!(err.message.contains("constant"));
    }

    #[test]
    fn stack_effects() {
        let call = Instruction::Call {
            name: "Math.divide".into(),
            args: 2,
        };
        assert_eq!(call.stack_effect(), -1);
        assert_eq!(Instruction::Arithmetic(Op::Neg).stack_effect(), 0);
        assert_eq!(Instruction::Arithmetic(Op::Lt).stack_effect(), -1);
        assert_eq!(Instruction::IfGoto("x".into()).stack_effect(), -1);
    }

    #[test]
    fn mnemonics_are_unique() {
        for op in Op::ALL {
            assert_eq!(Op::from_mnemonic(op.mnemonic()), Some(op));
        }
        for seg in Segment::ALL {
            assert_eq!(Segment::from_name(seg.name()), Some(seg));
        }
    }
}
