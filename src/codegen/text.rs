use std::fmt::Write;

use crate::cfg::{BinaryOp, BlockId, Instruction, Predicate, Terminator, Value, ValueType};

use super::{CodeGen, FunctionSignature, READ_BYTE_SYMBOL, WRITE_BYTE_SYMBOL};

/// Renders the graph as an LLVM flavoured listing, one block per label.
///
/// The output is for reading, not for `llc`: cells are addressed as
/// `%tape[index]` instead of through `getelementptr`, and `%head`/`%tape`
/// are never defined. The header comment says so.
#[derive(Debug, Default)]
pub struct TextBackend {
    out: String,
    labels: Vec<String>,
    values: Vec<ValueType>,
    open: bool,
}

impl TextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn bits(&self, value: Value) -> Option<u32> {
        self.values.get(value.0).map(|ty| bits(*ty))
    }

    fn ty(&self, value: Value) -> &'static str {
        match self.values.get(value.0) {
            Some(ty) => type_name(*ty),
            None => "?",
        }
    }

    fn label(&self, id: BlockId) -> String {
        self.labels
            .get(id.0)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    // writing into a String can't fail
    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        let _ = writeln!(self.out, "  {}", line);
    }
}

fn bits(ty: ValueType) -> u32 {
    match ty {
        ValueType::Index | ValueType::Int32 => 32,
        ValueType::Cell(width) => width.bits(),
        ValueType::Bool => 1,
    }
}

fn type_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Index | ValueType::Int32 => "i32",
        ValueType::Cell(width) => match width.bits() {
            8 => "i8",
            _ => "i32",
        },
        ValueType::Bool => "i1",
    }
}

impl CodeGen for TextBackend {
    type Output = String;

    fn begin_function(&mut self, signature: &FunctionSignature<'_>) {
        self.values = signature.values.to_vec();
        let _ = writeln!(self.out, "; block graph listing of @{}, not LLVM IR", signature.name);
        let _ = writeln!(self.out, "declare i32 @{}()", READ_BYTE_SYMBOL);
        let _ = writeln!(self.out, "declare i32 @{}(i32)", WRITE_BYTE_SYMBOL);
        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "; tape: {} x i{}, zero initialised, head starts at 0",
            signature.tape_length,
            signature.cell_width.bits()
        );
        let _ = writeln!(self.out, "define void @{}() {{", signature.name);
    }

    fn create_block(&mut self, id: BlockId, label: &str) {
        debug_assert_eq!(id.0, self.labels.len());
        self.labels.push(label.to_string());
    }

    fn position_at_end(&mut self, id: BlockId) {
        if self.open {
            let _ = writeln!(self.out);
        }
        self.open = true;
        let label = self.label(id);
        let _ = writeln!(self.out, "{}:", label);
    }

    fn emit_instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::LoadHead { dst } => self.line(format_args!("{} = load i32, ptr %head", dst)),
            Instruction::StoreHead { src } => self.line(format_args!("store i32 {}, ptr %head", src)),
            Instruction::LoadCell { dst, index } => {
                let ty = self.ty(*dst);
                self.line(format_args!("{} = load {}, ptr %tape[{}]", dst, ty, index))
            }
            Instruction::StoreCell { index, src } => {
                let ty = self.ty(*src);
                self.line(format_args!("store {} {}, ptr %tape[{}]", ty, src, index))
            }
            Instruction::BinaryImm { dst, op, lhs, imm } => {
                let ty = self.ty(*dst);
                let op = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                };
                self.line(format_args!("{} = {} {} {}, {}", dst, op, ty, lhs, imm))
            }
            Instruction::IntCast { dst, src } => {
                let (from, to) = (self.ty(*src), self.ty(*dst));
                let op = match (self.bits(*src), self.bits(*dst)) {
                    (Some(f), Some(t)) if f < t => "zext",
                    (Some(f), Some(t)) if f > t => "trunc",
                    _ => "bitcast",
                };
                self.line(format_args!("{} = {} {} {} to {}", dst, op, from, src, to))
            }
            Instruction::Compare { dst, predicate, src } => {
                let ty = self.ty(*src);
                let predicate = match predicate {
                    Predicate::Zero => "eq",
                    Predicate::NonZero => "ne",
                };
                self.line(format_args!("{} = icmp {} {} {}, 0", dst, predicate, ty, src))
            }
            Instruction::CallReadByte { dst } => {
                self.line(format_args!("{} = call i32 @{}()", dst, READ_BYTE_SYMBOL))
            }
            Instruction::CallWriteByte { src } => {
                self.line(format_args!("call i32 @{}(i32 {})", WRITE_BYTE_SYMBOL, src))
            }
        }
    }

    fn emit_terminator(&mut self, terminator: &Terminator) {
        match terminator {
            Terminator::Branch(target) => {
                let target = self.label(*target);
                self.line(format_args!("br label %{}", target))
            }
            Terminator::CondBranch {
                condition,
                if_true,
                if_false,
            } => {
                let (if_true, if_false) = (self.label(*if_true), self.label(*if_false));
                self.line(format_args!(
                    "br i1 {}, label %{}, label %{}",
                    condition, if_true, if_false
                ))
            }
            Terminator::Return => self.line(format_args!("ret void")),
        }
    }

    fn finish(mut self) -> String {
        let _ = writeln!(self.out, "}}");
        self.out
    }
}
