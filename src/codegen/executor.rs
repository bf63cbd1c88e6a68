use std::io;

use thiserror::Error;

use crate::{
    cell::CellWidth,
    cfg::{BinaryOp, BlockId, ControlFlowGraph, Instruction, Predicate, Terminator, Value, ValueType},
    io::ByteIo,
};

use super::{CodeGen, FunctionSignature};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("block {0} has no terminator")]
    MissingTerminator(BlockId),

    #[error("branch to unknown block {0}")]
    UnknownBlock(BlockId),

    #[error("value {0} used before it was defined")]
    UndefinedValue(Value),

    #[error("cell access below the start of the tape (index {0})")]
    TapeUnderflow(i32),

    #[error("cell access past the end of the tape (index {index}, length {tape_length})")]
    TapeOverflow { index: i32, tape_length: usize },

    #[error("step limit of {0} reached")]
    StepLimitExceeded(u64),

    #[error("external call failed")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
struct CompiledBlock {
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

/// A backend that keeps the graph in memory and runs it directly. It stands in
/// for a native code generator when checking what lowered code does.
#[derive(Debug, Default)]
pub struct Executor {
    tape_length: usize,
    cell_width: CellWidth,
    values: Vec<ValueType>,
    blocks: Vec<CompiledBlock>,
    current: Option<BlockId>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_block(&mut self) -> Option<&mut CompiledBlock> {
        let id = self.current?;
        self.blocks.get_mut(id.0)
    }
}

impl CodeGen for Executor {
    type Output = Result<ExecutableFunction, ExecutionError>;

    fn begin_function(&mut self, signature: &FunctionSignature<'_>) {
        self.tape_length = signature.tape_length;
        self.cell_width = signature.cell_width;
        self.values = signature.values.to_vec();
    }

    fn create_block(&mut self, _id: BlockId, _label: &str) {
        self.blocks.push(CompiledBlock {
            instructions: vec![],
            terminator: None,
        });
    }

    fn position_at_end(&mut self, id: BlockId) {
        self.current = Some(id);
    }

    fn emit_instruction(&mut self, instruction: &Instruction) {
        if let Some(block) = self.current_block() {
            block.instructions.push(instruction.clone());
        }
    }

    fn emit_terminator(&mut self, terminator: &Terminator) {
        if let Some(block) = self.current_block() {
            block.terminator = Some(terminator.clone());
        }
    }

    fn finish(self) -> Self::Output {
        let blocks = self
            .blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| match block.terminator {
                Some(terminator) => Ok((block.instructions, terminator)),
                None => Err(ExecutionError::MissingTerminator(BlockId(index))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExecutableFunction {
            tape_length: self.tape_length,
            cell_width: self.cell_width,
            values: self.values,
            blocks,
            eof_value: 0,
            step_limit: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Final tape, each cell zero extended to 32 bits
    pub tape: Vec<u32>,
    pub head: i32,
    pub steps: u64,
}

#[derive(Debug)]
pub struct ExecutableFunction {
    tape_length: usize,
    cell_width: CellWidth,
    values: Vec<ValueType>,
    blocks: Vec<(Vec<Instruction>, Terminator)>,
    eof_value: u32,
    step_limit: Option<u64>,
}

fn mask(ty: ValueType, value: u32) -> u32 {
    match ty.bits() {
        32 => value,
        bits => value & ((1u32 << bits) - 1),
    }
}

impl ExecutableFunction {
    /// Compile a graph through the [`Executor`] backend.
    pub fn compile(cfg: &ControlFlowGraph) -> Result<Self, ExecutionError> {
        super::emit(cfg, Executor::new())
    }

    /// What `read_byte` returns once the input is exhausted
    pub fn with_eof_value(mut self, eof_value: u32) -> Self {
        self.eof_value = eof_value;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn run(&self, io: &mut impl ByteIo) -> Result<ExecutionOutcome, ExecutionError> {
        self.run_with_tape(io, vec![])
    }

    /// Run starting from `initial` cells (the rest of the tape is zero).
    pub fn run_with_tape(&self, io: &mut impl ByteIo, initial: Vec<u32>) -> Result<ExecutionOutcome, ExecutionError> {
        let mut tape = initial;
        tape.resize(self.tape_length, 0);
        for cell in tape.iter_mut() {
            *cell = self.cell_width.truncate(*cell);
        }

        let mut registers: Vec<Option<u32>> = vec![None; self.values.len()];
        let mut head: i32 = 0;
        let mut steps: u64 = 0;
        let mut block = ControlFlowGraph::ENTRY;

        loop {
            let (instructions, terminator) = self
                .blocks
                .get(block.0)
                .ok_or(ExecutionError::UnknownBlock(block))?;

            for instruction in instructions {
                self.count_step(&mut steps)?;
                match *instruction {
                    Instruction::LoadHead { dst } => self.define(&mut registers, dst, head as u32),
                    Instruction::StoreHead { src } => head = Self::get(&registers, src)? as i32,
                    Instruction::LoadCell { dst, index } => {
                        let index = self.cell_index(Self::get(&registers, index)?)?;
                        self.define(&mut registers, dst, tape[index]);
                    }
                    Instruction::StoreCell { index, src } => {
                        let index = self.cell_index(Self::get(&registers, index)?)?;
                        tape[index] = self.cell_width.truncate(Self::get(&registers, src)?);
                    }
                    Instruction::BinaryImm { dst, op, lhs, imm } => {
                        let lhs = Self::get(&registers, lhs)?;
                        let result = match op {
                            BinaryOp::Add => lhs.wrapping_add(imm),
                            BinaryOp::Sub => lhs.wrapping_sub(imm),
                        };
                        self.define(&mut registers, dst, result);
                    }
                    // values are kept zero extended, so a cast is just a re-mask
                    Instruction::IntCast { dst, src } => {
                        let src = Self::get(&registers, src)?;
                        self.define(&mut registers, dst, src);
                    }
                    Instruction::Compare { dst, predicate, src } => {
                        let src = Self::get(&registers, src)?;
                        let result = match predicate {
                            Predicate::Zero => src == 0,
                            Predicate::NonZero => src != 0,
                        };
                        self.define(&mut registers, dst, result as u32);
                    }
                    Instruction::CallReadByte { dst } => {
                        let byte = match io.read_byte()? {
                            Some(byte) => byte as u32,
                            None => self.eof_value,
                        };
                        self.define(&mut registers, dst, byte);
                    }
                    Instruction::CallWriteByte { src } => {
                        io.write_byte((Self::get(&registers, src)? & 0xFF) as u8)?;
                    }
                }
            }

            self.count_step(&mut steps)?;
            block = match *terminator {
                Terminator::Branch(target) => target,
                Terminator::CondBranch {
                    condition,
                    if_true,
                    if_false,
                } => {
                    if Self::get(&registers, condition)? != 0 {
                        if_true
                    } else {
                        if_false
                    }
                }
                Terminator::Return => break,
            };
        }

        io.flush()?;
        Ok(ExecutionOutcome { tape, head, steps })
    }

    fn count_step(&self, steps: &mut u64) -> Result<(), ExecutionError> {
        if let Some(limit) = self.step_limit {
            if *steps >= limit {
                return Err(ExecutionError::StepLimitExceeded(limit));
            }
        }
        *steps += 1;
        Ok(())
    }

    fn define(&self, registers: &mut [Option<u32>], dst: Value, value: u32) {
        let ty = self.values.get(dst.0).copied().unwrap_or(ValueType::Int32);
        if let Some(slot) = registers.get_mut(dst.0) {
            *slot = Some(mask(ty, value));
        }
    }

    fn get(registers: &[Option<u32>], value: Value) -> Result<u32, ExecutionError> {
        registers
            .get(value.0)
            .copied()
            .flatten()
            .ok_or(ExecutionError::UndefinedValue(value))
    }

    fn cell_index(&self, raw: u32) -> Result<usize, ExecutionError> {
        let index = raw as i32;
        if index < 0 {
            return Err(ExecutionError::TapeUnderflow(index));
        }
        if index as usize >= self.tape_length {
            return Err(ExecutionError::TapeOverflow {
                index,
                tape_length: self.tape_length,
            });
        }
        Ok(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cfg::Lowerer, config::Config, io::MemoryIo, lexer::Lexer};

    fn compile(source: &str, config: &Config) -> ExecutableFunction {
        let tokens = Lexer::new(source).collect_results().unwrap();
        let cfg = Lowerer::new(config).lower(&tokens).unwrap();
        ExecutableFunction::compile(&cfg).unwrap()
    }

    #[test]
    fn runs_transfer_loop() {
        let function = compile("++>+++<[->+<]", &Config::default());
        let outcome = function.run(&mut MemoryIo::default()).unwrap();
        assert_eq!(&outcome.tape[..2], &[0, 5]);
        assert_eq!(outcome.head, 0);
    }

    #[test]
    fn clears_a_seeded_cell() {
        let function = compile("[-]", &Config::default());
        let outcome = function.run_with_tape(&mut MemoryIo::default(), vec![5]).unwrap();
        assert_eq!(outcome.tape[0], 0);
    }

    #[test]
    fn eight_bit_cells_wrap() {
        let function = compile("-", &Config::default());
        let outcome = function.run(&mut MemoryIo::default()).unwrap();
        assert_eq!(outcome.tape[0], 255);
    }

    #[test]
    fn eof_sentinel_is_truncated_to_the_cell() {
        let function = compile(",", &Config::default()).with_eof_value(u32::MAX);
        let outcome = function.run(&mut MemoryIo::default()).unwrap();
        assert_eq!(outcome.tape[0], 255);
    }

    #[test]
    fn thirty_two_bit_cells_keep_the_full_word() {
        let wide = Config {
            cell_width: CellWidth::ThirtyTwo,
            ..Config::default()
        };

        let outcome = compile("-", &wide).run(&mut MemoryIo::default()).unwrap();
        assert_eq!(outcome.tape[0], u32::MAX);

        let outcome = compile(&"+".repeat(300), &wide).run(&mut MemoryIo::default()).unwrap();
        assert_eq!(outcome.tape[0], 300);

        let outcome = compile(",", &wide)
            .with_eof_value(u32::MAX)
            .run(&mut MemoryIo::default())
            .unwrap();
        assert_eq!(outcome.tape[0], u32::MAX);

        // only the low byte reaches write_byte
        let mut io = MemoryIo::default();
        compile("-.", &wide).run(&mut io).unwrap();
        assert_eq!(io.output, vec![0xFF]);

        let mut io = MemoryIo::default();
        let outcome = compile("+++[->++<]>-.", &wide).run(&mut io).unwrap();
        assert_eq!(&outcome.tape[..2], &[0, 5]);
        assert_eq!(io.output, vec![5]);
    }

    #[test]
    fn echoes_through_external_calls() {
        let function = compile(",[.,]", &Config::default());
        let mut io = MemoryIo::new("xyz");
        function.run(&mut io).unwrap();
        assert_eq!(io.output_string(), "xyz");
    }

    #[test]
    fn out_of_tape_access_is_caught_at_runtime() {
        let config = Config {
            tape_length: 2,
            ..Config::default()
        };
        let function = compile("<+", &config);
        assert!(matches!(
            function.run(&mut MemoryIo::default()),
            Err(ExecutionError::TapeUnderflow(-1))
        ));

        let function = compile(">>+", &config);
        assert!(matches!(
            function.run(&mut MemoryIo::default()),
            Err(ExecutionError::TapeOverflow { index: 2, tape_length: 2 })
        ));
    }

    #[test]
    fn step_limit_stops_infinite_loops() {
        let function = compile("+[]", &Config::default()).with_step_limit(Some(1000));
        assert!(matches!(
            function.run(&mut MemoryIo::default()),
            Err(ExecutionError::StepLimitExceeded(1000))
        ));
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let mut executor = Executor::new();
        executor.begin_function(&FunctionSignature {
            name: "broken",
            tape_length: 1,
            cell_width: CellWidth::Eight,
            values: &[],
        });
        executor.create_block(BlockId(0), "entry");
        assert!(matches!(executor.finish(), Err(ExecutionError::MissingTerminator(BlockId(0)))));
    }
}
