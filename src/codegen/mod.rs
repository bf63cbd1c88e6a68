pub mod executor;
pub mod text;

use crate::{
    cell::CellWidth,
    cfg::{BlockId, ControlFlowGraph, Instruction, Terminator, ValueType},
};

pub use self::{
    executor::{ExecutableFunction, ExecutionError, ExecutionOutcome, Executor},
    text::TextBackend,
};

/// Name of the external input function generated code calls: `int read_byte(void)`
pub const READ_BYTE_SYMBOL: &str = "read_byte";
/// Name of the external output function generated code calls: `int write_byte(int)`
pub const WRITE_BYTE_SYMBOL: &str = "write_byte";

#[derive(Debug, Clone)]
pub struct FunctionSignature<'a> {
    pub name: &'a str,
    pub tape_length: usize,
    pub cell_width: CellWidth,
    /// Type of every value, indexed by value number
    pub values: &'a [ValueType],
}

/// A backend that consumes a block graph.
///
/// [`emit`] calls `begin_function` once, `create_block` for every block in
/// order, and then for each block `position_at_end` followed by its
/// instructions and exactly one terminator.
pub trait CodeGen {
    type Output;

    fn begin_function(&mut self, signature: &FunctionSignature<'_>);

    fn create_block(&mut self, id: BlockId, label: &str);

    fn position_at_end(&mut self, id: BlockId);

    fn emit_instruction(&mut self, instruction: &Instruction);

    fn emit_terminator(&mut self, terminator: &Terminator);

    fn finish(self) -> Self::Output;
}

/// Feed a whole graph through a backend.
pub fn emit<G: CodeGen>(cfg: &ControlFlowGraph, mut codegen: G) -> G::Output {
    codegen.begin_function(&FunctionSignature {
        name: &cfg.name,
        tape_length: cfg.tape_length,
        cell_width: cfg.cell_width,
        values: cfg.values(),
    });

    // create everything up front so forward branches have targets
    for block in cfg.blocks() {
        codegen.create_block(block.id, &block.label);
    }

    for block in cfg.blocks() {
        codegen.position_at_end(block.id);
        for instruction in block.instructions.iter() {
            codegen.emit_instruction(instruction);
        }
        codegen.emit_terminator(&block.terminator);
    }

    codegen.finish()
}
