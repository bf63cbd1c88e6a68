use thiserror::Error;

use crate::{
    cell::CellWidth,
    config::Config,
    lexer::{SourcePosition, Token, TokenKind},
};

use super::{
    BasicBlock, BinaryOp, BlockId, ControlFlowGraph, Instruction, Predicate, Terminator, Value,
    ValueType,
};

/// Failures here mean the tokens were never run through the bracket matcher
/// (or nest deeper than allowed); validated input never produces them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    #[error("']' at {position} closes a loop that was never opened")]
    LoopFrameUnderflow { position: SourcePosition },

    #[error("'[' at {position} nests deeper than the limit of {limit}")]
    LoopFrameOverflow {
        position: SourcePosition,
        limit: usize,
    },

    #[error("'[' at {position} is still open at the end of the program")]
    UnclosedLoop { position: SourcePosition },

    #[error("internal: block {0} was never terminated")]
    UnterminatedBlock(BlockId),
}

/// The blocks a loop branches between while its body is being lowered.
#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    body: BlockId,
    exit: BlockId,
    opened_at: SourcePosition,
}

#[derive(Debug)]
struct PendingBlock {
    label: String,
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

/// State for one lowering run. Nothing outlives the call to
/// [`Lowerer::lower`], so repeated runs never see each other's frames.
struct FunctionBuilder {
    cell_type: ValueType,
    blocks: Vec<PendingBlock>,
    values: Vec<ValueType>,
    current: BlockId,
    frames: Vec<LoopFrame>,
    loops: usize,
}

impl FunctionBuilder {
    fn new(cell_width: CellWidth) -> Self {
        let mut builder = Self {
            cell_type: ValueType::Cell(cell_width),
            blocks: vec![],
            values: vec![],
            current: ControlFlowGraph::ENTRY,
            frames: vec![],
            loops: 0,
        };
        builder.create_block("entry".to_string());
        builder
    }

    fn create_block(&mut self, label: String) -> BlockId {
        self.blocks.push(PendingBlock {
            label,
            instructions: vec![],
            terminator: None,
        });
        BlockId(self.blocks.len() - 1)
    }

    fn value(&mut self, ty: ValueType) -> Value {
        self.values.push(ty);
        Value(self.values.len() - 1)
    }

    fn push(&mut self, instruction: Instruction) {
        self.blocks[self.current.0].instructions.push(instruction);
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current.0];
        debug_assert!(block.terminator.is_none(), "block {} terminated twice", self.current);
        block.terminator = Some(terminator);
    }

    fn load_head(&mut self) -> Value {
        let dst = self.value(ValueType::Index);
        self.push(Instruction::LoadHead { dst });
        dst
    }

    fn load_cell(&mut self, index: Value) -> Value {
        let dst = self.value(self.cell_type);
        self.push(Instruction::LoadCell { dst, index });
        dst
    }

    fn binary(&mut self, op: BinaryOp, lhs: Value, ty: ValueType) -> Value {
        let dst = self.value(ty);
        self.push(Instruction::BinaryImm {
            dst,
            op,
            lhs,
            imm: 1,
        });
        dst
    }

    fn compare(&mut self, predicate: Predicate, src: Value) -> Value {
        let dst = self.value(ValueType::Bool);
        self.push(Instruction::Compare {
            dst,
            predicate,
            src,
        });
        dst
    }

    fn shift_head(&mut self, op: BinaryOp) {
        let head = self.load_head();
        let moved = self.binary(op, head, ValueType::Index);
        self.push(Instruction::StoreHead { src: moved });
    }

    fn update_cell(&mut self, op: BinaryOp) {
        let head = self.load_head();
        let cell = self.load_cell(head);
        let updated = self.binary(op, cell, self.cell_type);
        self.push(Instruction::StoreCell {
            index: head,
            src: updated,
        });
    }

    fn read(&mut self) {
        let byte = self.value(ValueType::Int32);
        self.push(Instruction::CallReadByte { dst: byte });
        let cast = self.value(self.cell_type);
        self.push(Instruction::IntCast { dst: cast, src: byte });
        let head = self.load_head();
        self.push(Instruction::StoreCell { index: head, src: cast });
    }

    fn write(&mut self) {
        let head = self.load_head();
        let cell = self.load_cell(head);
        let cast = self.value(ValueType::Int32);
        self.push(Instruction::IntCast { dst: cast, src: cell });
        self.push(Instruction::CallWriteByte { src: cast });
    }

    fn open_loop(&mut self, position: SourcePosition, limit: usize) -> Result<(), LoweringError> {
        if self.frames.len() >= limit {
            return Err(LoweringError::LoopFrameOverflow { position, limit });
        }

        let head = self.load_head();
        let cell = self.load_cell(head);
        let is_zero = self.compare(Predicate::Zero, cell);

        self.loops += 1;
        let body = self.create_block(format!("loop_body{}", self.loops));
        let exit = self.create_block(format!("loop_exit{}", self.loops));
        self.terminate(Terminator::CondBranch {
            condition: is_zero,
            if_true: exit,
            if_false: body,
        });

        self.frames.push(LoopFrame {
            body,
            exit,
            opened_at: position,
        });
        self.current = body;
        Ok(())
    }

    fn close_loop(&mut self, position: SourcePosition) -> Result<(), LoweringError> {
        let frame = self
            .frames
            .pop()
            .ok_or(LoweringError::LoopFrameUnderflow { position })?;

        let head = self.load_head();
        let cell = self.load_cell(head);
        let non_zero = self.compare(Predicate::NonZero, cell);
        self.terminate(Terminator::CondBranch {
            condition: non_zero,
            if_true: frame.body,
            if_false: frame.exit,
        });

        self.current = frame.exit;
        Ok(())
    }

    fn finish(mut self, name: String, tape_length: usize, cell_width: CellWidth) -> Result<ControlFlowGraph, LoweringError> {
        if let Some(frame) = self.frames.last() {
            return Err(LoweringError::UnclosedLoop {
                position: frame.opened_at,
            });
        }
        self.terminate(Terminator::Return);

        let blocks = self
            .blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                let id = BlockId(index);
                let terminator = block.terminator.ok_or(LoweringError::UnterminatedBlock(id))?;
                Ok(BasicBlock {
                    id,
                    label: block.label,
                    instructions: block.instructions,
                    terminator,
                })
            })
            .collect::<Result<Vec<_>, LoweringError>>()?;

        Ok(ControlFlowGraph::new(name, tape_length, cell_width, blocks, self.values))
    }
}

/// Turns a token stream into a [`ControlFlowGraph`].
///
/// Each `[` ends the current block with a branch on the cell being zero and
/// opens a body and an exit block, each `]` branches back to the body while
/// the cell is non-zero and continues in the exit block. So a program with
/// `n` loops always lowers to `2n + 1` blocks.
#[derive(Debug, Clone)]
pub struct Lowerer {
    name: String,
    tape_length: usize,
    cell_width: CellWidth,
    max_nesting: usize,
    trace: bool,
}

impl Lowerer {
    pub fn new(config: &Config) -> Self {
        Self {
            name: "run".to_string(),
            tape_length: config.tape_length,
            cell_width: config.cell_width,
            max_nesting: config.max_nesting,
            trace: config.trace,
        }
    }

    pub fn lower(&self, tokens: &[Token]) -> Result<ControlFlowGraph, LoweringError> {
        let mut builder = FunctionBuilder::new(self.cell_width);

        for token in tokens {
            if self.trace {
                log::trace!("lower: lowering '{}' into {}", token.kind, builder.current);
            }

            match token.kind {
                TokenKind::Increment => builder.update_cell(BinaryOp::Add),
                TokenKind::Decrement => builder.update_cell(BinaryOp::Sub),
                TokenKind::MoveRight => builder.shift_head(BinaryOp::Add),
                TokenKind::MoveLeft => builder.shift_head(BinaryOp::Sub),
                TokenKind::Read => builder.read(),
                TokenKind::Write => builder.write(),
                TokenKind::LoopStart => builder.open_loop(token.position, self.max_nesting)?,
                TokenKind::LoopEnd => builder.close_loop(token.position)?,
            }
        }

        let cfg = builder.finish(self.name.clone(), self.tape_length, self.cell_width)?;
        log::debug!(
            "lowered {} tokens into {} blocks and {} values",
            tokens.len(),
            cfg.blocks().len(),
            cfg.values().len()
        );
        Ok(cfg)
    }
}
