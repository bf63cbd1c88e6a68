use std::fmt;

use crate::cell::CellWidth;

pub mod lowerer;

pub use self::lowerer::{Lowerer, LoweringError};

/// Index of a block inside its [`ControlFlowGraph`]. Branches refer to blocks
/// only through these, the graph owns every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A single-assignment virtual value, numbered per function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub usize);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// The tape cursor, a signed 32-bit index
    Index,
    /// The contents of a single cell
    Cell(CellWidth),
    /// Argument/result of the external `read_byte`/`write_byte` calls
    Int32,
    /// Result of a comparison
    Bool,
}

impl ValueType {
    pub fn bits(&self) -> u32 {
        match self {
            ValueType::Index | ValueType::Int32 => 32,
            ValueType::Cell(width) => width.bits(),
            ValueType::Bool => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// value == 0
    Zero,
    /// value != 0
    NonZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Load the cursor
    LoadHead { dst: Value },
    /// Store the cursor
    StoreHead { src: Value },
    /// Load the cell at `index`
    LoadCell { dst: Value, index: Value },
    /// Store into the cell at `index`
    StoreCell { index: Value, src: Value },
    /// `dst = lhs op imm`, wrapping at the width of `dst`
    BinaryImm {
        dst: Value,
        op: BinaryOp,
        lhs: Value,
        imm: u32,
    },
    /// Zero extend or truncate `src` to the type of `dst`
    IntCast { dst: Value, src: Value },
    /// Compare against zero
    Compare {
        dst: Value,
        predicate: Predicate,
        src: Value,
    },
    /// `dst = read_byte()`
    CallReadByte { dst: Value },
    /// `write_byte(src)`
    CallWriteByte { src: Value },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Branch(BlockId),
    CondBranch {
        condition: Value,
        if_true: BlockId,
        if_false: BlockId,
    },
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminatorKind {
    Branch,
    CondBranch,
    Return,
}

impl Terminator {
    pub fn kind(&self) -> TerminatorKind {
        match self {
            Terminator::Branch(_) => TerminatorKind::Branch,
            Terminator::CondBranch { .. } => TerminatorKind::CondBranch,
            Terminator::Return => TerminatorKind::Return,
        }
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch(target) => vec![*target],
            Terminator::CondBranch {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
            Terminator::Return => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator.successors()
    }
}

/// The lowered program: a single function over a tape of `tape_length` cells,
/// entered at [`ControlFlowGraph::ENTRY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFlowGraph {
    pub name: String,
    pub tape_length: usize,
    pub cell_width: CellWidth,
    blocks: Vec<BasicBlock>,
    values: Vec<ValueType>,
}

/// Block count, terminator kinds and edges, without instructions or labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphShape {
    pub blocks: Vec<(TerminatorKind, Vec<BlockId>)>,
}

impl ControlFlowGraph {
    pub const ENTRY: BlockId = BlockId(0);

    pub(crate) fn new(
        name: String,
        tape_length: usize,
        cell_width: CellWidth,
        blocks: Vec<BasicBlock>,
        values: Vec<ValueType>,
    ) -> Self {
        Self {
            name,
            tape_length,
            cell_width,
            blocks,
            values,
        }
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0)
    }

    pub fn values(&self) -> &[ValueType] {
        &self.values
    }

    pub fn value_type(&self, value: Value) -> Option<ValueType> {
        self.values.get(value.0).copied()
    }

    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|block| block.successors().contains(&id))
            .map(|block| block.id)
            .collect()
    }

    pub fn shape(&self) -> GraphShape {
        GraphShape {
            blocks: self
                .blocks
                .iter()
                .map(|block| (block.terminator.kind(), block.successors()))
                .collect(),
        }
    }
}
