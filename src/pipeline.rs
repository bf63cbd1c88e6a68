//! The two backends share one front end: lex, then match brackets, and only
//! then interpret or lower.

use crate::{
    brackets::{match_brackets, BracketTable},
    cell::{Cell, CellWidth},
    cfg::{ControlFlowGraph, Lowerer},
    codegen::{ExecutableFunction, ExecutionOutcome},
    config::Config,
    error::Error,
    interpreter::{Runtime, TapeInterpreter},
    io::ByteIo,
    lexer::{Lexer, Token},
};

/// A token stream that is known to be lexically valid and bracket balanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    tokens: Vec<Token>,
    brackets: BracketTable,
}

impl Program {
    pub fn compile(source: &str) -> Result<Self, Error> {
        let tokens = Lexer::new(source).collect_results()?;
        let brackets = match_brackets(&tokens)?;
        log::debug!(
            "validated {} tokens, {} loops, nesting depth {}",
            tokens.len(),
            brackets.pair_count(),
            brackets.max_depth()
        );
        Ok(Self { tokens, brackets })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn brackets(&self) -> &BracketTable {
        &self.brackets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Final tape, each cell zero extended to 32 bits
    pub tape: Vec<u32>,
    pub cursor: usize,
    pub steps: u64,
}

/// Run `program` on the tape interpreter with the cell width chosen by `config`.
pub fn interpret<IO: ByteIo>(program: &Program, config: &Config, io: &mut IO) -> Result<Interpretation, Error> {
    config.validate()?;
    match config.cell_width {
        CellWidth::Eight => interpret_with::<u8, IO>(program, config, io),
        CellWidth::ThirtyTwo => interpret_with::<u32, IO>(program, config, io),
    }
}

fn interpret_with<C: Cell, IO: ByteIo>(program: &Program, config: &Config, io: &mut IO) -> Result<Interpretation, Error> {
    let mut runtime: Runtime<C, &mut IO> = Runtime::new(config.tape_length, config.eof_value, io);
    let result = TapeInterpreter::new(program)
        .with_trace(config.trace)
        .with_step_limit(config.step_limit)
        .run(&mut runtime);

    // whatever was written before a fault still goes out
    let flushed = runtime.flush();
    let steps = result?;
    flushed?;

    Ok(Interpretation {
        tape: runtime.tape().iter().map(|cell| cell.to_u32()).collect(),
        cursor: runtime.cursor(),
        steps,
    })
}

pub fn lower(program: &Program, config: &Config) -> Result<ControlFlowGraph, Error> {
    config.validate()?;
    Ok(Lowerer::new(config).lower(&program.tokens)?)
}

/// Compile a graph through the executor backend and run it.
pub fn execute<IO: ByteIo>(cfg: &ControlFlowGraph, config: &Config, io: &mut IO) -> Result<ExecutionOutcome, Error> {
    let function = ExecutableFunction::compile(cfg)?
        .with_eof_value(config.eof_value)
        .with_step_limit(config.step_limit);
    Ok(function.run(io)?)
}
