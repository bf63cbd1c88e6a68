use crate::{
    brackets::BracketTable,
    cell::Cell,
    io::ByteIo,
    lexer::{Token, TokenKind},
    pipeline::Program,
};

use super::{RuntimeError, Runtime, TapeFault};

/// Walks a validated token stream, resolving every jump through the
/// precomputed bracket table. Only a [`Program`] can supply the pair, so the
/// table always belongs to the tokens.
pub struct TapeInterpreter<'a> {
    tokens: &'a [Token],
    brackets: &'a BracketTable,
    trace: bool,
    step_limit: Option<u64>,
}

impl<'a> TapeInterpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            tokens: program.tokens(),
            brackets: program.brackets(),
            trace: false,
            step_limit: None,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.step_limit = step_limit;
        self
    }

    fn partner(&self, pc: usize) -> usize {
        // Program builds the table from these exact tokens so every bracket has one
        self.brackets
            .partner(pc)
            .unwrap_or_else(|| unreachable!("bracket at {} has no partner", pc))
    }

    pub fn run<C: Cell, IO: ByteIo>(&self, runtime: &mut Runtime<C, IO>) -> Result<u64, RuntimeError> {
        let mut pc = 0;
        let mut steps: u64 = 0;
        let tape_length = runtime.tape().len();

        while pc < self.tokens.len() {
            let token = &self.tokens[pc];

            if let Some(limit) = self.step_limit {
                if steps >= limit {
                    return Err(RuntimeError::StepLimitExceeded {
                        position: token.position,
                        limit,
                    });
                }
            }
            steps += 1;

            if self.trace {
                log::trace!("pc={} head={} executing '{}'", pc, runtime.cursor(), token.kind);
            }

            let locate = |fault: TapeFault| match fault {
                TapeFault::Underflow => RuntimeError::TapeUnderflow {
                    position: token.position,
                },
                TapeFault::Overflow => RuntimeError::TapeOverflow {
                    position: token.position,
                    tape_length,
                },
                TapeFault::Io(source) => RuntimeError::Io {
                    position: token.position,
                    command: token.kind.as_char(),
                    source,
                },
            };

            match token.kind {
                TokenKind::Increment => runtime.increment(),
                TokenKind::Decrement => runtime.decrement(),
                TokenKind::MoveLeft => runtime.move_left().map_err(locate)?,
                TokenKind::MoveRight => runtime.move_right().map_err(locate)?,
                TokenKind::Read => runtime.read().map_err(locate)?,
                TokenKind::Write => runtime.write().map_err(locate)?,
                TokenKind::LoopStart => {
                    if runtime.value_is_zero() {
                        // skip the body entirely
                        pc = self.partner(pc) + 1;
                        continue;
                    }
                }
                TokenKind::LoopEnd => {
                    if !runtime.value_is_zero() {
                        // back to the first token of the body
                        pc = self.partner(pc) + 1;
                        continue;
                    }
                }
            }
            pc += 1;
        }

        if self.trace {
            log::trace!("interpreter done after {} steps", steps);
        }
        Ok(steps)
    }
}
