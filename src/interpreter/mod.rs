pub mod tape_interpreter;

use std::io;

use thiserror::Error;

use crate::{cell::Cell, io::ByteIo, lexer::SourcePosition};

pub use self::tape_interpreter::TapeInterpreter;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("tape underflow at {position}: '<' with the cursor already on cell 0")]
    TapeUnderflow { position: SourcePosition },

    #[error("tape overflow at {position}: '>' would move the cursor off a {tape_length}-cell tape")]
    TapeOverflow {
        position: SourcePosition,
        tape_length: usize,
    },

    #[error("step limit of {limit} reached at {position}")]
    StepLimitExceeded {
        position: SourcePosition,
        limit: u64,
    },

    #[error("I/O failed at {position} ('{command}')")]
    Io {
        position: SourcePosition,
        command: char,
        #[source]
        source: io::Error,
    },
}

/// The raw reason a tape operation failed, before the interpreter attaches
/// the source position.
#[derive(Error, Debug)]
pub enum TapeFault {
    #[error("tape underflow")]
    Underflow,
    #[error("tape overflow")]
    Overflow,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub struct Runtime<C: Cell, IO: ByteIo> {
    /// Index of the current cell, always within the tape
    cursor: usize,

    /// Fixed length, zero initialised tape
    tape: Vec<C>,

    eof_value: C,

    io: IO,
}

impl<C: Cell, IO: ByteIo> Runtime<C, IO> {
    pub fn new(tape_length: usize, eof_value: u32, io: IO) -> Self {
        Self {
            cursor: 0,
            tape: vec![C::zero(); tape_length],
            eof_value: C::from_u32(eof_value),
            io,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tape(&self) -> &[C] {
        &self.tape
    }

    /// Seed a cell before running, e.g. to start from a non-zero tape.
    pub fn set_cell(&mut self, index: usize, value: C) {
        if let Some(cell) = self.tape.get_mut(index) {
            *cell = value;
        }
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn increment(&mut self) {
        self.tape[self.cursor] = self.tape[self.cursor].increment();
    }

    pub fn decrement(&mut self) {
        self.tape[self.cursor] = self.tape[self.cursor].decrement();
    }

    pub fn move_left(&mut self) -> Result<(), TapeFault> {
        if self.cursor == 0 {
            return Err(TapeFault::Underflow);
        }
        self.cursor -= 1;
        Ok(())
    }

    pub fn move_right(&mut self) -> Result<(), TapeFault> {
        if self.cursor + 1 >= self.tape.len() {
            return Err(TapeFault::Overflow);
        }
        self.cursor += 1;
        Ok(())
    }

    /// Read one byte into the current cell, storing the EOF sentinel when the
    /// input is exhausted
    pub fn read(&mut self) -> Result<(), TapeFault> {
        let value = match self.io.read_byte()? {
            Some(byte) => C::from_u32(byte as u32),
            None => self.eof_value,
        };
        self.tape[self.cursor] = value;
        Ok(())
    }

    /// Write the low byte of the current cell
    pub fn write(&mut self) -> Result<(), TapeFault> {
        self.io.write_byte(self.tape[self.cursor].low_byte())?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.io.flush()
    }

    /// is the value at the cursor zero?
    pub fn value_is_zero(&self) -> bool {
        self.tape[self.cursor].is_zero()
    }
}
