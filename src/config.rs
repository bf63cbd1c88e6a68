use thiserror::Error;

use crate::cell::CellWidth;

pub const DEFAULT_TAPE_LENGTH: usize = 64 * 1024;
pub const DEFAULT_MAX_NESTING: usize = 4096;

/// Options shared by the interpreter and the lowerer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of cells on the tape
    pub tape_length: usize,
    pub cell_width: CellWidth,
    /// Stored (truncated to the cell width) when `,` hits end of input
    pub eof_value: u32,
    /// Log every token as it's executed or lowered
    pub trace: bool,
    /// Deepest loop nesting the lowerer will accept
    pub max_nesting: usize,
    /// Stop a run after this many steps
    pub step_limit: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_length: DEFAULT_TAPE_LENGTH,
            cell_width: CellWidth::Eight,
            eof_value: 0,
            trace: false,
            max_nesting: DEFAULT_MAX_NESTING,
            step_limit: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tape length must be at least one cell")]
    EmptyTape,

    #[error("tape length {0} does not fit the 32-bit cursor of generated code")]
    TapeTooLong(usize),

    #[error("max nesting must be at least one")]
    ZeroNesting,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tape_length == 0 {
            return Err(ConfigError::EmptyTape);
        }
        if self.tape_length > i32::MAX as usize {
            return Err(ConfigError::TapeTooLong(self.tape_length));
        }
        if self.max_nesting == 0 {
            return Err(ConfigError::ZeroNesting);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert_eq!(config.tape_length, 65536);
        assert_eq!(config.eof_value, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_tape_is_rejected() {
        let config = Config {
            tape_length: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyTape));
    }
}
