use thiserror::Error;

use crate::{
    brackets::UnmatchedBracket, cfg::LoweringError, codegen::ExecutionError, config::ConfigError,
    interpreter::RuntimeError, lexer::LexError,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("{0}")]
    Bracket(#[from] UnmatchedBracket),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("lowering error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO Error")]
    FileIO(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, pipeline::lower, Program};

    #[test]
    fn nesting_past_the_limit_reads_as_a_user_error() {
        let program = Program::compile("[[[]]]").unwrap();
        let config = Config {
            max_nesting: 2,
            ..Config::default()
        };
        let err = lower(&program, &config).unwrap_err();
        assert!(matches!(err, Error::Lowering(LoweringError::LoopFrameOverflow { limit: 2, .. })));
        let message = err.to_string();
        assert!(message.starts_with("lowering error: '[' at 1:3"), "{}", message);
        assert!(!message.contains("internal"), "{}", message);
    }
}
