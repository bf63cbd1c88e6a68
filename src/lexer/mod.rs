use std::fmt;

use thiserror::Error;

pub mod lexer;

pub use self::lexer::Lexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // `+`: Increment the cell under the cursor by one
    Increment,
    // `-`: Decrement the cell under the cursor by one
    Decrement,

    // `<`: Move the cursor one cell to the left
    MoveLeft,
    // `>`: Move the cursor one cell to the right
    MoveRight,

    // `,`: Read the next byte from the input and store it under the cursor
    Read,
    // `.`: Write the cell under the cursor to the output
    Write,

    // `[`: If the cell under the cursor is zero, jump forward past the matching `]`
    LoopStart,
    // `]`: If the cell under the cursor is non-zero, jump back past the matching `[`
    LoopEnd,
}

impl TokenKind {
    pub fn from_char(c: char) -> Option<TokenKind> {
        match c {
            '+' => Some(TokenKind::Increment),
            '-' => Some(TokenKind::Decrement),
            '<' => Some(TokenKind::MoveLeft),
            '>' => Some(TokenKind::MoveRight),
            ',' => Some(TokenKind::Read),
            '.' => Some(TokenKind::Write),
            '[' => Some(TokenKind::LoopStart),
            ']' => Some(TokenKind::LoopEnd),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            TokenKind::Increment => '+',
            TokenKind::Decrement => '-',
            TokenKind::MoveLeft => '<',
            TokenKind::MoveRight => '>',
            TokenKind::Read => ',',
            TokenKind::Write => '.',
            TokenKind::LoopStart => '[',
            TokenKind::LoopEnd => ']',
        }
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, TokenKind::LoopStart | TokenKind::LoopEnd)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Where a character sits in the source: `offset` counts codepoints from the
/// start, `line`/`column` are 1-based and meant for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: SourcePosition,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized character {character:?} at {position} (offset {})", .position.offset)]
pub struct LexError {
    pub position: SourcePosition,
    pub character: char,
}

/// Renders tokens back into their source characters, dropping whitespace.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.kind.as_char()).collect()
}
