use std::fmt;

use thiserror::Error;

use crate::lexer::SourcePosition;

pub mod matcher;

pub use self::matcher::match_brackets;

/// Which side of a bracket pair is missing its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketSide {
    /// A `]` with no `[` before it
    CloseWithoutOpen,
    /// A `[` that is never closed
    OpenWithoutClose,
}

impl fmt::Display for BracketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketSide::CloseWithoutOpen => write!(f, "']' without matching '['"),
            BracketSide::OpenWithoutClose => write!(f, "'[' without matching ']'"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unmatched bracket at {position}: {kind}")]
pub struct UnmatchedBracket {
    pub position: SourcePosition,
    /// Index of the offending token in the token stream
    pub token_index: usize,
    pub kind: BracketSide,
}

/// For every bracket token, the index of its partner.
///
/// Indices are token indices, not source offsets. Non-bracket tokens have no
/// entry. Built once by [`match_brackets`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    partners: Vec<Option<usize>>,
    pairs: usize,
    max_depth: usize,
}

impl BracketTable {
    /// The index of the bracket matching the one at `index`.
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.partners.get(index).copied().flatten()
    }

    /// Number of `[`/`]` pairs.
    pub fn pair_count(&self) -> usize {
        self.pairs
    }

    /// Deepest loop nesting seen during matching.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// All pairs as `(open, close)`, ordered by the position of the `[`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.partners
            .iter()
            .enumerate()
            .filter_map(|(open, partner)| match partner {
                Some(close) if *close > open => Some((open, *close)),
                _ => None,
            })
    }
}
