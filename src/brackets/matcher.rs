use crate::lexer::{Token, TokenKind};

use super::{BracketSide, BracketTable, UnmatchedBracket};

/// Pairs every `[` with its `]` in one left to right pass.
///
/// The first violation wins: a `]` with an empty stack fails on the spot,
/// otherwise whatever `[` is left on top of the stack at the end is reported.
pub fn match_brackets(tokens: &[Token]) -> Result<BracketTable, UnmatchedBracket> {
    let mut partners = vec![None; tokens.len()];
    let mut open: Vec<usize> = vec![];
    let mut pairs = 0;
    let mut max_depth = 0;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LoopStart => {
                open.push(index);
                max_depth = max_depth.max(open.len());
            }
            TokenKind::LoopEnd => {
                let start = open.pop().ok_or(UnmatchedBracket {
                    position: token.position,
                    token_index: index,
                    kind: BracketSide::CloseWithoutOpen,
                })?;
                partners[start] = Some(index);
                partners[index] = Some(start);
                pairs += 1;
            }
            _ => {}
        }
    }

    if let Some(&start) = open.last() {
        return Err(UnmatchedBracket {
            position: tokens[start].position,
            token_index: start,
            kind: BracketSide::OpenWithoutClose,
        });
    }

    Ok(BracketTable {
        partners,
        pairs,
        max_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn table(source: &str) -> Result<BracketTable, UnmatchedBracket> {
        match_brackets(&Lexer::new(source).collect_results().unwrap())
    }

    #[test]
    fn nested_pairs_are_matched() {
        let table = table("[[-]+[>]]").unwrap();
        assert_eq!(table.partner(0), Some(8));
        assert_eq!(table.partner(1), Some(3));
        assert_eq!(table.partner(5), Some(7));
        assert_eq!(table.partner(2), None);
        assert_eq!(table.pair_count(), 3);
        assert_eq!(table.max_depth(), 2);
        assert_eq!(table.pairs().collect::<Vec<_>>(), vec![(0, 8), (1, 3), (5, 7)]);
    }

    #[test]
    fn partner_is_an_involution() {
        let table = table("+[>[<+>-]<[[]]]-[]").unwrap();
        for (open, close) in table.pairs() {
            assert_eq!(table.partner(close), Some(open));
            assert_eq!(table.partner(table.partner(open).unwrap()), Some(open));
        }
    }

    #[test]
    fn lone_close_is_reported_where_it_is() {
        let err = table("+-]").unwrap_err();
        assert_eq!(err.kind, BracketSide::CloseWithoutOpen);
        assert_eq!(err.position.offset, 2);
        assert_eq!(err.token_index, 2);
    }

    #[test]
    fn close_before_any_open_wins_over_later_opens() {
        let err = table("][[").unwrap_err();
        assert_eq!(err.kind, BracketSide::CloseWithoutOpen);
        assert_eq!(err.position.offset, 0);
    }

    #[test]
    fn unclosed_open_reports_innermost_leftover() {
        let err = table("[ [ [] ").unwrap_err();
        assert_eq!(err.kind, BracketSide::OpenWithoutClose);
        assert_eq!(err.position.offset, 2);
        assert_eq!(err.token_index, 1);
    }

    #[test]
    fn same_input_same_error() {
        assert_eq!(table("[]]]["), table("[]]]["));
    }

    #[test]
    fn empty_program_has_no_pairs() {
        let table = table("").unwrap();
        assert_eq!(table.pair_count(), 0);
        assert_eq!(table.max_depth(), 0);
    }
}
