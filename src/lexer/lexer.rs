use super::{LexError, SourcePosition, Token, TokenKind};

/// Scans source text into tokens on demand.
///
/// The lexer is an iterator and is `Clone`, so a scan can be restarted from any
/// point by cloning it before advancing.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /** Human Readable positions in file */
    pub cur_line: usize,
    pub cur_col: usize,

    /** 'raw' format / offset within the file (in terms of 'codepoints') */
    pub codepoint_offset: usize,

    chars: std::iter::Peekable<std::str::Chars<'a>>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a str) -> Lexer<'a> {
        Lexer {
            cur_col: 1,
            cur_line: 1,

            codepoint_offset: 0,

            chars: chars.chars().peekable(),
            failed: false,
        }
    }

    fn cur_position(&self) -> SourcePosition {
        SourcePosition {
            offset: self.codepoint_offset,
            line: self.cur_line,
            column: self.cur_col,
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        match self.chars.next() {
            Some(c) => {
                self.cur_col += 1;
                if c == '\n' {
                    self.cur_line += 1;
                    self.cur_col = 1;
                }
                self.codepoint_offset += 1;
                Some(c)
            }
            None => None,
        }
    }

    fn skip_whitespace(&mut self) {
        // `\r` is accepted so CRLF files lex the same as LF ones
        while let Some(&(' ' | '\t' | '\n' | '\r')) = self.chars.peek() {
            self.consume_char();
        }
    }

    /// Returns the next token, `Ok(None)` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let position = self.cur_position();
        match self.consume_char() {
            Some(c) => match TokenKind::from_char(c) {
                Some(kind) => Ok(Some(Token { kind, position })),
                None => Err(LexError {
                    position,
                    character: c,
                }),
            },
            None => Ok(None),
        }
    }

    /// Lexes the whole input, stopping at the first bad character.
    pub fn collect_results(&mut self) -> Result<Vec<Token>, LexError> {
        let mut v = vec![];
        while let Some(token) = self.next_token()? {
            v.push(token);
        }
        Ok(v)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        // once we've reported an error the stream is over
        if self.failed {
            return None;
        }

        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .collect_results()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_all_eight_commands() {
        assert_eq!(
            kinds("+-<>,.[]"),
            vec![
                TokenKind::Increment,
                TokenKind::Decrement,
                TokenKind::MoveLeft,
                TokenKind::MoveRight,
                TokenKind::Read,
                TokenKind::Write,
                TokenKind::LoopStart,
                TokenKind::LoopEnd,
            ]
        );
    }

    #[test]
    fn whitespace_is_skipped_but_counted() {
        let tokens = Lexer::new("+ \n\t-").collect_results().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].position.offset, 4);
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.column, 2);
    }

    #[test]
    fn unknown_character_fails_at_its_offset() {
        let err = Lexer::new("++ x+").collect_results().unwrap_err();
        assert_eq!(err.character, 'x');
        assert_eq!(err.position.offset, 3);
        assert_eq!(err.position.column, 4);
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut lexer = Lexer::new("+?+");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn cloned_lexer_rescans_from_the_same_point() {
        let mut lexer = Lexer::new("+>[-]");
        lexer.next();
        let replay = lexer.clone();
        let first: Vec<_> = lexer.collect();
        let second: Vec<_> = replay.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }
}
