//! Hand-written lexer turning query text into a stream of [`Token`]s.
//!
//! The lexer is pull-based: each call to [`Lexer::next_token`] scans
//! exactly one token starting at the current position. It is
//! restartable only by constructing a new `Lexer` — there is no way to
//! rewind an existing one, mirroring `oxide_sql_core::lexer::Lexer`.

use crate::token::{Keyword, Span, Token, TokenKind};

/// Errors produced while scanning characters into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A number literal contained a second `.`.
    #[error("number at position {0} has more than one decimal point")]
    MultipleDecimalPoints(usize),

    /// A string literal was never closed before the input ended.
    ///
    /// This is a deliberate divergence from the source program, which
    /// silently returns whatever was accumulated. See DESIGN.md.
    #[error("unterminated string literal starting at position {0}")]
    UnterminatedString(usize),
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    /// Once true, every further call returns `EndOfQuery` without
    /// advancing further — mirrors the original's treatment of `;`.
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.chars().collect(),
            pos: 0,
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn is_ident_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_ident_continue(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            lexeme: self.chars[start..self.pos].iter().collect(),
            span: Span::new(start, self.pos),
        }
    }

    /// Scans and returns the next token. Returns `EndOfQuery` forever
    /// once `;` or end-of-input has been reached.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.done {
            return Ok(Token {
                kind: TokenKind::EndOfQuery,
                lexeme: String::new(),
                span: Span::new(self.pos, self.pos),
            });
        }

        self.skip_whitespace();
        let start = self.pos;

        let Some(c) = self.peek() else {
            self.done = true;
            return Ok(Token {
                kind: TokenKind::EndOfQuery,
                lexeme: String::new(),
                span: Span::new(start, start),
            });
        };

        if c == ';' {
            self.pos += 1;
            self.done = true;
            return Ok(Token {
                kind: TokenKind::EndOfQuery,
                lexeme: ";".to_string(),
                span: Span::new(start, self.pos),
            });
        }

        if Self::is_ident_start(c) {
            return Ok(self.scan_identifier(start));
        }

        if c.is_ascii_digit() {
            return self.scan_number(start);
        }

        if c == '\'' || c == '"' {
            return self.scan_string(start, c);
        }

        self.advance();
        let kind = match c {
            '*' => TokenKind::Star,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '=' => TokenKind::Equal,
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    TokenKind::LessEqual
                }
                Some('>') => {
                    self.advance();
                    TokenKind::NotEqual
                }
                _ => TokenKind::Less,
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.advance();
                    TokenKind::GreaterEqual
                }
                _ => TokenKind::Greater,
            },
            _ => TokenKind::Unknown,
        };
        Ok(self.make(kind, start))
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if Self::is_ident_continue(c)) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = match Keyword::from_word(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        Token {
            kind,
            lexeme: text,
            span: Span::new(start, self.pos),
        }
    }

    fn scan_number(&mut self, start: usize) -> Result<Token, LexError> {
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' {
                if seen_dot {
                    return Err(LexError::MultipleDecimalPoints(self.pos));
                }
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.make(TokenKind::Number, start))
    }

    fn scan_string(&mut self, start: usize, quote: char) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let content_start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    let text: String = self.chars[content_start..self.pos].iter().collect();
                    self.advance(); // closing quote
                    return Ok(Token {
                        kind: TokenKind::String,
                        lexeme: text,
                        span: Span::new(start, self.pos),
                    });
                }
                Some(_) => {
                    self.pos += 1;
                }
                None => return Err(LexError::UnterminatedString(start)),
            }
        }
    }

    /// Lexes the entire input, stopping once `EndOfQuery` is produced.
    /// Mainly useful for tests and tooling; the parser drives the
    /// lexer token-by-token instead.
    #[cfg(test)]
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("input", &self.input)
            .field("pos", &self.pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn skips_whitespace_and_terminates_on_semicolon() {
        let toks = Lexer::new("  SELECT  ;").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Keyword(Keyword::Select));
        assert_eq!(toks[1].kind, TokenKind::EndOfQuery);
    }

    #[test]
    fn end_of_query_is_idempotent() {
        let mut lexer = Lexer::new("SELECT");
        let _ = lexer.next_token().unwrap();
        let first_eof = lexer.next_token().unwrap();
        let second_eof = lexer.next_token().unwrap();
        assert!(first_eof.is_eof());
        assert!(second_eof.is_eof());
    }

    #[test]
    fn identifiers_allow_underscore_and_digits() {
        let toks = Lexer::new("owner_id2").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].lexeme, "owner_id2");
    }

    #[test]
    fn keyword_with_underscore_spelling() {
        let toks = Lexer::new("PRIMARY_KEY").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Keyword(Keyword::PrimaryKey));
    }

    #[test]
    fn data_type_name_lexes_as_identifier() {
        let toks = Lexer::new("INTEGER").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn integer_and_float_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number, TokenKind::EndOfQuery]);
        let toks = Lexer::new("3.14").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "3.14");
    }

    #[test]
    fn second_decimal_point_is_a_lex_error() {
        let err = Lexer::new("1.2.3").tokenize().unwrap_err();
        assert!(matches!(err, LexError::MultipleDecimalPoints(_)));
    }

    #[test]
    fn string_literal_with_either_quote_style() {
        let toks = Lexer::new("'Ada' \"Lin\"").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].lexeme, "Ada");
        assert_eq!(toks[1].kind, TokenKind::String);
        assert_eq!(toks[1].lexeme, "Lin");
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = Lexer::new("'Ada").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString(_)));
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("<= >= <>"),
            vec![
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::NotEqual,
                TokenKind::EndOfQuery,
            ]
        );
    }

    #[test]
    fn single_char_operators_and_delimiters() {
        assert_eq!(
            kinds("* + - , ( ) = < >"),
            vec![
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Comma,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Equal,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::EndOfQuery,
            ]
        );
    }

    #[test]
    fn unknown_character_yields_unknown_token() {
        assert_eq!(kinds("@"), vec![TokenKind::Unknown, TokenKind::EndOfQuery]);
    }

    #[test]
    fn full_statement_tokenizes() {
        let toks = Lexer::new("SELECT * FROM people WHERE id = 1;")
            .tokenize()
            .unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Star,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::EndOfQuery,
            ]
        );
    }
}
