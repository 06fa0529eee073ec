//! Character-level tokenizer for grammar files.
//!
//! The lexer is a single-pass state machine. Block comments are scanned for
//! `@annotation` names and `{value}` blocks, which become tokens of their own;
//! everything else inside comments is dropped.

use crate::error::{CompileError, CompileResult, LexErrorKind};
use crate::location::LineIndex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Pipe,
    Colon,
    Semicolon,
    Dots,
    LParen,
    RParen,
    Star,
    Plus,
    Question,
    StringLiteral,
    Identifier,
    Annotation,
    AnnotationValue,
}

/// A lexed token. `start..end` is the byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SkipWhitespace,
    CollectingIdentifier,
    CollectingString,
    CommentCandidate,
    SkipSingleLineComment,
    MultiLineComment,
    MultiLineCommentStar,
    CollectingAnnotation,
    CollectingAnnotationValue,
    CollectingAnnotationValueStar,
    DotsCandidate,
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '\u{2028}' | '\u{2029}')
}

fn punctuation(ch: char) -> Option<TokenKind> {
    match ch {
        '|' => Some(TokenKind::Pipe),
        ':' => Some(TokenKind::Colon),
        ';' => Some(TokenKind::Semicolon),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '*' => Some(TokenKind::Star),
        '+' => Some(TokenKind::Plus),
        '?' => Some(TokenKind::Question),
        _ => None,
    }
}

/// Tokenizes a whole grammar source.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    state: State,
    token_start: usize,
    comment_start: usize,
    brace_depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            state: State::SkipWhitespace,
            token_start: 0,
            comment_start: 0,
            brace_depth: 0,
        }
    }

    fn run(mut self) -> CompileResult<Vec<Token>> {
        for (idx, ch) in self.source.char_indices() {
            self.step(idx, ch)?;
        }
        self.finish()?;
        log::trace!("lexed {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        let text = match kind {
            TokenKind::Annotation => self.source[start + 1..end].to_string(),
            _ => self.source[start..end].to_string(),
        };
        self.tokens.push(Token {
            kind,
            start,
            end,
            text,
        });
    }

    fn error(&self, kind: LexErrorKind, offset: usize) -> CompileError {
        CompileError::Lexical {
            kind,
            location: LineIndex::new(self.source).locate(offset),
        }
    }

    fn step(&mut self, idx: usize, ch: char) -> CompileResult<()> {
        match self.state {
            State::SkipWhitespace => {
                self.token_start = idx;
                self.start_token(idx, ch);
            }
            State::CollectingString => {
                if ch == '\'' {
                    self.emit(TokenKind::StringLiteral, self.token_start, idx + 1);
                    self.state = State::SkipWhitespace;
                }
            }
            State::SkipSingleLineComment => {
                if matches!(ch, '\r' | '\n' | '\u{2028}' | '\u{2029}') {
                    self.state = State::SkipWhitespace;
                }
            }
            State::CommentCandidate => match ch {
                '/' => self.state = State::SkipSingleLineComment,
                '*' => {
                    self.comment_start = idx - 1;
                    self.state = State::MultiLineComment;
                }
                other => return Err(self.error(LexErrorKind::UnexpectedAfterSlash(other), idx - 1)),
            },
            State::MultiLineComment => self.comment_char(idx, ch),
            State::MultiLineCommentStar => match ch {
                '*' => {}
                '/' => self.state = State::SkipWhitespace,
                _ => self.comment_char(idx, ch),
            },
            State::CollectingAnnotation => {
                if is_whitespace(ch) {
                    self.emit(TokenKind::Annotation, self.token_start, idx);
                    self.state = State::MultiLineComment;
                } else {
                    match ch {
                        '*' => {
                            self.emit(TokenKind::Annotation, self.token_start, idx);
                            self.state = State::MultiLineCommentStar;
                        }
                        '{' => {
                            self.emit(TokenKind::Annotation, self.token_start, idx);
                            self.begin_value(idx);
                        }
                        '@' => return Err(self.error(LexErrorKind::NestedAnnotation, self.token_start)),
                        _ => {}
                    }
                }
            }
            State::CollectingAnnotationValue => self.value_char(idx, ch),
            State::CollectingAnnotationValueStar => match ch {
                '/' => {
                    return Err(self.error(
                        LexErrorKind::CommentClosedInAnnotationValue,
                        self.token_start,
                    ))
                }
                _ => {
                    self.state = State::CollectingAnnotationValue;
                    self.value_char(idx, ch);
                }
            },
            State::CollectingIdentifier => {
                if is_whitespace(ch) {
                    self.emit(TokenKind::Identifier, self.token_start, idx);
                    self.state = State::SkipWhitespace;
                } else if matches!(ch, '\'' | '/' | '.') || punctuation(ch).is_some() {
                    self.emit(TokenKind::Identifier, self.token_start, idx);
                    self.token_start = idx;
                    self.state = State::SkipWhitespace;
                    self.start_token(idx, ch);
                }
            }
            State::DotsCandidate => match ch {
                '.' => {
                    self.emit(TokenKind::Dots, self.token_start, idx + 1);
                    self.state = State::SkipWhitespace;
                }
                _ => return Err(self.error(LexErrorKind::SingleDot, self.token_start)),
            },
        }
        Ok(())
    }

    /// Handles the first character of a token from the default state.
    fn start_token(&mut self, idx: usize, ch: char) {
        if is_whitespace(ch) {
            return;
        }
        if let Some(kind) = punctuation(ch) {
            self.emit(kind, idx, idx + ch.len_utf8());
            return;
        }
        self.state = match ch {
            '\'' => State::CollectingString,
            '/' => State::CommentCandidate,
            '.' => State::DotsCandidate,
            _ => State::CollectingIdentifier,
        };
    }

    fn comment_char(&mut self, idx: usize, ch: char) {
        match ch {
            '*' => self.state = State::MultiLineCommentStar,
            '@' => {
                self.token_start = idx;
                self.state = State::CollectingAnnotation;
            }
            '{' => self.begin_value(idx),
            _ => self.state = State::MultiLineComment,
        }
    }

    fn begin_value(&mut self, idx: usize) {
        self.token_start = idx;
        self.brace_depth = 0;
        self.state = State::CollectingAnnotationValue;
    }

    fn value_char(&mut self, idx: usize, ch: char) {
        match ch {
            '{' => self.brace_depth += 1,
            '}' if self.brace_depth > 0 => self.brace_depth -= 1,
            '}' => {
                self.emit(TokenKind::AnnotationValue, self.token_start, idx + 1);
                self.state = State::MultiLineComment;
            }
            '*' => self.state = State::CollectingAnnotationValueStar,
            _ => {}
        }
    }

    fn finish(&mut self) -> CompileResult<()> {
        let len = self.source.len();
        match self.state {
            State::SkipWhitespace | State::SkipSingleLineComment => Ok(()),
            State::CollectingIdentifier => {
                self.emit(TokenKind::Identifier, self.token_start, len);
                Ok(())
            }
            State::CollectingString => Err(self.error(LexErrorKind::UnclosedString, self.token_start)),
            State::MultiLineComment | State::MultiLineCommentStar => {
                Err(self.error(LexErrorKind::UnclosedComment, self.comment_start))
            }
            State::CollectingAnnotation => {
                Err(self.error(LexErrorKind::UnclosedAnnotation, self.token_start))
            }
            State::CollectingAnnotationValue | State::CollectingAnnotationValueStar => {
                Err(self.error(LexErrorKind::UnclosedAnnotationValue, self.token_start))
            }
            State::CommentCandidate => Err(self.error(LexErrorKind::TrailingSlash, len)),
            State::DotsCandidate => Err(self.error(LexErrorKind::SingleDot, len)),
        }
    }
}

// --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Testable;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .test()
            .assert_success()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .test()
            .assert_success()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_annotation_and_value() {
        let tokens = tokenize("/* @summary{This is a test} */").test().assert_success();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Annotation);
        assert_eq!(tokens[0].text, "summary");
        assert_eq!(tokens[1].kind, TokenKind::AnnotationValue);
        assert_eq!(tokens[1].text, "{This is a test}");
        assert_eq!(tokens[0].start, 3);
    }

    #[test]
    fn test_production_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("Foo : 'a' Bar? | (x)* y+ ;"),
            vec![
                Identifier, Colon, StringLiteral, Identifier, Question, Pipe, LParen, Identifier,
                RParen, Star, Identifier, Plus, Semicolon
            ]
        );
    }

    #[test]
    fn test_identifier_closed_by_punctuation() {
        assert_eq!(texts("Foo:Bar|Baz;"), vec!["Foo", ":", "Bar", "|", "Baz", ";"]);
        assert_eq!(texts("a'b'"), vec!["a", "'b'"]);
    }

    #[test]
    fn test_identifier_flushed_at_eof() {
        assert_eq!(texts("grammar Foo"), vec!["grammar", "Foo"]);
    }

    #[test]
    fn test_dots_and_ranges() {
        use TokenKind::*;
        assert_eq!(kinds("'a'..'z'"), vec![StringLiteral, Dots, StringLiteral]);
        assert_eq!(kinds("a..b"), vec![Identifier, Dots, Identifier]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(texts("// line comment\nFoo /* plain ** block */ ;"), vec!["Foo", ";"]);
        assert_eq!(texts("Foo/* x */;"), vec!["Foo", ";"]);
    }

    #[test]
    fn test_nested_braces_in_value() {
        let tokens = tokenize("/* @default{ {\"a\": {}} } */").test().assert_success();
        assert_eq!(tokens[1].text, "{ {\"a\": {}} }");
    }

    #[test]
    fn test_annotation_ends_at_star_or_whitespace() {
        assert_eq!(texts("/* @root*/"), vec!["root"]);
        assert_eq!(texts("/* @root @summary{x} */"), vec!["root", "summary", "{x}"]);
    }

    #[test]
    fn test_star_inside_value() {
        assert_eq!(texts("/* @pattern{a*b} */"), vec!["pattern", "{a*b}"]);
    }

    #[test]
    fn test_lexical_errors() {
        let err = tokenize("Foo : 'abc")
            .test()
            .assert_lexical_failure(LexErrorKind::UnclosedString);
        assert_eq!(err.location().offset, 6);

        tokenize("/* never closed").test().assert_lexical_failure(LexErrorKind::UnclosedComment);
        tokenize("a.").test().assert_lexical_failure(LexErrorKind::SingleDot);
        tokenize("Foo /x")
            .test()
            .assert_lexical_failure(LexErrorKind::UnexpectedAfterSlash('x'));
        tokenize("/* never closed").test().assert_failure_contains("unclosed comment");
        tokenize("/* @summary{open */").test().assert_failure_contains("comment closed inside");
        tokenize("/* @summary{open").test().assert_failure_contains("unclosed annotation value");
        tokenize("/* @summary").test().assert_failure_contains("unclosed annotation");
        tokenize("/* @a@b */").test().assert_failure_contains("'@'");
        tokenize("Foo /x").test().assert_failure_contains("after '/'");
        tokenize("Foo /").test().assert_failure_contains("end of input after '/'");
        tokenize("a . b").test().assert_failure_contains("single '.'");
        tokenize("a.").test().assert_failure_contains("single '.'");
    }

    #[test]
    fn test_error_location_has_line_and_column() {
        tokenize("grammar G;\n  'open").test().assert_failure_at(2, 3);
    }
}
