//! Parses a token stream into a [`Grammar`].
//!
//! ```text
//! grammar     := annotations 'grammar' IDENT annotations ';' production*
//! production  := annotations 'fragment'? IDENT annotations ':' alternation annotations ';'
//! alternation := group ('|' group)*
//! group       := quantified+
//! quantified  := atom ('*' | '+' | '?')?
//! atom        := annotations IDENT | STRING ('..' STRING)? | '(' alternation ')'
//! ```

use crate::error::{CompileError, CompileResult};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::location::{LineIndex, SourceLocation};
use crate::model::*;

/// Tokenizes and parses a grammar source.
pub fn parse_grammar_source(source: &str) -> CompileResult<Grammar> {
    let tokens = tokenize(source)?;
    Parser::new(source, &tokens).parse_grammar()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    index: LineIndex<'a>,
    source_len: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            index: LineIndex::new(source),
            source_len: source.len(),
        }
    }

    pub fn parse_grammar(mut self) -> CompileResult<Grammar> {
        let mut annotations = self.parse_annotations();
        let keyword = self.expect(TokenKind::Identifier, "'grammar'")?;
        if keyword.text != "grammar" {
            return Err(self.unexpected(keyword, "'grammar'"));
        }
        let location = self.locate(keyword.start);
        let name = self.expect(TokenKind::Identifier, "grammar name")?.text.clone();
        annotations.extend(self.parse_annotations());
        self.expect(TokenKind::Semicolon, "';'")?;

        let mut productions = Vec::new();
        while self.peek().is_some() {
            if let Some(production) = self.parse_production()? {
                productions.push(production);
            }
        }
        log::debug!("parsed grammar '{}' with {} productions", name, productions.len());

        let kind_enum_name = annotations
            .value("enumName")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}Kind", name));

        Ok(Grammar {
            namespace: annotations.value("namespace").map(str::to_string),
            kind_enum_name,
            name,
            productions,
            source_path: None,
            annotations,
            location,
        })
    }

    /// Returns `None` for `fragment` productions, which only matter to a lexer.
    fn parse_production(&mut self) -> CompileResult<Option<Production>> {
        let mut annotations = self.parse_annotations();
        let mut name_token = self.expect(TokenKind::Identifier, "production name")?;
        let is_fragment = name_token.text == "fragment"
            && matches!(self.peek(), Some(t) if t.kind == TokenKind::Identifier);
        if is_fragment {
            name_token = self.expect(TokenKind::Identifier, "production name")?;
        }
        let location = self.locate(name_token.start);
        annotations.extend(self.parse_annotations());
        self.expect(TokenKind::Colon, "':'")?;

        let groups = self.parse_alternation()?;
        // Trailing annotations before ';' carry no meaning.
        self.parse_annotations();
        self.expect(TokenKind::Semicolon, "';'")?;

        if is_fragment {
            log::trace!("skipping fragment '{}'", name_token.text);
            return Ok(None);
        }

        let mut lhs = NonTerminal::new(name_token.text.clone(), annotations.clone(), location);
        lhs.name = name_token.text.clone();

        Ok(Some(Production {
            lhs,
            rhs: production_rhs(groups),
            annotations,
            location,
        }))
    }

    fn parse_alternation(&mut self) -> CompileResult<Vec<Vec<Symbol>>> {
        let mut groups = vec![self.parse_group()?];
        while self.eat(TokenKind::Pipe) {
            groups.push(self.parse_group()?);
        }
        Ok(groups)
    }

    fn parse_group(&mut self) -> CompileResult<Vec<Symbol>> {
        let mut symbols = Vec::new();
        loop {
            let checkpoint = self.pos;
            let annotations = self.parse_annotations();
            match self.peek() {
                Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::StringLiteral | TokenKind::LParen) => {
                    let atom = self.parse_atom(annotations)?;
                    symbols.push(self.parse_quantifier(atom));
                }
                _ => {
                    // Annotations not followed by an atom belong to the caller.
                    self.pos = checkpoint;
                    break;
                }
            }
        }
        if symbols.is_empty() {
            return Err(match self.peek() {
                Some(t) => self.unexpected(t, "a symbol"),
                None => self.eof("a symbol"),
            });
        }
        Ok(symbols)
    }

    fn parse_quantifier(&mut self, atom: Symbol) -> Symbol {
        if self.eat(TokenKind::Star) {
            Symbol::Star(Box::new(atom))
        } else if self.eat(TokenKind::Plus) {
            Symbol::Plus(Box::new(atom))
        } else if self.eat(TokenKind::Question) {
            Symbol::QuestionMark(Box::new(atom))
        } else {
            atom
        }
    }

    fn parse_atom(&mut self, annotations: Annotations) -> CompileResult<Symbol> {
        let token = self.next_token("a symbol")?;
        let location = self.locate(token.start);
        match token.kind {
            TokenKind::Identifier => Ok(Symbol::NonTerminal(NonTerminal::new(
                token.text.clone(),
                annotations,
                location,
            ))),
            TokenKind::StringLiteral => {
                let mut text = unquote(&token.text).to_string();
                if self.eat(TokenKind::Dots) {
                    let upper = self.expect(TokenKind::StringLiteral, "range end")?;
                    text = format!("{}..{}", text, unquote(&upper.text));
                }
                Ok(Symbol::Terminal(Terminal { text, location }))
            }
            TokenKind::LParen => {
                let mut groups = self.parse_alternation()?;
                self.expect(TokenKind::RParen, "')'")?;
                if groups.len() == 1 {
                    Ok(Symbol::Group(groups.remove(0)))
                } else {
                    Ok(Symbol::Alternative(groups))
                }
            }
            _ => Err(self.unexpected(token, "a symbol")),
        }
    }

    /// Collects `@name{value}` pairs. Values without a name are plain comments.
    fn parse_annotations(&mut self) -> Annotations {
        let mut annotations = Annotations::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Annotation => {
                    let location = self.locate(token.start);
                    let name = token.text.clone();
                    self.pos += 1;
                    let value = match self.peek() {
                        Some(v) if v.kind == TokenKind::AnnotationValue => {
                            self.pos += 1;
                            Some(unbrace(&v.text).to_string())
                        }
                        _ => None,
                    };
                    annotations.push(Annotation::new(name, value, location));
                }
                TokenKind::AnnotationValue => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
        annotations
    }

    // --- token helpers ---

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn next_token(&mut self, expected: &str) -> CompileResult<&'a Token> {
        let token = self.peek().ok_or_else(|| self.eof(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> CompileResult<&'a Token> {
        let token = self.next_token(expected)?;
        if token.kind != kind {
            return Err(self.unexpected(token, expected));
        }
        Ok(token)
    }

    fn locate(&self, offset: usize) -> SourceLocation {
        self.index.locate(offset)
    }

    fn unexpected(&self, token: &Token, expected: &str) -> CompileError {
        CompileError::syntax(
            self.locate(token.start),
            format!("expected {}, found {}", expected, token),
        )
    }

    fn eof(&self, expected: &str) -> CompileError {
        CompileError::syntax(
            self.locate(self.source_len),
            format!("expected {}, found end of input", expected),
        )
    }
}

/// Decides how a top-level alternation is stored in a production.
fn production_rhs(mut groups: Vec<Vec<Symbol>>) -> Vec<Symbol> {
    if groups.len() > 1 || is_constant_alternative(&groups) {
        return vec![Symbol::Alternative(groups)];
    }
    let rhs = groups.remove(0);
    let is_collection = matches!(
        rhs.as_slice(),
        [Symbol::Star(inner)] | [Symbol::Plus(inner)] if inner.as_single_nonterminal().is_some()
    );
    if is_collection {
        rhs.into_iter()
            .map(|symbol| Symbol::Structural(Box::new(symbol)))
            .collect()
    } else {
        rhs
    }
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text)
}

fn unbrace(text: &str) -> &str {
    text.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
}

// --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Testable;

    fn parse(source: &str) -> Grammar {
        parse_grammar_source(source).test().assert_success()
    }

    #[test]
    fn test_header_and_annotations() {
        let g = parse(
            "/* @namespace{Acme.Model} */ grammar Calc /* @enumName{CalcNodeKind} */ ;
             Foo : 'a' ;",
        );
        assert_eq!(g.name, "Calc");
        assert_eq!(g.namespace.as_deref(), Some("Acme.Model"));
        assert_eq!(g.kind_enum_name, "CalcNodeKind");
        assert_eq!(g.productions.len(), 1);
    }

    #[test]
    fn test_default_kind_enum_name() {
        let g = parse("grammar Calc; Foo : 'a' ;");
        assert_eq!(g.kind_enum_name, "CalcKind");
    }

    #[test]
    fn test_sequence_with_quantifiers() {
        let g = parse("grammar G; Foo : 'a' Bar? Baz* (',' Qux)+ ;");
        let rhs = &g.productions[0].rhs;
        assert_eq!(rhs.len(), 4);
        assert!(matches!(&rhs[0], Symbol::Terminal(t) if t.text == "a"));
        assert!(matches!(&rhs[1], Symbol::QuestionMark(inner) if inner.as_single_nonterminal().is_some()));
        assert!(matches!(&rhs[2], Symbol::Star(_)));
        match &rhs[3] {
            Symbol::Plus(inner) => match &**inner {
                Symbol::Group(symbols) => assert_eq!(symbols.len(), 2),
                other => panic!("Expected Group inside Plus, got {:?}", other),
            },
            other => panic!("Expected Plus, got {:?}", other),
        }
    }

    #[test]
    fn test_alternatives() {
        let g = parse("grammar G; Shape : Circle | Square ; Color : 'red' | 'green' ; Bar : 'b' ;");
        for production in &g.productions {
            assert!(
                matches!(production.single_symbol(), Some(Symbol::Alternative(_))),
                "{} should be an alternative",
                production.name()
            );
        }
    }

    #[test]
    fn test_collection_is_structural() {
        let g = parse("grammar G; Tags : Tag* ; Tag : ID ;");
        assert!(matches!(g.productions[0].single_symbol(), Some(Symbol::Structural(_))));
        assert!(matches!(g.productions[1].single_symbol(), Some(Symbol::NonTerminal(_))));
    }

    #[test]
    fn test_nonterminal_annotations() {
        let g = parse("grammar G; Foo : /* @name{title} @summary{The title.} */ STRING /* @type{NUMBER} */ DICTIONARY ;");
        let rhs = &g.productions[0].rhs;
        let title = rhs[0].as_single_nonterminal().unwrap();
        assert_eq!(title.name, "title");
        assert_eq!(title.grammar_type, "STRING");
        assert_eq!(title.annotations.value("summary"), Some("The title."));
        let dict = rhs[1].as_single_nonterminal().unwrap();
        assert_eq!(dict.declared_type, "NUMBER");
        assert!(dict.is_user_defined_type);
    }

    #[test]
    fn test_production_annotations_are_merged() {
        let g = parse("grammar G; /* @summary{Doc} */ Foo /* @className{Bar} */ : 'a' /* @ignored */ ;");
        let p = &g.productions[0];
        assert_eq!(p.annotations.value("summary"), Some("Doc"));
        assert_eq!(p.annotations.value("className"), Some("Bar"));
        assert!(!p.annotations.has("ignored"));
    }

    #[test]
    fn test_fragments_and_ranges() {
        let g = parse("grammar G; fragment HEX : 'a'..'f' ; DIGIT : '0'..'9' ;");
        assert_eq!(g.productions.len(), 1);
        let digit = &g.productions[0];
        assert_eq!(digit.name(), "DIGIT");
        match digit.single_symbol() {
            Some(Symbol::Alternative(groups)) => {
                assert!(matches!(&groups[0][0], Symbol::Terminal(t) if t.text == "0..9"))
            }
            other => panic!("Expected Alternative, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        parse_grammar_source("Foo : 'a' ;").test().assert_syntax_failure("'grammar'");
        parse_grammar_source("grammar G; Foo 'a' ;").test().assert_syntax_failure("expected ':'");
        parse_grammar_source("grammar G;\nFoo : ( 'a' ;").test().assert_failure_at(2, 13);
        parse_grammar_source("grammar G; Foo : 'a'").test().assert_failure_contains("end of input");
        parse_grammar_source("grammar G; Foo : 'a' | ;").test().assert_failure_contains("expected a symbol");
        parse_grammar_source("grammar G; Foo : ( 'a' ;").test().assert_failure_contains("expected ')'");
    }
}
