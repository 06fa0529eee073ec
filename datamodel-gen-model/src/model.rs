pub mod types;

use crate::location::SourceLocation;
use std::path::PathBuf;
pub use types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub name: String,
    pub productions: Vec<Production>,
    pub namespace: Option<String>,
    /// Name of the generated discriminant enumeration.
    pub kind_enum_name: String,
    pub source_path: Option<PathBuf>,
    pub annotations: Annotations,
    pub location: SourceLocation,
}

impl Grammar {
    pub fn production(&self, name: &str) -> Option<&Production> {
        self.productions.iter().find(|p| p.lhs.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub lhs: NonTerminal,
    pub rhs: Vec<Symbol>,
    pub annotations: Annotations,
    pub location: SourceLocation,
}

impl Production {
    pub fn name(&self) -> &str {
        &self.lhs.name
    }

    /// The RHS if it is exactly one symbol.
    pub fn single_symbol(&self) -> Option<&Symbol> {
        match self.rhs.as_slice() {
            [symbol] => Some(symbol),
            _ => None,
        }
    }

    /// The repeated non-terminal of a collection-shaped production.
    pub fn collection_item(&self) -> Option<&NonTerminal> {
        match self.single_symbol()? {
            Symbol::Structural(inner) => match &**inner {
                Symbol::Star(s) | Symbol::Plus(s) => s.as_single_nonterminal(),
                other => other.as_single_nonterminal(),
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonTerminal {
    /// The property name this reference produces.
    pub name: String,
    /// The type looked up in the resolver tables.
    pub declared_type: String,
    /// The token as written in the grammar.
    pub grammar_type: String,
    pub annotations: Annotations,
    /// `true` if `declared_type` came from a `@type` annotation.
    pub is_user_defined_type: bool,
    pub location: SourceLocation,
}

impl NonTerminal {
    /// Builds a reference from the token text and its leading annotations.
    pub fn new(token: impl Into<String>, annotations: Annotations, location: SourceLocation) -> Self {
        let grammar_type = token.into();
        let name = annotations
            .value("name")
            .map(str::to_string)
            .unwrap_or_else(|| grammar_type.clone());
        let user_type = annotations.value("type").map(str::to_string);
        Self {
            name,
            is_user_defined_type: user_type.is_some(),
            declared_type: user_type.unwrap_or_else(|| grammar_type.clone()),
            grammar_type,
            annotations,
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub text: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(Terminal),
    Group(Vec<Symbol>),
    /// `|`-separated choices; each entry is one group.
    Alternative(Vec<Vec<Symbol>>),
    Star(Box<Symbol>),
    Plus(Box<Symbol>),
    QuestionMark(Box<Symbol>),
    /// The sole RHS element of a collection-shaped production.
    Structural(Box<Symbol>),
}

impl Symbol {
    pub fn location(&self) -> SourceLocation {
        match self {
            Symbol::NonTerminal(nt) => nt.location,
            Symbol::Terminal(t) => t.location,
            Symbol::Star(s) | Symbol::Plus(s) | Symbol::QuestionMark(s) | Symbol::Structural(s) => {
                s.location()
            }
            Symbol::Group(symbols) => symbols.first().map(Symbol::location).unwrap_or_default(),
            Symbol::Alternative(groups) => groups
                .first()
                .and_then(|g| g.first())
                .map(Symbol::location)
                .unwrap_or_default(),
        }
    }

    /// A non-terminal on its own or wrapped in a one-element group.
    pub fn as_single_nonterminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(nt) => Some(nt),
            Symbol::Group(symbols) => match symbols.as_slice() {
                [single] => single.as_single_nonterminal(),
                _ => None,
            },
            _ => None,
        }
    }

    /// A terminal on its own or wrapped in a one-element group.
    pub fn as_single_terminal(&self) -> Option<&Terminal> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::Group(symbols) => match symbols.as_slice() {
                [single] => single.as_single_terminal(),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Views a group as a single symbol when it holds exactly one.
pub fn single_of(group: &[Symbol]) -> Option<&Symbol> {
    match group {
        [symbol] => Some(symbol),
        _ => None,
    }
}

/// An alternative where every group is a single literal.
pub fn is_constant_alternative(groups: &[Vec<Symbol>]) -> bool {
    !groups.is_empty()
        && groups
            .iter()
            .all(|g| single_of(g).and_then(Symbol::as_single_terminal).is_some())
}

/// An alternative where every group is a single non-terminal.
pub fn is_subclass_alternative(groups: &[Vec<Symbol>]) -> bool {
    !groups.is_empty()
        && groups
            .iter()
            .all(|g| single_of(g).and_then(Symbol::as_single_nonterminal).is_some())
}
