use crate::location::SourceLocation;
use thiserror::Error;

pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// What went wrong while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    UnclosedString,
    UnclosedComment,
    UnclosedAnnotation,
    UnclosedAnnotationValue,
    /// A `/` that starts neither `//` nor `/*`.
    UnexpectedAfterSlash(char),
    /// End of input right after a `/`.
    TrailingSlash,
    /// A `.` not followed by a second `.`.
    SingleDot,
    /// `@` inside an annotation name.
    NestedAnnotation,
    /// `*/` before the annotation value was closed.
    CommentClosedInAnnotationValue,
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErrorKind::UnclosedString => write!(f, "unclosed string literal"),
            LexErrorKind::UnclosedComment => write!(f, "unclosed comment"),
            LexErrorKind::UnclosedAnnotation => write!(f, "unclosed annotation"),
            LexErrorKind::UnclosedAnnotationValue => write!(f, "unclosed annotation value"),
            LexErrorKind::UnexpectedAfterSlash(ch) => {
                write!(f, "unexpected character '{}' after '/'", ch)
            }
            LexErrorKind::TrailingSlash => write!(f, "unexpected end of input after '/'"),
            LexErrorKind::SingleDot => write!(f, "a single '.' must be followed by another '.'"),
            LexErrorKind::NestedAnnotation => write!(f, "'@' is not allowed inside an annotation name"),
            LexErrorKind::CommentClosedInAnnotationValue => {
                write!(f, "comment closed inside an annotation value")
            }
        }
    }
}

/// A fatal compilation error. Every variant aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{location}: lexical error: {kind}")]
    Lexical {
        kind: LexErrorKind,
        location: SourceLocation,
    },

    #[error("{location}: syntax error: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: {message}")]
    Semantic {
        message: String,
        location: SourceLocation,
    },
}

impl CompileError {
    pub fn semantic(location: SourceLocation, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            message: message.into(),
            location,
        }
    }

    pub fn syntax(location: SourceLocation, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            CompileError::Lexical { location, .. }
            | CompileError::Syntax { location, .. }
            | CompileError::Semantic { location, .. } => *location,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, CompileError::Lexical { .. })
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, CompileError::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, CompileError::Semantic { .. })
    }
}
