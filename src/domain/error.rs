//! Domain error types for the compiler pipeline and its surroundings.

use std::fmt;

/// 1-based line/column of a token in the DSL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// What the parser actually saw where it wanted something else.
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    Token { text: String, position: Position },
    /// The rule's line ended; more input follows on later lines.
    EndOfLine { line: usize },
    EndOfInput,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Token { text, position } => write!(f, "'{}' at {}", text, position),
            Found::EndOfLine { line } => write!(f, "end of line {}", line),
            Found::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// Render `source` line `position.line` with a caret under `position.column`.
fn caret_context(source: &str, position: Position, err: &dyn fmt::Display) -> String {
    let line = source
        .lines()
        .nth(position.line.saturating_sub(1))
        .unwrap_or_default();
    let caret = " ".repeat(position.column.saturating_sub(1)) + "^";
    format!("{line}\n{caret}\n{err}")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unexpected character '{character}' at line {line}, column {column}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub character: char,
}

impl LexError {
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// Format the error with a caret pointing at the offending character.
    pub fn display_with_context(&self, source: &str) -> String {
        caret_context(source, self.position(), self)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected}, found {actual}")]
    UnexpectedToken { expected: String, actual: Found },

    #[error("unknown indicator '{name}' at {position}")]
    UnknownIndicator { name: String, position: Position },

    #[error("{indicator} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        indicator: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid CROSS direction \"{value}\" at {position} (expected \"ABOVE\" or \"BELOW\")")]
    InvalidCrossDirection { value: String, position: Position },

    #[error("strategy must contain an ENTRY or EXIT block")]
    EmptyStrategy,

    #[error("expression nested deeper than {limit} levels at {position}")]
    NestingTooDeep { limit: usize, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::UnexpectedToken {
                actual: Found::Token { position, .. },
                ..
            }
            | ParseError::UnknownIndicator { position, .. }
            | ParseError::InvalidCrossDirection { position, .. }
            | ParseError::NestingTooDeep { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn is_end_of_input(&self) -> bool {
        matches!(
            self,
            ParseError::UnexpectedToken {
                actual: Found::EndOfInput,
                ..
            }
        )
    }

    /// Format the error with a caret pointing at the error position in the
    /// source. Errors without a position fall back to the plain message.
    pub fn display_with_context(&self, source: &str) -> String {
        match self.position() {
            Some(position) => caret_context(source, position, self),
            None => self.to_string(),
        }
    }
}

/// Failure anywhere between DSL text and AST.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CompileError {
    pub fn display_with_context(&self, source: &str) -> String {
        match self {
            CompileError::Lex(e) => e.display_with_context(source),
            CompileError::Parse(e) => e.display_with_context(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid argument to {indicator}: {reason}")]
    InvalidArgument { indicator: String, reason: String },

    #[error("unknown column '{name}' in input series")]
    UnknownColumn { name: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("input series has no 'close' column")]
    MissingClose,

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}

/// Failure rendering rule structs to DSL text or to an AST.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown comparison operator '{op}'")]
    UnknownOperator { op: String },

    #[error("invalid cross direction '{value}' (expected ABOVE or BELOW)")]
    InvalidDirection { value: String },

    #[error("number {value} cannot be written in the rule language")]
    UnrepresentableNumber { value: f64 },

    #[error("'{name}' is not a valid field name")]
    InvalidName { name: String },

    #[error("unknown indicator '{name}'")]
    UnknownIndicator { name: String },

    #[error("{indicator} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        indicator: String,
        expected: usize,
        actual: usize,
    },

    #[error("rule set has no entry or exit rules")]
    Empty,
}

/// Top-level error type for stratlang.
#[derive(Debug, thiserror::Error)]
pub enum StratError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("invalid rule struct: {0}")]
    RuleStruct(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<LexError> for StratError {
    fn from(err: LexError) -> Self {
        StratError::Compile(err.into())
    }
}

impl From<ParseError> for StratError {
    fn from(err: ParseError) -> Self {
        StratError::Compile(err.into())
    }
}

impl From<&StratError> for std::process::ExitCode {
    fn from(err: &StratError) -> Self {
        let code: u8 = match err {
            StratError::Io(_) => 1,
            StratError::ConfigParse { .. }
            | StratError::ConfigMissing { .. }
            | StratError::ConfigInvalid { .. } => 2,
            StratError::DataLoad { .. } | StratError::Series(_) => 3,
            StratError::Compile(_) => 4,
            StratError::Eval(_) => 5,
            StratError::Render(_) | StratError::RuleStruct(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
