use serde::{Deserialize, Serialize};
use std::fmt;

/// A lexer or parser failure. Matches the JSON shape the CLI prints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntaxError {
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl SyntaxError {
    pub fn new(file: &str, line: u32, message: impl Into<String>) -> Self {
        SyntaxError {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn lex(file: &str, line: u32, message: impl Into<String>) -> Self {
        SyntaxError::new(file, line, message)
    }

    pub fn parse(file: &str, line: u32, message: impl Into<String>) -> Self {
        SyntaxError::new(file, line, message)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
        })
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Where a failure happened: `file:line:col` plus the enclosing syntax
/// path rendered as node kinds, narrowest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub position: String,
    pub path: Vec<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.position)
        } else {
            write!(f, "{} [{}]", self.position, self.path.join(" < "))
        }
    }
}

/// All errors the migration pipeline can report.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The input already fails to type-check, so migration refuses to start.
    #[error("{phase}: source does not type-check: {first} ({count} diagnostic(s))")]
    PreexistingTypeError {
        phase: &'static str,
        first: String,
        count: usize,
    },

    /// A diagnostic matched none of the known conflict shapes.
    #[error("fix unknown: {message} at {location}")]
    UnknownConflict { message: String, location: Location },

    /// A known conflict shape whose handler could not apply an edit.
    #[error("{handler}: {reason}: {message} at {location}")]
    FixHandler {
        handler: &'static str,
        reason: String,
        message: String,
        location: Location,
    },

    /// The diagnostic count did not decrease across a Fix iteration.
    #[error("no progress fixing type conflicts: {count} remaining, first: {first}")]
    NoProgress {
        count: usize,
        first: String,
        remaining: Vec<String>,
    },

    /// A format argument is not a compile-time constant and its file is
    /// not exempted. The unit is skipped, the batch continues.
    #[error("{position}: can't check non-constant format {source_text:?} in call to {callee}")]
    NonConstantFormat {
        position: String,
        source_text: String,
        callee: String,
    },

    /// Arity or directive/type failure while reconciling a format call.
    #[error("{position}: {message}")]
    Format { position: String, message: String },

    #[error("stale type information for unit '{unit}': re-run the type checker first")]
    StaleTypeInfo { unit: String },

    #[error("invalid directive: {0}")]
    Directive(String),
}

impl MigrateError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Recoverable errors skip the unit without aborting the batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MigrateError::NonConstantFormat { .. })
    }

    /// Short machine-readable tag, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::Syntax(_) => "syntax",
            MigrateError::Io { .. } => "io",
            MigrateError::PreexistingTypeError { .. } => "preexisting_type_error",
            MigrateError::UnknownConflict { .. } => "unknown_conflict",
            MigrateError::FixHandler { .. } => "fix_handler",
            MigrateError::NoProgress { .. } => "no_progress",
            MigrateError::NonConstantFormat { .. } => "non_constant_format",
            MigrateError::Format { .. } => "format",
            MigrateError::StaleTypeInfo { .. } => "stale_type_info",
            MigrateError::Directive(_) => "directive",
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":    self.kind(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_renders_path_narrowest_first() {
        let loc = Location {
            position: "a.go:3:9".into(),
            path: vec!["Ident".into(), "CallExpr".into()],
        };
        assert_eq!(loc.to_string(), "a.go:3:9 [Ident < CallExpr]");
    }

    #[test]
    fn only_non_constant_format_is_recoverable() {
        let skip = MigrateError::NonConstantFormat {
            position: "a.go:1:1".into(),
            source_text: "tfmt".into(),
            callee: "Sprintf".into(),
        };
        assert!(skip.is_recoverable());
        let fatal = MigrateError::Format {
            position: "a.go:1:1".into(),
            message: "wrong number of args".into(),
        };
        assert!(!fatal.is_recoverable());
    }

    #[test]
    fn syntax_error_json_has_all_fields() {
        let e = SyntaxError::parse("x.go", 4, "expected ')'");
        let v = e.to_json_value();
        assert_eq!(v["file"], "x.go");
        assert_eq!(v["line"], 4);
        assert_eq!(v["message"], "expected ')'");
    }
}
