//! Error and diagnostic types for parameter-set operations.
//!
//! Structural registry operations fail hard with an [`Error`]; per-field
//! evaluation failures during resolution are caught and stored as sentinel
//! text values instead, so one broken field never aborts the rest of the
//! registry. Lenient resolution reports those soft failures through
//! [`Diagnostic`] values returned alongside the result.

use std::fmt;

/// A hard failure from a registry operation or the expression sandbox.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The named field does not exist in the registry.
    UnknownField(String),
    /// Attempt to remove a reserved name.
    Protected(String),
    /// An expression references a name that is neither a resolved field nor
    /// an allow-listed constant.
    NameUndefined(String),
    /// A call expression names something outside the function allow-list.
    CallNotAllowed(String),
    /// An attribute access names something outside the attribute allow-list.
    AttributeNotAllowed(String),
    /// The expression uses syntax the restricted grammar does not accept.
    UnsupportedExpression(String),
    /// Strict-mode dependency sorting could not place this many definitions.
    UnresolvableDependencies(usize),
    /// Positional registry access outside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
    /// Arithmetic, type, or index failure inside the sandboxed evaluator.
    Evaluation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownField(name) => write!(f, "the parameter \"{name}\" does not exist"),
            Error::Protected(name) => write!(f, "the name \"{name}\" is reserved and cannot be removed"),
            Error::NameUndefined(name) => write!(f, "undef parameter \"{name}\""),
            Error::CallNotAllowed(name) => write!(f, "call not allowed: \"{name}\""),
            Error::AttributeNotAllowed(name) => write!(f, "attribute not allowed: \"{name}\""),
            Error::UnsupportedExpression(what) => write!(f, "unsupported expression: {what}"),
            Error::UnresolvableDependencies(n) => {
                write!(f, "unable to order {n} interdependent definitions")
            }
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} parameters")
            }
            Error::Evaluation(msg) => write!(f, "evaluation error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// A non-fatal problem reported during lenient resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the field the problem was found in, or an empty string for a
    /// registry-level summary.
    pub field: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_undefined() {
        let e = Error::NameUndefined("d".into());
        assert_eq!(e.to_string(), "undef parameter \"d\"");
    }

    #[test]
    fn display_unresolvable() {
        let e = Error::UnresolvableDependencies(2);
        assert!(e.to_string().contains('2'));
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::new("c", "reference to \"d\" is unresolved");
        assert_eq!(d.to_string(), "c: reference to \"d\" is unresolved");
        let s = Diagnostic::new("", "1/3 definitions unresolved");
        assert_eq!(s.to_string(), "1/3 definitions unresolved");
    }
}
