//! Diagnostics reported by the declaration checker.
//!
//! The checker never aborts on a user-level problem: it records a
//! `Diagnostic` in its sink, recovers (usually by assigning the Invalid
//! type), and keeps going. Secondary information - the other declaration of
//! a duplicated name, the members of a cycle - is attached as related
//! entries on the primary diagnostic.

use crate::span::Pos;
use serde::Serialize;

/// Stable identifier for a class of problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    DuplicateDecl,
    InvalidDeclCycle,
    InvalidConstType,
    InvalidConstInit,
    WrongAssignCount,
    BadDecl,
    MissingFuncBody,
    DuplicateMethod,
    DuplicateFieldAndMethod,
    InvalidAst,
}

/// A secondary note attached to a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelatedInfo {
    pub pos: Pos,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub pos: Pos,
    pub message: String,
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    pub fn error(pos: Pos, code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            pos,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, pos: Pos, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            pos,
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let d = Diagnostic::error(Pos(1), ErrorCode::DuplicateDecl, "x redeclared in this block")
            .with_related(Pos(2), "other declaration of x");
        assert_eq!(d.code, ErrorCode::DuplicateDecl);
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].message, "other declaration of x");
    }
}
