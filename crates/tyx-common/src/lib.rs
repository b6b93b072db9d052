//! Shared infrastructure for the tyx toolkit.
//!
//! This crate provides:
//! - `Pos` / `FileSet` - interned source positions
//! - `Diagnostic` / `ErrorCode` - problem reports emitted by the checker

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, ErrorCode, RelatedInfo};
pub use span::{FileSet, Pos, Position};
