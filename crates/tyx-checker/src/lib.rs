//! Declaration type-checker for the tyx toolkit.
//!
//! Resolves package-level declarations - constants, variables, types,
//! functions, methods - into the fully-typed object graph of `tyx-types`.
//! The hard part is cycle management: declarations reference each other by
//! name, so resolution recurses through a white/grey/black discipline
//! whose grey state indexes the object path, letting a re-entry classify
//! the cycle it closed. Structural validity (types of infinite size) is a
//! separate deferred walk.
//!
//! Entry point: build a [`Checker`] over a `Universe` and a collected
//! package, then call [`Checker::check_package`].

mod checker;
mod decl;
mod typexpr;
mod validtype;
mod walk;

pub use checker::Checker;
pub use walk::DeclRecord;
