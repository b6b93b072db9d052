//! Declaration walking.
//!
//! Translates grouped AST declarations into a flat sequence of uniform
//! records, normalising const inheritance (a spec without type and values
//! borrows both from the nearest preceding spec that had them), checking
//! name/value arity, and flattening groups.

use crate::checker::Checker;
use tyx_ast::{Decl, DeclTok, FuncDecl, ImportSpec, Spec, TypeExpr, TypeSpec, ValueSpec, Expr};
use tyx_common::ErrorCode;

/// A uniform declaration record.
#[derive(Clone, Debug)]
pub enum DeclRecord {
    Import {
        spec: ImportSpec,
    },
    Const {
        spec: ValueSpec,
        /// Zero-based index of the spec within its const block.
        iota: usize,
        typ: Option<TypeExpr>,
        init: Vec<Expr>,
        inherited: bool,
    },
    Var {
        spec: ValueSpec,
    },
    Type {
        spec: TypeSpec,
    },
    Func {
        decl: FuncDecl,
    },
}

impl Checker<'_> {
    /// Flatten declarations into uniform records, reporting arity and
    /// token problems along the way.
    pub fn walk(&mut self, decls: &[Decl]) -> Vec<DeclRecord> {
        let mut records = Vec::new();
        self.walk_decls(decls, &mut |_, rec| records.push(rec));
        records
    }

    pub(crate) fn walk_decls(
        &mut self,
        decls: &[Decl],
        f: &mut impl FnMut(&mut Checker<'_>, DeclRecord),
    ) {
        for d in decls {
            self.walk_decl(d, f);
        }
    }

    pub(crate) fn walk_decl(
        &mut self,
        d: &Decl,
        f: &mut impl FnMut(&mut Checker<'_>, DeclRecord),
    ) {
        match d {
            Decl::Bad { .. } => {}
            Decl::Gen(g) => {
                // last ValueSpec with a type or init exprs seen
                let mut last: Option<ValueSpec> = None;
                for (iota, s) in g.specs.iter().enumerate() {
                    match s {
                        Spec::Import(spec) => f(self, DeclRecord::Import { spec: spec.clone() }),
                        Spec::Value(s) => match g.tok {
                            DeclTok::Const => {
                                let mut inherited = true;
                                if s.typ.is_some() || !s.values.is_empty() {
                                    last = Some(s.clone());
                                    inherited = false;
                                } else if last.is_none() {
                                    last = Some(ValueSpec::default());
                                    inherited = false;
                                }
                                let l = last.clone().unwrap_or_default();
                                self.arity_match(s, Some(&l));
                                f(
                                    self,
                                    DeclRecord::Const {
                                        spec: s.clone(),
                                        iota,
                                        typ: l.typ,
                                        init: l.values,
                                        inherited,
                                    },
                                );
                            }
                            DeclTok::Var => {
                                self.arity_match(s, None);
                                f(self, DeclRecord::Var { spec: s.clone() });
                            }
                            _ => {
                                self.error(
                                    s.pos,
                                    ErrorCode::InvalidAst,
                                    format!("invalid token {:?}", g.tok),
                                );
                            }
                        },
                        Spec::Type(s) => f(self, DeclRecord::Type { spec: s.clone() }),
                    }
                }
            }
            Decl::Func(fd) => f(self, DeclRecord::Func { decl: fd.clone() }),
        }
    }

    /// Check that the number of names matches the number of initialization
    /// values. `init` is the inherited spec for constants, None for vars.
    fn arity_match(&mut self, s: &ValueSpec, init: Option<&ValueSpec>) {
        let l = s.names.len();
        let mut r = s.values.len();
        if let Some(init) = init {
            r = init.values.len();
        }

        if init.is_none() && r == 0 {
            // var declaration without initialization
            if s.typ.is_none() {
                self.error(
                    s.pos,
                    ErrorCode::WrongAssignCount,
                    "missing type or initialization expression",
                );
            }
        } else if l < r {
            if l < s.values.len() {
                let n = &s.values[l];
                self.error(
                    n.pos(),
                    ErrorCode::WrongAssignCount,
                    "extra initialization expression",
                );
            } else {
                // init exprs "inherited" from a previous spec
                self.error(
                    s.pos,
                    ErrorCode::WrongAssignCount,
                    format!("extra initialization expression(s) given with {l} name(s)"),
                );
            }
        } else if l > r && (init.is_some() || r != 1) {
            // a single rhs may be a multi-valued call; everything else is
            // short of values
            let n = &s.names[r];
            self.error(
                n.pos,
                ErrorCode::WrongAssignCount,
                format!("missing initialization expression for {}", n.name),
            );
        }
    }
}
