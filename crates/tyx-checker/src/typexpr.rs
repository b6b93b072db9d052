//! Type and constant expression resolution.
//!
//! The declaration checker needs two collaborators: something that turns
//! a type expression into a type (forcing the declarations it mentions),
//! and something that evaluates a constant initializer. This module is
//! the concrete form of both, covering the declaration surface; full
//! expression checking is a separate layer.

use crate::checker::{Action, Checker};
use tyx_ast::{Expr, FuncSig, Ident, StructField, TypeExpr};
use tyx_common::{ErrorCode, Pos};
use tyx_types::{
    Field, FloatVal, ObjectId, ObjectKind, Param, SignatureData, TypeData, TypeId, UnionTerm,
    Universe, Value,
};

/// The result of evaluating an expression: its type, and its value when
/// the expression is constant.
#[derive(Clone, Debug)]
pub(crate) struct Operand {
    pub(crate) pos: Pos,
    pub(crate) typ: TypeId,
    pub(crate) val: Value,
}

impl Operand {
    pub(crate) fn unknown(pos: Pos) -> Operand {
        Operand {
            pos,
            typ: TypeId::INVALID,
            val: Value::Unknown,
        }
    }
}

impl Checker<'_> {
    /// Resolve a type expression that forms the right-hand side of the
    /// type definition `def`; self-references resolve to `def` itself.
    pub(crate) fn defined_type(&mut self, e: &TypeExpr, def: TypeId) -> TypeId {
        self.type_expr(e, Some(def))
    }

    /// Resolve a type expression in a value context.
    pub(crate) fn var_type(&mut self, e: &TypeExpr) -> TypeId {
        self.type_expr(e, None)
    }

    /// Resolve a type parameter bound. The bound must turn out to be an
    /// interface; that is verified once the bound's own declarations are
    /// done.
    pub(crate) fn bound_type(&mut self, e: &TypeExpr) -> TypeId {
        if let TypeExpr::Name(id) = e {
            if id.name == "any" && self.lookup(&id.name).is_none() {
                return TypeId::ANY;
            }
        }
        let bound = self.type_expr(e, None);
        self.delayed.push(Action::CheckBound {
            pos: e.pos(),
            t: bound,
        });
        bound
    }

    /// Resolve a type expression. `def` is forwarded only to a name in
    /// head position; structural sub-expressions never see it.
    pub(crate) fn type_expr(&mut self, e: &TypeExpr, def: Option<TypeId>) -> TypeId {
        match e {
            TypeExpr::Name(id) => self.resolve_type_name(id, def),

            TypeExpr::Pointer { elem, .. } => {
                let elem = self.var_type(elem);
                self.uni.types.alloc(TypeData::Pointer { elem })
            }

            TypeExpr::Slice { elem, .. } => {
                let elem = self.var_type(elem);
                self.uni.types.alloc(TypeData::Slice { elem })
            }

            TypeExpr::Array { len, elem, .. } => {
                let len = self.array_length(len);
                let elem = self.var_type(elem);
                self.uni.types.alloc(TypeData::Array { len, elem })
            }

            TypeExpr::Map { key, value, .. } => {
                let key = self.var_type(key);
                let value = self.var_type(value);
                self.uni.types.alloc(TypeData::Map { key, value })
            }

            TypeExpr::Chan { dir, elem, .. } => {
                let dir = *dir;
                let elem = self.var_type(elem);
                self.uni.types.alloc(TypeData::Chan { dir, elem })
            }

            TypeExpr::Struct { fields, .. } => self.struct_type(fields),

            TypeExpr::Interface {
                embeds, methods, ..
            } => {
                let embeddeds: Vec<TypeId> = embeds.iter().map(|e| self.var_type(e)).collect();
                let mut mobjs = Vec::with_capacity(methods.len());
                for m in methods {
                    let sig = self.signature_type(&m.sig);
                    mobjs.push(self.uni.new_object(
                        ObjectKind::Func,
                        m.pos,
                        self.pkg,
                        m.name.name.clone(),
                        Some(sig),
                    ));
                }
                let t = self.uni.new_interface(mobjs, embeddeds);
                // completion must wait until embedded declarations are done
                self.delayed.push(Action::CompleteInterface { t });
                t
            }

            TypeExpr::Func { sig, .. } => self.signature_type(sig),

            TypeExpr::Union { terms, .. } => {
                let terms: Vec<UnionTerm> = terms
                    .iter()
                    .map(|t| UnionTerm {
                        tilde: t.tilde,
                        typ: self.var_type(&t.typ),
                    })
                    .collect();
                self.uni.types.alloc(TypeData::Union { terms })
            }
        }
    }

    fn resolve_type_name(&mut self, id: &Ident, def: Option<TypeId>) -> TypeId {
        if let Some(obj) = self.lookup(&id.name) {
            let kind = self.uni.objects.get(obj).kind;
            if kind != ObjectKind::TypeName {
                self.error(
                    id.pos,
                    ErrorCode::BadDecl,
                    format!("{} is not a type", id.name),
                );
                return TypeId::INVALID;
            }
            self.obj_decl(obj, def);
            return self.uni.objects.get(obj).typ.unwrap_or(TypeId::INVALID);
        }
        if let Some(t) = Universe::universe_type(&id.name) {
            return t;
        }
        self.error(
            id.pos,
            ErrorCode::BadDecl,
            format!("undeclared name: {}", id.name),
        );
        TypeId::INVALID
    }

    fn struct_type(&mut self, fields: &[StructField]) -> TypeId {
        let mut out = Vec::new();
        let mut tags = Vec::new();
        for f in fields {
            let typ = self.var_type(&f.typ);
            if f.names.is_empty() {
                // embedded field; its name is the base name of its type
                match embedded_field_name(&f.typ) {
                    Some(name) => {
                        out.push(Field {
                            pos: f.pos,
                            pkg: self.pkg,
                            name,
                            typ,
                            embedded: true,
                        });
                        tags.push(f.tag.clone().unwrap_or_default());
                    }
                    None => {
                        self.error(f.pos, ErrorCode::BadDecl, "invalid embedded field type");
                    }
                }
                continue;
            }
            for name in &f.names {
                out.push(Field {
                    pos: name.pos,
                    pkg: self.pkg,
                    name: name.name.clone(),
                    typ,
                    embedded: false,
                });
                tags.push(f.tag.clone().unwrap_or_default());
            }
        }
        self.uni.types.alloc(TypeData::Struct { fields: out, tags })
    }

    fn signature_type(&mut self, sig: &FuncSig) -> TypeId {
        let t = self
            .uni
            .types
            .alloc(TypeData::Signature(SignatureData::default()));
        self.fill_signature(t, sig);
        t
    }

    /// Resolve receiver, type parameters, and parameter lists of a
    /// function declaration into `sig`.
    pub(crate) fn func_type(&mut self, sig: TypeId, fdecl: &tyx_ast::FuncDecl) {
        let mut opened = false;
        if !fdecl.tparams.is_empty() {
            self.push_scope();
            opened = true;
            let tparams = self.collect_type_params(&fdecl.tparams);
            self.uni.types.signature_mut(sig).tparams = tparams;
        }

        if let Some(recv) = &fdecl.recv {
            let rt = self.var_type(&recv.typ);
            if self.uni.base_named(rt).is_none() && self.uni.types.under(rt) != TypeId::INVALID {
                self.error(recv.pos, ErrorCode::BadDecl, "invalid receiver type");
            }
            let param = Param {
                pos: recv.pos,
                pkg: self.pkg,
                name: recv.name.as_ref().map(|n| n.name.clone()).unwrap_or_default(),
                typ: rt,
            };
            self.uni.types.signature_mut(sig).recv = Some(param);
        }

        self.fill_signature(sig, &fdecl.sig);
        if opened {
            self.pop_scope();
        }
    }

    fn fill_signature(&mut self, t: TypeId, sig: &FuncSig) {
        let params = self.field_list(&sig.params);
        let results = self.field_list(&sig.results);
        let s = self.uni.types.signature_mut(t);
        s.params = params;
        s.results = results;
        s.variadic = sig.variadic;
    }

    fn field_list(&mut self, fields: &[tyx_ast::FieldDecl]) -> Vec<Param> {
        fields
            .iter()
            .map(|f| {
                let typ = self.var_type(&f.typ);
                Param {
                    pos: f.pos,
                    pkg: self.pkg,
                    name: f.name.as_ref().map(|n| n.name.clone()).unwrap_or_default(),
                    typ,
                }
            })
            .collect()
    }

    fn array_length(&mut self, e: &Expr) -> u64 {
        let x = self.eval_expr(e);
        if x.typ == TypeId::INVALID {
            return 0;
        }
        match &x.val {
            Value::Int(v) => match v.to_i64() {
                Some(n) if n >= 0 => n as u64,
                _ => {
                    self.error(e.pos(), ErrorCode::BadDecl, "invalid array length");
                    0
                }
            },
            _ => {
                self.error(e.pos(), ErrorCode::BadDecl, "array length must be constant");
                0
            }
        }
    }

    // ----- constant expressions --------------------------------------

    /// Evaluate a (constant) expression.
    pub(crate) fn eval_expr(&mut self, e: &Expr) -> Operand {
        match e {
            Expr::IntLit { pos, value } => Operand {
                pos: *pos,
                typ: TypeId::UNTYPED_INT,
                val: Value::int(*value),
            },
            Expr::FloatLit { pos, value } => Operand {
                pos: *pos,
                typ: TypeId::UNTYPED_FLOAT,
                val: Value::Float(FloatVal::from_f64(*value)),
            },
            Expr::StrLit { pos, value } => Operand {
                pos: *pos,
                typ: TypeId::UNTYPED_STRING,
                val: Value::Str(value.clone()),
            },
            Expr::BoolLit { pos, value } => Operand {
                pos: *pos,
                typ: TypeId::UNTYPED_BOOL,
                val: Value::Bool(*value),
            },
            Expr::Iota { pos } => match self.iota.clone() {
                Some(v) => Operand {
                    pos: *pos,
                    typ: TypeId::UNTYPED_INT,
                    val: v,
                },
                None => {
                    self.error(
                        *pos,
                        ErrorCode::BadDecl,
                        "cannot use iota outside constant declaration",
                    );
                    Operand::unknown(*pos)
                }
            },
            Expr::Name(id) => self.eval_name(id),
            Expr::Paren { inner, .. } => self.eval_expr(inner),
            Expr::Call { pos, args, .. } => {
                // calls are resolved by the expression layer; evaluate the
                // arguments for their declaration dependencies only
                for a in args {
                    let _ = self.eval_expr(a);
                }
                Operand::unknown(*pos)
            }
        }
    }

    fn eval_name(&mut self, id: &Ident) -> Operand {
        let Some(obj) = self.lookup(&id.name) else {
            self.error(
                id.pos,
                ErrorCode::BadDecl,
                format!("undeclared name: {}", id.name),
            );
            return Operand::unknown(id.pos);
        };
        self.obj_decl(obj, None);
        let o = self.uni.objects.get(obj);
        match o.kind {
            ObjectKind::Const => Operand {
                pos: id.pos,
                typ: o.typ.unwrap_or(TypeId::INVALID),
                val: o.value.clone(),
            },
            ObjectKind::Var | ObjectKind::Func => Operand {
                pos: id.pos,
                typ: o.typ.unwrap_or(TypeId::INVALID),
                val: Value::Unknown,
            },
            _ => {
                let name = id.name.clone();
                self.error(
                    id.pos,
                    ErrorCode::BadDecl,
                    format!("{name} is not an expression"),
                );
                Operand::unknown(id.pos)
            }
        }
    }

    // ----- initialization --------------------------------------------

    /// Unify a constant's declared type and its initializer.
    pub(crate) fn init_const(&mut self, obj: ObjectId, x: Operand) {
        if x.typ == TypeId::INVALID {
            if self.uni.objects.get(obj).typ.is_none() {
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
            }
            return;
        }
        if !x.val.is_known() {
            self.error(
                x.pos,
                ErrorCode::InvalidConstInit,
                "initialization expression is not a constant",
            );
            if self.uni.objects.get(obj).typ.is_none() {
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
            }
            return;
        }
        // an untyped constant keeps its untyped type
        if self.uni.objects.get(obj).typ.is_none() {
            self.uni.objects.get_mut(obj).typ = Some(x.typ);
        }
        self.uni.objects.get_mut(obj).value = x.val;
    }

    /// Infer a variable's type from its initializer when it has none.
    pub(crate) fn init_var(&mut self, obj: ObjectId, x: Operand) {
        if x.typ == TypeId::INVALID {
            if self.uni.objects.get(obj).typ.is_none() {
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
            }
            return;
        }
        if self.uni.objects.get(obj).typ.is_none() {
            let t = self.default_type(x.typ);
            if t == TypeId::UNTYPED_NIL {
                self.error(x.pos, ErrorCode::BadDecl, "cannot infer type from untyped nil");
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
                return;
            }
            self.uni.objects.get_mut(obj).typ = Some(t);
        }
    }

    /// Initialize a group of variables from one multi-valued expression.
    /// Called exactly once per group; the members are promoted to black
    /// when the resolver reaches them.
    pub(crate) fn init_vars(&mut self, lhs: &[ObjectId], init: &Expr) {
        let _ = self.eval_expr(init);
        // splitting a multi-valued expression is the expression layer's
        // job; members without a declared type cannot be typed here
        for &l in lhs {
            if self.uni.objects.get(l).typ.is_none() {
                self.uni.objects.get_mut(l).typ = Some(TypeId::INVALID);
            }
        }
    }
}

/// The name an embedded struct field is known by: the base identifier of
/// its type, through one optional pointer.
fn embedded_field_name(t: &TypeExpr) -> Option<String> {
    match t {
        TypeExpr::Name(id) => Some(id.name.clone()),
        TypeExpr::Pointer { elem, .. } => match elem.as_ref() {
            TypeExpr::Name(id) => Some(id.name.clone()),
            _ => None,
        },
        _ => None,
    }
}
