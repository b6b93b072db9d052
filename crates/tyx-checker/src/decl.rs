//! Declaration checking.
//!
//! `obj_decl` drives an object from white through grey to black. An
//! object is grey exactly while it sits on the object path, and its grey
//! color records its path index; re-entering a grey object therefore
//! yields the cycle as the path suffix from that index. Cycles are
//! classified by composition: all-value cycles are left to the
//! initialization-order pass, cycles with at least one type definition
//! (and no values) are permitted, everything else is reported.

use crate::checker::{Action, Checker, DeclInfo, ALIASES_SINCE};
use crate::walk::DeclRecord;
use tracing::trace;
use tyx_ast::{Decl, TypeExpr, TypeParamDecl, TypeSpec};
use tyx_common::{Diagnostic, ErrorCode, Pos};
use tyx_types::{
    Color, NamedData, Object, ObjectId, ObjectKind, SignatureData, TypeData, TypeId,
    TypeParamData, Value,
};
use smallvec::SmallVec;

impl Checker<'_> {
    // ----- collection ------------------------------------------------

    /// Create white objects and declaration payloads for one record.
    pub(crate) fn collect_record(&mut self, rec: DeclRecord) {
        match rec {
            DeclRecord::Import { .. } => {
                // module resolution is a separate layer
            }

            DeclRecord::Const {
                spec,
                iota,
                typ,
                init,
                inherited,
            } => {
                for (i, name) in spec.names.iter().enumerate() {
                    let obj = self.uni.objects.alloc(Object::new(
                        ObjectKind::Const,
                        name.pos,
                        self.pkg,
                        name.name.clone(),
                        None,
                    ));
                    self.uni.objects.get_mut(obj).value = Value::int(iota as i64);
                    self.obj_map.insert(
                        obj,
                        DeclInfo {
                            vtyp: typ.clone(),
                            init: init.get(i).cloned(),
                            inherited,
                            ..DeclInfo::default()
                        },
                    );
                    self.declare_pkg(&name.name, name.pos, obj);
                    self.obj_order.push(obj);
                }
            }

            DeclRecord::Var { spec } => {
                let lhs: Vec<ObjectId> = spec
                    .names
                    .iter()
                    .map(|name| {
                        self.uni.objects.alloc(Object::new(
                            ObjectKind::Var,
                            name.pos,
                            self.pkg,
                            name.name.clone(),
                            None,
                        ))
                    })
                    .collect();
                // n names with a single value share one initializer
                let shared_init = lhs.len() > 1 && spec.values.len() == 1;
                for (i, name) in spec.names.iter().enumerate() {
                    let init = if shared_init {
                        Some(spec.values[0].clone())
                    } else {
                        spec.values.get(i).cloned()
                    };
                    self.obj_map.insert(
                        lhs[i],
                        DeclInfo {
                            lhs: if shared_init { lhs.clone() } else { Vec::new() },
                            vtyp: spec.typ.clone(),
                            init,
                            ..DeclInfo::default()
                        },
                    );
                    self.declare_pkg(&name.name, name.pos, lhs[i]);
                    self.obj_order.push(lhs[i]);
                }
            }

            DeclRecord::Type { spec } => {
                let obj = self.uni.objects.alloc(Object::new(
                    ObjectKind::TypeName,
                    spec.name.pos,
                    self.pkg,
                    spec.name.name.clone(),
                    None,
                ));
                self.obj_map.insert(
                    obj,
                    DeclInfo {
                        tdecl: Some(spec.clone()),
                        ..DeclInfo::default()
                    },
                );
                self.declare_pkg(&spec.name.name, spec.name.pos, obj);
                self.obj_order.push(obj);
            }

            DeclRecord::Func { decl } => {
                let obj = self.uni.objects.alloc(Object::new(
                    ObjectKind::Func,
                    decl.name.pos,
                    self.pkg,
                    decl.name.name.clone(),
                    None,
                ));
                if let Some(recv) = &decl.recv {
                    // a method is filed under its receiver base type name,
                    // not in the package scope
                    match recv_base_name(&recv.typ) {
                        Some(base) => {
                            if decl.name.name != "_" {
                                self.methods.entry(base).or_default().push(obj);
                            }
                        }
                        None => self.error(
                            recv.pos,
                            ErrorCode::BadDecl,
                            "invalid receiver type",
                        ),
                    }
                } else {
                    self.declare_pkg(&decl.name.name, decl.name.pos, obj);
                }
                self.obj_map.insert(
                    obj,
                    DeclInfo {
                        fdecl: Some(decl),
                        ..DeclInfo::default()
                    },
                );
                self.obj_order.push(obj);
            }
        }
    }

    // ----- object resolution -----------------------------------------

    /// Type-check the declaration of `obj`. `def` is the Named type whose
    /// right-hand side is being resolved, when there is one.
    pub(crate) fn obj_decl(&mut self, obj: ObjectId, def: Option<TypeId>) {
        // White objects may have been given a type without passing through
        // here (multi-variable initialization does this); promote them.
        {
            let o = self.uni.objects.get(obj);
            if o.color == Color::White && o.typ.is_some() {
                self.set_color(obj, Color::Black);
                return;
            }
        }

        match self.uni.objects.get(obj).color {
            Color::White => {
                debug_assert!(self.uni.objects.get(obj).typ.is_none());
                let index = self.obj_path.len();
                self.obj_path.push(obj);
                self.set_color(obj, Color::Grey(index));
                trace!(name = %self.obj_name(obj), index, "checking declaration");

                self.check_decl_body(obj, def);

                let popped = self.obj_path.pop();
                debug_assert_eq!(popped, Some(obj));
                self.set_color(obj, Color::Black);
            }

            Color::Black => {
                debug_assert!(self.uni.objects.get(obj).typ.is_some());
            }

            Color::Grey(index) => {
                // A cycle. Objects with a known type are fine; the rest
                // get Invalid to break the recursion.
                let invalid_cycle = self.cycle(obj, index);
                let kind = self.uni.objects.get(obj).kind;
                let typ_is_none = self.uni.objects.get(obj).typ.is_none();
                match kind {
                    ObjectKind::Const | ObjectKind::Var => {
                        if invalid_cycle || typ_is_none {
                            self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
                        }
                    }
                    ObjectKind::TypeName => {
                        if invalid_cycle {
                            self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
                        }
                    }
                    ObjectKind::Func => {
                        // Grey functions keep their empty signature; other
                        // code relies on functions having signature types.
                    }
                    _ => unreachable!("unexpected object kind in cycle"),
                }
                debug_assert!(self.uni.objects.get(obj).typ.is_some());
            }
        }
    }

    fn check_decl_body(&mut self, obj: ObjectId, def: Option<TypeId>) {
        let Some(d) = self.obj_map.get(&obj).cloned() else {
            debug_assert!(false, "{} should have been collected", self.obj_name(obj));
            return;
        };
        // each object is checked in a fresh context; in particular the
        // iota of an enclosing constant declaration does not leak in
        let saved_iota = self.iota.take();
        self.dispatch_decl(obj, &d, def);
        self.iota = saved_iota;
    }

    fn dispatch_decl(&mut self, obj: ObjectId, d: &DeclInfo, def: Option<TypeId>) {
        match self.uni.objects.get(obj).kind {
            ObjectKind::Const => self.const_decl(obj, d),
            ObjectKind::Var => self.var_decl(obj, d),
            ObjectKind::TypeName => {
                // invalid recursive types are detected via the object path
                let Some(tdecl) = d.tdecl.clone() else {
                    debug_assert!(false, "type name without declaration payload");
                    return;
                };
                self.type_decl(obj, &tdecl, def);
                // methods can only be added to package-level types
                self.collect_methods(obj);
            }
            ObjectKind::Func => {
                // functions may be recursive; no dependency tracking needed
                self.func_decl(obj, d);
            }
            _ => unreachable!("unexpected object kind in declaration"),
        }
    }

    /// Classify the cycle that starts at path index `start`. Reports and
    /// returns true when the cycle is invalid.
    pub(crate) fn cycle(&mut self, obj: ObjectId, start: usize) -> bool {
        let cycle: Vec<ObjectId> = self.obj_path[start..].to_vec();
        let mut nval = 0; // constants and variables in the cycle
        let mut ndef = 0; // type definitions (not aliases) in the cycle
        for &o in &cycle {
            match self.uni.objects.get(o).kind {
                ObjectKind::Const | ObjectKind::Var => nval += 1,
                ObjectKind::TypeName => {
                    // Package-level objects carry their syntax; use it so
                    // classification does not depend on resolution order.
                    // Local objects are ordered, so the object works.
                    let alias = match self.obj_map.get(&o).and_then(|d| d.tdecl.as_ref()) {
                        Some(tdecl) => tdecl.assign,
                        None => self.is_alias(o),
                    };
                    if !alias {
                        ndef += 1;
                    }
                }
                ObjectKind::Func => {} // ignored
                _ => unreachable!("unexpected object kind in cycle"),
            }
        }
        trace!(
            start = %self.obj_name(obj),
            len = cycle.len(),
            nval,
            ndef,
            "cycle detected"
        );

        // A cycle involving only constants and variables is reported by
        // the initialization order check, not here.
        if nval == cycle.len() {
            return false;
        }

        // A type-only cycle needs at least one proper definition;
        // otherwise the aliases would expand forever.
        if nval == 0 && ndef > 0 {
            return false;
        }

        self.report_cycle(&cycle);
        true
    }

    /// Report a declaration cycle, starting with the object that comes
    /// first in the source.
    pub(crate) fn report_cycle(&mut self, cycle: &[ObjectId]) {
        let first = first_in_src(self, cycle);
        let start = cycle[first];
        let mut diag = Diagnostic::error(
            self.obj_pos(start),
            ErrorCode::InvalidDeclCycle,
            format!("illegal cycle in declaration of {}", self.obj_name(start)),
        );
        let mut i = first;
        let mut cur = start;
        for _ in 0..cycle.len() {
            diag = diag.with_related(
                self.obj_pos(cur),
                format!("{} refers to", self.obj_name(cur)),
            );
            i = (i + 1) % cycle.len();
            cur = cycle[i];
        }
        diag = diag.with_related(self.obj_pos(cur), self.obj_name(cur));
        self.report(diag);
    }

    // ----- constants -------------------------------------------------

    pub(crate) fn const_decl(&mut self, obj: ObjectId, d: &DeclInfo) {
        debug_assert!(self.uni.objects.get(obj).typ.is_none());

        // the object's value slot holds the spec ordinal; that is the
        // value of iota for this declaration
        let saved_iota = self.iota.take();
        self.iota = Some(self.uni.objects.get(obj).value.clone());
        // provide a valid value under all circumstances
        self.uni.objects.get_mut(obj).value = Value::Unknown;

        if let Some(texpr) = &d.vtyp {
            let t = self.type_expr(texpr, None);
            if !self.is_const_type(t) {
                // no error if the type is invalid anyway
                if self.uni.types.under(t) != TypeId::INVALID {
                    self.error(
                        texpr.pos(),
                        ErrorCode::InvalidConstType,
                        "invalid constant type",
                    );
                }
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
                self.iota = saved_iota;
                return;
            }
            self.uni.objects.get_mut(obj).typ = Some(t);
        }

        let x = match &d.init {
            Some(init) => self.eval_expr(init),
            None => crate::typexpr::Operand::unknown(Pos::NONE),
        };
        self.init_const(obj, x);
        self.iota = saved_iota;
    }

    // ----- variables -------------------------------------------------

    pub(crate) fn var_decl(&mut self, obj: ObjectId, d: &DeclInfo) {
        debug_assert!(self.uni.objects.get(obj).typ.is_none());

        if let Some(texpr) = &d.vtyp {
            let t = self.var_type(texpr);
            self.uni.objects.get_mut(obj).typ = Some(t);
        }

        let Some(init) = &d.init else {
            if d.vtyp.is_none() {
                // error reported by the arity check
                self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
            }
            return;
        };

        if d.lhs.is_empty() || d.lhs.len() == 1 {
            debug_assert!(d.lhs.is_empty() || d.lhs[0] == obj);
            let x = self.eval_expr(init);
            self.init_var(obj, x);
            return;
        }

        // Multiple variables, one initialization expression. Spread a
        // declared type to all of them, then initialize the group exactly
        // once; the other members are promoted when visited.
        if d.vtyp.is_some() {
            let t = self.uni.objects.get(obj).typ;
            for &l in &d.lhs {
                if self.uni.objects.get(l).typ.is_none() {
                    self.uni.objects.get_mut(l).typ = t;
                }
            }
        }
        self.init_vars(&d.lhs, init);
    }

    // ----- type declarations -----------------------------------------

    pub(crate) fn type_decl(&mut self, obj: ObjectId, tdecl: &TypeSpec, def: Option<TypeId>) {
        debug_assert!(self.uni.objects.get(obj).typ.is_none());

        self.delayed.push(Action::ValidType { obj });

        let mut alias = tdecl.assign;
        if alias && !tdecl.tparams.is_empty() {
            // the parser rejects this; tolerate a hand-built AST
            self.error(tdecl.pos, ErrorCode::BadDecl, "generic type cannot be alias");
            alias = false;
        }

        if alias {
            if !self.allow_version(ALIASES_SINCE.0, ALIASES_SINCE.1) {
                self.error(
                    tdecl.pos,
                    ErrorCode::BadDecl,
                    format!(
                        "type aliases require language version {}.{} or later",
                        ALIASES_SINCE.0, ALIASES_SINCE.1
                    ),
                );
            }
            // block recursion into the alias while its target resolves
            self.uni.objects.get_mut(obj).typ = Some(TypeId::INVALID);
            let rhs = self.var_type(&tdecl.rhs);
            self.uni.objects.get_mut(obj).typ = Some(rhs);
            return;
        }

        // type definition, possibly generic
        let named = self.uni.types.alloc(TypeData::Named(NamedData::stub(obj)));
        if self.uni.objects.get(obj).typ.is_none() {
            self.uni.objects.get_mut(obj).typ = Some(named);
        }
        if let Some(def) = def {
            self.uni.types.named_mut(def).underlying = Some(named);
        }

        let mut opened = false;
        if !tdecl.tparams.is_empty() {
            self.push_scope();
            opened = true;
            let tparams = self.collect_type_params(&tdecl.tparams);
            self.uni.types.named_mut(named).tparams = tparams;
        }

        let rhs = self.defined_type(&tdecl.rhs, named);
        self.uni.types.named_mut(named).from_rhs = Some(rhs);

        // The right-hand side may itself be a named type that is still
        // incomplete; resolve the forward chain now or once it closes.
        self.finish_underlying(named, tdecl.rhs.pos(), true);

        if opened {
            self.pop_scope();
        }
    }

    /// Resolve a named type's forward chain to its structural underlying
    /// type. A chain that loops through named types only is a cycle: it is
    /// reported once, and every member collapses to Invalid. A chain that
    /// reaches a still-unresolved declaration is retried from the delayed
    /// queue when `may_defer` allows it.
    pub(crate) fn finish_underlying(&mut self, named: TypeId, pos: Pos, may_defer: bool) {
        match self.resolve_under_chain(named) {
            UnderResolution::Resolved(u) => self.set_underlying(named, u, pos),
            UnderResolution::Incomplete => {
                if may_defer {
                    self.delayed.push(Action::ResolveUnder { named, pos });
                } else {
                    debug_assert!(false, "underlying chain still open at flush");
                    self.uni.types.named_mut(named).underlying = Some(TypeId::INVALID);
                }
            }
            UnderResolution::Cycle(members) => {
                let objs: Vec<ObjectId> = members.iter().map(|&(_, o)| o).collect();
                self.report_cycle(&objs);
                for &(t, _) in &members {
                    self.uni.types.named_mut(t).underlying = Some(TypeId::INVALID);
                }
            }
        }
    }

    fn resolve_under_chain(&self, start: TypeId) -> UnderResolution {
        let mut path: Vec<(TypeId, ObjectId)> = Vec::new();
        let mut cur = start;
        loop {
            match self.uni.types.get(cur) {
                TypeData::Named(n) => {
                    if let Some(i) = path.iter().position(|&(t, _)| t == cur) {
                        return UnderResolution::Cycle(path[i..].to_vec());
                    }
                    path.push((cur, n.obj));
                    match (n.underlying, n.from_rhs) {
                        (Some(u), _) if u != cur => cur = u,
                        (Some(_), _) => return UnderResolution::Resolved(TypeId::INVALID),
                        (None, Some(rhs)) => cur = rhs,
                        (None, None) => return UnderResolution::Incomplete,
                    }
                }
                _ => return UnderResolution::Resolved(cur),
            }
        }
    }

    /// Install the resolved underlying type, rejecting a type parameter
    /// that is not declared by this very declaration.
    pub(crate) fn set_underlying(&mut self, named: TypeId, underlying: TypeId, pos: Pos) {
        self.uni.types.named_mut(named).underlying = Some(underlying);
        if matches!(self.uni.types.get(underlying), TypeData::TypeParam(_))
            && !self.uni.types.named(named).tparams.contains(&underlying)
        {
            self.error(
                pos,
                ErrorCode::BadDecl,
                "cannot use a function type parameter as the right-hand side of a type declaration",
            );
            self.uni.types.named_mut(named).underlying = Some(TypeId::INVALID);
        }
    }

    /// Declare the type parameters of a generic declaration into the
    /// current scope. All parameters are declared first with the default
    /// bound so that bounds may refer to any of them, then the bounds are
    /// resolved.
    pub(crate) fn collect_type_params(
        &mut self,
        groups: &[TypeParamDecl],
    ) -> SmallVec<[TypeId; 4]> {
        let mut tparams: SmallVec<[TypeId; 4]> = SmallVec::new();
        for g in groups {
            for name in &g.names {
                let tn = self.uni.objects.alloc(Object::new(
                    ObjectKind::TypeName,
                    name.pos,
                    self.pkg,
                    name.name.clone(),
                    None,
                ));
                let id = self.next_tparam_id;
                self.next_tparam_id += 1;
                let tp = self.uni.types.alloc(TypeData::TypeParam(TypeParamData {
                    obj: tn,
                    constraint: Some(TypeId::ANY),
                    id,
                }));
                self.uni.objects.set_type(tn, tp);
                self.declare_local(&name.name, name.pos, tn, name.pos);
                tparams.push(tp);
            }
        }

        let mut index = 0;
        for g in groups {
            if let Some(bexpr) = &g.bound {
                let bound = self.bound_type(bexpr);
                for i in 0..g.names.len() {
                    self.uni.types.type_param_mut(tparams[index + i]).constraint = Some(bound);
                }
            }
            index += g.names.len();
        }
        tparams
    }

    // ----- functions -------------------------------------------------

    pub(crate) fn func_decl(&mut self, obj: ObjectId, d: &DeclInfo) {
        debug_assert!(self.uni.objects.get(obj).typ.is_none());
        debug_assert!(self.iota.is_none());

        let Some(fdecl) = d.fdecl.clone() else {
            debug_assert!(false, "function without declaration payload");
            return;
        };
        let sig = self
            .uni
            .types
            .alloc(TypeData::Signature(SignatureData::default()));
        // guard against cycles through the signature
        self.uni.objects.get_mut(obj).typ = Some(sig);

        // Referring to the function while its receiver type is elaborated
        // must not read as a cycle; paint it black for the duration.
        let saved = self.uni.objects.get(obj).color;
        self.set_color(obj, Color::Black);
        self.func_type(sig, &fdecl);
        self.set_color(obj, saved);

        if !fdecl.tparams.is_empty() && !fdecl.has_body {
            self.error(
                fdecl.name.pos,
                ErrorCode::MissingFuncBody,
                "generic function is missing function body",
            );
        }

        // function bodies are resolved after all package-level declarations
        if fdecl.has_body {
            self.delayed.push(Action::FuncBody { obj });
        }
    }

    /// Bind collected methods to `obj`'s type, rejecting clashes with
    /// struct fields and earlier methods.
    pub(crate) fn collect_methods(&mut self, obj: ObjectId) {
        let Some(methods) = self.methods.remove(&self.uni.objects.get(obj).name) else {
            return;
        };
        debug_assert!(!self.is_alias(obj));

        let base = self.uni.objects.get(obj).typ.and_then(|t| {
            match self.uni.types.get(t) {
                TypeData::Named(n) if n.obj == obj => Some(t),
                _ => None,
            }
        });

        // existing field and method names, for conflict checks
        let mut mset: rustc_hash::FxHashMap<String, (bool, Pos)> = rustc_hash::FxHashMap::default();
        if let Some(base) = base {
            let under = self.uni.types.under(base);
            if self.uni.types.is_interface(under) {
                self.error(
                    self.obj_pos(obj),
                    ErrorCode::BadDecl,
                    format!(
                        "invalid receiver type {} (interface underlying type)",
                        self.obj_name(obj)
                    ),
                );
                return;
            }
            if let TypeData::Struct { fields, .. } = self.uni.types.get(under) {
                for f in fields {
                    if f.name != "_" {
                        mset.insert(f.name.clone(), (true, f.pos));
                    }
                }
            }
            // methods added by earlier passes over the same type
            for &m in &self.uni.types.named(base).methods.clone() {
                let mo = self.uni.objects.get(m);
                mset.insert(mo.name.clone(), (false, mo.pos));
            }
        }

        for m in methods {
            let (mname, mpos) = {
                let mo = self.uni.objects.get(m);
                (mo.name.clone(), mo.pos)
            };
            debug_assert_ne!(mname, "_");
            if let Some(&(is_field, alt_pos)) = mset.get(&mname) {
                let diag = if is_field {
                    Diagnostic::error(
                        mpos,
                        ErrorCode::DuplicateFieldAndMethod,
                        format!("field and method with the same name {mname}"),
                    )
                } else {
                    Diagnostic::error(
                        mpos,
                        ErrorCode::DuplicateMethod,
                        format!(
                            "method {mname} already declared for {}",
                            self.obj_name(obj)
                        ),
                    )
                }
                .with_related(alt_pos, format!("other declaration of {mname}"));
                self.report(diag);
                continue;
            }
            mset.insert(mname, (false, mpos));
            if let Some(base) = base {
                self.uni.types.named_mut(base).methods.push(m);
            }
        }
    }

    // ----- local declarations ----------------------------------------

    /// Type-check a declaration appearing in a statement context. The
    /// caller provides the enclosing lexical scope via `push_scope`.
    pub fn decl_stmt(&mut self, d: &Decl) {
        let mut records = Vec::new();
        self.walk_decl(d, &mut |_, rec| records.push(rec));

        for rec in records {
            match rec {
                DeclRecord::Const {
                    spec,
                    iota,
                    typ,
                    init,
                    inherited,
                } => {
                    let top = self.delayed.len();
                    let mut lhs = Vec::with_capacity(spec.names.len());
                    for (i, _) in spec.names.iter().enumerate() {
                        let obj = self.uni.objects.alloc(Object::new(
                            ObjectKind::Const,
                            spec.names[i].pos,
                            self.pkg,
                            spec.names[i].name.clone(),
                            None,
                        ));
                        self.uni.objects.get_mut(obj).value = Value::int(iota as i64);
                        lhs.push(obj);
                        let dinfo = DeclInfo {
                            vtyp: typ.clone(),
                            init: init.get(i).cloned(),
                            inherited,
                            ..DeclInfo::default()
                        };
                        self.const_decl(obj, &dinfo);
                        self.set_color(obj, Color::Black);
                    }
                    self.process_delayed(top);
                    // names become visible only after the whole spec
                    for (i, name) in spec.names.iter().enumerate() {
                        self.declare_local(&name.name, name.pos, lhs[i], spec.pos);
                    }
                }

                DeclRecord::Var { spec } => {
                    let top = self.delayed.len();
                    let lhs0: Vec<ObjectId> = spec
                        .names
                        .iter()
                        .map(|name| {
                            self.uni.objects.alloc(Object::new(
                                ObjectKind::Var,
                                name.pos,
                                self.pkg,
                                name.name.clone(),
                                None,
                            ))
                        })
                        .collect();
                    for (i, &obj) in lhs0.iter().enumerate() {
                        let (lhs, init) = match spec.values.len() {
                            n if n == spec.names.len() => (Vec::new(), Some(spec.values[i].clone())),
                            1 => (lhs0.clone(), Some(spec.values[0].clone())),
                            _ => (Vec::new(), spec.values.get(i).cloned()),
                        };
                        let dinfo = DeclInfo {
                            lhs,
                            vtyp: spec.typ.clone(),
                            init,
                            ..DeclInfo::default()
                        };
                        self.var_decl(obj, &dinfo);
                        self.set_color(obj, Color::Black);
                        if spec.values.len() == 1 {
                            // a single rhs initializes every variable in
                            // one step
                            for &l in &lhs0 {
                                if self.uni.objects.get(l).typ.is_some() {
                                    self.set_color(l, Color::Black);
                                }
                            }
                            break;
                        }
                    }
                    self.process_delayed(top);
                    for (i, name) in spec.names.iter().enumerate() {
                        self.declare_local(&name.name, name.pos, lhs0[i], spec.pos);
                    }
                }

                DeclRecord::Type { spec } => {
                    let obj = self.uni.objects.alloc(Object::new(
                        ObjectKind::TypeName,
                        spec.name.pos,
                        self.pkg,
                        spec.name.name.clone(),
                        None,
                    ));
                    self.declare_local(&spec.name.name, spec.name.pos, obj, spec.name.pos);
                    // mark and unmark the object around the body, exactly
                    // as obj_decl would
                    let index = self.obj_path.len();
                    self.obj_path.push(obj);
                    self.set_color(obj, Color::Grey(index));
                    self.type_decl(obj, &spec, None);
                    let popped = self.obj_path.pop();
                    debug_assert_eq!(popped, Some(obj));
                    self.set_color(obj, Color::Black);
                }

                DeclRecord::Import { spec } => {
                    self.error(
                        spec.pos,
                        ErrorCode::InvalidAst,
                        "import declaration not allowed in this context",
                    );
                }

                DeclRecord::Func { decl } => {
                    self.error(
                        decl.pos,
                        ErrorCode::InvalidAst,
                        "function declaration not allowed in this context",
                    );
                }
            }
        }
    }
}

/// Outcome of resolving a named type's forward chain.
pub(crate) enum UnderResolution {
    Resolved(TypeId),
    Incomplete,
    /// The `(type, object)` pairs of a named-only cycle.
    Cycle(Vec<(TypeId, ObjectId)>),
}

/// The base type name of a method receiver: `T` or `*T`.
fn recv_base_name(t: &TypeExpr) -> Option<String> {
    match t {
        TypeExpr::Name(id) => Some(id.name.clone()),
        TypeExpr::Pointer { elem, .. } => match elem.as_ref() {
            TypeExpr::Name(id) => Some(id.name.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Index of the object with the smallest source position.
fn first_in_src(check: &Checker<'_>, path: &[ObjectId]) -> usize {
    debug_assert!(!path.is_empty());
    let mut first = 0;
    let mut pos = check.obj_pos(path[0]);
    for (i, &o) in path.iter().enumerate().skip(1) {
        if check.obj_pos(o) < pos {
            first = i;
            pos = check.obj_pos(o);
        }
    }
    first
}
