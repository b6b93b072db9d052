//! Checker state.
//!
//! Holds the shared state used throughout declaration checking: the type
//! universe, the package under inspection, the object map built by the
//! collector, the object path used for cycle detection, the deferred work
//! queue, and the diagnostics sink. The logic lives in the sibling
//! modules; this separation keeps the specialized passes free to borrow
//! the state mutably.

use rustc_hash::FxHashMap;
use tracing::trace;
use tyx_ast::{Decl, FuncDecl, TypeExpr, TypeSpec, Expr};
use tyx_common::{Diagnostic, ErrorCode, Pos};
use tyx_types::{Color, ObjectId, ObjectKind, PackageId, Scope, TypeId, Universe, Value};

/// Per-object declaration payload recorded by the collector.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeclInfo {
    /// All left-hand-side variables of a multi-variable declaration;
    /// empty for everything else.
    pub(crate) lhs: Vec<ObjectId>,
    /// Declared type expression of a const or var, if any.
    pub(crate) vtyp: Option<TypeExpr>,
    /// Initialization expression, if any.
    pub(crate) init: Option<Expr>,
    /// Whether type and init were inherited from an earlier const spec.
    pub(crate) inherited: bool,
    pub(crate) tdecl: Option<TypeSpec>,
    pub(crate) fdecl: Option<FuncDecl>,
}

/// Deferred work, drained FIFO at well-defined flush points.
#[derive(Clone, Debug)]
pub(crate) enum Action {
    /// Walk a type declaration's structure for infinite-expansion cycles.
    ValidType { obj: ObjectId },
    /// Finish a named type whose underlying chain was incomplete when it
    /// was declared.
    ResolveUnder { named: TypeId, pos: Pos },
    /// Flatten and close an interface literal's method set.
    CompleteInterface { t: TypeId },
    /// Verify that a resolved type parameter bound is an interface.
    CheckBound { pos: Pos, t: TypeId },
    /// A function body, resolved by the statement layer after all
    /// package-level declarations are done.
    FuncBody { obj: ObjectId },
}

/// Minimum language version for each gated feature, as (major, minor).
pub const ALIASES_SINCE: (u32, u32) = (1, 9);

pub struct Checker<'a> {
    pub uni: &'a mut Universe,
    pub(crate) pkg: PackageId,
    diagnostics: Vec<Diagnostic>,

    pub(crate) obj_map: FxHashMap<ObjectId, DeclInfo>,
    /// Source order of collected objects, methods included.
    pub(crate) obj_order: Vec<ObjectId>,
    /// Methods waiting to be bound, keyed by receiver base type name.
    pub(crate) methods: FxHashMap<String, Vec<ObjectId>>,
    /// Objects currently being resolved; grey colors index into this.
    pub(crate) obj_path: Vec<ObjectId>,
    pub(crate) delayed: Vec<Action>,
    /// Lexical scopes for type parameters and local declarations.
    pub(crate) scopes: Vec<Scope>,
    /// Value of iota inside a constant declaration.
    pub(crate) iota: Option<Value>,
    pub(crate) next_tparam_id: u64,
    version: (u32, u32),
}

impl<'a> Checker<'a> {
    pub fn new(uni: &'a mut Universe, pkg: PackageId) -> Checker<'a> {
        Checker {
            uni,
            pkg,
            diagnostics: Vec::new(),
            obj_map: FxHashMap::default(),
            obj_order: Vec::new(),
            methods: FxHashMap::default(),
            obj_path: Vec::new(),
            delayed: Vec::new(),
            scopes: Vec::new(),
            iota: None,
            next_tparam_id: 1,
            version: (1, 18),
        }
    }

    /// Override the language version the checked package declares.
    pub fn with_version(mut self, major: u32, minor: u32) -> Checker<'a> {
        self.version = (major, minor);
        self
    }

    pub fn allow_version(&self, major: u32, minor: u32) -> bool {
        self.version >= (major, minor)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn error(&mut self, pos: Pos, code: ErrorCode, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(pos, code, message));
    }

    pub(crate) fn report(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    /// Type-check all package-level declarations.
    pub fn check_package(&mut self, decls: &[Decl]) {
        for rec in self.walk(decls) {
            self.collect_record(rec);
        }

        let order = self.obj_order.clone();
        for obj in order {
            self.obj_decl(obj, None);
        }

        self.process_delayed(0);
        debug_assert!(self.obj_path.is_empty(), "object path not drained");
    }

    /// Drain deferred actions starting at `top`, in insertion order.
    /// Actions may append more work; everything past `top` is gone when
    /// this returns.
    pub(crate) fn process_delayed(&mut self, top: usize) {
        let mut i = top;
        while i < self.delayed.len() {
            let action = self.delayed[i].clone();
            i += 1;
            self.run_action(action);
        }
        self.delayed.truncate(top);
    }

    fn run_action(&mut self, action: Action) {
        match action {
            Action::ValidType { obj } => {
                if let Some(t) = self.uni.objects.get(obj).typ {
                    let mut path = Vec::new();
                    self.valid_type(t, &mut path);
                }
            }
            Action::ResolveUnder { named, pos } => self.finish_underlying(named, pos, false),
            Action::CompleteInterface { t } => self.uni.complete_interface(t),
            Action::CheckBound { pos, t } => {
                let u = self.uni.types.under(t);
                if !self.uni.types.is_interface(u) && u != TypeId::INVALID {
                    self.error(pos, ErrorCode::BadDecl, "type parameter bound is not an interface");
                }
            }
            Action::FuncBody { obj } => {
                // Statement checking is a separate layer; the entry here
                // preserves ordering for it.
                trace!(name = %self.uni.objects.get(obj).name, "function body ready");
            }
        }
    }

    // ----- scopes and name resolution --------------------------------

    /// Open a lexical scope; local declarations via [`Checker::decl_stmt`]
    /// land in the innermost open scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Look up a name through the lexical scopes, then the package scope.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        for scope in self.scopes.iter().rev() {
            if let Some(obj) = scope.lookup(name) {
                return Some(obj);
            }
        }
        self.uni.lookup(self.pkg, name)
    }

    /// Declare an object in the package scope, reporting duplicates.
    /// The blank identifier never introduces a binding.
    pub(crate) fn declare_pkg(&mut self, name: &str, pos: Pos, obj: ObjectId) {
        if name == "_" {
            return;
        }
        if let Some(alt) = self.uni.declare(self.pkg, name, obj) {
            self.report_redeclared(name, pos, alt);
            return;
        }
        self.uni.objects.get_mut(obj).scope_pos = pos;
    }

    /// Declare an object in the innermost lexical scope.
    pub(crate) fn declare_local(&mut self, name: &str, pos: Pos, obj: ObjectId, scope_pos: Pos) {
        if name == "_" {
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if let Some(alt) = scope.insert(name, obj) {
            self.report_redeclared(name, pos, alt);
            return;
        }
        self.uni.objects.get_mut(obj).scope_pos = scope_pos;
    }

    fn report_redeclared(&mut self, name: &str, pos: Pos, alt: ObjectId) {
        let mut diag = Diagnostic::error(
            pos,
            ErrorCode::DuplicateDecl,
            format!("{name} redeclared in this block"),
        );
        let alt_pos = self.uni.objects.get(alt).pos;
        if alt_pos.is_some() {
            // "other" rather than "previous": the first declaration seen
            // may not be textually earlier in the source
            diag = diag.with_related(alt_pos, format!("other declaration of {name}"));
        }
        self.report(diag);
    }

    // ----- small shared helpers --------------------------------------

    pub(crate) fn obj_name(&self, obj: ObjectId) -> String {
        self.uni.objects.get(obj).name.clone()
    }

    pub(crate) fn obj_pos(&self, obj: ObjectId) -> Pos {
        self.uni.objects.get(obj).pos
    }

    pub(crate) fn set_color(&mut self, obj: ObjectId, color: Color) {
        self.uni.objects.get_mut(obj).color = color;
    }

    /// Whether a type name binds an alias rather than a defined type.
    /// Usable only once the object has a type (or mid-resolution, when
    /// the alias path has pre-set Invalid).
    pub(crate) fn is_alias(&self, obj: ObjectId) -> bool {
        let o = self.uni.objects.get(obj);
        debug_assert_eq!(o.kind, ObjectKind::TypeName);
        match o.typ {
            None => false,
            Some(t) => match self.uni.types.get(t) {
                tyx_types::TypeData::Named(n) => n.obj != obj,
                tyx_types::TypeData::TypeParam(p) => p.obj != obj,
                _ => true,
            },
        }
    }

    /// Whether values of this type can be constants: a basic type (or a
    /// named type whose underlying is basic) of const class.
    pub(crate) fn is_const_type(&self, t: TypeId) -> bool {
        match self.uni.types.basic_info(self.uni.types.under(t)) {
            Some((_, info)) => info & tyx_types::basic_info::IS_CONST_TYPE != 0,
            None => false,
        }
    }

    /// The default type of an untyped constant type.
    pub(crate) fn default_type(&self, t: TypeId) -> TypeId {
        match t {
            TypeId::UNTYPED_BOOL => TypeId::BOOL,
            TypeId::UNTYPED_INT => TypeId::INT,
            TypeId::UNTYPED_RUNE => TypeId::INT32,
            TypeId::UNTYPED_FLOAT => TypeId::FLOAT64,
            TypeId::UNTYPED_COMPLEX => TypeId::COMPLEX128,
            TypeId::UNTYPED_STRING => TypeId::STRING,
            _ => t,
        }
    }
}
