//! The single mutable context threaded through the whole pass —
//! `spec.md` §9's "package as a single context structure owned by the
//! pass" design note, covering the ~ten fields §4.1 lists for the
//! attribution visitor plus the two cycle-breaking stacks §5 calls out.

use std::rc::Rc;

use sable_ast::{Def, Param, Spanned};

use crate::model::{ErrorRecord, InitializeInfo, ResolvedType};
use crate::oracle::{LookupRoot, Resolver, SymbolTable, TypeAlgebra};

/// Everything the attribution visitor (C5) and the two guessers (C3, C4)
/// share. Owned by the pass entry point and threaded by `&mut` reference;
/// every scope-entering push here is paired with a pop on every return
/// path (`spec.md` §5).
pub struct PassCtx<'a> {
    pub resolver: &'a dyn Resolver,
    pub algebra: &'a dyn TypeAlgebra,
    pub symbols: &'a dyn SymbolTable,

    /// Lexically enclosing class/module types, innermost last.
    owner_stack: Vec<ResolvedType>,

    /// True while the traversal is not inside a method body.
    pub outside_def: bool,

    /// Set while guessing the body of an `initialize`-shaped definition;
    /// cleared on exit.
    pub current_init_info: Option<InitializeInfo>,

    /// Reset to `false` at each method entry; set by the self-detector
    /// pre-scan before an assignment's RHS is processed.
    pub found_self: bool,

    /// The current method's formal parameters, for `Var` restriction
    /// lookups in `guess_type`/`guess_type_vars`.
    pub current_args: Vec<Param>,
    pub current_block_arg: Option<Param>,

    /// Block literal parameter scopes the traversal is nested inside,
    /// innermost last (`arr.each { |x| ... }`'s `x`). Checked before
    /// `current_args` since a block's own parameters shadow the enclosing
    /// method's.
    block_scopes: Vec<Vec<Param>>,

    /// Set by the legality check (`spec.md` §4.5) the first time a name
    /// resolution rejects a type during the current assignment's guessing;
    /// cleared at the start of every assignment and drained at its end.
    pub error_slot: Option<ErrorRecord>,

    /// Constants currently being resolved, innermost last — breaks cycles
    /// like `A = B; B = A` (`spec.md` §4.2.4, §5).
    constants_being_resolved: Vec<String>,

    /// Method definitions currently being guessed through, by pointer
    /// identity — breaks cycles through body inference (`spec.md` §4.2.5, §5).
    methods_being_checked: Vec<*const Spanned<Def>>,
}

/// Token from [`PassCtx::push_owner`], to be handed back to
/// [`PassCtx::pop_owner`] on every path out of the scope it was opened for
/// — including an early `?` return, which is why this isn't a `Drop` guard:
/// the traversal is fallible end-to-end, and each call site pops explicitly
/// before propagating its error.
pub struct OwnerGuard {
    depth: usize,
}

impl<'a> PassCtx<'a> {
    pub fn new(resolver: &'a dyn Resolver, algebra: &'a dyn TypeAlgebra, symbols: &'a dyn SymbolTable) -> Self {
        Self {
            resolver,
            algebra,
            symbols,
            owner_stack: Vec::new(),
            outside_def: true,
            current_init_info: None,
            found_self: false,
            current_args: Vec::new(),
            current_block_arg: None,
            block_scopes: Vec::new(),
            error_slot: None,
            constants_being_resolved: Vec::new(),
            methods_being_checked: Vec::new(),
        }
    }

    /// The lexically enclosing class/module, or `None` at the top-level
    /// program.
    pub fn current_owner(&self) -> Option<&ResolvedType> {
        self.owner_stack.last()
    }

    pub fn enclosing_owners(&self) -> &[ResolvedType] {
        &self.owner_stack
    }

    /// Where a bare name lookup should start: the current owner's scope,
    /// or the program root at the top level.
    pub fn lookup_root(&self) -> LookupRoot {
        match self.current_owner() {
            Some(owner) => LookupRoot::Owner(owner.clone()),
            None => LookupRoot::Program,
        }
    }

    #[must_use]
    pub fn push_owner(&mut self, owner: ResolvedType) -> OwnerGuard {
        self.owner_stack.push(owner);
        OwnerGuard {
            depth: self.owner_stack.len(),
        }
    }

    pub fn pop_owner(&mut self, guard: OwnerGuard) {
        debug_assert_eq!(self.owner_stack.len(), guard.depth);
        self.owner_stack.pop();
    }

    pub fn constant_cycle_contains(&self, id: &str) -> bool {
        self.constants_being_resolved.iter().any(|c| c == id)
    }

    pub fn push_constant(&mut self, id: String) {
        self.constants_being_resolved.push(id);
    }

    pub fn pop_constant(&mut self) {
        self.constants_being_resolved.pop();
    }

    pub fn method_cycle_contains(&self, def: &Rc<Spanned<Def>>) -> bool {
        let ptr = Rc::as_ptr(def);
        self.methods_being_checked.iter().any(|p| std::ptr::eq(*p, ptr))
    }

    pub fn push_method(&mut self, def: &Rc<Spanned<Def>>) {
        self.methods_being_checked.push(Rc::as_ptr(def));
    }

    pub fn pop_method(&mut self) {
        self.methods_being_checked.pop();
    }

    /// Record a legality failure, first-wins within the current assignment.
    pub fn record_error(&mut self, err: ErrorRecord) {
        if self.error_slot.is_none() {
            self.error_slot = Some(err);
        }
    }

    pub fn push_block_scope(&mut self, params: Vec<Param>) {
        self.block_scopes.push(params);
    }

    pub fn pop_block_scope(&mut self) {
        self.block_scopes.pop();
    }

    /// The innermost block parameter named `name`, if any block literal
    /// currently encloses the traversal.
    pub fn lookup_block_param(&self, name: &str) -> Option<&Param> {
        self.block_scopes.iter().rev().flatten().find(|p| p.name.node == name)
    }
}
