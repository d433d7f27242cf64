//! The external contracts `spec.md` §6 hands this pass: a name resolver,
//! a type algebra, and a symbol table of already-typed globals/class vars.
//! None of these are implemented here — the parser, the full semantic
//! analyzer, and the symbol table own them. This module only states the
//! shape of what the pass consumes.

use std::rc::Rc;

use sable_ast::{Def, Expr, Spanned, TypeNode};

use crate::model::ResolvedType;

/// What kind of owner a type is, as far as this pass needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    /// The implicit top-level program/file module: instance variables are
    /// illegal here.
    TopLevel,
    /// An ordinary class or struct — instance variables guess to resolved
    /// types.
    Concrete,
    /// A module mixed into other types — instance variables guess to
    /// resolved types, same as `Concrete`.
    ConcreteModule,
    /// A class/module parameterized by unresolved type variables —
    /// instance variables guess to syntactic type expressions.
    Generic,
}

/// Where a type lookup should start searching from — `spec.md` §4.1.1's
/// "program vs. current owner's metaclass".
#[derive(Debug, Clone, PartialEq)]
pub enum LookupRoot {
    Program,
    Owner(ResolvedType),
}

/// A method definition that might satisfy a call, returned by
/// [`Resolver::candidate_defs`] for `spec.md` §4.2.5's body inference.
#[derive(Debug, Clone)]
pub struct DefCandidate {
    pub def: Rc<Spanned<Def>>,
    /// The type that should be swapped in as the current owner while
    /// guessing through this candidate's body.
    pub owner: ResolvedType,
    pub declared_return: Option<ResolvedType>,
}

impl PartialEq for DefCandidate {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.def, &other.def) && self.owner == other.owner
    }
}

/// A resolved constant (as opposed to a type name) reachable via a `Path`
/// expression — `spec.md` §4.2.4.
#[derive(Debug, Clone)]
pub struct ConstantRef {
    /// Stable identity for this constant, used as the cycle-detection key
    /// on the constants-being-resolved stack.
    pub id: String,
    /// Set if the constant's value is already known (from an earlier pass)
    /// to be an enum member literal.
    pub enum_member_type: Option<ResolvedType>,
    /// The constant's initializer expression, to be guessed recursively
    /// when `enum_member_type` is absent.
    pub value: Rc<Spanned<Expr>>,
}

impl PartialEq for ConstantRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A foreign-library function signature, as declared in an `extern`/`lib`
/// block — `spec.md` §4.1.2 and §4.2.1 rule 5.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignFnSig {
    pub return_type: Option<ResolvedType>,
    /// Pointee element type of each parameter, if that parameter is
    /// pointer-shaped (`None` otherwise). Indexed positionally.
    pub param_pointees: Vec<Option<ResolvedType>>,
}

/// Name resolution, as an external oracle this pass only queries.
///
/// Implementations back onto the real symbol table / semantic analyzer;
/// a fake is provided under `#[cfg(test)]` so the pass can be exercised
/// without either.
pub trait Resolver {
    /// `lookup(root, node, allow_typeof) -> Type?` from `spec.md` §6.
    fn lookup(&self, root: &LookupRoot, node: &TypeNode, allow_typeof: bool) -> Option<ResolvedType>;

    fn owner_kind(&self, owner: &ResolvedType) -> OwnerKind;

    /// Climb the enclosing-type stack to find which type actually owns a
    /// class variable of this name (`spec.md` §4.1.1, "Class var").
    fn class_var_owner(&self, enclosing: &[ResolvedType], name: &str) -> Option<ResolvedType>;

    /// Candidate method definitions on `owner_metaclass` matching the
    /// call's block-presence and argument count (`spec.md` §4.2.5).
    fn candidate_defs(
        &self,
        owner_metaclass: &ResolvedType,
        name: &str,
        has_block: bool,
        arg_count: usize,
    ) -> Vec<DefCandidate>;

    /// `T` in `Pointer(T).malloc` / `Pointer(T).null` — `Some` only if
    /// `ty` actually resolves to a pointer instance type.
    fn pointer_element(&self, ty: &ResolvedType) -> Option<ResolvedType>;

    /// Whether the bare path (no arguments) resolves to the `Pointer`
    /// generic type itself — used by `Pointer.malloc(n, v)` (rule 4).
    fn is_pointer_type_path(&self, names: &[String]) -> bool;

    /// Resolve a constant reachable through a `Path` expression.
    fn resolve_constant(&self, root: &LookupRoot, names: &[String]) -> Option<ConstantRef>;

    /// Whether `names` (resolved from `root`) denotes a foreign-library
    /// descriptor (an `extern`/`lib` block).
    fn foreign_library(&self, root: &LookupRoot, names: &[String]) -> Option<ForeignLibrary>;

    /// A declared function on a foreign library, by name.
    fn foreign_fn(&self, lib: &ForeignLibrary, name: &str) -> Option<ForeignFnSig>;

    /// A declared external variable's type, by name.
    fn foreign_var(&self, lib: &ForeignLibrary, name: &str) -> Option<ResolvedType>;

    fn is_abstract_root(&self, ty: &ResolvedType) -> bool;
    fn is_uninstantiated_generic(&self, ty: &ResolvedType) -> bool;

    /// The virtualized form of a concrete class (`spec.md` §4.5, §4.2.2 `self`).
    fn virtualized(&self, ty: &ResolvedType) -> ResolvedType;

    fn metaclass_of(&self, ty: &ResolvedType) -> ResolvedType;
}

/// A resolved foreign-library descriptor, e.g. `LibC`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignLibrary {
    pub id: String,
}

/// The language's canonical union/widening operator and type factories —
/// `spec.md` §6 and §4.4 ("Merging is the language's canonical
/// union/widening operator; this spec does not redefine it").
pub trait TypeAlgebra {
    fn merge(&self, types: &[ResolvedType]) -> ResolvedType;

    fn array(&self, element: ResolvedType) -> ResolvedType {
        ResolvedType::Array(Box::new(element))
    }
    fn hash(&self, key: ResolvedType, value: ResolvedType) -> ResolvedType {
        ResolvedType::Hash(Box::new(key), Box::new(value))
    }
    fn range(&self, from: ResolvedType, to: ResolvedType) -> ResolvedType {
        ResolvedType::Range(Box::new(from), Box::new(to))
    }
    fn tuple(&self, elements: Vec<ResolvedType>) -> ResolvedType {
        ResolvedType::Tuple(elements)
    }
    fn named_tuple(&self, fields: Vec<(String, ResolvedType)>) -> ResolvedType {
        ResolvedType::NamedTuple(fields)
    }
    fn nilable(&self, inner: ResolvedType) -> ResolvedType {
        match inner {
            ResolvedType::Nilable(_) => inner,
            other => ResolvedType::Nilable(Box::new(other)),
        }
    }
    fn proc(&self, inputs: Vec<ResolvedType>, output: ResolvedType) -> ResolvedType {
        ResolvedType::Proc(inputs, Box::new(output))
    }
    fn proc_void(&self) -> ResolvedType {
        ResolvedType::Proc(vec![], Box::new(ResolvedType::Nil))
    }
    fn pointer(&self, inner: ResolvedType) -> ResolvedType {
        ResolvedType::Pointer(Box::new(inner))
    }
}

/// Already-typed globals and class variables from the symbol table —
/// `spec.md` §4.1.1's "if the symbol table already has this global typed,
/// reuse that type and stop."
pub trait SymbolTable {
    fn typed_global(&self, name: &str) -> Option<ResolvedType>;
    fn typed_class_var(&self, owner: &ResolvedType, name: &str) -> Option<ResolvedType>;
}
