//! The data model from `spec.md` §3: resolved types, the per-variable
//! bucket records, and the traversal's output.

use indexmap::{IndexMap, IndexSet};
use sable_ast::{FloatKind, IntKind, Span, Spanned, TypeNode};

/// A concrete, resolved type. Built only through [`crate::oracle::TypeAlgebra`]
/// factory methods or [`crate::oracle::Resolver::lookup`] — the pass never
/// invents one out of thin air.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Int(IntKind),
    Float(FloatKind),
    Bool,
    Char,
    Nil,
    Str,
    Symbol,
    Regex,
    Array(Box<ResolvedType>),
    Hash(Box<ResolvedType>, Box<ResolvedType>),
    Range(Box<ResolvedType>, Box<ResolvedType>),
    Tuple(Vec<ResolvedType>),
    NamedTuple(Vec<(String, ResolvedType)>),
    Nilable(Box<ResolvedType>),
    Proc(Vec<ResolvedType>, Box<ResolvedType>),
    Pointer(Box<ResolvedType>),
    /// A user-defined class/struct/module/enum, possibly instantiated
    /// with type arguments.
    Named { name: String, generics: Vec<ResolvedType> },
    /// The metaclass (type-of-a-type) of some resolved type.
    Metaclass(Box<ResolvedType>),
    /// A widened union, as produced by `merge!`.
    Union(Vec<ResolvedType>),
}

impl std::fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedType::Int(k) => write!(f, "{k:?}"),
            ResolvedType::Float(k) => write!(f, "{k:?}"),
            ResolvedType::Bool => write!(f, "Bool"),
            ResolvedType::Char => write!(f, "Char"),
            ResolvedType::Nil => write!(f, "Nil"),
            ResolvedType::Str => write!(f, "String"),
            ResolvedType::Symbol => write!(f, "Symbol"),
            ResolvedType::Regex => write!(f, "Regex"),
            ResolvedType::Array(e) => write!(f, "Array({e})"),
            ResolvedType::Hash(k, v) => write!(f, "Hash({k}, {v})"),
            ResolvedType::Range(a, b) => write!(f, "Range({a}, {b})"),
            ResolvedType::Tuple(es) => {
                write!(f, "{{")?;
                for (i, e) in es.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "}}")
            }
            ResolvedType::NamedTuple(fs) => {
                write!(f, "{{")?;
                for (i, (n, e)) in fs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{n}: {e}")?;
                }
                write!(f, "}}")
            }
            ResolvedType::Nilable(inner) => write!(f, "{inner}?"),
            ResolvedType::Proc(inputs, output) => {
                write!(f, "Proc(")?;
                for (i, e) in inputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, " -> {output})")
            }
            ResolvedType::Pointer(inner) => write!(f, "Pointer({inner})"),
            ResolvedType::Named { name, generics } => {
                write!(f, "{name}")?;
                if !generics.is_empty() {
                    write!(f, "(")?;
                    for (i, g) in generics.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{g}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            ResolvedType::Metaclass(inner) => write!(f, "{inner}.class"),
            ResolvedType::Union(parts) => {
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
        }
    }
}

/// A type that may still be an unresolved syntax fragment, as produced by
/// [`crate::guess::expr_vars::guess_type_vars`] for generic owners
/// (`spec.md` §4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Resolved(ResolvedType),
    Unresolved(Spanned<TypeNode>),
}

/// `TypeInfo` for globals and class variables (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub ty: ResolvedType,
    pub first_location: Span,
    pub outside_def: bool,
}

/// `InstanceVarTypeInfo` for instance variables (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceVarTypeInfo {
    pub location: Span,
    pub type_vars: Vec<TypeExpr>,
    pub outside_def: bool,
}

/// A pre-existing explicit declaration for a variable, which suppresses
/// guessing for that (owner, name) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclarationWithLocation {
    pub ty: ResolvedType,
    pub location: Span,
}

/// What a forbidden type looked like when it was rejected (`spec.md` §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisallowedKind {
    AbstractRoot,
    UninstantiatedGeneric,
}

/// A captured `DisallowedVariableType` rejection, first-wins per (owner, name).
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub span: Span,
    pub offending_type: ResolvedType,
    pub kind: DisallowedKind,
}

/// Which instance variables a single `initialize`-shaped definition
/// assigns before any `self` escape (`spec.md` §3, §4.6).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializeInfo {
    pub instance_vars: IndexSet<String>,
}

/// Pre-populated, read-only: explicit instance variable declarations from
/// an earlier pass. Guessing is suppressed wherever an entry exists here.
#[derive(Debug, Clone, Default)]
pub struct ExplicitInstanceVars {
    pub(crate) by_owner: IndexMap<ResolvedType, IndexMap<String, TypeDeclarationWithLocation>>,
}

impl ExplicitInstanceVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: ResolvedType, name: impl Into<String>, decl: TypeDeclarationWithLocation) {
        self.by_owner.entry(owner).or_default().insert(name.into(), decl);
    }

    pub fn get(&self, owner: &ResolvedType, name: &str) -> Option<&TypeDeclarationWithLocation> {
        self.by_owner.get(owner).and_then(|m| m.get(name))
    }
}

/// The full set of output buckets populated by one run of the pass
/// (`spec.md` §3, §6 "Outputs").
#[derive(Debug, Default)]
pub struct Buckets {
    pub globals: IndexMap<String, TypeInfo>,
    pub class_vars: IndexMap<ResolvedType, IndexMap<String, TypeInfo>>,
    pub guessed_instance_vars: IndexMap<ResolvedType, IndexMap<String, InstanceVarTypeInfo>>,
    pub instance_vars_outside: IndexMap<ResolvedType, IndexSet<String>>,
    pub initialize_infos: IndexMap<ResolvedType, Vec<InitializeInfo>>,
    pub errors: IndexMap<ResolvedType, IndexMap<String, ErrorRecord>>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }
}
