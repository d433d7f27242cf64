//! Syntactic type expressions (named `types` to avoid clashing with the
//! resolved-type algebra living downstream in `sable-typeguess`).

use crate::expressions::Expr;
use crate::infrastructure::Spanned;

/// A type as written in source — not yet resolved to a concrete type.
///
/// Generic owners keep these around verbatim (`spec.md` §4.3): the node is
/// substituted only once the owner is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// `Foo`, `Foo::Bar`, `Array(Int32)`, `Pointer(T)` — a possibly
    /// generic, possibly namespaced path.
    Path {
        names: Vec<String>,
        type_vars: Vec<Spanned<TypeNode>>,
    },
    /// `T?`
    Nilable(Box<Spanned<TypeNode>>),
    /// `Proc(A, B -> C)`
    Proc {
        inputs: Vec<Spanned<TypeNode>>,
        output: Option<Box<Spanned<TypeNode>>>,
    },
    /// `self` used in a type position (return type, restriction).
    SelfType,
    /// `typeof(a, b, ...)`
    TypeOf(Vec<Spanned<Expr>>),
    /// `T.class` — the metaclass of `T`.
    Metaclass(Box<Spanned<TypeNode>>),
}

impl TypeNode {
    pub fn simple(name: impl Into<String>) -> Self {
        TypeNode::Path {
            names: vec![name.into()],
            type_vars: vec![],
        }
    }
}
