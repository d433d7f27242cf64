//! Generic type parameters on class/module/struct definitions.

use crate::infrastructure::Spanned;

/// A single type parameter on a generic owner, e.g. `T` in `class Box(T)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: Spanned<String>,
}
