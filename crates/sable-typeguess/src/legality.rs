//! C7 — the generics-legality check (`spec.md` §4.5).
//!
//! Runs after every name-to-type resolution the guessers perform: an
//! abstract root or an uninstantiated generic is not a legal variable
//! type, and gets rejected instead of stored.

use sable_ast::Span;

use crate::model::{DisallowedKind, ErrorRecord, ResolvedType};
use crate::oracle::Resolver;

/// Checks `ty`, resolved at `site`, against the two disallowed shapes.
/// Returns the (possibly virtualized) type on success, or an `ErrorRecord`
/// describing the rejection on failure — never both.
pub fn check(resolver: &dyn Resolver, ty: ResolvedType, site: Span) -> (Option<ResolvedType>, Option<ErrorRecord>) {
    if resolver.is_abstract_root(&ty) {
        return (
            None,
            Some(ErrorRecord {
                span: site,
                offending_type: ty,
                kind: DisallowedKind::AbstractRoot,
            }),
        );
    }
    if resolver.is_uninstantiated_generic(&ty) {
        return (
            None,
            Some(ErrorRecord {
                span: site,
                offending_type: ty,
                kind: DisallowedKind::UninstantiatedGeneric,
            }),
        );
    }
    (Some(resolver.virtualized(&ty)), None)
}
