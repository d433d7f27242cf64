//! The two failure channels from `spec.md` §7: a hard compile error that
//! aborts traversal, and a soft, per-(owner, name) rejection recorded for
//! downstream diagnostics to render later.

use miette::{Diagnostic, SourceSpan};
use sable_ast::Span;
use thiserror::Error;

use crate::model::{DisallowedKind, ErrorRecord};

fn source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start.into(), span.end.saturating_sub(span.start))
}

/// `InstanceVarForbiddenHere` — raised immediately, aborting the
/// surrounding traversal as a compile error.
#[derive(Debug, Error, Diagnostic)]
#[error("can't declare instance variables in {owner}")]
#[diagnostic(code(sable::typeguess::instance_var_forbidden_here))]
pub struct InstanceVarForbiddenHere {
    pub owner: String,
    #[label("instance variable assigned here")]
    pub span: SourceSpan,
}

impl InstanceVarForbiddenHere {
    pub fn new(owner: impl Into<String>, span: Span) -> Self {
        Self {
            owner: owner.into(),
            span: source_span(span),
        }
    }
}

/// `DisallowedVariableType` — a generic class/module used uninstantiated,
/// or an abstract root, used as a variable type. Built from a stored
/// [`crate::model::ErrorRecord`] only when a caller actually wants to
/// render it; the bucket itself stores the cheaper, comparable record.
#[derive(Debug, Error, Diagnostic)]
pub enum DisallowedVariableType {
    #[error("an abstract type may not be used as a variable's type: {type_name}")]
    #[diagnostic(code(sable::typeguess::disallowed_abstract_root))]
    AbstractRoot {
        type_name: String,
        #[label("used as a variable type here")]
        span: SourceSpan,
    },

    #[error("a generic type must be instantiated before it can be used as a variable's type: {type_name}")]
    #[diagnostic(code(sable::typeguess::disallowed_uninstantiated_generic))]
    UninstantiatedGeneric {
        type_name: String,
        #[label("used as a variable type here")]
        span: SourceSpan,
    },
}

impl From<ErrorRecord> for DisallowedVariableType {
    fn from(record: ErrorRecord) -> Self {
        let type_name = record.offending_type.to_string();
        let span = source_span(record.span);
        match record.kind {
            DisallowedKind::AbstractRoot => DisallowedVariableType::AbstractRoot { type_name, span },
            DisallowedKind::UninstantiatedGeneric => DisallowedVariableType::UninstantiatedGeneric { type_name, span },
        }
    }
}

/// The pass's only propagating error — everything else that "doesn't
/// know" returns `None` rather than failing (`spec.md` §7).
pub type GuessResult<T> = Result<T, InstanceVarForbiddenHere>;
