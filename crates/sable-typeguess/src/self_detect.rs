//! C1 — the self-detector (`spec.md` §4.6).
//!
//! A pure subtree walk: does this expression mention `self` in a way that
//! would let it escape? `self.class` is excluded — it yields the
//! metaclass without exposing the instance.

use sable_ast::{Expr, Spanned, Stmt};

/// Returns true if `self` is mentioned anywhere in `expr` other than as
/// the receiver of a bare `.class` call.
pub fn self_escapes(expr: &Spanned<Expr>) -> bool {
    walk_expr(&expr.node)
}

pub fn self_escapes_in_stmts(stmts: &[Spanned<Stmt>]) -> bool {
    stmts.iter().any(walk_stmt)
}

fn walk_stmt(stmt: &Spanned<Stmt>) -> bool {
    match &stmt.node {
        Stmt::Expr(e) => walk_expr(&e.node),
        // A nested class/def introduces its own `self`; it can't leak the
        // enclosing instance just by existing in the body.
        Stmt::TypeDef(_) | Stmt::Def(_) => false,
    }
}

fn is_bare_self_dot_class(obj: &Option<Box<Spanned<Expr>>>, name: &str, args_empty: bool, no_block: bool) -> bool {
    name == "class"
        && args_empty
        && no_block
        && matches!(obj.as_deref().map(|o| &o.node), Some(Expr::Var(n)) if n == "self")
}

fn walk_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Var(name) => name == "self",

        Expr::IntLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::CharLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::NilLiteral
        | Expr::StringLiteral(_)
        | Expr::SymbolLiteral(_)
        | Expr::RegexLiteral(_)
        | Expr::Nop
        | Expr::Path(_)
        | Expr::InstanceVar(_)
        | Expr::ClassVar(_)
        | Expr::Global(_)
        | Expr::Uninitialized(_)
        | Expr::SizeOf(_)
        | Expr::InstanceSizeOf(_) => false,

        Expr::StringInterp(parts) => parts.iter().any(|p| match p {
            sable_ast::StringInterpPart::Lit(_) => false,
            sable_ast::StringInterpPart::Expr(e) => walk_expr(&e.node),
        }),

        Expr::Range { from, to, .. } => {
            from.as_deref().map(|e| walk_expr(&e.node)).unwrap_or(false)
                || to.as_deref().map(|e| walk_expr(&e.node)).unwrap_or(false)
        }

        Expr::ArrayLiteral { elements, .. } => elements.iter().any(|e| walk_expr(&e.node)),
        Expr::HashLiteral { entries, .. } => entries
            .iter()
            .any(|(k, v)| walk_expr(&k.node) || walk_expr(&v.node)),
        Expr::TupleLiteral(elements) => elements.iter().any(|e| walk_expr(&e.node)),
        Expr::NamedTupleLiteral(fields) => fields.iter().any(|(_, v)| walk_expr(&v.node)),

        Expr::Binary { left, right, .. } => walk_expr(&left.node) || walk_expr(&right.node),
        Expr::Not(inner) => walk_expr(&inner.node),

        Expr::If { cond, then, else_ } | Expr::Unless { cond, then, else_ } => {
            walk_expr(&cond.node)
                || self_escapes_in_stmts(then)
                || else_.as_ref().map(|e| self_escapes_in_stmts(e)).unwrap_or(false)
        }

        Expr::Case { subject, whens, else_ } => {
            subject.as_deref().map(|e| walk_expr(&e.node)).unwrap_or(false)
                || whens.iter().any(|w| {
                    w.conditions.iter().any(|c| walk_expr(&c.node)) || self_escapes_in_stmts(&w.body)
                })
                || else_.as_ref().map(|e| self_escapes_in_stmts(e)).unwrap_or(false)
        }

        Expr::IsA { obj, .. } | Expr::RespondsTo { obj, .. } => walk_expr(&obj.node),
        Expr::Cast { obj, .. } | Expr::NilableCast { obj, .. } => walk_expr(&obj.node),

        Expr::Generic { base, .. } => walk_expr(&base.node),

        Expr::Call { obj, name, args, block } => {
            if is_bare_self_dot_class(obj, name, args.is_empty(), block.is_none()) {
                return false;
            }
            obj.as_deref().map(|o| walk_expr(&o.node)).unwrap_or(false)
                || args.iter().any(|a| walk_expr(&a.value.node))
                || block.as_ref().map(|b| self_escapes_in_stmts(&b.body)).unwrap_or(false)
        }

        Expr::Assign { target, value } => walk_expr(&target.node) || walk_expr(&value.node),
        Expr::MultiAssign { targets, values } => {
            targets.iter().any(|t| walk_expr(&t.node)) || values.iter().any(|v| walk_expr(&v.node))
        }
        Expr::UninitializedDeclaration { target, .. } => walk_expr(&target.node),
        Expr::TypeDeclaration { target, value, .. } => walk_expr(&target.node) || walk_expr(&value.node),

        Expr::Expressions(stmts) => self_escapes_in_stmts(stmts),
        Expr::MacroLike(inner) => walk_expr(&inner.node),
        Expr::Return(inner) => inner.as_deref().map(|e| walk_expr(&e.node)).unwrap_or(false),
    }
}
