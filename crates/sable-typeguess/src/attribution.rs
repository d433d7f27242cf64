//! C5 — the attribution visitor (`spec.md` §4.1). The pass's pre-order
//! traversal: walks every statement, enters class/module/enum and method
//! scopes, and routes each assignment to the right output bucket via the
//! two guessers (C3/C4). The only part of the pass that mutates
//! [`Buckets`].

use sable_ast::{Def, Expr, Module, Spanned, Stmt, TypeDef, TypeNode};

use crate::context::PassCtx;
use crate::error::{GuessResult, InstanceVarForbiddenHere};
use crate::guess::concrete::guess_type;
use crate::guess::expr_vars::guess_type_vars;
use crate::guess::GuessInputs;
use crate::model::{Buckets, ExplicitInstanceVars, InitializeInfo, InstanceVarTypeInfo, ResolvedType, TypeExpr, TypeInfo};
use crate::oracle::OwnerKind;
use crate::self_detect::self_escapes;

/// Runs the whole pass over `module`. Returns `Err` the first time an
/// instance variable is assigned somewhere instance variables can't live
/// (the top-level program) — `spec.md` §7's hard-error channel, which
/// aborts the traversal rather than recording a soft error.
pub fn run(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, module: &Module) -> GuessResult<Buckets> {
    let mut buckets = Buckets::new();
    visit_stmts(ctx, explicit, &mut buckets, &module.body)?;
    Ok(buckets)
}

fn guess_value(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &Buckets, expr: &Spanned<Expr>) -> Option<ResolvedType> {
    let inputs = GuessInputs { explicit, buckets };
    guess_type(ctx, &inputs, expr)
}

fn guess_value_vars(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &Buckets, expr: &Spanned<Expr>) -> Option<Vec<TypeExpr>> {
    let inputs = GuessInputs { explicit, buckets };
    guess_type_vars(ctx, &inputs, expr)
}

fn visit_stmts(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &mut Buckets, stmts: &[Spanned<Stmt>]) -> GuessResult<()> {
    for s in stmts {
        visit_stmt(ctx, explicit, buckets, s)?;
    }
    Ok(())
}

fn visit_stmt(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &mut Buckets, stmt: &Spanned<Stmt>) -> GuessResult<()> {
    match &stmt.node {
        Stmt::TypeDef(td) => visit_type_def(ctx, explicit, buckets, td),
        Stmt::Def(d) => visit_def(ctx, explicit, buckets, d),
        Stmt::Expr(e) => {
            // An assignment's own self-escape check runs inside
            // `attribute_instance_var_assignment`, against just its RHS, so
            // that statement still gets its own var added before the flag
            // flips. A compound statement (`if`/`case`/a nested block) is
            // recursed into statement-by-statement, and each nested
            // statement runs this same check on its own — so only a flat
            // statement (a bare call, a bare value) needs the check here,
            // to catch a `self` that escapes without being assigned anywhere
            // (`publish(self)`).
            let is_flat = !matches!(
                e.node,
                Expr::Assign { .. }
                    | Expr::MultiAssign { .. }
                    | Expr::TypeDeclaration { .. }
                    | Expr::UninitializedDeclaration { .. }
                    | Expr::If { .. }
                    | Expr::Unless { .. }
                    | Expr::Case { .. }
                    | Expr::Expressions(_)
            );
            if is_flat && ctx.current_init_info.is_some() && !ctx.found_self && self_escapes(e) {
                ctx.found_self = true;
            }
            visit_expr(ctx, explicit, buckets, e)
        }
    }
}

fn owner_for(td: &TypeDef) -> ResolvedType {
    ResolvedType::Named {
        name: td.name.node.clone(),
        generics: vec![],
    }
}

fn visit_type_def(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &mut Buckets, td: &Spanned<TypeDef>) -> GuessResult<()> {
    let owner = owner_for(&td.node);
    buckets.initialize_infos.entry(owner.clone()).or_default();
    let guard = ctx.push_owner(owner);
    let result = visit_stmts(ctx, explicit, buckets, &td.node.body);
    ctx.pop_owner(guard);
    result
}

fn visit_def(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &mut Buckets, def: &Spanned<Def>) -> GuessResult<()> {
    // An earlier overload reachable only through the shadow chain is still
    // visited, as if it were its own sibling definition — a redefinition
    // reaches back to what it shadows instead of hiding it outright.
    if let Some(prev) = &def.node.previous {
        visit_def(ctx, explicit, buckets, prev)?;
    }

    let saved_args = std::mem::replace(&mut ctx.current_args, def.node.args.clone());
    let saved_block_arg = std::mem::replace(&mut ctx.current_block_arg, def.node.block_arg.clone());
    let saved_outside_def = std::mem::replace(&mut ctx.outside_def, false);
    let saved_found_self = std::mem::replace(&mut ctx.found_self, false);

    let is_initialize = def.node.name.node == "initialize";
    let saved_init_info = if is_initialize {
        std::mem::replace(&mut ctx.current_init_info, Some(InitializeInfo::default()))
    } else {
        None
    };

    let result = visit_stmts(ctx, explicit, buckets, &def.node.body);

    if is_initialize {
        if let Some(info) = ctx.current_init_info.take() {
            if let Some(owner) = ctx.current_owner().cloned() {
                buckets.initialize_infos.entry(owner).or_default().push(info);
            }
        }
        ctx.current_init_info = saved_init_info;
    }

    ctx.current_args = saved_args;
    ctx.current_block_arg = saved_block_arg;
    ctx.outside_def = saved_outside_def;
    ctx.found_self = saved_found_self;

    result
}

fn visit_expr(ctx: &mut PassCtx, explicit: &ExplicitInstanceVars, buckets: &mut Buckets, e: &Spanned<Expr>) -> GuessResult<()> {
    scan_out_params(ctx, buckets, e);

    match &e.node {
        Expr::Assign { target, value } => {
            visit_expr(ctx, explicit, buckets, value)?;
            do_assign(ctx, explicit, buckets, target, value, e.span)
        }
        Expr::MultiAssign { targets, values } => {
            for v in values {
                visit_expr(ctx, explicit, buckets, v)?;
            }
            do_multi_assign(ctx, explicit, buckets, targets, values, e.span)
        }
        Expr::UninitializedDeclaration { target, declared_type } => {
            do_uninitialized_decl(ctx, explicit, buckets, target, declared_type, e.span)
        }
        Expr::TypeDeclaration { target, declared_type, value } => {
            visit_expr(ctx, explicit, buckets, value)?;
            do_type_decl(ctx, explicit, buckets, target, declared_type, value, e.span)
        }

        Expr::If { cond, then, else_ } | Expr::Unless { cond, then, else_ } => {
            visit_expr(ctx, explicit, buckets, cond)?;
            visit_stmts(ctx, explicit, buckets, then)?;
            if let Some(eb) = else_ {
                visit_stmts(ctx, explicit, buckets, eb)?;
            }
            Ok(())
        }
        Expr::Case { subject, whens, else_ } => {
            if let Some(s) = subject {
                visit_expr(ctx, explicit, buckets, s)?;
            }
            for w in whens {
                for c in &w.conditions {
                    visit_expr(ctx, explicit, buckets, c)?;
                }
                visit_stmts(ctx, explicit, buckets, &w.body)?;
            }
            if let Some(eb) = else_ {
                visit_stmts(ctx, explicit, buckets, eb)?;
            }
            Ok(())
        }
        Expr::Expressions(stmts) => visit_stmts(ctx, explicit, buckets, stmts),
        Expr::Call { obj, args, block, .. } => {
            if let Some(o) = obj {
                visit_expr(ctx, explicit, buckets, o)?;
            }
            for a in args {
                visit_expr(ctx, explicit, buckets, &a.value)?;
            }
            if let Some(b) = block {
                ctx.push_block_scope(b.args.clone());
                let result = visit_stmts(ctx, explicit, buckets, &b.body);
                ctx.pop_block_scope();
                result?;
            }
            Ok(())
        }
        Expr::MacroLike(inner) => visit_expr(ctx, explicit, buckets, inner),

        _ => Ok(()),
    }
}

/// Resolves a target expression to the owner/name pair this pass tracks,
/// or `None` if it isn't one of the three tracked kinds.
enum Target {
    Global(String),
    ClassVar(ResolvedType, String),
    InstanceVar(String),
}

fn classify(ctx: &PassCtx, target: &Expr) -> Option<Target> {
    match target {
        Expr::Global(name) => Some(Target::Global(name.clone())),
        Expr::ClassVar(name) => {
            let owner = ctx.resolver.class_var_owner(ctx.enclosing_owners(), name)?;
            Some(Target::ClassVar(owner, name.clone()))
        }
        Expr::InstanceVar(name) => Some(Target::InstanceVar(name.clone())),
        _ => None,
    }
}

fn do_assign(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    target: &Spanned<Expr>,
    value: &Spanned<Expr>,
    span: sable_ast::Span,
) -> GuessResult<()> {
    let Some(kind) = classify(ctx, &target.node) else {
        return Ok(());
    };

    match kind {
        Target::Global(name) => {
            ctx.error_slot = None;
            if ctx.symbols.typed_global(&name).is_none() {
                if let Some(ty) = guess_value(ctx, explicit, buckets, value) {
                    attribute_global(buckets, ctx, name, ty, span);
                }
            }
            Ok(())
        }
        Target::ClassVar(owner, name) => {
            ctx.error_slot = None;
            if ctx.symbols.typed_class_var(&owner, &name).is_none() {
                if let Some(ty) = guess_value(ctx, explicit, buckets, value) {
                    attribute_class_var(buckets, ctx, owner, name, ty, span);
                }
            }
            Ok(())
        }
        Target::InstanceVar(name) => attribute_instance_var_assignment(ctx, explicit, buckets, &name, Some(value), span),
    }
}

fn do_multi_assign(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    targets: &[Spanned<Expr>],
    values: &[Spanned<Expr>],
    span: sable_ast::Span,
) -> GuessResult<()> {
    if targets.len() == values.len() {
        for (t, v) in targets.iter().zip(values) {
            do_assign(ctx, explicit, buckets, t, v, span)?;
        }
        return Ok(());
    }

    // Unequal arity: every instance-var target still gets its name marked
    // into the enclosing initialize info, and every value still gets
    // scanned for a self-escape, independent of whether a tuple source can
    // actually be distributed below.
    for t in targets {
        if let Some(Target::InstanceVar(name)) = classify(ctx, &t.node) {
            if ctx.current_init_info.is_some() && !ctx.found_self {
                if let Some(info) = &mut ctx.current_init_info {
                    info.instance_vars.insert(name);
                }
            }
        }
    }
    for v in values {
        if !ctx.found_self && self_escapes(v) {
            ctx.found_self = true;
        }
    }

    // Single-tuple-source form: `@a, @b = pair`.
    if let [value] = values {
        let tuple = guess_value(ctx, explicit, buckets, value);
        let elems = match tuple {
            Some(ResolvedType::Tuple(elems)) if elems.len() == targets.len() => Some(elems),
            _ => None,
        };
        for (i, t) in targets.iter().enumerate() {
            let Some(kind) = classify(ctx, &t.node) else { continue };
            let elem = elems.as_ref().map(|e| e[i].clone());
            match kind {
                Target::Global(name) => {
                    if ctx.symbols.typed_global(&name).is_none() {
                        if let Some(ty) = elem {
                            attribute_global(buckets, ctx, name, ty, span);
                        }
                    }
                }
                Target::ClassVar(owner, name) => {
                    if ctx.symbols.typed_class_var(&owner, &name).is_none() {
                        if let Some(ty) = elem {
                            attribute_class_var(buckets, ctx, owner, name, ty, span);
                        }
                    }
                }
                Target::InstanceVar(name) => {
                    attribute_instance_var_known(ctx, explicit, buckets, &name, elem, span)?;
                }
            }
        }
    }
    Ok(())
}

fn do_uninitialized_decl(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    target: &Spanned<Expr>,
    declared_type: &Spanned<TypeNode>,
    span: sable_ast::Span,
) -> GuessResult<()> {
    let Some(kind) = classify(ctx, &target.node) else {
        return Ok(());
    };
    ctx.error_slot = None;
    let root = ctx.lookup_root();
    let resolved = match ctx.resolver.lookup(&root, &declared_type.node, false) {
        Some(looked_up) => {
            let (ok, err) = crate::legality::check(ctx.resolver, looked_up, declared_type.span);
            if let Some(e) = err {
                ctx.record_error(e);
            }
            ok
        }
        None => None,
    };
    match kind {
        Target::Global(name) => {
            if let Some(ty) = resolved {
                attribute_global(buckets, ctx, name, ty, span);
            }
            Ok(())
        }
        Target::ClassVar(owner, name) => {
            if let Some(ty) = resolved {
                attribute_class_var(buckets, ctx, owner, name, ty, span);
            }
            Ok(())
        }
        Target::InstanceVar(name) => attribute_instance_var_known(ctx, explicit, buckets, &name, resolved, span),
    }
}

fn do_type_decl(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    target: &Spanned<Expr>,
    declared_type: &Spanned<TypeNode>,
    _value: &Spanned<Expr>,
    span: sable_ast::Span,
) -> GuessResult<()> {
    // An explicit `v : T = e` declares its own type; the guesser never
    // needs to run for it, only legality-check the written type.
    do_uninitialized_decl(ctx, explicit, buckets, target, declared_type, span)
}

fn attribute_global(buckets: &mut Buckets, ctx: &PassCtx, name: String, ty: ResolvedType, span: sable_ast::Span) {
    match buckets.globals.get_mut(&name) {
        Some(info) => info.ty = ctx.algebra.merge(&[info.ty.clone(), ty]),
        None => {
            buckets.globals.insert(
                name,
                TypeInfo {
                    ty,
                    first_location: span,
                    outside_def: ctx.outside_def,
                },
            );
        }
    }
}

fn attribute_class_var(buckets: &mut Buckets, ctx: &PassCtx, owner: ResolvedType, name: String, ty: ResolvedType, span: sable_ast::Span) {
    let bucket = buckets.class_vars.entry(owner).or_default();
    match bucket.get_mut(&name) {
        Some(info) => info.ty = ctx.algebra.merge(&[info.ty.clone(), ty]),
        None => {
            bucket.insert(
                name,
                TypeInfo {
                    ty,
                    first_location: span,
                    outside_def: ctx.outside_def,
                },
            );
        }
    }
}

/// The common instance-variable attribution path for an `@x = value`
/// assignment: runs the self-detector, collects initializer info, and
/// dispatches to the concrete (C3) or type-expression (C4) guesser
/// depending on whether the owner is generic.
fn attribute_instance_var_assignment(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    name: &str,
    value: Option<&Spanned<Expr>>,
    span: sable_ast::Span,
) -> GuessResult<()> {
    let Some(owner) = ctx.current_owner().cloned() else {
        return Err(InstanceVarForbiddenHere::new("the top-level program", span));
    };

    if ctx.outside_def {
        buckets.instance_vars_outside.entry(owner.clone()).or_default().insert(name.to_string());
    }

    if ctx.current_init_info.is_some() && !ctx.found_self {
        if let Some(info) = &mut ctx.current_init_info {
            info.instance_vars.insert(name.to_string());
        }
    }
    if let Some(v) = value {
        if !ctx.found_self && self_escapes(v) {
            ctx.found_self = true;
        }
    }

    if explicit.get(&owner, name).is_some() {
        return Ok(());
    }

    ctx.error_slot = None;
    match ctx.resolver.owner_kind(&owner) {
        OwnerKind::TopLevel => Err(InstanceVarForbiddenHere::new(owner.to_string(), span)),
        OwnerKind::Generic => {
            if let Some(value) = value {
                if let Some(parts) = guess_value_vars(ctx, explicit, buckets, value) {
                    merge_instance_var_vars(buckets, owner.clone(), name, parts, span, ctx.outside_def);
                }
            }
            if let Some(err) = ctx.error_slot.take() {
                buckets.errors.entry(owner).or_default().entry(name.to_string()).or_insert(err);
            }
            Ok(())
        }
        OwnerKind::Concrete | OwnerKind::ConcreteModule => {
            if let Some(value) = value {
                if let Some(ty) = guess_value(ctx, explicit, buckets, value) {
                    merge_instance_var_resolved(buckets, ctx, owner.clone(), name, ty, span, ctx.outside_def);
                }
            }
            if let Some(err) = ctx.error_slot.take() {
                buckets.errors.entry(owner).or_default().entry(name.to_string()).or_insert(err);
            }
            Ok(())
        }
    }
}

/// Same routing, but for a destructuring / out-param target whose type is
/// already known (no value expression to guess or self-scan).
fn attribute_instance_var_known(
    ctx: &mut PassCtx,
    explicit: &ExplicitInstanceVars,
    buckets: &mut Buckets,
    name: &str,
    known: Option<ResolvedType>,
    span: sable_ast::Span,
) -> GuessResult<()> {
    let Some(owner) = ctx.current_owner().cloned() else {
        return Err(InstanceVarForbiddenHere::new("the top-level program", span));
    };
    if ctx.outside_def {
        buckets.instance_vars_outside.entry(owner.clone()).or_default().insert(name.to_string());
    }
    if explicit.get(&owner, name).is_some() {
        return Ok(());
    }
    if let Some(ty) = known {
        match ctx.resolver.owner_kind(&owner) {
            OwnerKind::TopLevel => return Err(InstanceVarForbiddenHere::new(owner.to_string(), span)),
            OwnerKind::Generic => merge_instance_var_vars(buckets, owner.clone(), name, vec![TypeExpr::Resolved(ty)], span, ctx.outside_def),
            OwnerKind::Concrete | OwnerKind::ConcreteModule => merge_instance_var_resolved(buckets, ctx, owner.clone(), name, ty, span, ctx.outside_def),
        }
    }
    if let Some(err) = ctx.error_slot.take() {
        buckets.errors.entry(owner).or_default().entry(name.to_string()).or_insert(err);
    }
    Ok(())
}

fn merge_instance_var_resolved(buckets: &mut Buckets, ctx: &PassCtx, owner: ResolvedType, name: &str, ty: ResolvedType, span: sable_ast::Span, outside_def: bool) {
    let bucket = buckets.guessed_instance_vars.entry(owner).or_default();
    match bucket.get_mut(name) {
        Some(info) => {
            if let [TypeExpr::Resolved(existing)] = info.type_vars.as_mut_slice() {
                *existing = ctx.algebra.merge(&[existing.clone(), ty]);
            } else {
                info.type_vars = vec![TypeExpr::Resolved(ty)];
            }
        }
        None => {
            bucket.insert(
                name.to_string(),
                InstanceVarTypeInfo {
                    location: span,
                    type_vars: vec![TypeExpr::Resolved(ty)],
                    outside_def,
                },
            );
        }
    }
}

fn merge_instance_var_vars(buckets: &mut Buckets, owner: ResolvedType, name: &str, parts: Vec<TypeExpr>, span: sable_ast::Span, outside_def: bool) {
    let bucket = buckets.guessed_instance_vars.entry(owner).or_default();
    match bucket.get_mut(name) {
        Some(info) => {
            for p in parts {
                if !info.type_vars.contains(&p) {
                    info.type_vars.push(p);
                }
            }
        }
        None => {
            bucket.insert(
                name.to_string(),
                InstanceVarTypeInfo {
                    location: span,
                    type_vars: parts,
                    outside_def,
                },
            );
        }
    }
}

/// `spec.md` §4.1.2: `LibX.fn(out @var)` attributes `@var` from the
/// foreign function's declared pointee type for that parameter, wherever
/// a call-shaped node appears — independent of whether it's assigned
/// from.
fn scan_out_params(ctx: &mut PassCtx, buckets: &mut Buckets, expr: &Spanned<Expr>) {
    if let Expr::Call { obj, name, args, .. } = &expr.node {
        if let Some(names) = receiver_path(obj) {
            let root = ctx.lookup_root();
            if let Some(lib) = ctx.resolver.foreign_library(&root, &names) {
                if let Some(sig) = ctx.resolver.foreign_fn(&lib, name) {
                    for (i, a) in args.iter().enumerate() {
                        if !a.is_out {
                            continue;
                        }
                        if let Expr::InstanceVar(var_name) = &a.value.node {
                            if let Some(Some(pointee)) = sig.param_pointees.get(i).cloned() {
                                if let Some(owner) = ctx.current_owner().cloned() {
                                    merge_instance_var_resolved(buckets, ctx, owner, var_name, pointee, a.value.span, ctx.outside_def);
                                }
                            }
                        }
                    }
                }
            }
        }
        for a in args {
            scan_out_params(ctx, buckets, &a.value);
        }
        if let Some(o) = obj {
            scan_out_params(ctx, buckets, o);
        }
    }
}

fn receiver_path(obj: &Option<Box<Spanned<Expr>>>) -> Option<Vec<String>> {
    match obj.as_deref().map(|o| &o.node) {
        Some(Expr::Path(names)) => Some(names.clone()),
        _ => None,
    }
}
