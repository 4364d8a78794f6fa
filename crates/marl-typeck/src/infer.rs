//! Constraint-generating inference engine for Marl.
//!
//! Walks the AST generating equality constraints and deferred
//! field-access constraints, then solves them by unification
//! ([`crate::unify`]), composing the resulting substitutions into an
//! accumulator owned by the [`InferCtx`]. Implements Hindley-Milner
//! inference with:
//!
//! - let-polymorphism (generalize at binding groups, instantiate at use)
//! - mutually recursive binding groups via pre-declared placeholders
//! - row-polymorphic records (open rows synthesized from deferred field
//!   accesses)
//! - directional subtyping at call sites and annotated bindings
//!   (contravariant parameters, covariant returns, record width)
//!
//! Errors propagate immediately; a failed constraint aborts inference.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use marl_common::span::Span;
use marl_parser::ast::{
    BinOp, Expr, ExprKind, FuncLit, LetGroup, PatternKind, Program, TypeExpr, TypeExprKind, UnOp,
};

use crate::builtins;
use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::subst::{free_type_vars, Subst};
use crate::ty::{Row, RowVar, Scheme, Ty, TyVar};
use crate::unify::unify;

/// An equality constraint between two types, tagged with the span of the
/// expression that generated it.
#[derive(Debug)]
struct Constraint {
    left: Ty,
    right: Ty,
    span: Span,
}

/// A deferred member access: `object.field` where the object's type was
/// still a bare variable at inference time.
#[derive(Debug)]
struct FieldConstraint {
    object: Ty,
    field: String,
    result: Ty,
    span: Span,
}

/// The inference context: fresh-variable counters, the pending constraint
/// lists, and the substitution accumulated by solving.
pub struct InferCtx {
    next_ty_var: u32,
    next_row_var: u32,
    constraints: Vec<Constraint>,
    field_constraints: Vec<FieldConstraint>,
    subst: Subst,
}

impl InferCtx {
    /// Create a new, empty inference context.
    pub fn new() -> Self {
        InferCtx {
            next_ty_var: 0,
            next_row_var: 0,
            constraints: Vec::new(),
            field_constraints: Vec::new(),
            subst: Subst::new(),
        }
    }

    // ── Fresh variables ────────────────────────────────────────────────

    /// Allocate a fresh type variable.
    pub fn fresh_ty_var(&mut self) -> TyVar {
        let var = TyVar(self.next_ty_var);
        self.next_ty_var += 1;
        var
    }

    /// Allocate a fresh type variable wrapped as a type.
    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.fresh_ty_var())
    }

    /// Allocate a fresh row variable (separate id space).
    pub fn fresh_row_var(&mut self) -> RowVar {
        let var = RowVar(self.next_row_var);
        self.next_row_var += 1;
        var
    }

    /// Move both counters past every variable id free in `env`, so fresh
    /// variables never collide with a caller-provided environment.
    pub fn bump_past(&mut self, env: &TypeEnv) {
        let (ty_bound, row_bound) = env.var_id_bounds();
        self.next_ty_var = self.next_ty_var.max(ty_bound);
        self.next_row_var = self.next_row_var.max(row_bound);
    }

    // ── Constraint accumulation ────────────────────────────────────────

    /// Record an equality constraint.
    pub fn constrain(&mut self, left: Ty, right: Ty, span: Span) {
        self.constraints.push(Constraint { left, right, span });
    }

    /// Record a deferred field-access constraint.
    fn constrain_field(&mut self, object: Ty, field: String, result: Ty, span: Span) {
        self.field_constraints.push(FieldConstraint {
            object,
            field,
            result,
            span,
        });
    }

    /// The substitution accumulated by solving so far.
    pub fn subst(&self) -> &Subst {
        &self.subst
    }

    // ── Solving ────────────────────────────────────────────────────────

    /// Solve all pending constraints, composing their unifiers into the
    /// accumulated substitution.
    ///
    /// Equality constraints are processed in order: each side gets the
    /// accumulated substitution applied, the results unify, and the
    /// unifier folds into the accumulator. Field-access constraints then
    /// group by their (substituted) object type: a group whose object is
    /// still a variable synthesizes an open record with the required
    /// fields and a fresh row tail; objects that resolved to concrete
    /// records discharge directly. Both lists are empty afterwards.
    pub fn solve(&mut self) -> Result<(), TypeError> {
        let constraints = std::mem::take(&mut self.constraints);
        for c in constraints {
            let left = self.subst.apply(&c.left);
            let right = self.subst.apply(&c.right);
            let mgu = unify(&left, &right, c.span)?;
            if !mgu.is_empty() {
                self.subst = Subst::compose(&mgu, &self.subst);
            }
        }

        let deferred = std::mem::take(&mut self.field_constraints);
        let mut groups: Vec<(TyVar, BTreeMap<String, Ty>, Span)> = Vec::new();
        for fc in deferred {
            let object = self.subst.apply(&fc.object);
            let result = self.subst.apply(&fc.result);
            match object {
                Ty::Var(v) => {
                    let idx = match groups.iter().position(|(gv, _, _)| *gv == v) {
                        Some(idx) => idx,
                        None => {
                            groups.push((v, BTreeMap::new(), fc.span));
                            groups.len() - 1
                        }
                    };
                    let existing = groups[idx].1.get(&fc.field).cloned();
                    match existing {
                        Some(existing) => {
                            // The same field was accessed twice; its
                            // result types must agree.
                            let existing = self.subst.apply(&existing);
                            let mgu = unify(&existing, &result, fc.span)?;
                            if !mgu.is_empty() {
                                self.subst = Subst::compose(&mgu, &self.subst);
                            }
                        }
                        None => {
                            groups[idx].1.insert(fc.field, result);
                        }
                    }
                }
                Ty::Record(row) => match row.fields.get(&fc.field) {
                    Some(field_ty) => {
                        let mgu = unify(field_ty, &result, fc.span)?;
                        if !mgu.is_empty() {
                            self.subst = Subst::compose(&mgu, &self.subst);
                        }
                    }
                    // An open row may still supply the field through its
                    // tail; only a closed row without it is an error.
                    None if row.is_open() => {}
                    None => {
                        return Err(TypeError::NoSuchField {
                            ty: Ty::Record(row),
                            field: fc.field,
                            span: fc.span,
                        })
                    }
                },
                other => {
                    return Err(TypeError::NoSuchField {
                        ty: other,
                        field: fc.field,
                        span: fc.span,
                    })
                }
            }
        }

        for (var, fields, span) in groups {
            let fields = fields
                .into_iter()
                .map(|(name, ty)| (name, self.subst.apply(&ty)))
                .collect();
            let record = Ty::Record(Row::open(fields, self.fresh_row_var()));
            let object = self.subst.apply(&Ty::Var(var));
            let mgu = unify(&object, &record, span)?;
            if !mgu.is_empty() {
                self.subst = Subst::compose(&mgu, &self.subst);
            }
        }

        Ok(())
    }

    // ── Generalization and instantiation ───────────────────────────────

    /// Generalize a type against the environment: quantify the type
    /// variables free in the type but not free in any scheme of the
    /// environment. Row variables are never quantified.
    pub fn generalize(&self, env: &TypeEnv, ty: &Ty) -> Scheme {
        self.generalize_against(&env.free_vars().types, ty)
    }

    /// Generalize against an explicit set of environment variable ids,
    /// mapping both the type and the ids through the accumulated
    /// substitution first.
    fn generalize_against(&self, env_var_ids: &FxHashSet<u32>, ty: &Ty) -> Scheme {
        let resolved = self.subst.apply(ty);
        let mut env_free: FxHashSet<u32> = FxHashSet::default();
        for id in env_var_ids {
            let image = self.subst.apply(&Ty::Var(TyVar(*id)));
            env_free.extend(free_type_vars(&image).types);
        }
        let mut vars: Vec<TyVar> = free_type_vars(&resolved)
            .types
            .difference(&env_free)
            .map(|id| TyVar(*id))
            .collect();
        vars.sort();
        Scheme { vars, ty: resolved }
    }

    /// Instantiate a scheme: replace each quantified variable with a
    /// fresh one in a copy of the body.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        let scheme = self.subst.apply_scheme(scheme);
        if scheme.vars.is_empty() {
            return scheme.ty;
        }
        let mut mapping = Subst::new();
        for var in &scheme.vars {
            let fresh = self.fresh_var();
            mapping = Subst::compose(&Subst::singleton(*var, fresh), &mapping);
        }
        mapping.apply(&scheme.ty)
    }

    // ── Annotation lowering ────────────────────────────────────────────

    /// Lower a surface type expression to a type. Named type variables
    /// are scoped per binding: the same name inside one annotation scope
    /// maps to the same inference variable.
    pub fn lower_type_expr(
        &mut self,
        te: &TypeExpr,
        scope: &mut FxHashMap<String, Ty>,
    ) -> Result<Ty, TypeError> {
        match &te.kind {
            TypeExprKind::Number => Ok(Ty::Number),
            TypeExprKind::Str => Ok(Ty::Str),
            TypeExprKind::Bool => Ok(Ty::Bool),
            TypeExprKind::Null => Ok(Ty::Null),
            TypeExprKind::Undefined => Ok(Ty::Undefined),
            TypeExprKind::Unit => Ok(Ty::Unit),
            TypeExprKind::Array(elem) => Ok(Ty::array(self.lower_type_expr(elem, scope)?)),
            TypeExprKind::Dict(key, value) => Ok(Ty::dict(
                self.lower_type_expr(key, scope)?,
                self.lower_type_expr(value, scope)?,
            )),
            TypeExprKind::Func(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| self.lower_type_expr(p, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ty::fun(params, self.lower_type_expr(ret, scope)?))
            }
            TypeExprKind::Name(name) => {
                // `Array`/`Dict` without arguments name no type.
                if name == "Array" || name == "Dict" {
                    return Err(TypeError::UnknownTypeExpr {
                        name: name.clone(),
                        span: te.span,
                    });
                }
                if let Some(ty) = scope.get(name) {
                    return Ok(ty.clone());
                }
                let fresh = self.fresh_var();
                scope.insert(name.clone(), fresh.clone());
                Ok(fresh)
            }
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

// ── Directional subtyping ──────────────────────────────────────────────

/// Apply `sub <= sup`: "a value of `sub` is usable where `sup` is
/// expected". Emitted only at call sites and annotated bindings.
///
/// Functions are contravariant in parameters and covariant in the return
/// type; records use width subtyping (extra fields in `sub` are fine);
/// arrays and dictionaries fall back to invariant equality; a type
/// variable on either side defers to unification as an equality
/// constraint.
fn subsume(ctx: &mut InferCtx, sub: &Ty, sup: &Ty, span: Span) -> Result<(), TypeError> {
    if sub == sup {
        return Ok(());
    }
    match (sub, sup) {
        (Ty::Var(_), _) | (_, Ty::Var(_)) => {
            ctx.constrain(sub.clone(), sup.clone(), span);
            Ok(())
        }
        (Ty::Fun(sub_params, sub_ret), Ty::Fun(sup_params, sup_ret)) => {
            if sub_params.len() != sup_params.len() {
                return Err(TypeError::ArityMismatch {
                    expected: sub_params.len(),
                    found: sup_params.len(),
                    span,
                });
            }
            for (a, b) in sub_params.iter().zip(sup_params.iter()) {
                subsume(ctx, b, a, span)?; // contravariant
            }
            subsume(ctx, sub_ret, sup_ret, span) // covariant
        }
        (Ty::Record(sub_row), Ty::Record(sup_row)) => {
            let mut missing = Vec::new();
            for (name, sup_field) in &sup_row.fields {
                match sub_row.fields.get(name) {
                    Some(sub_field) => subsume(ctx, sub_field, sup_field, span)?,
                    None => missing.push(name.clone()),
                }
            }
            if !missing.is_empty() {
                return Err(TypeError::MissingFields {
                    fields: missing,
                    ty: sub.clone(),
                    span,
                });
            }
            Ok(())
        }
        (Ty::Array(a), Ty::Array(b)) => {
            ctx.constrain((**a).clone(), (**b).clone(), span);
            Ok(())
        }
        (Ty::Dict(ka, va), Ty::Dict(kb, vb)) => {
            ctx.constrain((**ka).clone(), (**kb).clone(), span);
            ctx.constrain((**va).clone(), (**vb).clone(), span);
            Ok(())
        }
        _ => {
            ctx.constrain(sub.clone(), sup.clone(), span);
            Ok(())
        }
    }
}

// ── Expression inference ───────────────────────────────────────────────

/// Infer the type of an expression, accumulating constraints in `ctx`.
pub fn infer_expr(ctx: &mut InferCtx, env: &mut TypeEnv, expr: &Expr) -> Result<Ty, TypeError> {
    match &expr.kind {
        ExprKind::Number(_) => Ok(Ty::Number),
        ExprKind::Str(_) => Ok(Ty::Str),
        ExprKind::Bool(_) => Ok(Ty::Bool),
        ExprKind::Null => Ok(Ty::Null),
        ExprKind::Undefined => Ok(Ty::Undefined),

        ExprKind::Ident(name) => {
            let scheme = env
                .lookup(name)
                .cloned()
                .ok_or_else(|| TypeError::UndefinedVariable {
                    name: name.clone(),
                    span: expr.span,
                })?;
            Ok(ctx.instantiate(&scheme))
        }

        ExprKind::Array(elements) => {
            let Some((first, rest)) = elements.split_first() else {
                return Ok(Ty::array(ctx.fresh_var()));
            };
            let elem_ty = infer_expr(ctx, env, first)?;
            for element in rest {
                let ty = infer_expr(ctx, env, element)?;
                ctx.constrain(ty, elem_ty.clone(), element.span);
            }
            Ok(Ty::array(elem_ty))
        }

        ExprKind::Dict(entries) => {
            let Some(((first_key, first_value), rest)) = entries.split_first() else {
                return Ok(Ty::dict(ctx.fresh_var(), ctx.fresh_var()));
            };
            let key_ty = infer_expr(ctx, env, first_key)?;
            let value_ty = infer_expr(ctx, env, first_value)?;
            for (key, value) in rest {
                let k = infer_expr(ctx, env, key)?;
                ctx.constrain(k, key_ty.clone(), key.span);
                let v = infer_expr(ctx, env, value)?;
                ctx.constrain(v, value_ty.clone(), value.span);
            }
            Ok(Ty::dict(key_ty, value_ty))
        }

        ExprKind::Record(fields) => {
            // A record literal has a closed row; order is irrelevant.
            let mut row_fields = BTreeMap::new();
            for (name, value) in fields {
                let ty = infer_expr(ctx, env, value)?;
                row_fields.insert(name.clone(), ty);
            }
            Ok(Ty::Record(Row::closed(row_fields)))
        }

        ExprKind::Member { object, field } => {
            let object_ty = infer_expr(ctx, env, object)?;
            let object_ty = ctx.subst().apply(&object_ty);
            match object_ty {
                Ty::Record(row) => {
                    if let Some(field_ty) = row.fields.get(field) {
                        Ok(field_ty.clone())
                    } else if row.is_open() {
                        Ok(ctx.fresh_var())
                    } else {
                        Err(TypeError::NoSuchField {
                            ty: Ty::Record(row),
                            field: field.clone(),
                            span: expr.span,
                        })
                    }
                }
                Ty::Var(_) => {
                    let result = ctx.fresh_var();
                    ctx.constrain_field(object_ty, field.clone(), result.clone(), expr.span);
                    Ok(result)
                }
                other => Err(TypeError::NoSuchField {
                    ty: other,
                    field: field.clone(),
                    span: expr.span,
                }),
            }
        }

        ExprKind::Index { object, index } => {
            let object_ty = infer_expr(ctx, env, object)?;
            let index_ty = infer_expr(ctx, env, index)?;
            // A string-literal index or a dictionary-literal container
            // means dictionary access; everything else is array access.
            let dict_access = matches!(index.kind, ExprKind::Str(_))
                || matches!(object.kind, ExprKind::Dict(_));
            if dict_access {
                let value = ctx.fresh_var();
                ctx.constrain(object_ty, Ty::dict(index_ty, value.clone()), expr.span);
                Ok(value)
            } else {
                let elem = ctx.fresh_var();
                ctx.constrain(object_ty, Ty::array(elem.clone()), expr.span);
                ctx.constrain(index_ty, Ty::Number, index.span);
                Ok(elem)
            }
        }

        ExprKind::Func(func) => infer_func(ctx, env, func),

        ExprKind::Call { callee, args } => {
            let callee_ty = infer_expr(ctx, env, callee)?;
            let mut arg_tys = Vec::with_capacity(args.len());
            for arg in args {
                arg_tys.push(infer_expr(ctx, env, arg)?);
            }
            let ret = ctx.fresh_var();
            subsume(ctx, &callee_ty, &Ty::fun(arg_tys, ret.clone()), expr.span)?;
            Ok(ret)
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let lhs_ty = infer_expr(ctx, env, lhs)?;
            let rhs_ty = infer_expr(ctx, env, rhs)?;
            match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                    ctx.constrain(lhs_ty, Ty::Number, lhs.span);
                    ctx.constrain(rhs_ty, Ty::Number, rhs.span);
                    Ok(Ty::Number)
                }
                BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                    ctx.constrain(lhs_ty, Ty::Number, lhs.span);
                    ctx.constrain(rhs_ty, Ty::Number, rhs.span);
                    Ok(Ty::Bool)
                }
                BinOp::Eq | BinOp::NotEq => {
                    ctx.constrain(lhs_ty, rhs_ty, expr.span);
                    Ok(Ty::Bool)
                }
                BinOp::And | BinOp::Or => {
                    ctx.constrain(lhs_ty, Ty::Bool, lhs.span);
                    ctx.constrain(rhs_ty, Ty::Bool, rhs.span);
                    Ok(Ty::Bool)
                }
            }
        }

        ExprKind::Unary { op, operand } => {
            let operand_ty = infer_expr(ctx, env, operand)?;
            match op {
                UnOp::Neg => {
                    ctx.constrain(operand_ty, Ty::Number, operand.span);
                    Ok(Ty::Number)
                }
                UnOp::Not => {
                    ctx.constrain(operand_ty, Ty::Bool, operand.span);
                    Ok(Ty::Bool)
                }
            }
        }

        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond_ty = infer_expr(ctx, env, cond)?;
            ctx.constrain(cond_ty, Ty::Bool, cond.span);
            let then_ty = infer_expr(ctx, env, then_branch)?;
            match else_branch {
                Some(else_branch) => {
                    let else_ty = infer_expr(ctx, env, else_branch)?;
                    Ok(conditional_join(ctx, &then_ty, &else_ty, expr.span))
                }
                None => {
                    ctx.constrain(then_ty, Ty::Unit, then_branch.span);
                    Ok(Ty::Unit)
                }
            }
        }

        ExprKind::Block { stmts, tail } => {
            env.enter_scope();
            for stmt in stmts {
                infer_expr(ctx, env, stmt)?;
            }
            let ty = infer_expr(ctx, env, tail)?;
            env.exit_scope();
            Ok(ty)
        }

        ExprKind::Match { scrutinee, cases } => {
            let scrutinee_ty = infer_expr(ctx, env, scrutinee)?;
            let mut result_ty: Option<Ty> = None;
            for case in cases {
                env.enter_scope();
                if let PatternKind::Ident(name) = &case.pattern.kind {
                    // Bound names are polymorphic over the discriminant.
                    let scheme = ctx.generalize(env, &scrutinee_ty);
                    env.insert(name.clone(), scheme);
                }
                if let Some(guard) = &case.guard {
                    let guard_ty = infer_expr(ctx, env, guard)?;
                    ctx.constrain(guard_ty, Ty::Bool, guard.span);
                }
                let body_ty = infer_expr(ctx, env, &case.body)?;
                env.exit_scope();
                match &result_ty {
                    Some(first) => ctx.constrain(body_ty, first.clone(), case.body.span),
                    None => result_ty = Some(body_ty),
                }
            }
            Ok(result_ty.expect("parser rejects empty match"))
        }

        ExprKind::Let(group) => infer_let_group(ctx, env, group),
    }
}

/// Infer a function literal: bind parameters (annotated or fresh), infer
/// the body, and constrain it against any return annotation.
fn infer_func(ctx: &mut InferCtx, env: &mut TypeEnv, func: &FuncLit) -> Result<Ty, TypeError> {
    // One annotation scope per literal: the same type-variable name in
    // the parameter list and return annotation means the same variable.
    let mut scope: FxHashMap<String, Ty> = FxHashMap::default();
    env.enter_scope();
    let mut param_tys = Vec::with_capacity(func.params.len());
    for param in &func.params {
        let ty = match &param.annotation {
            Some(annotation) => ctx.lower_type_expr(annotation, &mut scope)?,
            None => ctx.fresh_var(),
        };
        env.insert(param.name.clone(), Scheme::mono(ty.clone()));
        param_tys.push(ty);
    }
    let body_ty = infer_expr(ctx, env, &func.body)?;
    env.exit_scope();

    let ret_ty = match &func.ret {
        Some(annotation) => {
            let annotated = ctx.lower_type_expr(annotation, &mut scope)?;
            ctx.constrain(body_ty, annotated.clone(), func.body.span);
            annotated
        }
        None => body_ty,
    };
    Ok(Ty::fun(param_tys, ret_ty))
}

/// Infer a binding group as a single unit, so members may be mutually
/// recursive.
///
/// Every name is pre-declared with its annotation or a fresh placeholder;
/// initializers are inferred under that extended environment; inferred
/// types meet their placeholders (by equality, or by directional
/// subtyping when annotated); then the group solves and each binding
/// generalizes against the environment as it was before the placeholders
/// were introduced.
fn infer_let_group(
    ctx: &mut InferCtx,
    env: &mut TypeEnv,
    group: &LetGroup,
) -> Result<Ty, TypeError> {
    let outer_free = env.free_vars().types;

    let mut placeholders = Vec::with_capacity(group.bindings.len());
    for binding in &group.bindings {
        let mut scope: FxHashMap<String, Ty> = FxHashMap::default();
        let (placeholder, annotated) = match &binding.annotation {
            Some(annotation) => (ctx.lower_type_expr(annotation, &mut scope)?, true),
            None => (ctx.fresh_var(), false),
        };
        env.insert(binding.name.clone(), Scheme::mono(placeholder.clone()));
        placeholders.push((placeholder, annotated));
    }

    for (binding, (placeholder, annotated)) in group.bindings.iter().zip(placeholders.iter()) {
        let inferred = infer_expr(ctx, env, &binding.init)?;
        if *annotated {
            // Width-wider records may satisfy a narrower annotation.
            subsume(ctx, &inferred, placeholder, binding.init.span)?;
        } else {
            ctx.constrain(inferred, placeholder.clone(), binding.init.span);
        }
    }

    ctx.solve()?;
    env.apply_subst(ctx.subst());

    let mut group_ty = Ty::Unit;
    for (binding, (placeholder, _)) in group.bindings.iter().zip(placeholders.iter()) {
        let final_ty = ctx.subst().apply(placeholder);
        let scheme = ctx.generalize_against(&outer_free, &final_ty);
        env.insert(binding.name.clone(), scheme);
        group_ty = final_ty;
    }
    Ok(group_ty)
}

/// The structural join of the two branches of a conditional.
///
/// When both branches are records, the join is a closed row over their
/// common fields, recursing into fields that are records on both sides
/// and constraining the rest to be equal. Otherwise (including when there
/// are no common fields) the branches are constrained equal and the then
/// branch's type is returned.
fn conditional_join(ctx: &mut InferCtx, then_ty: &Ty, else_ty: &Ty, span: Span) -> Ty {
    if let (Ty::Record(then_row), Ty::Record(else_row)) = (then_ty, else_ty) {
        let common: Vec<&String> = then_row
            .fields
            .keys()
            .filter(|name| else_row.fields.contains_key(*name))
            .collect();
        if !common.is_empty() {
            let mut fields = BTreeMap::new();
            for name in common {
                let a = &then_row.fields[name];
                let b = &else_row.fields[name];
                let joined = if matches!((a, b), (Ty::Record(_), Ty::Record(_))) {
                    conditional_join(ctx, a, b, span)
                } else {
                    ctx.constrain(a.clone(), b.clone(), span);
                    a.clone()
                };
                fields.insert(name.clone(), joined);
            }
            return Ty::Record(Row::closed(fields));
        }
    }
    ctx.constrain(then_ty.clone(), else_ty.clone(), span);
    then_ty.clone()
}

// ── Entry points ───────────────────────────────────────────────────────

/// Infer and solve a whole program, returning the final type environment.
///
/// Items are processed in order; each item's constraints solve
/// immediately and the resulting substitution applies to the environment,
/// so later items see solved types. With no `base_env`, the environment
/// starts from the built-in schemes.
pub fn infer_and_solve(
    program: &Program,
    base_env: Option<TypeEnv>,
) -> Result<TypeEnv, TypeError> {
    let mut ctx = InferCtx::new();
    let mut env = match base_env {
        Some(env) => {
            ctx.bump_past(&env);
            env
        }
        None => {
            let mut env = TypeEnv::new();
            builtins::register_builtins(&mut ctx, &mut env);
            env
        }
    };
    for item in &program.items {
        infer_expr(&mut ctx, &mut env, item)?;
        ctx.solve()?;
        env.apply_subst(ctx.subst());
    }
    Ok(env)
}

/// Infer the type of a single expression against an environment.
///
/// The environment is not modified; bindings introduced by the
/// expression are local to the query.
pub fn infer_expression(expr: &Expr, env: &TypeEnv) -> Result<Ty, TypeError> {
    let mut ctx = InferCtx::new();
    let mut env = env.clone();
    ctx.bump_past(&env);
    let ty = infer_expr(&mut ctx, &mut env, expr)?;
    ctx.solve()?;
    Ok(ctx.subst().apply(&ty))
}
