//! Unification: the most-general-unifier computation.
//!
//! Structural unification over [`Ty`], returning the substitution that
//! makes both sides equal. Records unify row-wise: shared fields unify
//! pairwise, extra fields on one side require an open tail on the other,
//! and two open tails unify their row variables.
//!
//! The occurs check guards against infinite types, with one deliberate
//! exception: it reports no occurrence inside record types, so a type
//! variable can be bound to an open record whose field types mention that
//! same variable. This lets row-polymorphic field accesses on a bound
//! variable resolve instead of being rejected.

use marl_common::span::Span;

use crate::error::TypeError;
use crate::subst::Subst;
use crate::ty::{Row, Ty, TyVar};

/// Whether `var` occurs free in `ty`, treating record types as opaque.
///
/// The record exception means `occurs_in(v, { f: v })` is false; see the
/// module docs for why.
pub fn occurs_in(var: TyVar, ty: &Ty) -> bool {
    match ty {
        Ty::Var(v) => *v == var,
        Ty::Number | Ty::Str | Ty::Bool | Ty::Null | Ty::Undefined | Ty::Unit => false,
        Ty::Array(elem) => occurs_in(var, elem),
        Ty::Dict(key, value) => occurs_in(var, key) || occurs_in(var, value),
        Ty::Record(_) => false,
        Ty::Fun(params, ret) => params.iter().any(|p| occurs_in(var, p)) || occurs_in(var, ret),
    }
}

/// Unify two types, producing their most general unifier.
///
/// `span` locates the constraint for error reporting. Inputs are expected
/// to have the solver's accumulated substitution already applied.
pub fn unify(a: &Ty, b: &Ty, span: Span) -> Result<Subst, TypeError> {
    match (a, b) {
        // Equal types unify with the empty substitution.
        _ if a == b => Ok(Subst::new()),

        // Variable vs. anything: occurs check, then bind.
        (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
            if occurs_in(*v, ty) {
                return Err(TypeError::InfiniteType {
                    var: *v,
                    ty: ty.clone(),
                    span,
                });
            }
            Ok(Subst::singleton(*v, ty.clone()))
        }

        // Functions: arity must match; unify parameters pairwise, then
        // return types, threading the substitution left to right.
        (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
            if p1.len() != p2.len() {
                return Err(TypeError::ArityMismatch {
                    expected: p1.len(),
                    found: p2.len(),
                    span,
                });
            }
            let mut subst = Subst::new();
            for (a, b) in p1.iter().zip(p2.iter()) {
                let mgu = unify(&subst.apply(a), &subst.apply(b), span)?;
                subst = Subst::compose(&mgu, &subst);
            }
            let mgu = unify(&subst.apply(r1), &subst.apply(r2), span)?;
            Ok(Subst::compose(&mgu, &subst))
        }

        // Arrays: unify element types.
        (Ty::Array(e1), Ty::Array(e2)) => unify(e1, e2, span),

        // Dictionaries: unify keys, then values.
        (Ty::Dict(k1, v1), Ty::Dict(k2, v2)) => {
            let subst = unify(k1, k2, span)?;
            let mgu = unify(&subst.apply(v1), &subst.apply(v2), span)?;
            Ok(Subst::compose(&mgu, &subst))
        }

        // Records: row unification.
        (Ty::Record(ra), Ty::Record(rb)) => unify_rows(ra, rb, span),

        // Everything else is a mismatch.
        _ => Err(TypeError::Mismatch {
            left: a.clone(),
            right: b.clone(),
            span,
        }),
    }
}

/// Row unification.
///
/// Fields present on both sides unify pairwise. A side with extra fields
/// requires the other side to be open; a closed side missing fields is an
/// error naming them. Two open tails unify their row variables.
fn unify_rows(ra: &Row, rb: &Row, span: Span) -> Result<Subst, TypeError> {
    let mut subst = Subst::new();

    for (name, a_ty) in &ra.fields {
        if let Some(b_ty) = rb.fields.get(name) {
            let mgu = unify(&subst.apply(a_ty), &subst.apply(b_ty), span)?;
            subst = Subst::compose(&mgu, &subst);
        }
    }

    let a_only: Vec<String> = ra
        .fields
        .keys()
        .filter(|name| !rb.fields.contains_key(*name))
        .cloned()
        .collect();
    let b_only: Vec<String> = rb
        .fields
        .keys()
        .filter(|name| !ra.fields.contains_key(*name))
        .cloned()
        .collect();

    if !a_only.is_empty() && rb.tail.is_none() {
        return Err(TypeError::MissingFields {
            fields: a_only,
            ty: Ty::Record(rb.clone()),
            span,
        });
    }
    if !b_only.is_empty() && ra.tail.is_none() {
        return Err(TypeError::MissingFields {
            fields: b_only,
            ty: Ty::Record(ra.clone()),
            span,
        });
    }

    if let (Some(ta), Some(tb)) = (ra.tail, rb.tail) {
        if ta != tb {
            subst = Subst::compose(&Subst::singleton_row(ta, tb), &subst);
        }
    }

    Ok(subst)
}
