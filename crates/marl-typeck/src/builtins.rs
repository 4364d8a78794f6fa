//! Built-in scheme registration.
//!
//! Registers the polymorphic type scheme of every built-in function into
//! the type environment. The runtime half of the registry (the native
//! implementations) lives in the evaluator crate; both sides carry the
//! same catalog, name for name.

use crate::env::TypeEnv;
use crate::infer::InferCtx;
use crate::ty::{Scheme, Ty};

/// Every built-in, in catalog order. The evaluator's registry mirrors
/// this list exactly.
pub const BUILTIN_NAMES: &[&str] = &[
    "length",
    "head",
    "tail",
    "push",
    "empty",
    "range",
    "sum",
    "product",
    "flatten",
    "unique",
    "chunk",
    "zip",
    "concat",
    "substring",
    "strlen",
    "sqrt",
    "abs",
    "floor",
    "ceil",
    "toString",
    "toNumber",
    "dictKeys",
    "dictValues",
    "dictEntries",
    "dictFromEntries",
    "dictMerge",
    "dictHas",
    "dictSet",
    "dictDelete",
    "dictSize",
];

/// Register all built-in schemes into the environment.
pub fn register_builtins(ctx: &mut InferCtx, env: &mut TypeEnv) {
    // ── Arrays ──────────────────────────────────────────────────────

    env.insert("length", poly1(ctx, |a| Ty::fun(vec![Ty::array(a)], Ty::Number)));
    env.insert("head", poly1(ctx, |a| Ty::fun(vec![Ty::array(a.clone())], a)));
    env.insert(
        "tail",
        poly1(ctx, |a| Ty::fun(vec![Ty::array(a.clone())], Ty::array(a))),
    );
    env.insert(
        "push",
        poly1(ctx, |a| {
            Ty::fun(vec![Ty::array(a.clone()), a.clone()], Ty::array(a))
        }),
    );
    env.insert("empty", poly1(ctx, |a| Ty::fun(vec![Ty::array(a)], Ty::Bool)));
    env.insert(
        "range",
        Scheme::mono(Ty::fun(
            vec![Ty::Number, Ty::Number],
            Ty::array(Ty::Number),
        )),
    );
    env.insert(
        "sum",
        Scheme::mono(Ty::fun(vec![Ty::array(Ty::Number)], Ty::Number)),
    );
    env.insert(
        "product",
        Scheme::mono(Ty::fun(vec![Ty::array(Ty::Number)], Ty::Number)),
    );
    env.insert(
        "flatten",
        poly1(ctx, |a| {
            Ty::fun(vec![Ty::array(Ty::array(a.clone()))], Ty::array(a))
        }),
    );
    env.insert(
        "unique",
        poly1(ctx, |a| Ty::fun(vec![Ty::array(a.clone())], Ty::array(a))),
    );
    env.insert(
        "chunk",
        poly1(ctx, |a| {
            Ty::fun(
                vec![Ty::array(a.clone()), Ty::Number],
                Ty::array(Ty::array(a)),
            )
        }),
    );
    env.insert(
        "zip",
        poly2(ctx, |a, b| {
            Ty::fun(
                vec![Ty::array(a.clone()), Ty::array(b.clone())],
                Ty::array(Ty::record([("first", a), ("second", b)])),
            )
        }),
    );
    env.insert(
        "concat",
        poly1(ctx, |a| {
            Ty::fun(
                vec![Ty::array(a.clone()), Ty::array(a.clone())],
                Ty::array(a),
            )
        }),
    );

    // ── Strings ─────────────────────────────────────────────────────

    env.insert(
        "substring",
        Scheme::mono(Ty::fun(vec![Ty::Str, Ty::Number, Ty::Number], Ty::Str)),
    );
    env.insert("strlen", Scheme::mono(Ty::fun(vec![Ty::Str], Ty::Number)));

    // ── Numbers ─────────────────────────────────────────────────────

    for name in ["sqrt", "abs", "floor", "ceil"] {
        env.insert(name, Scheme::mono(Ty::fun(vec![Ty::Number], Ty::Number)));
    }

    // ── Conversions ─────────────────────────────────────────────────

    env.insert("toString", poly1(ctx, |a| Ty::fun(vec![a], Ty::Str)));
    env.insert("toNumber", Scheme::mono(Ty::fun(vec![Ty::Str], Ty::Number)));

    // ── Dictionaries ────────────────────────────────────────────────

    env.insert(
        "dictKeys",
        poly2(ctx, |k, v| Ty::fun(vec![Ty::dict(k.clone(), v)], Ty::array(k))),
    );
    env.insert(
        "dictValues",
        poly2(ctx, |k, v| Ty::fun(vec![Ty::dict(k, v.clone())], Ty::array(v))),
    );
    env.insert(
        "dictEntries",
        poly2(ctx, |k, v| {
            Ty::fun(
                vec![Ty::dict(k.clone(), v.clone())],
                Ty::array(Ty::record([("key", k), ("value", v)])),
            )
        }),
    );
    env.insert(
        "dictFromEntries",
        poly2(ctx, |k, v| {
            Ty::fun(
                vec![Ty::array(Ty::record([("key", k.clone()), ("value", v.clone())]))],
                Ty::dict(k, v),
            )
        }),
    );
    env.insert(
        "dictMerge",
        poly2(ctx, |k, v| {
            let d = Ty::dict(k, v);
            Ty::fun(vec![d.clone(), d.clone()], d)
        }),
    );
    env.insert(
        "dictHas",
        poly2(ctx, |k, v| Ty::fun(vec![Ty::dict(k.clone(), v), k], Ty::Bool)),
    );
    env.insert(
        "dictSet",
        poly2(ctx, |k, v| {
            let d = Ty::dict(k.clone(), v.clone());
            Ty::fun(vec![d.clone(), k, v], d)
        }),
    );
    env.insert(
        "dictDelete",
        poly2(ctx, |k, v| {
            let d = Ty::dict(k.clone(), v);
            Ty::fun(vec![d.clone(), k], d)
        }),
    );
    env.insert(
        "dictSize",
        poly2(ctx, |k, v| Ty::fun(vec![Ty::dict(k, v)], Ty::Number)),
    );
}

/// Build a scheme quantified over one fresh variable.
fn poly1(ctx: &mut InferCtx, build: impl FnOnce(Ty) -> Ty) -> Scheme {
    let a = ctx.fresh_ty_var();
    Scheme {
        vars: vec![a],
        ty: build(Ty::Var(a)),
    }
}

/// Build a scheme quantified over two fresh variables.
fn poly2(ctx: &mut InferCtx, build: impl FnOnce(Ty, Ty) -> Ty) -> Scheme {
    let a = ctx.fresh_ty_var();
    let b = ctx.fresh_ty_var();
    Scheme {
        vars: vec![a, b],
        ty: build(Ty::Var(a), Ty::Var(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_registered() {
        let mut ctx = InferCtx::new();
        let mut env = TypeEnv::new();
        register_builtins(&mut ctx, &mut env);
        for name in BUILTIN_NAMES {
            assert!(env.lookup(name).is_some(), "missing builtin `{name}`");
        }
        assert_eq!(BUILTIN_NAMES.len(), 29);
    }

    #[test]
    fn polymorphic_builtins_quantify_their_vars() {
        let mut ctx = InferCtx::new();
        let mut env = TypeEnv::new();
        register_builtins(&mut ctx, &mut env);

        let head = env.lookup("head").unwrap();
        assert_eq!(head.vars.len(), 1);
        let zip = env.lookup("zip").unwrap();
        assert_eq!(zip.vars.len(), 2);
        let range = env.lookup("range").unwrap();
        assert!(range.vars.is_empty());

        // No free variables may leak out of the builtin environment.
        assert!(env.free_vars().types.is_empty());
        assert!(env.free_vars().rows.is_empty());
    }
}
