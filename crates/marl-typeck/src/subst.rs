//! Substitutions and free-variable queries.
//!
//! A [`Subst`] maps type-variable ids to types and row-variable ids to row
//! variables (row variables only ever unify with other row variables, so
//! their images are always row variables). Application is a single
//! structural walk: a variable is replaced by its image as-is, without
//! re-substituting into the image. Composition keeps the accumulated
//! substitution idempotent by applying the newer one to the older one's
//! images first.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ty::{Row, RowVar, Scheme, Ty, TyVar};

/// A substitution from variable ids to types/row variables.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    types: FxHashMap<u32, Ty>,
    rows: FxHashMap<u32, RowVar>,
}

impl Subst {
    /// The empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// A substitution binding a single type variable.
    pub fn singleton(var: TyVar, ty: Ty) -> Self {
        let mut s = Self::new();
        s.types.insert(var.0, ty);
        s
    }

    /// A substitution binding a single row variable to another.
    pub fn singleton_row(var: RowVar, image: RowVar) -> Self {
        let mut s = Self::new();
        s.rows.insert(var.0, image);
        s
    }

    /// Whether this substitution binds nothing.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.rows.is_empty()
    }

    /// The image of a type variable, if bound.
    pub fn lookup(&self, var: TyVar) -> Option<&Ty> {
        self.types.get(&var.0)
    }

    /// Apply the substitution to a type.
    ///
    /// Walks the type, replacing any bound type variable by its image and
    /// recursing into arrays, dictionaries, rows, and function types. The
    /// image itself is not walked again.
    pub fn apply(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.types.get(&v.0) {
                Some(image) => image.clone(),
                None => ty.clone(),
            },
            Ty::Number | Ty::Str | Ty::Bool | Ty::Null | Ty::Undefined | Ty::Unit => ty.clone(),
            Ty::Array(elem) => Ty::array(self.apply(elem)),
            Ty::Dict(key, value) => Ty::dict(self.apply(key), self.apply(value)),
            Ty::Record(row) => Ty::Record(self.apply_row(row)),
            Ty::Fun(params, ret) => {
                Ty::fun(params.iter().map(|p| self.apply(p)).collect(), self.apply(ret))
            }
        }
    }

    /// Apply the substitution to a row: substitute each field type and
    /// redirect the tail if it maps to another row variable.
    pub fn apply_row(&self, row: &Row) -> Row {
        let fields = row
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), self.apply(ty)))
            .collect();
        let tail = row.tail.map(|t| self.rows.get(&t.0).copied().unwrap_or(t));
        Row { fields, tail }
    }

    /// Apply the substitution to a scheme's body, leaving quantified
    /// variables untouched.
    pub fn apply_scheme(&self, scheme: &Scheme) -> Scheme {
        if scheme.vars.is_empty() {
            return Scheme::mono(self.apply(&scheme.ty));
        }
        let mut narrowed = self.clone();
        for v in &scheme.vars {
            narrowed.types.remove(&v.0);
        }
        Scheme {
            vars: scheme.vars.clone(),
            ty: narrowed.apply(&scheme.ty),
        }
    }

    /// Compose two substitutions: the result behaves like applying
    /// `second` first, then `first`.
    ///
    /// Applies `first` to every image in `second`, then folds in any
    /// mapping of `first` whose key `second` does not already bind.
    pub fn compose(first: &Subst, second: &Subst) -> Subst {
        let mut types: FxHashMap<u32, Ty> = second
            .types
            .iter()
            .map(|(id, ty)| (*id, first.apply(ty)))
            .collect();
        for (id, ty) in &first.types {
            types.entry(*id).or_insert_with(|| ty.clone());
        }

        let mut rows: FxHashMap<u32, RowVar> = second
            .rows
            .iter()
            .map(|(id, image)| (*id, first.rows.get(&image.0).copied().unwrap_or(*image)))
            .collect();
        for (id, image) in &first.rows {
            rows.entry(*id).or_insert(*image);
        }

        Subst { types, rows }
    }
}

/// The sets of type-variable and row-variable ids free in a type.
#[derive(Clone, Debug, Default)]
pub struct FreeVars {
    pub types: FxHashSet<u32>,
    pub rows: FxHashSet<u32>,
}

impl FreeVars {
    /// Merge another set into this one.
    pub fn extend(&mut self, other: FreeVars) {
        self.types.extend(other.types);
        self.rows.extend(other.rows);
    }
}

/// Collect the free type- and row-variable ids of a type.
pub fn free_type_vars(ty: &Ty) -> FreeVars {
    let mut out = FreeVars::default();
    collect_free(ty, &mut out);
    out
}

/// Collect the free variables of a scheme: the body's free variables
/// minus the quantified ones.
pub fn free_scheme_vars(scheme: &Scheme) -> FreeVars {
    let mut out = free_type_vars(&scheme.ty);
    for v in &scheme.vars {
        out.types.remove(&v.0);
    }
    out
}

fn collect_free(ty: &Ty, out: &mut FreeVars) {
    match ty {
        Ty::Var(v) => {
            out.types.insert(v.0);
        }
        Ty::Number | Ty::Str | Ty::Bool | Ty::Null | Ty::Undefined | Ty::Unit => {}
        Ty::Array(elem) => collect_free(elem, out),
        Ty::Dict(key, value) => {
            collect_free(key, out);
            collect_free(value, out);
        }
        Ty::Record(row) => {
            for ty in row.fields.values() {
                collect_free(ty, out);
            }
            if let Some(tail) = row.tail {
                out.rows.insert(tail.0);
            }
        }
        Ty::Fun(params, ret) => {
            for p in params {
                collect_free(p, out);
            }
            collect_free(ret, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_bound_var() {
        let s = Subst::singleton(TyVar(0), Ty::Number);
        assert_eq!(s.apply(&Ty::Var(TyVar(0))), Ty::Number);
        assert_eq!(s.apply(&Ty::Var(TyVar(1))), Ty::Var(TyVar(1)));
    }

    #[test]
    fn apply_recurses_into_structure() {
        let s = Subst::singleton(TyVar(0), Ty::Str);
        let ty = Ty::fun(vec![Ty::array(Ty::Var(TyVar(0)))], Ty::Var(TyVar(0)));
        assert_eq!(
            s.apply(&ty),
            Ty::fun(vec![Ty::array(Ty::Str)], Ty::Str)
        );
    }

    #[test]
    fn apply_substitutes_record_fields_and_tail() {
        let mut s = Subst::singleton(TyVar(0), Ty::Number);
        s.rows.insert(1, RowVar(9));
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("x".to_string(), Ty::Var(TyVar(0)));
        let row = Row::open(fields, RowVar(1));
        let applied = s.apply_row(&row);
        assert_eq!(applied.fields["x"], Ty::Number);
        assert_eq!(applied.tail, Some(RowVar(9)));
    }

    #[test]
    fn apply_is_idempotent_for_solved_substitutions() {
        let s = Subst::compose(
            &Subst::singleton(TyVar(1), Ty::Number),
            &Subst::singleton(TyVar(0), Ty::array(Ty::Var(TyVar(1)))),
        );
        let ty = Ty::fun(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(1)));
        let once = s.apply(&ty);
        let twice = s.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn compose_applies_first_to_second_images() {
        // second: t0 -> [t1], first: t1 -> number
        // composed: t0 -> [number], t1 -> number
        let second = Subst::singleton(TyVar(0), Ty::array(Ty::Var(TyVar(1))));
        let first = Subst::singleton(TyVar(1), Ty::Number);
        let composed = Subst::compose(&first, &second);
        assert_eq!(
            composed.apply(&Ty::Var(TyVar(0))),
            Ty::array(Ty::Number)
        );
        assert_eq!(composed.apply(&Ty::Var(TyVar(1))), Ty::Number);
    }

    #[test]
    fn compose_prefers_second_on_key_collision() {
        // A key bound by `second` keeps its (rewritten) image.
        let second = Subst::singleton(TyVar(0), Ty::Str);
        let first = Subst::singleton(TyVar(0), Ty::Number);
        let composed = Subst::compose(&first, &second);
        assert_eq!(composed.apply(&Ty::Var(TyVar(0))), Ty::Str);
    }

    #[test]
    fn apply_scheme_skips_quantified_vars() {
        let s = Subst::singleton(TyVar(0), Ty::Number);
        let scheme = Scheme {
            vars: vec![TyVar(0)],
            ty: Ty::fun(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(0))),
        };
        let applied = s.apply_scheme(&scheme);
        // The quantified t0 must survive untouched.
        assert_eq!(applied.ty, scheme.ty);
    }

    #[test]
    fn free_vars_of_compound_type() {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("x".to_string(), Ty::Var(TyVar(3)));
        let ty = Ty::fun(
            vec![Ty::Var(TyVar(1)), Ty::Record(Row::open(fields, RowVar(2)))],
            Ty::dict(Ty::Var(TyVar(1)), Ty::Number),
        );
        let free = free_type_vars(&ty);
        assert!(free.types.contains(&1));
        assert!(free.types.contains(&3));
        assert_eq!(free.types.len(), 2);
        assert!(free.rows.contains(&2));
    }

    #[test]
    fn free_scheme_vars_excludes_quantified() {
        let scheme = Scheme {
            vars: vec![TyVar(0)],
            ty: Ty::fun(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(5))),
        };
        let free = free_scheme_vars(&scheme);
        assert!(!free.types.contains(&0));
        assert!(free.types.contains(&5));
    }
}
