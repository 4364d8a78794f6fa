//! Type representation for the Marl type system.
//!
//! Defines the core [`Ty`] enum, type variables ([`TyVar`]), row variables
//! ([`RowVar`]), record rows ([`Row`]), and polymorphic type schemes
//! ([`Scheme`]). Type variables and row variables draw from separate id
//! spaces; both counters live on the inference context.

use std::collections::BTreeMap;
use std::fmt;

/// A type variable, identified by a `u32` from the context's counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

/// A row variable: the tail of an open record row. Separate id space from
/// [`TyVar`]; row variables only ever unify with other row variables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowVar(pub u32);

/// A record row: field name to type, plus an optional row-variable tail.
///
/// A `Some` tail marks the record as *open* (it may carry further,
/// unknown fields); `None` marks it *closed*. Field order is irrelevant
/// to the type, so fields are kept sorted for deterministic display.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub fields: BTreeMap<String, Ty>,
    pub tail: Option<RowVar>,
}

impl Row {
    /// A closed row over the given fields.
    pub fn closed(fields: BTreeMap<String, Ty>) -> Self {
        Row { fields, tail: None }
    }

    /// An open row over the given fields with the given tail.
    pub fn open(fields: BTreeMap<String, Ty>, tail: RowVar) -> Self {
        Row {
            fields,
            tail: Some(tail),
        }
    }

    /// Whether the row admits fields beyond the ones listed.
    pub fn is_open(&self) -> bool {
        self.tail.is_some()
    }
}

/// A Marl type.
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    /// An inference variable (unresolved until solving binds it).
    Var(TyVar),
    Number,
    Str,
    Bool,
    Null,
    Undefined,
    Unit,
    /// `[T]`
    Array(Box<Ty>),
    /// `[K : V]`
    Dict(Box<Ty>, Box<Ty>),
    /// A record type described by its row.
    Record(Row),
    /// `(T1, ..., Tn) => U`
    Fun(Vec<Ty>, Box<Ty>),
}

impl Ty {
    /// Create an array type.
    pub fn array(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    /// Create a dictionary type.
    pub fn dict(key: Ty, value: Ty) -> Ty {
        Ty::Dict(Box::new(key), Box::new(value))
    }

    /// Create a function type.
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    /// Create a closed record type from (name, type) pairs.
    pub fn record<I, S>(fields: I) -> Ty
    where
        I: IntoIterator<Item = (S, Ty)>,
        S: Into<String>,
    {
        Ty::Record(Row::closed(
            fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        ))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "t{}", v.0),
            Ty::Number => write!(f, "number"),
            Ty::Str => write!(f, "string"),
            Ty::Bool => write!(f, "boolean"),
            Ty::Null => write!(f, "null"),
            Ty::Undefined => write!(f, "undefined"),
            Ty::Unit => write!(f, "unit"),
            Ty::Array(elem) => write!(f, "[{}]", elem),
            Ty::Dict(key, value) => write!(f, "[{} : {}]", key, value),
            Ty::Record(row) => {
                write!(f, "{{")?;
                let mut first = true;
                for (name, ty) in &row.fields {
                    if !first {
                        write!(f, ",")?;
                    }
                    first = false;
                    write!(f, " {}: {}", name, ty)?;
                }
                if row.tail.is_some() {
                    if !first {
                        write!(f, ",")?;
                    }
                    write!(f, " ..")?;
                }
                write!(f, " }}")
            }
            Ty::Fun(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") => {}", ret)
            }
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified type
/// variables.
///
/// The identity function's scheme is `forall t0. (t0) => t0`, represented
/// as `Scheme { vars: [t0], ty: Fun([Var(t0)], Var(t0)) }`. Row variables
/// are never quantified in this design.
#[derive(Clone, Debug)]
pub struct Scheme {
    /// The quantified (generic) type variables.
    pub vars: Vec<TyVar>,
    /// The underlying type (may reference `vars`).
    pub ty: Ty,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }
}

impl fmt::Display for Scheme {
    /// Print the body with quantified variables renumbered to `t0..tN`
    /// in quantifier order, so a scheme's display does not depend on
    /// which raw ids inference happened to allocate.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vars.is_empty() {
            return write!(f, "{}", self.ty);
        }
        let mapping: rustc_hash::FxHashMap<u32, u32> = self
            .vars
            .iter()
            .enumerate()
            .map(|(i, v)| (v.0, i as u32))
            .collect();
        write!(f, "{}", renumber(&self.ty, &mapping))
    }
}

/// Rewrite quantified variable ids for display.
fn renumber(ty: &Ty, mapping: &rustc_hash::FxHashMap<u32, u32>) -> Ty {
    match ty {
        Ty::Var(v) => Ty::Var(TyVar(*mapping.get(&v.0).unwrap_or(&v.0))),
        Ty::Number | Ty::Str | Ty::Bool | Ty::Null | Ty::Undefined | Ty::Unit => ty.clone(),
        Ty::Array(elem) => Ty::array(renumber(elem, mapping)),
        Ty::Dict(key, value) => Ty::dict(renumber(key, mapping), renumber(value, mapping)),
        Ty::Record(row) => Ty::Record(Row {
            fields: row
                .fields
                .iter()
                .map(|(n, t)| (n.clone(), renumber(t, mapping)))
                .collect(),
            tail: row.tail,
        }),
        Ty::Fun(params, ret) => Ty::fun(
            params.iter().map(|p| renumber(p, mapping)).collect(),
            renumber(ret, mapping),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_primitives() {
        assert_eq!(Ty::Number.to_string(), "number");
        assert_eq!(Ty::Str.to_string(), "string");
        assert_eq!(Ty::Bool.to_string(), "boolean");
        assert_eq!(Ty::Unit.to_string(), "unit");
    }

    #[test]
    fn display_compound() {
        assert_eq!(Ty::array(Ty::Number).to_string(), "[number]");
        assert_eq!(Ty::dict(Ty::Str, Ty::Bool).to_string(), "[string : boolean]");
        assert_eq!(
            Ty::fun(vec![Ty::Number, Ty::Str], Ty::Bool).to_string(),
            "(number, string) => boolean"
        );
    }

    #[test]
    fn display_records() {
        let closed = Ty::record([("x", Ty::Number), ("y", Ty::Str)]);
        assert_eq!(closed.to_string(), "{ x: number, y: string }");

        let mut fields = BTreeMap::new();
        fields.insert("x".to_string(), Ty::Number);
        let open = Ty::Record(Row::open(fields, RowVar(0)));
        assert_eq!(open.to_string(), "{ x: number, .. }");

        assert_eq!(Ty::record::<_, String>([]).to_string(), "{ }");
    }

    #[test]
    fn record_fields_display_sorted() {
        // BTreeMap keeps fields in name order regardless of insertion.
        let ty = Ty::record([("b", Ty::Number), ("a", Ty::Str)]);
        assert_eq!(ty.to_string(), "{ a: string, b: number }");
    }

    #[test]
    fn row_openness() {
        let closed = Row::closed(BTreeMap::new());
        assert!(!closed.is_open());
        let open = Row::open(BTreeMap::new(), RowVar(7));
        assert!(open.is_open());
    }
}
