//! Type environment.
//!
//! Maps names to type schemes with lexical scoping. Rather than a stack
//! of per-scope tables, the environment is one flat list of bindings
//! plus a stack of scope marks: entering a scope records the list
//! length, leaving truncates back to it, and lookup scans newest-first,
//! so shadowing falls out of the ordering. Binding counts in Marl
//! programs are small enough that the linear scan is never the cost that
//! matters; what the inferencer leans on is cheap whole-environment
//! traversal for free-variable queries and substitution, which the flat
//! list gives directly.

use crate::subst::{free_scheme_vars, FreeVars, Subst};
use crate::ty::Scheme;

/// A lexically scoped name-to-scheme map.
#[derive(Clone, Debug)]
pub struct TypeEnv {
    /// All live bindings, oldest first. Later entries shadow earlier
    /// ones with the same name.
    bindings: Vec<(String, Scheme)>,
    /// For each open scope, the binding count at its entry.
    marks: Vec<usize>,
}

impl TypeEnv {
    /// An empty environment with no open scopes.
    pub fn new() -> Self {
        TypeEnv {
            bindings: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Open a scope: bindings added after this call disappear again at
    /// the matching [`exit_scope`](Self::exit_scope).
    pub fn enter_scope(&mut self) {
        self.marks.push(self.bindings.len());
    }

    /// Close the innermost scope, dropping every binding made inside it.
    ///
    /// # Panics
    ///
    /// Panics when no scope is open.
    pub fn exit_scope(&mut self) {
        let mark = self
            .marks
            .pop()
            .expect("exit_scope without a matching enter_scope");
        self.bindings.truncate(mark);
    }

    /// Bind a name in the innermost open scope (or at the top level when
    /// none is open). Rebinding a name shadows the earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.bindings.push((name.into(), scheme));
    }

    /// Find the newest binding for a name.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, scheme)| scheme)
    }

    /// Free type- and row-variable ids across every scheme in scope.
    ///
    /// Generalization quantifies exactly the variables free in a type but
    /// not free in the environment; this is the "not free in the
    /// environment" half. Shadowed entries still count: they stay live
    /// until their scope closes.
    pub fn free_vars(&self) -> FreeVars {
        let mut out = FreeVars::default();
        for (_, scheme) in &self.bindings {
            out.extend(free_scheme_vars(scheme));
        }
        out
    }

    /// Apply a substitution to every scheme in scope.
    pub fn apply_subst(&mut self, subst: &Subst) {
        for (_, scheme) in &mut self.bindings {
            *scheme = subst.apply_scheme(scheme);
        }
    }

    /// The largest type- and row-variable ids mentioned anywhere in the
    /// environment, as a `(type, row)` pair of exclusive upper bounds.
    /// Used to keep a fresh-variable counter clear of a caller-provided
    /// environment.
    pub fn var_id_bounds(&self) -> (u32, u32) {
        let free = self.free_vars();
        let ty_bound = free.types.iter().map(|id| id + 1).max().unwrap_or(0);
        let row_bound = free.rows.iter().map(|id| id + 1).max().unwrap_or(0);
        (ty_bound, row_bound)
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
