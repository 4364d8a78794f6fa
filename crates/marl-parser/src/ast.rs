//! Abstract syntax tree for Marl.
//!
//! Expressions form a single closed sum ([`ExprKind`]); patterns and type
//! expressions are their own small sums. Every node carries the byte
//! [`Span`] of the source text it came from. The tree is immutable after
//! parsing and is shared by the type inferencer and the evaluator.
//!
//! Function-literal payloads live behind an [`Rc`] so that closures created
//! at runtime can share the parameter list and body with the tree instead
//! of cloning them.

use std::rc::Rc;

use marl_common::span::Span;

/// A parsed program: top-level items in source order.
///
/// Each item is an expression; `let` declarations are expressions too
/// (their value is the final binding's value).
#[derive(Debug, Clone)]
pub struct Program {
    pub items: Vec<Expr>,
}

/// An expression node: a kind plus the span it covers.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every expression form in the language.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Numeric literal, always double precision.
    Number(f64),
    /// String literal with escapes already decoded.
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    /// Name reference.
    Ident(String),
    /// `[e1, e2, ...]`
    Array(Vec<Expr>),
    /// `[k1: v1, k2: v2, ...]` -- entries in source order.
    Dict(Vec<(Expr, Expr)>),
    /// `{ name1: e1, name2: e2, ... }` -- fields in source order, names
    /// unique (the parser rejects duplicates).
    Record(Vec<(String, Expr)>),
    /// `object.field`
    Member { object: Box<Expr>, field: String },
    /// `container[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `(params) => body`, `(params): T => body`, or `param => body`.
    Func(Rc<FuncLit>),
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `lhs op rhs`
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `-operand` or `!operand`
    Unary { op: UnOp, operand: Box<Expr> },
    /// `if (cond) then_branch` with optional `else else_branch`.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// `{ stmt; stmt; tail }` -- statements are discarded (or bind, for
    /// let groups); the tail expression is the block's value.
    Block { stmts: Vec<Expr>, tail: Box<Expr> },
    /// `match scrutinee { case, case, ... }`
    Match {
        scrutinee: Box<Expr>,
        cases: Vec<MatchCase>,
    },
    /// `let a = e1 and b = e2 ...` -- one mutually recursive group.
    Let(LetGroup),
}

/// A function literal: parameters, optional return annotation, body.
#[derive(Debug)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Expr,
}

/// One function parameter with an optional type annotation.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub span: Span,
}

/// A `let` declaration: a non-empty group of bindings that are typed and
/// evaluated as a unit, so members may refer to each other.
#[derive(Debug, Clone)]
pub struct LetGroup {
    pub bindings: Vec<Binding>,
}

/// One binding inside a let group.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub init: Expr,
    pub span: Span,
}

/// One case of a match expression.
#[derive(Debug, Clone)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// A match pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

/// Pattern forms: literals compare structurally, identifiers bind, the
/// wildcard always matches.
#[derive(Debug, Clone)]
pub enum PatternKind {
    Wildcard,
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),
}

/// A surface type expression from an annotation.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

/// Type expression forms.
#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Number,
    Str,
    Bool,
    Null,
    Undefined,
    Unit,
    /// `[T]` or `Array<T>`
    Array(Box<TypeExpr>),
    /// `[K : V]` or `Dict<K, V>`
    Dict(Box<TypeExpr>, Box<TypeExpr>),
    /// `(T1, ..., Tn) => U`
    Func(Vec<TypeExpr>, Box<TypeExpr>),
    /// A named type variable.
    Name(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOp {
    /// Source text of the operator, for error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    /// Source text of the operator, for error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}
