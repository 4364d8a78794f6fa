//! Runtime values.
//!
//! Values are cheap to clone: compound payloads sit behind `Rc`. The
//! language is pure (built-ins allocate new containers instead of
//! mutating), so no interior mutability is needed at the value level.
//!
//! # Sentinel semantics
//!
//! [`Value::Pending`] is an internal marker used only while a `let`
//! group's slots are being initialized: every name in the group is
//! pre-defined as `Pending`, and reading a `Pending` slot raises the
//! "referenced before initialization" runtime error. Function literals
//! tolerate their own name being pending because evaluating the literal
//! does not read it. `Pending` never escapes a completed evaluation.

use std::fmt;
use std::rc::Rc;

use marl_common::span::Span;
use marl_parser::ast::FuncLit;

use crate::env::Env;
use crate::error::RuntimeError;

/// A Marl runtime value.
#[derive(Clone)]
pub enum Value {
    /// Double-precision number.
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    /// Ordered sequence.
    Array(Rc<Vec<Value>>),
    /// Insertion-ordered mapping with structural-equality keys.
    Dict(Rc<Vec<(Value, Value)>>),
    /// Insertion-ordered record fields.
    Record(Rc<Vec<(String, Value)>>),
    /// A function literal paired with its captured environment.
    Closure(Rc<Closure>),
    /// A native built-in function.
    Builtin(&'static Builtin),
    /// Internal recursive-binding sentinel; see the module docs.
    Pending,
}

/// A closure: the function literal's AST and the lexical environment
/// present at the moment the literal was evaluated.
pub struct Closure {
    pub func: Rc<FuncLit>,
    pub env: Env,
}

/// A built-in function: a name, an arity hint checked at the call site,
/// and the native implementation.
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub run: BuiltinFn,
}

/// Native implementations receive the evaluated arguments and the call
/// span (for error locations) and perform their own shape checks.
pub type BuiltinFn = fn(Vec<Value>, Span) -> Result<Value, RuntimeError>;

impl Value {
    /// Construct a string value.
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Construct an array value.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }

    /// The value-kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Array(_) => "array",
            Value::Dict(_) => "dictionary",
            Value::Record(_) => "record",
            Value::Closure(_) | Value::Builtin(_) => "function",
            Value::Pending => "uninitialized",
        }
    }

    /// Truthiness: null/undefined are falsy, booleans are themselves,
    /// numbers are truthy iff non-zero, strings iff non-empty, and every
    /// container or function is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Dict(_)
            | Value::Record(_)
            | Value::Closure(_)
            | Value::Builtin(_) => true,
            Value::Pending => false,
        }
    }

    /// Deep structural equality.
    ///
    /// Arrays compare element-wise, records compare field-set-wise,
    /// dictionaries compare entry-set-wise (insertion order does not
    /// matter). Functions compare by identity.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Record(a), Value::Record(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(name, x)| {
                        b.iter()
                            .find(|(other_name, _)| other_name == name)
                            .is_some_and(|(_, y)| x.structural_eq(y))
                    })
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, x)| {
                        b.iter()
                            .find(|(other_key, _)| other_key.structural_eq(key))
                            .is_some_and(|(_, y)| x.structural_eq(y))
                    })
            }
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// Dictionary lookup by structural key equality.
    pub fn dict_get<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
        entries
            .iter()
            .find(|(k, _)| k.structural_eq(key))
            .map(|(_, v)| v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

// ── Display ────────────────────────────────────────────────────────────

/// Format a number the way the language shows it: integral finite
/// doubles print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    /// Top-level rendering: strings print raw; inside containers they
    /// print quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            other => write!(f, "{}", quoted(other)),
        }
    }
}

/// Rendering used inside containers (strings quoted).
fn quoted(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Str(s) => format!("{:?}", s),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(quoted).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Dict(entries) => {
            if entries.is_empty() {
                return "[:]".to_string();
            }
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", quoted(k), quoted(v)))
                .collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Record(fields) => {
            if fields.is_empty() {
                return "{}".to_string();
            }
            let inner: Vec<String> = fields
                .iter()
                .map(|(n, v)| format!("{}: {}", n, quoted(v)))
                .collect();
            format!("{{ {} }}", inner.join(", "))
        }
        Value::Closure(_) => "<function>".to_string(),
        Value::Builtin(b) => format!("<builtin {}>", b.name),
        Value::Pending => "<uninitialized>".to_string(),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug matches the container rendering (strings quoted) so test
        // failures print unambiguously. Closure environments are not
        // walked; they may be cyclic.
        write!(f, "{}", quoted(self))
    }
}
