//! Native built-in implementations.
//!
//! The runtime half of the built-in registry; the type schemes live in
//! the type checker crate, and both catalogs match name for name. Every
//! implementation is pure: containers are copied, never mutated in
//! place. Shape checks raise [`RuntimeError::TypeMismatch`] with the
//! built-in's name in the message.

use std::rc::Rc;

use marl_common::span::Span;

use crate::env::Env;
use crate::error::RuntimeError;
use crate::value::{Builtin, Value};

/// The built-in registry, in catalog order.
pub static BUILTINS: &[Builtin] = &[
    Builtin { name: "length", arity: 1, run: rt_length },
    Builtin { name: "head", arity: 1, run: rt_head },
    Builtin { name: "tail", arity: 1, run: rt_tail },
    Builtin { name: "push", arity: 2, run: rt_push },
    Builtin { name: "empty", arity: 1, run: rt_empty },
    Builtin { name: "range", arity: 2, run: rt_range },
    Builtin { name: "sum", arity: 1, run: rt_sum },
    Builtin { name: "product", arity: 1, run: rt_product },
    Builtin { name: "flatten", arity: 1, run: rt_flatten },
    Builtin { name: "unique", arity: 1, run: rt_unique },
    Builtin { name: "chunk", arity: 2, run: rt_chunk },
    Builtin { name: "zip", arity: 2, run: rt_zip },
    Builtin { name: "concat", arity: 2, run: rt_concat },
    Builtin { name: "substring", arity: 3, run: rt_substring },
    Builtin { name: "strlen", arity: 1, run: rt_strlen },
    Builtin { name: "sqrt", arity: 1, run: rt_sqrt },
    Builtin { name: "abs", arity: 1, run: rt_abs },
    Builtin { name: "floor", arity: 1, run: rt_floor },
    Builtin { name: "ceil", arity: 1, run: rt_ceil },
    Builtin { name: "toString", arity: 1, run: rt_to_string },
    Builtin { name: "toNumber", arity: 1, run: rt_to_number },
    Builtin { name: "dictKeys", arity: 1, run: rt_dict_keys },
    Builtin { name: "dictValues", arity: 1, run: rt_dict_values },
    Builtin { name: "dictEntries", arity: 1, run: rt_dict_entries },
    Builtin { name: "dictFromEntries", arity: 1, run: rt_dict_from_entries },
    Builtin { name: "dictMerge", arity: 2, run: rt_dict_merge },
    Builtin { name: "dictHas", arity: 2, run: rt_dict_has },
    Builtin { name: "dictSet", arity: 3, run: rt_dict_set },
    Builtin { name: "dictDelete", arity: 2, run: rt_dict_delete },
    Builtin { name: "dictSize", arity: 1, run: rt_dict_size },
];

/// Define every built-in in the given (root) environment.
pub fn install(env: &Env) {
    for builtin in BUILTINS {
        env.define(builtin.name, Value::Builtin(builtin));
    }
}

/// Insert into a dictionary entry list: replace the value in place when
/// the key is already present (keeping its position), append otherwise.
pub(crate) fn dict_insert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| k.structural_eq(&key)) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

// ── Shape-check helpers ────────────────────────────────────────────────

fn shape_error(builtin: &str, expected: &str, found: &Value, span: Span) -> RuntimeError {
    RuntimeError::TypeMismatch {
        message: format!(
            "`{}` expects {}, found {}",
            builtin,
            expected,
            found.kind_name()
        ),
        span,
    }
}

fn as_array(value: &Value, builtin: &str, span: Span) -> Result<Rc<Vec<Value>>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(shape_error(builtin, "an array", other, span)),
    }
}

fn as_dict(
    value: &Value,
    builtin: &str,
    span: Span,
) -> Result<Rc<Vec<(Value, Value)>>, RuntimeError> {
    match value {
        Value::Dict(entries) => Ok(entries.clone()),
        other => Err(shape_error(builtin, "a dictionary", other, span)),
    }
}

fn as_number(value: &Value, builtin: &str, span: Span) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(shape_error(builtin, "a number", other, span)),
    }
}

fn as_string(value: &Value, builtin: &str, span: Span) -> Result<Rc<str>, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(shape_error(builtin, "a string", other, span)),
    }
}

// ── Arrays ─────────────────────────────────────────────────────────────

fn rt_length(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "length", span)?;
    Ok(Value::Number(items.len() as f64))
}

fn rt_head(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "head", span)?;
    items
        .first()
        .cloned()
        .ok_or(RuntimeError::IndexOutOfBounds {
            index: 0.0,
            len: 0,
            span,
        })
}

fn rt_tail(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "tail", span)?;
    let rest = items.iter().skip(1).cloned().collect();
    Ok(Value::array(rest))
}

fn rt_push(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "push", span)?;
    let mut out = items.as_ref().clone();
    out.push(args[1].clone());
    Ok(Value::array(out))
}

fn rt_empty(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "empty", span)?;
    Ok(Value::Bool(items.is_empty()))
}

fn rt_range(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let start = as_number(&args[0], "range", span)?;
    let end = as_number(&args[1], "range", span)?;
    let mut items = Vec::new();
    let mut i = start;
    while i < end {
        items.push(Value::Number(i));
        i += 1.0;
    }
    Ok(Value::array(items))
}

fn rt_sum(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "sum", span)?;
    let mut total = 0.0;
    for item in items.iter() {
        total += as_number(item, "sum", span)?;
    }
    Ok(Value::Number(total))
}

fn rt_product(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "product", span)?;
    let mut total = 1.0;
    for item in items.iter() {
        total *= as_number(item, "product", span)?;
    }
    Ok(Value::Number(total))
}

fn rt_flatten(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let outer = as_array(&args[0], "flatten", span)?;
    let mut items = Vec::new();
    for inner in outer.iter() {
        let inner = as_array(inner, "flatten", span)?;
        items.extend(inner.iter().cloned());
    }
    Ok(Value::array(items))
}

fn rt_unique(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "unique", span)?;
    let mut out: Vec<Value> = Vec::new();
    for item in items.iter() {
        if !out.iter().any(|seen| seen.structural_eq(item)) {
            out.push(item.clone());
        }
    }
    Ok(Value::array(out))
}

fn rt_chunk(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "chunk", span)?;
    let size = as_number(&args[1], "chunk", span)?;
    if size < 1.0 || size.fract() != 0.0 {
        return Err(RuntimeError::TypeMismatch {
            message: format!("`chunk` size must be a positive integer, got {}", size),
            span,
        });
    }
    let chunks = items
        .chunks(size as usize)
        .map(|chunk| Value::array(chunk.to_vec()))
        .collect();
    Ok(Value::array(chunks))
}

fn rt_zip(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let left = as_array(&args[0], "zip", span)?;
    let right = as_array(&args[1], "zip", span)?;
    let pairs = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| {
            Value::Record(Rc::new(vec![
                ("first".to_string(), a.clone()),
                ("second".to_string(), b.clone()),
            ]))
        })
        .collect();
    Ok(Value::array(pairs))
}

fn rt_concat(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let left = as_array(&args[0], "concat", span)?;
    let right = as_array(&args[1], "concat", span)?;
    let mut out = left.as_ref().clone();
    out.extend(right.iter().cloned());
    Ok(Value::array(out))
}

// ── Strings ────────────────────────────────────────────────────────────

fn rt_substring(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let s = as_string(&args[0], "substring", span)?;
    let start = as_number(&args[1], "substring", span)?;
    let end = as_number(&args[2], "substring", span)?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let start = (start.max(0.0) as usize).min(len);
    let end = (end.max(0.0) as usize).clamp(start, len);
    Ok(Value::str(chars[start..end].iter().collect::<String>()))
}

fn rt_strlen(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let s = as_string(&args[0], "strlen", span)?;
    Ok(Value::Number(s.chars().count() as f64))
}

// ── Numbers ────────────────────────────────────────────────────────────

fn rt_sqrt(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_number(&args[0], "sqrt", span)?.sqrt()))
}

fn rt_abs(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_number(&args[0], "abs", span)?.abs()))
}

fn rt_floor(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_number(&args[0], "floor", span)?.floor()))
}

fn rt_ceil(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_number(&args[0], "ceil", span)?.ceil()))
}

// ── Conversions ────────────────────────────────────────────────────────

fn rt_to_string(args: Vec<Value>, _span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::str(args[0].to_string()))
}

fn rt_to_number(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let s = as_string(&args[0], "toNumber", span)?;
    let parsed = s.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    match parsed {
        Some(n) => Ok(Value::Number(n)),
        None => Err(RuntimeError::TypeMismatch {
            message: format!("`toNumber` cannot convert {:?} to a number", s.as_ref()),
            span,
        }),
    }
}

// ── Dictionaries ───────────────────────────────────────────────────────

fn rt_dict_keys(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictKeys", span)?;
    Ok(Value::array(entries.iter().map(|(k, _)| k.clone()).collect()))
}

fn rt_dict_values(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictValues", span)?;
    Ok(Value::array(entries.iter().map(|(_, v)| v.clone()).collect()))
}

fn rt_dict_entries(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictEntries", span)?;
    let records = entries
        .iter()
        .map(|(k, v)| {
            Value::Record(Rc::new(vec![
                ("key".to_string(), k.clone()),
                ("value".to_string(), v.clone()),
            ]))
        })
        .collect();
    Ok(Value::array(records))
}

fn rt_dict_from_entries(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let items = as_array(&args[0], "dictFromEntries", span)?;
    let mut entries: Vec<(Value, Value)> = Vec::new();
    for item in items.iter() {
        let Value::Record(fields) = item else {
            return Err(shape_error(
                "dictFromEntries",
                "an array of { key, value } records",
                item,
                span,
            ));
        };
        let key = fields.iter().find(|(n, _)| n == "key").map(|(_, v)| v);
        let value = fields.iter().find(|(n, _)| n == "value").map(|(_, v)| v);
        let (Some(key), Some(value)) = (key, value) else {
            return Err(shape_error(
                "dictFromEntries",
                "an array of { key, value } records",
                item,
                span,
            ));
        };
        dict_insert(&mut entries, key.clone(), value.clone());
    }
    Ok(Value::Dict(Rc::new(entries)))
}

fn rt_dict_merge(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let left = as_dict(&args[0], "dictMerge", span)?;
    let right = as_dict(&args[1], "dictMerge", span)?;
    let mut entries = left.as_ref().clone();
    for (k, v) in right.iter() {
        dict_insert(&mut entries, k.clone(), v.clone());
    }
    Ok(Value::Dict(Rc::new(entries)))
}

fn rt_dict_has(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictHas", span)?;
    Ok(Value::Bool(Value::dict_get(&entries, &args[1]).is_some()))
}

fn rt_dict_set(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictSet", span)?;
    let mut out = entries.as_ref().clone();
    dict_insert(&mut out, args[1].clone(), args[2].clone());
    Ok(Value::Dict(Rc::new(out)))
}

fn rt_dict_delete(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictDelete", span)?;
    let out = entries
        .iter()
        .filter(|(k, _)| !k.structural_eq(&args[1]))
        .cloned()
        .collect();
    Ok(Value::Dict(Rc::new(out)))
}

fn rt_dict_size(args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    let entries = as_dict(&args[0], "dictSize", span)?;
    Ok(Value::Number(entries.len() as f64))
}
