//! The tree-walking evaluator.
//!
//! Walks the shared AST against a runtime [`Env`] chain. The root
//! environment carries the built-ins; every block, call, and match case
//! evaluates under a child frame. Errors propagate immediately via
//! `Result`; nothing is caught internally.

use std::rc::Rc;

use marl_common::span::Span;
use marl_parser::ast::{
    BinOp, Expr, ExprKind, LetGroup, MatchCase, PatternKind, Program, UnOp,
};

use crate::builtins::{self, dict_insert};
use crate::env::Env;
use crate::error::RuntimeError;
use crate::value::{format_number, Closure, Value};

/// Evaluate a whole program, returning the value of its last item
/// (`null` for an empty program).
///
/// The program is expected to have passed type inference; evaluation of
/// an unchecked program still behaves deterministically but may raise
/// the runtime errors inference would have prevented.
pub fn evaluate(program: &Program) -> Result<Value, RuntimeError> {
    let root = Env::root();
    builtins::install(&root);
    let mut result = Value::Null;
    for item in &program.items {
        result = eval_expr(&root, item)?;
    }
    Ok(result)
}

/// Evaluate one expression in the given environment.
pub fn eval_expr(env: &Env, expr: &Expr) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ExprKind::Number(n) => Ok(Value::Number(*n)),
        ExprKind::Str(s) => Ok(Value::str(s)),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::Null => Ok(Value::Null),
        ExprKind::Undefined => Ok(Value::Undefined),

        ExprKind::Ident(name) => match env.lookup(name) {
            Some(Value::Pending) => Err(RuntimeError::UninitializedBinding {
                name: name.clone(),
                span: expr.span,
            }),
            Some(value) => Ok(value),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.clone(),
                span: expr.span,
            }),
        },

        ExprKind::Array(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                items.push(eval_expr(env, element)?);
            }
            Ok(Value::array(items))
        }

        ExprKind::Dict(entry_exprs) => {
            let mut entries: Vec<(Value, Value)> = Vec::with_capacity(entry_exprs.len());
            for (key_expr, value_expr) in entry_exprs {
                let key = eval_expr(env, key_expr)?;
                let value = eval_expr(env, value_expr)?;
                // A repeated key keeps its position and takes the later
                // value.
                dict_insert(&mut entries, key, value);
            }
            Ok(Value::Dict(Rc::new(entries)))
        }

        ExprKind::Record(field_exprs) => {
            let mut fields = Vec::with_capacity(field_exprs.len());
            for (name, value_expr) in field_exprs {
                fields.push((name.clone(), eval_expr(env, value_expr)?));
            }
            Ok(Value::Record(Rc::new(fields)))
        }

        ExprKind::Member { object, field } => {
            let value = eval_expr(env, object)?;
            match value {
                Value::Record(fields) => fields
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| RuntimeError::MissingField {
                        field: field.clone(),
                        span: expr.span,
                    }),
                other => Err(RuntimeError::PropertyOnNonRecord {
                    kind: other.kind_name(),
                    field: field.clone(),
                    span: expr.span,
                }),
            }
        }

        ExprKind::Index { object, index } => {
            let container = eval_expr(env, object)?;
            let key = eval_expr(env, index)?;
            match container {
                Value::Array(items) => match key {
                    Value::Number(n) => {
                        if n < 0.0 || n.fract() != 0.0 || (n as usize) >= items.len() {
                            return Err(RuntimeError::IndexOutOfBounds {
                                index: n,
                                len: items.len(),
                                span: expr.span,
                            });
                        }
                        Ok(items[n as usize].clone())
                    }
                    other => Err(RuntimeError::IndexNotNumber {
                        kind: other.kind_name(),
                        span: index.span,
                    }),
                },
                Value::Dict(entries) => {
                    Ok(Value::dict_get(&entries, &key).cloned().unwrap_or(Value::Undefined))
                }
                other => Err(RuntimeError::NotIndexable {
                    kind: other.kind_name(),
                    span: expr.span,
                }),
            }
        }

        ExprKind::Func(func) => Ok(Value::Closure(Rc::new(Closure {
            func: func.clone(),
            env: env.clone(),
        }))),

        ExprKind::Call { callee, args } => {
            let callee_value = eval_expr(env, callee)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(eval_expr(env, arg)?);
            }
            call_value(&callee_value, arg_values, expr.span)
        }

        ExprKind::Binary { op, lhs, rhs } => eval_binary(env, *op, lhs, rhs, expr.span),

        ExprKind::Unary { op, operand } => {
            let value = eval_expr(env, operand)?;
            match op {
                UnOp::Neg => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(RuntimeError::TypeMismatch {
                        message: format!("unary `-` expects a number, found {}", other.kind_name()),
                        span: operand.span,
                    }),
                },
                UnOp::Not => Ok(Value::Bool(!value.truthy())),
            }
        }

        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if eval_expr(env, cond)?.truthy() {
                eval_expr(env, then_branch)
            } else {
                match else_branch {
                    Some(else_branch) => eval_expr(env, else_branch),
                    None => Ok(Value::Null),
                }
            }
        }

        ExprKind::Block { stmts, tail } => {
            let frame = env.child();
            for stmt in stmts {
                eval_expr(&frame, stmt)?;
            }
            eval_expr(&frame, tail)
        }

        ExprKind::Match { scrutinee, cases } => {
            let discriminant = eval_expr(env, scrutinee)?;
            eval_match(env, &discriminant, cases, expr.span)
        }

        ExprKind::Let(group) => eval_let_group(env, group),
    }
}

// ── Calls ──────────────────────────────────────────────────────────────

/// Invoke a callable value with evaluated arguments.
pub fn call_value(callee: &Value, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
    match callee {
        Value::Builtin(builtin) => {
            if args.len() != builtin.arity {
                return Err(RuntimeError::ArityMismatch {
                    expected: builtin.arity,
                    found: args.len(),
                    span,
                });
            }
            (builtin.run)(args, span)
        }
        Value::Closure(closure) => {
            let params = &closure.func.params;
            if args.len() != params.len() {
                return Err(RuntimeError::ArityMismatch {
                    expected: params.len(),
                    found: args.len(),
                    span,
                });
            }
            let frame = closure.env.child();
            for (param, arg) in params.iter().zip(args) {
                frame.define(param.name.clone(), arg);
            }
            eval_expr(&frame, &closure.func.body)
        }
        other => Err(RuntimeError::NotCallable {
            kind: other.kind_name(),
            span,
        }),
    }
}

// ── Operators ──────────────────────────────────────────────────────────

fn eval_binary(
    env: &Env,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
) -> Result<Value, RuntimeError> {
    // Short-circuit forms decide before touching the right operand.
    match op {
        BinOp::And => {
            if !eval_expr(env, lhs)?.truthy() {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(eval_expr(env, rhs)?.truthy()));
        }
        BinOp::Or => {
            if eval_expr(env, lhs)?.truthy() {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(eval_expr(env, rhs)?.truthy()));
        }
        _ => {}
    }

    let left = eval_expr(env, lhs)?;
    let right = eval_expr(env, rhs)?;

    match op {
        BinOp::Eq => Ok(Value::Bool(left.structural_eq(&right))),
        BinOp::NotEq => Ok(Value::Bool(!left.structural_eq(&right))),

        // `+` doubles as string concatenation when either side is a
        // string.
        BinOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::str(format!("{}{}", concat_text(&left), concat_text(&right))))
            }
            _ => Err(operand_error("+", &left, &right, span)),
        },

        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => match op {
                BinOp::Sub => Ok(Value::Number(a - b)),
                BinOp::Mul => Ok(Value::Number(a * b)),
                BinOp::Div => {
                    if *b == 0.0 {
                        Err(RuntimeError::DivisionByZero { span })
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                BinOp::Rem => Ok(Value::Number(a % b)),
                _ => unreachable!("arm covers arithmetic ops only"),
            },
            _ => Err(operand_error(op.symbol(), &left, &right, span)),
        },

        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(match op {
                BinOp::Lt => a < b,
                BinOp::LtEq => a <= b,
                BinOp::Gt => a > b,
                BinOp::GtEq => a >= b,
                _ => unreachable!("arm covers comparison ops only"),
            })),
            _ => Err(operand_error(op.symbol(), &left, &right, span)),
        },

        BinOp::And | BinOp::Or => unreachable!("short-circuit forms handled above"),
    }
}

fn operand_error(op: &str, left: &Value, right: &Value, span: Span) -> RuntimeError {
    RuntimeError::TypeMismatch {
        message: format!(
            "`{}` cannot be applied to {} and {}",
            op,
            left.kind_name(),
            right.kind_name()
        ),
        span,
    }
}

/// Text used by `+` concatenation: numbers render without a trailing
/// `.0`, everything else renders as its display form.
fn concat_text(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

// ── Match ──────────────────────────────────────────────────────────────

fn eval_match(
    env: &Env,
    discriminant: &Value,
    cases: &[MatchCase],
    span: Span,
) -> Result<Value, RuntimeError> {
    for case in cases {
        let frame = env.child();
        let matched = match &case.pattern.kind {
            PatternKind::Wildcard => true,
            PatternKind::Number(n) => discriminant.structural_eq(&Value::Number(*n)),
            PatternKind::Str(s) => discriminant.structural_eq(&Value::str(s)),
            PatternKind::Bool(b) => discriminant.structural_eq(&Value::Bool(*b)),
            PatternKind::Null => discriminant.structural_eq(&Value::Null),
            PatternKind::Ident(name) => {
                frame.define(name.clone(), discriminant.clone());
                true
            }
        };
        if !matched {
            continue;
        }
        if let Some(guard) = &case.guard {
            if !eval_expr(&frame, guard)?.truthy() {
                continue;
            }
        }
        return eval_expr(&frame, &case.body);
    }
    Err(RuntimeError::NoMatchingCase { span })
}

// ── Let groups ─────────────────────────────────────────────────────────

/// Evaluate a binding group.
///
/// Every name is pre-defined with the pending sentinel, then all
/// initializers evaluate under the extended frame, and finally the slots
/// are replaced with their values. Reading a pending slot raises; a
/// function-literal initializer succeeds because evaluating the literal
/// does not read its own name. This one mechanism covers simple and
/// mutual recursion.
fn eval_let_group(env: &Env, group: &LetGroup) -> Result<Value, RuntimeError> {
    for binding in &group.bindings {
        env.define(binding.name.clone(), Value::Pending);
    }
    let mut values = Vec::with_capacity(group.bindings.len());
    for binding in &group.bindings {
        values.push(eval_expr(env, &binding.init)?);
    }
    let mut last = Value::Null;
    for (binding, value) in group.bindings.iter().zip(values) {
        env.define(binding.name.clone(), value.clone());
        last = value;
    }
    Ok(last)
}
