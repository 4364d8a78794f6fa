//! End-to-end evaluator tests.
//!
//! `run` mirrors the real pipeline: parse, type-check, then evaluate.
//! `run_raw` skips the type checker for the runtime errors that a typed
//! program can never reach (operator misuse, missing fields on known
//! records, calling non-functions).

use marl_eval::{evaluate, RuntimeError, Value};

fn run(source: &str) -> Result<Value, RuntimeError> {
    let program = marl_parser::parse(source).expect("source should parse");
    marl_typeck::infer_and_solve(&program, None)
        .unwrap_or_else(|err| panic!("`{source}` should type-check, got: {err}"));
    evaluate(&program)
}

fn run_raw(source: &str) -> Result<Value, RuntimeError> {
    let program = marl_parser::parse(source).expect("source should parse");
    evaluate(&program)
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn s(text: &str) -> Value {
    Value::str(text)
}

// ── Whole-program scenarios ────────────────────────────────────────────

#[test]
fn scenario_add() {
    assert_eq!(run("let add = (x, y) => x + y; add(5, 10)"), Ok(num(15.0)));
}

#[test]
fn scenario_polymorphic_id() {
    assert_eq!(
        run("let id = (x) => x; let a = id(42); let b = id(\"hi\"); b"),
        Ok(s("hi"))
    );
}

#[test]
fn scenario_row_polymorphic_accessor() {
    assert_eq!(
        run("let getX = (p) => p.x; getX({ x: 1, y: 2 }); getX({ x: 3, y: 4, z: 5 })"),
        Ok(num(3.0))
    );
}

#[test]
fn scenario_mutual_recursion() {
    let source = "let even = (n) => if (n == 0) true else odd(n - 1) \
                  and odd = (n) => if (n == 0) false else even(n - 1); ";
    assert_eq!(run(&format!("{source} even(4)")), Ok(Value::Bool(true)));
    assert_eq!(run(&format!("{source} odd(7)")), Ok(Value::Bool(true)));
}

#[test]
fn scenario_match_with_guard() {
    let arms = "{ x if x < 0 => \"neg\", 0 => \"zero\", _ => \"pos\" }";
    assert_eq!(run(&format!("match 5 {arms}")), Ok(s("pos")));
    assert_eq!(run(&format!("match -1 {arms}")), Ok(s("neg")));
    assert_eq!(run(&format!("match 0 {arms}")), Ok(s("zero")));
}

#[test]
fn scenario_annotated_array() {
    assert_eq!(
        run("let nums: [number] = [1, 2, 3]; nums[0] + nums[1] + nums[2]"),
        Ok(num(6.0))
    );
}

// ── Determinism ────────────────────────────────────────────────────────

#[test]
fn evaluation_is_deterministic() {
    let source = "let xs = unique(concat([3, 1], [3, 2])); toString(xs)";
    assert_eq!(run(source), run(source));
    assert_eq!(run(source), Ok(s("[3, 1, 2]")));
}

// ── Closures and scoping ───────────────────────────────────────────────

#[test]
fn closures_capture_their_environment() {
    assert_eq!(
        run("let make = (n) => (m) => n + m; let add5 = make(5); add5(3)"),
        Ok(num(8.0))
    );
}

#[test]
fn block_scope_shadows_and_restores() {
    assert_eq!(
        run("let x = 1; let y = { let x = 2; x + 1 }; x + y"),
        Ok(num(4.0))
    );
}

#[test]
fn simple_recursion() {
    assert_eq!(
        run("let fact = (n) => if (n <= 1) 1 else n * fact(n - 1); fact(5)"),
        Ok(num(120.0))
    );
}

#[test]
fn let_group_value_is_last_binding() {
    assert_eq!(run("let x = 42"), Ok(num(42.0)));
    assert_eq!(run("let a = 1 and b = 2"), Ok(num(2.0)));
}

// ── Operators ──────────────────────────────────────────────────────────

#[test]
fn arithmetic() {
    assert_eq!(run("2 + 3 * 4"), Ok(num(14.0)));
    assert_eq!(run("10 % 3"), Ok(num(1.0)));
    assert_eq!(run("-(2 + 3)"), Ok(num(-5.0)));
}

#[test]
fn string_concatenation_with_plus() {
    // `+` concatenates when either operand is a string (dynamic-only
    // behavior; the type checker restricts `+` to numbers).
    assert_eq!(run_raw("\"a\" + 1"), Ok(s("a1")));
    assert_eq!(run_raw("1 + \"a\""), Ok(s("1a")));
    assert_eq!(run_raw("\"x\" + true"), Ok(s("xtrue")));
}

#[test]
fn division_by_zero() {
    assert_eq!(
        run("1 / 0"),
        Err(RuntimeError::DivisionByZero {
            span: marl_common::span::Span::new(0, 5)
        })
    );
}

#[test]
fn operator_operand_mismatch_is_a_runtime_error_untyped() {
    assert!(matches!(
        run_raw("true - 1"),
        Err(RuntimeError::TypeMismatch { .. })
    ));
    assert!(matches!(
        run_raw("\"a\" < \"b\""),
        Err(RuntimeError::TypeMismatch { .. })
    ));
}

#[test]
fn deep_structural_equality() {
    assert_eq!(run("[[1], [2, 3]] == [[1], [2, 3]]"), Ok(Value::Bool(true)));
    assert_eq!(run("[[1], [2, 3]] == [[1], [2, 4]]"), Ok(Value::Bool(false)));
    assert_eq!(
        run("{ x: 1, y: { z: 2 } } == { y: { z: 2 }, x: 1 }"),
        Ok(Value::Bool(true))
    );
    assert_eq!(run("\"a\" != \"b\""), Ok(Value::Bool(true)));
}

#[test]
fn logical_operators_short_circuit() {
    // The right operand would raise; short-circuiting must skip it.
    assert_eq!(run("false && (1 / 0 == 0)"), Ok(Value::Bool(false)));
    assert_eq!(run("true || (1 / 0 == 0)"), Ok(Value::Bool(true)));
    assert_eq!(run("true && false"), Ok(Value::Bool(false)));
}

#[test]
fn truthiness_of_not() {
    assert_eq!(run_raw("!0"), Ok(Value::Bool(true)));
    assert_eq!(run_raw("!\"\""), Ok(Value::Bool(true)));
    assert_eq!(run_raw("![]"), Ok(Value::Bool(false)));
    assert_eq!(run_raw("!null"), Ok(Value::Bool(true)));
}

// ── Conditionals ───────────────────────────────────────────────────────

#[test]
fn if_selects_branch() {
    assert_eq!(run("if (1 < 2) \"yes\" else \"no\""), Ok(s("yes")));
    assert_eq!(run("if (2 < 1) \"yes\" else \"no\""), Ok(s("no")));
}

#[test]
fn if_without_else_yields_null_when_falsy() {
    assert_eq!(run_raw("if (false) 1"), Ok(Value::Null));
}

// ── Containers ─────────────────────────────────────────────────────────

#[test]
fn array_indexing_and_bounds() {
    assert_eq!(run("[10, 20, 30][1]"), Ok(num(20.0)));
    assert!(matches!(
        run("[10, 20][5]"),
        Err(RuntimeError::IndexOutOfBounds { len: 2, .. })
    ));
    assert!(matches!(
        run_raw("[10][true]"),
        Err(RuntimeError::IndexNotNumber { .. })
    ));
    assert!(matches!(
        run_raw("5[0]"),
        Err(RuntimeError::NotIndexable { kind: "number", .. })
    ));
}

#[test]
fn dictionary_lookup_and_miss() {
    assert_eq!(run("[\"a\": 1, \"b\": 2][\"b\"]"), Ok(num(2.0)));
    assert_eq!(run("[\"a\": 1][\"missing\"]"), Ok(Value::Undefined));
}

#[test]
fn dictionary_keys_use_structural_equality() {
    // Number keys land through the array/dict split at inference only
    // when the container is a dictionary literal.
    assert_eq!(run_raw("[[1, 2]: \"pair\"][[1, 2]]"), Ok(s("pair")));
}

#[test]
fn record_member_access() {
    assert_eq!(run("{ x: 1, y: 2 }.y"), Ok(num(2.0)));
    assert!(matches!(
        run_raw("{ x: 1 }.z"),
        Err(RuntimeError::MissingField { .. })
    ));
    assert!(matches!(
        run_raw("null.x"),
        Err(RuntimeError::PropertyOnNonRecord { kind: "null", .. })
    ));
    assert!(matches!(
        run_raw("undefined.x"),
        Err(RuntimeError::PropertyOnNonRecord {
            kind: "undefined",
            ..
        })
    ));
    assert!(matches!(
        run_raw("(5).x"),
        Err(RuntimeError::PropertyOnNonRecord { kind: "number", .. })
    ));
}

// ── Calls ──────────────────────────────────────────────────────────────

#[test]
fn arity_mismatch_at_runtime() {
    assert!(matches!(
        run_raw("(x => x)(1, 2)"),
        Err(RuntimeError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        })
    ));
    assert!(matches!(
        run_raw("length([1], [2])"),
        Err(RuntimeError::ArityMismatch { .. })
    ));
}

#[test]
fn calling_a_non_function() {
    assert!(matches!(
        run_raw("5(1)"),
        Err(RuntimeError::NotCallable { kind: "number", .. })
    ));
}

// ── Match ──────────────────────────────────────────────────────────────

#[test]
fn match_selects_first_matching_case() {
    assert_eq!(
        run("match 1 { 1 => \"first\", 1 => \"second\", _ => \"other\" }"),
        Ok(s("first"))
    );
}

#[test]
fn match_guard_sees_pattern_binding() {
    assert_eq!(
        run("let classify = (n) => match n { x if x % 2 == 0 => \"even\", _ => \"odd\" }; \
             classify(10)"),
        Ok(s("even"))
    );
}

#[test]
fn match_without_matching_case() {
    assert!(matches!(
        run("match 5 { 0 => 1 }"),
        Err(RuntimeError::NoMatchingCase { .. })
    ));
}

#[test]
fn match_on_strings_and_null() {
    assert_eq!(
        run_raw("match \"b\" { \"a\" => 1, \"b\" => 2, _ => 3 }"),
        Ok(num(2.0))
    );
    assert_eq!(run_raw("match null { null => 1, _ => 2 }"), Ok(num(1.0)));
}

// ── Recursive bindings ─────────────────────────────────────────────────

#[test]
fn non_function_self_reference_is_uninitialized_read() {
    // Type inference admits this (record occurs-check exception); the
    // evaluator's pending sentinel rejects it.
    let err = run("let x = { self: x }").unwrap_err();
    let RuntimeError::UninitializedBinding { name, .. } = err else {
        panic!("expected UninitializedBinding");
    };
    assert_eq!(name, "x");
}

#[test]
fn group_members_are_simultaneous_not_sequential() {
    // Data reads of a group mate see the pending slot; only function
    // bodies (entered after binding) may refer to group mates.
    assert!(matches!(
        run("let a = 1, b = a + 1"),
        Err(RuntimeError::UninitializedBinding { .. })
    ));
    // A separate `let` sequences normally.
    assert_eq!(run("let a = 1; let b = a + 1; b"), Ok(num(2.0)));
}

// ── Built-ins through the pipeline ─────────────────────────────────────

#[test]
fn builtin_catalog_matches_type_schemes() {
    let runtime: Vec<&str> = marl_eval::builtins::BUILTINS.iter().map(|b| b.name).collect();
    assert_eq!(runtime, marl_typeck::builtins::BUILTIN_NAMES);
}

#[test]
fn builtins_compose() {
    assert_eq!(run("sum(range(1, 5))"), Ok(num(10.0)));
    assert_eq!(run("product([1, 2, 3, 4])"), Ok(num(24.0)));
    assert_eq!(run("length(tail([1, 2, 3]))"), Ok(num(2.0)));
    assert_eq!(run("head(flatten([[9], [8]]))"), Ok(num(9.0)));
    assert_eq!(run("strlen(substring(\"hello\", 0, 4))"), Ok(num(4.0)));
    assert_eq!(run("toString(3 + 4)"), Ok(s("7")));
    assert_eq!(run("toNumber(\"21\") * 2"), Ok(num(42.0)));
    assert_eq!(run("floor(sqrt(10))"), Ok(num(3.0)));
}

#[test]
fn builtin_dicts_compose() {
    assert_eq!(
        run("dictSize(dictMerge([\"a\": 1], [\"b\": 2]))"),
        Ok(num(2.0))
    );
    assert_eq!(
        run("dictHas(dictDelete([\"a\": 1], \"a\"), \"a\")"),
        Ok(Value::Bool(false))
    );
    assert_eq!(
        run("dictValues(dictSet([\"a\": 1], \"a\", 5))"),
        Ok(Value::array(vec![num(5.0)]))
    );
    assert_eq!(
        run("dictKeys(dictFromEntries(dictEntries([\"x\": 1, \"y\": 2])))"),
        Ok(Value::array(vec![s("x"), s("y")]))
    );
}

#[test]
fn builtin_zip_makes_pair_records() {
    assert_eq!(
        run("head(zip([1, 2], [\"a\", \"b\"])).second"),
        Ok(s("a"))
    );
}

#[test]
fn builtin_shape_check_raises() {
    assert!(matches!(
        run_raw("length(5)"),
        Err(RuntimeError::TypeMismatch { .. })
    ));
    assert!(matches!(
        run_raw("head(5)"),
        Err(RuntimeError::TypeMismatch { .. })
    ));
}

#[test]
fn head_of_empty_array() {
    // Bounds-style failures stay possible in typed programs.
    assert!(matches!(
        run("head([])"),
        Err(RuntimeError::IndexOutOfBounds { .. })
    ));
}

// ── Soundness smoke test ───────────────────────────────────────────────

#[test]
fn typed_programs_avoid_type_tagged_runtime_errors() {
    // Every program here passes inference; none may raise an operator,
    // call, field, or arity error at runtime.
    let sources = [
        "let twice = (f, x) => f(f(x)); twice((n) => n + 1, 0)",
        "let pick = (p) => if (p.score > 0) p.name else \"anon\"; \
         pick({ name: \"ada\", score: 3, extra: true })",
        "let fib = (n) => if (n < 2) n else fib(n - 1) + fib(n - 2); fib(10)",
        "match head([{ tag: 1 }]) { r if r.tag == 1 => \"one\", _ => \"other\" }",
        "sum([1, 2]) + dictSize([\"k\": true]) + strlen(toString(12))",
    ];
    for source in sources {
        match run(source) {
            Ok(_) => {}
            Err(err) => match err {
                RuntimeError::TypeMismatch { .. }
                | RuntimeError::NotCallable { .. }
                | RuntimeError::ArityMismatch { .. }
                | RuntimeError::MissingField { .. }
                | RuntimeError::PropertyOnNonRecord { .. } => {
                    panic!("typed program `{source}` raised a type-tagged error: {err}")
                }
                other => panic!("unexpected runtime error for `{source}`: {other}"),
            },
        }
    }
}
