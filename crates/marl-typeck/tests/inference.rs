//! Integration tests for the Marl type inference engine.
//!
//! These tests parse Marl source, run `infer_and_solve`, and assert on
//! the resulting environment schemes and on single-expression queries via
//! `infer_expression`. They exercise let-polymorphism, mutual recursion,
//! row-polymorphic records, directional subtyping, the structural join at
//! conditionals, the occurs check (and its record exception), and error
//! detection.

use marl_typeck::error::TypeError;
use marl_typeck::{base_env, infer_and_solve, infer_expression, TypeEnv};

// ── Helpers ────────────────────────────────────────────────────────────

/// Parse and type-check a whole program.
fn check(source: &str) -> Result<TypeEnv, TypeError> {
    let program = marl_parser::parse(source).expect("source should parse");
    infer_and_solve(&program, None)
}

/// Parse and type-check, expecting success.
fn check_ok(source: &str) -> TypeEnv {
    match check(source) {
        Ok(env) => env,
        Err(err) => panic!("expected `{source}` to type-check, got: {err}"),
    }
}

/// The display string of a top-level binding's scheme.
fn scheme_of(env: &TypeEnv, name: &str) -> String {
    env.lookup(name)
        .unwrap_or_else(|| panic!("`{name}` should be bound"))
        .to_string()
}

/// Type of a single expression against the builtin environment.
fn type_of(source: &str) -> Result<String, TypeError> {
    let expr = marl_parser::parse_expression(source).expect("source should parse");
    infer_expression(&expr, &base_env()).map(|ty| ty.to_string())
}

// ── Literals and operators ─────────────────────────────────────────────

#[test]
fn literal_types() {
    assert_eq!(type_of("42").unwrap(), "number");
    assert_eq!(type_of("\"hi\"").unwrap(), "string");
    assert_eq!(type_of("true").unwrap(), "boolean");
    assert_eq!(type_of("null").unwrap(), "null");
    assert_eq!(type_of("undefined").unwrap(), "undefined");
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(type_of("1 + 2 * 3").unwrap(), "number");
    assert_eq!(type_of("1 < 2").unwrap(), "boolean");
    assert_eq!(type_of("1 == 2").unwrap(), "boolean");
    assert_eq!(type_of("true && false || true").unwrap(), "boolean");
    assert_eq!(type_of("-(1 + 2)").unwrap(), "number");
    assert_eq!(type_of("!true").unwrap(), "boolean");
}

#[test]
fn operator_type_errors() {
    assert!(matches!(
        type_of("1 + \"a\"").unwrap_err(),
        TypeError::Mismatch { .. }
    ));
    assert!(matches!(
        type_of("1 && true").unwrap_err(),
        TypeError::Mismatch { .. }
    ));
    assert!(matches!(
        type_of("1 == \"a\"").unwrap_err(),
        TypeError::Mismatch { .. }
    ));
    assert!(matches!(
        type_of("-\"a\"").unwrap_err(),
        TypeError::Mismatch { .. }
    ));
}

// ── Functions and application ──────────────────────────────────────────

#[test]
fn add_function_scheme() {
    let env = check_ok("let add = (x, y) => x + y; add(5, 10)");
    assert_eq!(scheme_of(&env, "add"), "(number, number) => number");
}

#[test]
fn let_polymorphism() {
    let env = check_ok("let id = (x) => x; let a = id(42); let b = id(\"hi\"); b");
    assert_eq!(scheme_of(&env, "id"), "(t0) => t0");
    assert_eq!(scheme_of(&env, "a"), "number");
    assert_eq!(scheme_of(&env, "b"), "string");
}

#[test]
fn call_arity_mismatch() {
    let err = check("let f = (x) => x; f(1, 2)").unwrap_err();
    assert!(matches!(
        err,
        TypeError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

#[test]
fn occurs_check_rejects_self_application() {
    let err = check("let f = (g) => g(g)").unwrap_err();
    assert!(matches!(err, TypeError::InfiniteType { .. }));
}

#[test]
fn undefined_identifier() {
    let err = check("nope + 1").unwrap_err();
    let TypeError::UndefinedVariable { name, .. } = err else {
        panic!("expected UndefinedVariable");
    };
    assert_eq!(name, "nope");
}

#[test]
fn higher_order_annotation_with_type_variables() {
    let env = check_ok("let apply: ((a) => b, a) => b = (f, x) => f(x)");
    assert_eq!(scheme_of(&env, "apply"), "((t0) => t1, t0) => t1");
}

#[test]
fn return_annotation_constrains_body() {
    let err = check("let f = (x: number): string => x + 1").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

// ── Mutual recursion ───────────────────────────────────────────────────

#[test]
fn mutually_recursive_group() {
    let env = check_ok(
        "let even = (n) => if (n == 0) true else odd(n - 1) \
         and odd = (n) => if (n == 0) false else even(n - 1); \
         even(4)",
    );
    assert_eq!(scheme_of(&env, "even"), "(number) => boolean");
    assert_eq!(scheme_of(&env, "odd"), "(number) => boolean");
}

#[test]
fn simple_recursion() {
    let env = check_ok("let fact = (n) => if (n == 0) 1 else n * fact(n - 1)");
    assert_eq!(scheme_of(&env, "fact"), "(number) => number");
}

#[test]
fn separate_lets_do_not_see_later_bindings() {
    // `odd` is not in scope inside `even` when the groups are separate.
    let err = check("let even = (n) => odd(n); let odd = (n) => even(n)").unwrap_err();
    assert!(matches!(err, TypeError::UndefinedVariable { .. }));
}

// ── Records and row polymorphism ───────────────────────────────────────

#[test]
fn record_literal_is_closed() {
    assert_eq!(
        type_of("{ x: 1, y: \"a\" }").unwrap(),
        "{ x: number, y: string }"
    );
}

#[test]
fn member_access_on_literal() {
    assert_eq!(type_of("{ x: 1, y: 2 }.x").unwrap(), "number");
    let err = type_of("{ x: 1 }.z").unwrap_err();
    assert!(matches!(err, TypeError::NoSuchField { .. }));
}

#[test]
fn row_polymorphic_accessor_accepts_wider_records() {
    let env = check_ok(
        "let getX = (p) => p.x; \
         let a = getX({ x: 1, y: 2 }); \
         let b = getX({ x: 3, y: 4, z: 5 }); b",
    );
    assert_eq!(scheme_of(&env, "a"), "number");
    assert_eq!(scheme_of(&env, "b"), "number");
}

#[test]
fn width_subtyping_at_call_site() {
    // (R2) => T accepts R1 when R1's fields are a superset of R2's.
    let env = check_ok("let sumXY = (p) => p.x + p.y; sumXY({ x: 1, y: 2, z: 3 })");
    assert!(scheme_of(&env, "sumXY").contains("=> number"));
}

#[test]
fn missing_field_at_call_site() {
    let err = check("let getX = (p) => p.x; getX({ y: 2 })").unwrap_err();
    let TypeError::MissingFields { fields, .. } = err else {
        panic!("expected MissingFields");
    };
    assert_eq!(fields, vec!["x".to_string()]);
}

#[test]
fn member_access_on_non_record() {
    let err = type_of("(5).x").unwrap_err();
    assert!(matches!(err, TypeError::NoSuchField { .. }));
}

#[test]
fn self_referential_record_type_checks() {
    // Evaluation rejects this (uninitialized read); inference admits it
    // through the record-case occurs exception.
    assert!(check("let x = { self: x }").is_ok());
}

// ── Conditionals and the structural join ───────────────────────────────

#[test]
fn condition_must_be_boolean() {
    let err = type_of("if (1) 2 else 3").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn if_without_else_is_unit() {
    // The then branch must then be unit, which `1` is not.
    let err = type_of("if (true) 1").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn branch_types_must_agree() {
    let err = type_of("if (true) 1 else \"a\"").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn structural_join_keeps_common_fields() {
    assert_eq!(
        type_of("if (true) { x: 1, y: 2 } else { x: 3, z: 4 }").unwrap(),
        "{ x: number }"
    );
}

#[test]
fn structural_join_recurses_into_nested_records() {
    assert_eq!(
        type_of(
            "if (true) { p: { x: 1, y: 2 }, q: 1 } else { p: { x: 3, z: 4 }, r: 2 }"
        )
        .unwrap(),
        "{ p: { x: number } }"
    );
}

#[test]
fn structural_join_constrains_common_field_types() {
    let err = type_of("if (true) { x: 1 } else { x: \"a\" }").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn disjoint_records_fall_back_to_equality() {
    let err = type_of("if (true) { x: 1 } else { y: 2 }").unwrap_err();
    assert!(matches!(err, TypeError::MissingFields { .. }));
}

// ── Arrays, dictionaries, indexing ─────────────────────────────────────

#[test]
fn array_literals() {
    assert_eq!(type_of("[1, 2, 3]").unwrap(), "[number]");
    let err = type_of("[1, \"a\"]").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn empty_array_generalizes() {
    let env = check_ok("let xs = []");
    assert_eq!(scheme_of(&env, "xs"), "[t0]");
}

#[test]
fn dict_literals() {
    assert_eq!(type_of("[\"a\": 1, \"b\": 2]").unwrap(), "[string : number]");
    let err = type_of("[\"a\": 1, \"b\": \"c\"]").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn array_indexing() {
    assert_eq!(type_of("[1, 2, 3][0]").unwrap(), "number");
    let err = type_of("[1, 2, 3][true]").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn dict_indexing_by_string_literal() {
    assert_eq!(type_of("[\"a\": 1][\"a\"]").unwrap(), "number");
}

#[test]
fn annotated_array_binding() {
    let env = check_ok("let nums: [number] = [1, 2, 3]; nums[0] + nums[1] + nums[2]");
    assert_eq!(scheme_of(&env, "nums"), "[number]");

    let err = check("let nums: Array<string> = [1, 2, 3]").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn bare_generic_name_is_unknown_type() {
    let err = check("let xs: Array = []").unwrap_err();
    let TypeError::UnknownTypeExpr { name, .. } = err else {
        panic!("expected UnknownTypeExpr");
    };
    assert_eq!(name, "Array");
}

// ── Match expressions ──────────────────────────────────────────────────

#[test]
fn match_case_bodies_share_a_type() {
    assert_eq!(
        type_of("match 5 { x if x < 0 => \"neg\", 0 => \"zero\", _ => \"pos\" }").unwrap(),
        "string"
    );
    let err = type_of("match 5 { 0 => 1, _ => \"a\" }").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn match_guard_must_be_boolean() {
    let err = type_of("match 5 { x if x + 1 => 1, _ => 2 }").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn match_binding_is_usable_in_guard_and_body() {
    assert_eq!(type_of("match 5 { x if x > 0 => x, _ => 0 }").unwrap(), "number");
}

// ── Blocks and scoping ─────────────────────────────────────────────────

#[test]
fn block_type_is_tail_type() {
    assert_eq!(type_of("{ let y = 1; y + 1 }").unwrap(), "number");
}

#[test]
fn block_bindings_do_not_escape() {
    let err = check("let x = { let y = 1; y + 1 }; y").unwrap_err();
    assert!(matches!(err, TypeError::UndefinedVariable { .. }));
}

#[test]
fn parameter_shadowing() {
    let env = check_ok("let x = 1; let f = (x) => x; let s = f(\"a\"); s");
    assert_eq!(scheme_of(&env, "x"), "number");
    assert_eq!(scheme_of(&env, "s"), "string");
}

// ── Built-ins ──────────────────────────────────────────────────────────

#[test]
fn builtin_array_schemes() {
    assert_eq!(type_of("length([1, 2])").unwrap(), "number");
    assert_eq!(type_of("head([1, 2])").unwrap(), "number");
    assert_eq!(type_of("tail([\"a\"])").unwrap(), "[string]");
    assert_eq!(type_of("push([1], 2)").unwrap(), "[number]");
    assert_eq!(type_of("sum(range(0, 10))").unwrap(), "number");
    assert_eq!(type_of("flatten([[1], [2]])").unwrap(), "[number]");
    assert_eq!(type_of("chunk([1, 2, 3], 2)").unwrap(), "[[number]]");

    let err = type_of("push([1], \"a\")").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn builtin_zip_produces_pair_records() {
    assert_eq!(
        type_of("zip([1, 2], [\"a\", \"b\"])").unwrap(),
        "[{ first: number, second: string }]"
    );
}

#[test]
fn builtin_dict_schemes() {
    assert_eq!(type_of("dictKeys([\"a\": 1])").unwrap(), "[string]");
    assert_eq!(type_of("dictValues([\"a\": 1])").unwrap(), "[number]");
    assert_eq!(
        type_of("dictEntries([\"a\": 1])").unwrap(),
        "[{ key: string, value: number }]"
    );
    assert_eq!(
        type_of("dictFromEntries(dictEntries([\"a\": 1]))").unwrap(),
        "[string : number]"
    );
    assert_eq!(type_of("dictHas([\"a\": 1], \"a\")").unwrap(), "boolean");
    assert_eq!(
        type_of("dictSet([\"a\": 1], \"b\", 2)").unwrap(),
        "[string : number]"
    );
    assert_eq!(type_of("dictSize([\"a\": 1])").unwrap(), "number");
}

#[test]
fn builtin_tostring_is_polymorphic() {
    assert_eq!(type_of("toString(1)").unwrap(), "string");
    assert_eq!(type_of("toString([true])").unwrap(), "string");
}

// ── Environment reuse ──────────────────────────────────────────────────

#[test]
fn infer_and_solve_accepts_a_base_env() {
    let env = check_ok("let double = (n) => n * 2");
    let program = marl_parser::parse("double(21)").expect("parses");
    let env = infer_and_solve(&program, Some(env)).expect("type-checks");
    assert!(env.lookup("double").is_some());
}

#[test]
fn infer_expression_leaves_env_untouched() {
    let env = base_env();
    let expr = marl_parser::parse_expression("{ let tmp = 1; tmp }").expect("parses");
    let _ = infer_expression(&expr, &env);
    assert!(env.lookup("tmp").is_none());
}
