//! Integration tests for the Vision tokenizer.
//!
//! Covers:
//! - token/operator extraction
//! - number and string literals
//! - brackets, arrays, calls and dotted access
//! - declarations and compound assignments
//! - postfix factorial
//! - introducer blocks
//! - error codes for malformed input

use pretty_assertions::assert_eq;
use vis_eval::{evaluate, Library};
use vis_parser::{tokenize, Tokenizer};
use vis_types::{ErrorCode, ErrorKind, Namespace, Operator, Value, VisError, VisResult};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn scope() -> Namespace {
    Library::new().scope()
}

/// Tokenize and evaluate one line in `ns`.
fn run_in(ns: &Namespace, source: &str) -> VisResult<Vec<Value>> {
    evaluate(&tokenize(source, ns)?)
}

fn run(source: &str) -> VisResult<Vec<Value>> {
    run_in(&scope(), source)
}

/// Evaluate a line that must produce a single number.
fn number(source: &str) -> f64 {
    match run(source).expect("evaluation failed").as_slice() {
        [Value::Number(n)] => *n,
        other => panic!("expected one number for {source:?}, got {other:?}"),
    }
}

fn error(source: &str) -> VisError {
    run(source).expect_err("expected an error")
}

fn nums(items: &[f64]) -> Vec<Value> {
    items.iter().map(|n| Value::Number(*n)).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Token extraction
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn tokens_and_operators_are_split() {
    let statement = tokenize("5*4+3", &scope()).unwrap();
    assert_eq!(statement.tokens().len(), 5);
    assert_eq!(statement.operators(), &[Operator::Mul, Operator::Add]);
}

#[test]
fn compound_operators_take_two_chars() {
    let ns = scope();
    let statement = tokenize("a += 1", &ns).unwrap();
    assert_eq!(statement.operators(), &[Operator::AddTo]);
    let statement = tokenize("1 == 1, 1 != 2", &ns).unwrap();
    assert_eq!(
        statement.operators(),
        &[Operator::IsEquals, Operator::Separator, Operator::NotEquals]
    );
}

#[test]
fn blank_source_is_empty() {
    assert!(run("").unwrap().is_empty());
    assert!(run("   \t").unwrap().is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Priorities
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn multiply_before_add() {
    assert_eq!(number("3+5*4"), 23.0);
}

#[test]
fn power_before_subtract() {
    assert_eq!(number("3^5-4"), 239.0);
}

#[test]
fn brackets_group() {
    assert_eq!(number("5*(4+3)"), 35.0);
    assert_eq!(number("(5*4)+3"), 23.0);
    assert_eq!(number("((2))"), 2.0);
}

#[test]
fn modulo_and_division() {
    assert_eq!(number("7 % 4 * 2"), 6.0);
    assert_eq!(number("8 / 2 * 2"), 8.0);
}

#[test]
fn signs() {
    assert_eq!(number("-4 + 1"), -3.0);
    assert_eq!(run("1, -2").unwrap(), nums(&[1.0, -2.0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn decimal_numbers_round_trip() {
    assert_eq!(number("3.14"), 3.14);
    assert_eq!(number(".5"), 0.5);
    assert_eq!(number("7."), 7.0);
    assert_eq!(number("0.125"), 0.125);
}

#[test]
fn long_fractions_keep_fifteen_digits() {
    let n = number("0.1234567890123456789");
    assert!((n - 0.123_456_789_012_345_68).abs() < 1e-15, "{n}");
}

#[test]
fn number_errors() {
    assert_eq!(error("1.2.3").code, ErrorCode::NUMBER_TWO_DOTS);
    assert_eq!(error(".").code, ErrorCode::NUMBER_WITHOUT_DIGITS);
}

#[test]
fn strings_use_either_quote() {
    assert_eq!(
        run("'a b', \"c\"").unwrap(),
        vec![Value::from("a b"), Value::from("c")]
    );
    assert_eq!(run("\"it's\"").unwrap(), vec![Value::from("it's")]);
    assert_eq!(error("'open").code, ErrorCode::STRING_NOT_CLOSED);
}

#[test]
fn arrays_keep_every_value() {
    assert_eq!(
        run("[1, 2 + 3, 'x']").unwrap(),
        vec![Value::Array(vec![1.0.into(), 5.0.into(), "x".into()])]
    );
    assert_eq!(run("[]").unwrap(), vec![Value::Array(vec![])]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn declaration_then_reference() {
    let ns = scope();
    assert_eq!(run_in(&ns, "a = 2").unwrap(), nums(&[2.0]));
    assert_eq!(run_in(&ns, "a").unwrap(), nums(&[2.0]));
    assert_eq!(run_in(&ns, "a += 3").unwrap(), nums(&[5.0]));
    assert_eq!(run_in(&ns, "a * 2").unwrap(), nums(&[10.0]));
}

#[test]
fn declaration_with_sign() {
    let ns = scope();
    assert_eq!(run_in(&ns, "a = -3").unwrap(), nums(&[-3.0]));
    assert_eq!(run_in(&ns, "a").unwrap(), nums(&[-3.0]));
}

#[test]
fn compound_assignment_on_undeclared_name() {
    let err = error("b += 3");
    assert_eq!(err.code, ErrorCode::UNDECLARED_CHANGE);
    assert_eq!(err.kind, ErrorKind::Access);
}

#[test]
fn unknown_identifier_is_an_access_error() {
    let err = error("x + 1");
    assert_eq!(err.code, ErrorCode::NO_VALUE);
    assert_eq!(err.kind, ErrorKind::Access);
}

#[test]
fn declaring_a_value_fails() {
    assert_eq!(error("1 = 2").code, ErrorCode::NOT_A_LABEL);
}

// ══════════════════════════════════════════════════════════════════════════════
// Comparisons and factorial
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn comparisons() {
    assert_eq!(run("1 + 1 == 2").unwrap(), vec![Value::Bool(true)]);
    assert_eq!(run("1 != 1").unwrap(), vec![Value::Bool(false)]);
    assert_eq!(run("'a' == 'a'").unwrap(), vec![Value::Bool(true)]);
}

#[test]
fn factorial() {
    assert_eq!(number("4!"), 24.0);
    assert_eq!(number("3! + 1"), 7.0);
    let ns = scope();
    run_in(&ns, "n = 5").unwrap();
    assert_eq!(run_in(&ns, "n!").unwrap(), nums(&[120.0]));
}

#[test]
fn factorial_errors() {
    assert_eq!(error("!").code, ErrorCode::FACTORIAL_WITHOUT_VALUE);
    assert_eq!(error("1 + !").code, ErrorCode::FACTORIAL_WITHOUT_VALUE);
    assert_eq!(error("'x'!").code, ErrorCode::FACTORIAL_WITHOUT_VALUE);
    assert_eq!(error("2.5!").code, ErrorCode::FACTORIAL_DOMAIN);
    assert_eq!(error("171!").code, ErrorCode::FACTORIAL_DOMAIN);
}

// ══════════════════════════════════════════════════════════════════════════════
// Calls and dotted access
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn builtin_calls() {
    assert_eq!(number("sqrt(16) + 1"), 5.0);
    assert_eq!(number("hypot(3, 4)"), 5.0);
    assert_eq!(number("len([1, 2, 3])"), 3.0);
    assert_eq!(run("type('a')").unwrap(), vec![Value::from("string")]);
}

#[test]
fn range_is_lazy_and_listable() {
    assert_eq!(
        run("list(range(0, 1, 5))").unwrap(),
        vec![Value::Array(nums(&[0.0, 1.0, 2.0, 3.0, 4.0]))]
    );
}

#[test]
fn import_then_dotted_access() {
    let ns = scope();
    run_in(&ns, "import('math')").unwrap();
    assert_eq!(
        run_in(&ns, "math.pi").unwrap(),
        nums(&[std::f64::consts::PI])
    );
    assert_eq!(run_in(&ns, "math.sqrt(9)").unwrap(), nums(&[3.0]));
}

#[test]
fn dotted_access_errors() {
    assert_eq!(error("math.pi").code, ErrorCode::NO_VALUE);
    let ns = scope();
    run_in(&ns, "a = 1").unwrap();
    let err = run_in(&ns, "a.b").unwrap_err();
    assert_eq!(err.code, ErrorCode::NOT_A_NAMESPACE);
}

#[test]
fn call_needs_the_bracket_right_after_the_name() {
    assert_eq!(error("sqrt (16)").code, ErrorCode::MALFORMED_STATEMENT);
    let ns = scope();
    run_in(&ns, "a = 1").unwrap();
    assert_eq!(
        run_in(&ns, "a (1)").unwrap_err().code,
        ErrorCode::MALFORMED_STATEMENT
    );
}

#[test]
fn calling_a_number_fails() {
    let ns = scope();
    run_in(&ns, "a = 1").unwrap();
    assert_eq!(run_in(&ns, "a(2)").unwrap_err().code, ErrorCode::NOT_CALLABLE);
}

#[test]
fn structures() {
    let ns = scope();
    run_in(&ns, "Point = struct('x', 'y')").unwrap();
    run_in(&ns, "p = Point(1, 2)").unwrap();
    assert_eq!(run_in(&ns, "p.x + p.y").unwrap(), nums(&[3.0]));
    assert_eq!(run_in(&ns, "p.x = 5").unwrap(), nums(&[5.0]));
    assert_eq!(run_in(&ns, "p.x").unwrap(), nums(&[5.0]));
    assert_eq!(
        run_in(&ns, "p.z = 1").unwrap_err().code,
        ErrorCode::FIELD_MISSING
    );
    assert_eq!(
        run_in(&ns, "Point(1)").unwrap_err().code,
        ErrorCode::WRONG_ARG_COUNT
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Introducer blocks
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn open_block_runs() {
    let ns = scope();
    let values = run_in(&ns, "if(1 == 1) { a = 2 }").unwrap();
    assert_eq!(values, vec![Value::Array(nums(&[2.0]))]);
    assert_eq!(ns.lookup("a"), Some(Value::Number(2.0)));
}

#[test]
fn closed_block_is_skipped() {
    let ns = scope();
    let values = run_in(&ns, "if(1 == 2) { a = '}' }").unwrap();
    assert_eq!(values, vec![Value::Array(vec![])]);
    assert!(!ns.contains("a"));
}

#[test]
fn introducer_without_block_is_its_gate() {
    assert_eq!(run("if(1 == 1, 2 == 3)").unwrap(), vec![Value::Bool(false)]);
}

#[test]
fn nested_blocks() {
    let ns = scope();
    run_in(&ns, "if(1 == 1) { if(2 == 2) { b = 1 } }").unwrap();
    assert_eq!(ns.lookup("b"), Some(Value::Number(1.0)));
}

#[test]
fn block_errors() {
    assert_eq!(error("{ 1 }").code, ErrorCode::BLOCK_WITHOUT_INTRODUCER);
    assert_eq!(error("if(1 == 2) { 1").code, ErrorCode::BRACKET_NOT_CLOSED);
}

// ══════════════════════════════════════════════════════════════════════════════
// Malformed input
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn brackets_wrap_one_value() {
    assert_eq!(error("(1, 2)").code, ErrorCode::BRACKETS_NOT_SINGLE);
    assert_eq!(error("()").code, ErrorCode::BRACKETS_NOT_SINGLE);
}

#[test]
fn bracket_matching() {
    assert_eq!(error("(1 + 2").code, ErrorCode::BRACKET_NOT_CLOSED);
    assert_eq!(error("1)").code, ErrorCode::UNEXPECTED_CLOSING);
    assert_eq!(error("(1]").code, ErrorCode::BRACKET_MISMATCH);
    assert_eq!(error("[1)").code, ErrorCode::BRACKET_MISMATCH);
}

#[test]
fn unknown_character_is_a_parsing_error() {
    let err = error("1 # 2");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_CHAR);
    assert_eq!(err.kind, ErrorKind::Parsing);
    assert_eq!(err.to_string(), "ParsingError [110]: could not parse char '#' at 2");
}

#[test]
fn nesting_is_bounded() {
    let ns = scope();
    let mut shallow = Tokenizer::new(&ns).with_max_depth(2);
    shallow.tokenize("((1))").unwrap();

    let mut deep = Tokenizer::new(&ns).with_max_depth(2);
    let err = deep.tokenize("(((1)))").unwrap_err();
    assert_eq!(err.code, ErrorCode::NESTING_TOO_DEEP);
}

#[test]
fn deep_nesting_reports_instead_of_overflowing() {
    let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
    assert_eq!(error(&source).code, ErrorCode::NESTING_TOO_DEEP);
}

// ══════════════════════════════════════════════════════════════════════════════
// Chaining
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn chain_after_an_operator_statement() {
    let mut tokenizer = Tokenizer::new(&scope());
    tokenizer.tokenize("1+2").unwrap();
    tokenizer.chain().unwrap();
    tokenizer.tokenize("3").unwrap();
    assert_eq!(evaluate(tokenizer.statement()).unwrap(), nums(&[3.0, 3.0]));
}

#[test]
fn chain_three_statements() {
    let ns = scope();
    let mut tokenizer = Tokenizer::new(&ns);
    tokenizer.tokenize("a = 2 * 3").unwrap();
    tokenizer.chain().unwrap();
    tokenizer.tokenize("4 - 1").unwrap();
    tokenizer.chain().unwrap();
    tokenizer.tokenize("2 ^ 3").unwrap();
    let statement = tokenizer.into_statement();
    assert_eq!(statement.tokens().len(), 2 * statement.operators().len() + 1);
    assert_eq!(evaluate(&statement).unwrap(), nums(&[6.0, 3.0, 8.0]));
    assert_eq!(ns.lookup("a"), Some(Value::Number(6.0)));
}

#[test]
fn chain_twice_in_a_row() {
    let mut tokenizer = Tokenizer::new(&scope());
    tokenizer.tokenize("1+2").unwrap();
    tokenizer.chain().unwrap();
    let err = tokenizer.chain().unwrap_err();
    assert_eq!(err.code, ErrorCode::CHAIN_AFTER_SEPARATOR);
    assert_eq!(err.kind, ErrorKind::Parsing);
}

#[test]
fn chain_after_dangling_operator() {
    let mut tokenizer = Tokenizer::new(&scope());
    tokenizer.tokenize("1 +").unwrap();
    assert_eq!(
        tokenizer.chain().unwrap_err().code,
        ErrorCode::CHAIN_SIZE_MISMATCH
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn evaluation_is_deterministic() {
    let first = run("3 + 5 * 4, [1, 2], 'x'").unwrap();
    for _ in 0..100 {
        assert_eq!(run("3 + 5 * 4, [1, 2], 'x'").unwrap(), first);
    }
}

#[test]
fn statement_can_be_evaluated_twice() {
    let ns = scope();
    run_in(&ns, "a = 4").unwrap();
    let statement = tokenize("a * 2 + 1", &ns).unwrap();
    assert_eq!(evaluate(&statement).unwrap(), evaluate(&statement).unwrap());
}
