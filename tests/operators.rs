//! Arithmetic, comparison, equality and logical operators

mod common;

use common::{lines, run_ok, runtime_error};
use pretty_assertions::assert_eq;

// =============================================================================
// ARITHMETIC
// =============================================================================

#[test]
fn test_precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
    assert_eq!(run_ok("print 2 * 3 - 4 / 2;"), "4\n");
    assert_eq!(run_ok("print 10 - 4 - 3;"), "3\n");
}

#[test]
fn test_fractional_division() {
    assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
    assert_eq!(run_ok("print 1 / 4;"), "0.25\n");
}

#[test]
fn test_division_by_zero() {
    assert_eq!(runtime_error("print 5 / 0;"), "Division by zero is not allowed. [line:1]");
    assert_eq!(runtime_error("let z = 0;\nprint -3 / z;"), "Division by zero is not allowed. [line:2]");
}

#[test]
fn test_unary_minus_and_not() {
    assert_eq!(lines("print -3; print --3; print !true; print !!nil;"), vec!["-3", "3", "false", "false"]);
    assert_eq!(runtime_error("print -nil;"), "Operand must be a number. [line:1]");
}

#[test]
fn test_arithmetic_type_errors() {
    assert_eq!(runtime_error("print 1 - \"a\";"), "Operands must be numbers. [line:1]");
    assert_eq!(runtime_error("print \"a\" * 2;"), "Operands must be numbers. [line:1]");
    assert_eq!(
        runtime_error("print nil + 1;"),
        "Operands must be two numbers or two strings. [line:1]"
    );
}

// =============================================================================
// STRINGS
// =============================================================================

#[test]
fn test_concatenation() {
    assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    assert_eq!(run_ok("print \"total: \" + 1.5;"), "total: 1.5\n");
    assert_eq!(run_ok("print 2 + \"x\";"), "2x\n");
    assert_eq!(run_ok("print \"is \" + true;"), "is true\n");
}

#[test]
fn test_string_ordering_uses_char_code_sum() {
    // "z" = 122, "aa" = 194
    assert_eq!(run_ok("print \"z\" < \"aa\";"), "true\n");
    assert_eq!(run_ok("print \"b\" > \"a\";"), "true\n");
    // Same sum, different text.
    assert_eq!(lines("print \"ab\" <= \"ba\"; print \"ab\" >= \"ba\";"), vec!["true", "true"]);
}

// =============================================================================
// COMPARISON AND EQUALITY
// =============================================================================

#[test]
fn test_number_comparison() {
    assert_eq!(
        lines("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"),
        vec!["true", "true", "false", "false"]
    );
}

#[test]
fn test_mixed_type_comparison_fails() {
    assert_eq!(
        runtime_error("print 1 < \"1\";"),
        "Operands must be of the same type for comparison. [line:1]"
    );
    assert_eq!(
        runtime_error("print nil >= nil;"),
        "Comparison operators are only supported for numbers and strings. [line:1]"
    );
}

#[test]
fn test_equality() {
    assert_eq!(
        lines("print 1 == 1; print \"a\" == \"a\"; print nil == nil; print nil == false; print 0 == false; print 1 != 2;"),
        vec!["true", "true", "true", "false", "false", "true"]
    );
}

#[test]
fn test_functions_equal_only_themselves() {
    assert_eq!(
        lines("fun f() {} fun g() {} let h = f; print f == h; print f == g;"),
        vec!["true", "false"]
    );
}

// =============================================================================
// LOGICAL, CONDITIONAL, COMMA
// =============================================================================

#[test]
fn test_truthiness() {
    assert_eq!(
        lines("if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\"; else print \"no nil\";"),
        vec!["zero", "empty", "no nil"]
    );
}

#[test]
fn test_short_circuit_returns_operand() {
    assert_eq!(
        lines("print nil or 3; print \"a\" or 3; print nil and 3; print 1 and \"b\";"),
        vec!["3", "a", "nil", "b"]
    );
}

#[test]
fn test_short_circuit_skips_right_side() {
    let source = "
        let calls = 0;
        fun touch() { calls = calls + 1; return true; }
        false and touch();
        true or touch();
        print calls;
    ";
    assert_eq!(run_ok(source), "0\n");
}

#[test]
fn test_conditional_expression() {
    assert_eq!(lines("print 1 < 2 ? \"yes\" : \"no\"; print nil ? 1 : 2 ? 3 : 4;"), vec!["yes", "3"]);
}

#[test]
fn test_comma_sequence() {
    assert_eq!(run_ok("let a = 1; let b = (a = a + 1, a * 10); print b; print a;"), "20\n2\n");
}
