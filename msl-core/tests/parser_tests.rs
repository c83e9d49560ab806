//! End-to-end parsing tests

mod common;

use common::compact;
use msl_core::compiler::ast::{Ast, DependencyCollector, NodeCounter, NodeKind};
use msl_core::compiler::parser::{parse, parse_tokens_with, ErrorLocation, ParseErrorKind};
use msl_core::LimitConfig;
use msl_core::kit::lexer::{tokenize, validate};

#[test]
fn test_precedence_table() {
    let cases = [
        ("W,A+B", "Sequential(Key(W), Simultaneous(Key(A), Key(B)))"),
        ("A+B,C", "Sequential(Simultaneous(Key(A), Key(B)), Key(C))"),
        ("A|B+C", "Simultaneous(Parallel(Key(A), Key(B)), Key(C))"),
        ("A>B|C", "Parallel(HoldChain(Key(A), Key(B)), Key(C))"),
        ("A&10>B", "HoldChain(Continuous(10){Key(A)}, Key(B))"),
        ("A*2&10", "Continuous(10){Repeat(2){Key(A)}}"),
        ("~A*2", "Repeat(2){Toggle(Key(A))}"),
    ];
    for (script, expected) in cases {
        assert_eq!(compact(script), expected, "script: {script}");
    }
}

#[test]
fn test_timing_nodes_contain_their_action() {
    assert_eq!(compact("W(500)"), "Delay(500){Key(W)}");
    assert_eq!(compact("W[1000]"), "Hold(1000){Key(W)}");
    assert_eq!(compact("Space*5{200}"), "Repeat(5){Key(Space), Interval(200)}");
}

#[test]
fn test_documented_trees() {
    assert_eq!(compact("~CapsLock"), "Toggle(Key(CapsLock))");
    assert_eq!(compact("@(100,200)"), "MouseCoord(100,200)");
    assert_eq!(
        compact("Shift[2000]+(W,A,S,D)"),
        "Simultaneous(Hold(2000){Key(Shift)}, Group(Sequential(Key(W), Key(A), Key(S), Key(D))))"
    );
}

#[test]
fn test_unterminated_delay_points_at_end() {
    let err = parse("W(").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MissingNumber { .. }));
    assert!(matches!(err.location, ErrorLocation::Eof(pos) if pos.column == 3));
    assert!(err.to_string().contains("NUMBER"));
}

#[test]
fn test_no_silent_partial_parse() {
    for script in ["A B", "A,B)", "A+B]", "(A", "A[10", "A*3{5", "A<10>", "A,,B", ",A"] {
        assert!(parse(script).is_err(), "script should fail: {script}");
    }
}

#[test]
fn test_multiline_script_with_comments() {
    let script = "\
# open the inventory and sort it
I(100),
Ctrl+S # sort
, Escape";
    assert_eq!(
        compact(script),
        "Sequential(Delay(100){Key(I)}, Simultaneous(Key(Ctrl), Key(S)), Key(Escape))"
    );
}

#[test]
fn test_error_positions_on_later_lines() {
    let err = parse("A,\nB,\n  C+").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DanglingOperator { operator: "+".into() });
    assert_eq!((err.line(), err.column()), (3, 4));
}

#[test]
fn test_lexer_diagnostics_match_parse_failure() {
    let tokens = tokenize("A, B ^ C");
    let diagnostics = validate(&tokens);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].column(), 6);

    let err = parse("A, B ^ C").unwrap_err();
    assert_eq!(err.column(), 6);
}

#[test]
fn test_tree_string_snapshot() {
    let ast = parse("Shift > A*2{50}, ~CapsLock").unwrap();
    let expected = "\
Sequential
  HoldChain
    Key(Shift)
    Repeat(2)
      Key(A)
      Interval(50)
  Toggle
    Key(CapsLock)";
    assert_eq!(ast.tree_string(), expected);
}

#[test]
fn test_parent_links_are_informational() {
    let ast = parse("A,B").unwrap();
    let root = ast.root().unwrap();
    for &child in ast.children(root) {
        assert_eq!(ast.parent(child), Some(root));
    }
    assert_eq!(ast.parent(root), None);
}

#[test]
fn test_editing_a_parsed_tree() {
    let mut ast = parse("A,B").unwrap();
    let root = ast.root().unwrap();
    let extra = ast.push(NodeKind::Key { name: "C".into() }, None);
    ast.add_child(root, extra).unwrap();
    assert_eq!(ast.to_string(), "Sequential(Key(A), Key(B), Key(C))");

    let first = ast.children(root)[0];
    assert!(ast.remove_child(root, first));
    assert_eq!(ast.to_script(), "B, C");
}

#[test]
fn test_analysis_on_parsed_script() {
    let ast = parse("Ctrl+C, $paste | W&100, @(5,5)").unwrap();
    let deps = DependencyCollector::collect(&ast);
    assert!(deps.keys.contains("Ctrl") && deps.keys.contains("W"));
    assert!(deps.variables.contains("paste"));
    assert!(deps.uses_parallel && deps.uses_continuous && deps.uses_mouse);

    let counter = NodeCounter::count(&ast);
    assert_eq!(counter.get("Key"), 3);
    assert_eq!(counter.get("Variable"), 1);
}

#[test]
fn test_formatter_output_reparses_identically() {
    let scripts = [
        "Shift[2000]+(W,A,S,D)",
        "~CapsLock, Space*5{200}",
        "Alt > Tab > Tab",
        "A<250>$b, wheel+2",
        "(Q|E)*2&300",
    ];
    for script in scripts {
        let ast: Ast = parse(script).unwrap();
        let formatted = ast.to_script();
        assert_eq!(compact(&formatted), ast.to_string(), "formatted: {formatted}");
    }
}

#[test]
fn test_deep_group_nesting_is_rejected() {
    let script = format!("{}A{}", "(".repeat(200_000), ")".repeat(200_000));
    let err = parse(&script).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::NestingTooDeep { limit: 128 }));
    assert_eq!(err.line(), 1);
}

#[test]
fn test_deep_modifier_chain_is_rejected() {
    let script = format!("A{}", "(1)".repeat(500));
    let err = parse(&script).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::NestingTooDeep { limit: 128 }));
    assert!(err.to_string().contains("deeper than 128"));
}

#[test]
fn test_nesting_within_limit() {
    let groups = format!("{}A{}", "(".repeat(127), ")".repeat(127));
    assert_eq!(NodeCounter::count(&parse(&groups).unwrap()).max_depth, 128);
    assert!(parse(&format!("A{}", "(1)".repeat(127))).is_ok());
    assert!(parse(&format!("A{}", "(1)".repeat(128))).is_err());
}

#[test]
fn test_custom_nesting_limit() {
    let limits = LimitConfig {
        max_nesting_depth: 3,
        ..LimitConfig::default()
    };
    assert!(parse_tokens_with(tokenize("(A(1))"), &limits).is_ok());
    let err = parse_tokens_with(tokenize("((A(1)))"), &limits).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::NestingTooDeep { limit: 3 }));
}

#[test]
fn test_number_overflowing_to_infinity_is_invalid() {
    let script = format!("A({})", "9".repeat(400));
    let err = parse(&script).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::InvalidNumber { .. }));
    assert!(parse("A(99999999999999999999999)").is_ok());
}
