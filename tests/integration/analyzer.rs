//! Completeness analyzer properties

use proptest::prelude::*;
use snippad::frontend::{analyze, analyze_completion, is_blank, CompletionKind};

/// Units and remainder from one pass over `text`
fn split(text: &str) -> (Vec<String>, String) {
    let mut analyzer = analyze(text);
    let units = analyzer.by_ref().map(|unit| unit.source.to_string()).collect();
    (units, analyzer.remainder().to_string())
}

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "int x = 1;",
        "x + 1;",
        "String s = \"a;b\";",
        "// note;\n",
        "/* block; */",
        "if (x > 0) { x--; } else { x++; }",
        "while (x < 3) x++;",
        "int sq(int n) { return n * n; }",
        "do { x++; } while (x < 5);",
        "do x++; while (x < 4);",
        "for (int i = 0; i < 2; i++) {}",
        "System.out.println(\"{\");",
        "{ int y = 2; }",
        "\n",
        "   ",
    ])
}

proptest! {
    #[test]
    fn splitting_distributes_over_concatenation(
        head in prop::collection::vec(fragment(), 0..6),
        parts in prop::collection::vec(fragment(), 0..6),
        tail in "[a-z =(+]{0,6}",
    ) {
        let a: String = head.concat();
        let mut b: String = parts.concat();
        b.push_str(&tail);
        // `else` would continue the last statement of `a`
        prop_assume!(!b.trim_start().starts_with("else"));

        let (units_a, rest_a) = split(&a);
        prop_assert!(is_blank(&rest_a));
        let (units_b, rest_b) = split(&b);
        let (units_ab, rest_ab) = split(&format!("{}{}", a, b));

        let mut expected = units_a;
        expected.extend(units_b);
        prop_assert_eq!(units_ab, expected);
        // Whatever `a` left unconsumed is blank, so it only pads `b`'s remainder
        prop_assert!(rest_ab.ends_with(rest_b.as_str()));
        prop_assert!(is_blank(&rest_ab[..rest_ab.len() - rest_b.len()]));
    }

    #[test]
    fn complete_statements_split_one_each(parts in prop::collection::vec(fragment(), 1..8)) {
        let statements: Vec<&str> = parts
            .iter()
            .copied()
            .filter(|part| !part.trim().is_empty() && !part.starts_with("//") && !part.starts_with("/*"))
            .collect();
        let text = parts.join("\n");
        let (units, remainder) = split(&text);
        prop_assert_eq!(units, statements);
        prop_assert!(remainder.trim().is_empty());
    }
}

#[test]
fn test_incomplete_declaration_yields_nothing() {
    let (units, remainder) = split("int x = ");
    assert!(units.is_empty());
    assert_eq!(remainder, "int x = ");
    assert_eq!(analyze_completion("int x = ").kind, CompletionKind::Incomplete);
}

#[test]
fn test_comments_only_yield_nothing() {
    let (units, _) = split("// one\n/* two */\n   ");
    assert!(units.is_empty());
    assert_eq!(analyze_completion("// one\n").kind, CompletionKind::Empty);
}

#[test]
fn test_missing_final_semicolon_is_implied() {
    let mut analyzer = analyze("int x = 1;\nx + 1");
    assert_eq!(analyzer.next().map(|u| u.implied_semicolon), Some(false));
    let last = analyzer.next().unwrap();
    assert_eq!(last.source, "x + 1");
    assert!(last.implied_semicolon);
    assert!(analyzer.next().is_none());
}
