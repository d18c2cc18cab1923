use firstfollow::{
    grammar::{Grammar, SymbolID},
    report::Report,
    syntax::{self, ParsedGrammar, SyntaxError},
    Diagnostic,
};
use std::{env, fs, path::PathBuf};

fn project_root() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
}

fn parse(name: &str) -> ParsedGrammar {
    syntax::parse_file(project_root().join(format!("tests/{}.txt", name)), None).unwrap()
}

fn names(g: &Grammar, set: Option<&firstfollow::grammar::SymbolSet>) -> Vec<String> {
    set.unwrap()
        .names(g)
        .into_iter()
        .map(String::from)
        .collect()
}

fn check_properties(g: &Grammar) {
    let analysis = firstfollow::analyze(g);
    let again = firstfollow::analyze(g);
    assert_eq!(analysis.first, again.first);
    assert_eq!(analysis.follow, again.follow);
    assert!(analysis.follow.is_converged());

    for &id in &analysis.classification.nonterminals {
        assert!(analysis.first.get(id).is_some());
        let follow = analysis.follow.get(id).unwrap();
        assert!(!follow.contains(SymbolID::EPSILON));
    }
    if let Some(start) = g.start_symbol {
        let follow = analysis.follow.get(start).unwrap();
        assert!(follow.contains(SymbolID::END_MARKER));
    }
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let parsed = parse(stringify!($name));
            eprintln!("grammar:\n{}", parsed.grammar);
            check_properties(&parsed.grammar);
        }
    )*};
}

define_tests! {
    expression,
    arithmetic,
    nullable,
    mutual,
    json,
    undefined,
}

#[test]
fn expression_report() {
    let parsed = parse("expression");
    let analysis = firstfollow::analyze(&parsed.grammar);
    let expected = fs::read_to_string(project_root().join("tests/expression.sets")).unwrap();
    assert_eq!(
        Report::new(&parsed.grammar, &analysis).sets().to_string(),
        expected
    );
}

#[test]
fn json_follow_sets() {
    let parsed = parse("json");
    let g = &parsed.grammar;
    let analysis = firstfollow::analyze(g);
    let follow = |name| names(g, analysis.follow.get(g.lookup(name).unwrap()));
    assert_eq!(follow("value"), ["$", ",", "]", "}"]);
    assert_eq!(follow("pair"), [",", "}"]);
    assert_eq!(follow("elements_tail"), ["]"]);

    let first = |name| names(g, analysis.first.get(g.lookup(name).unwrap()));
    assert_eq!(first("members"), ["STRING", "ε"]);
    assert_eq!(
        first("elements"),
        ["NUMBER", "STRING", "[", "false", "null", "true", "{", "ε"]
    );
}

#[test]
fn mutual_left_recursion() {
    let parsed = parse("mutual");
    let g = &parsed.grammar;
    let analysis = firstfollow::analyze(g);
    let first = |name| names(g, analysis.first.get(g.lookup(name).unwrap()));
    assert_eq!(first("A"), ["a", "c"]);
    assert_eq!(first("B"), ["a", "c", "ε"]);
    let follow = |name| names(g, analysis.follow.get(g.lookup(name).unwrap()));
    assert_eq!(follow("A"), ["$", "b"]);
    assert_eq!(follow("B"), ["a"]);
}

#[test]
fn undefined_symbol_is_reported() {
    let parsed = parse("undefined");
    assert!(matches!(
        &parsed.errors[..],
        [SyntaxError::Malformed { line: 5, .. }]
    ));

    let g = &parsed.grammar;
    let analysis = firstfollow::analyze(g);
    let b = g.lookup("B").unwrap();
    assert!(analysis.first.get(b).unwrap().is_empty());
    assert_eq!(
        analysis.diagnostics,
        [Diagnostic::UndefinedSymbol {
            symbol: b,
            name: "B".into(),
        }]
    );
    assert_eq!(
        names(g, analysis.first.get(g.lookup("S").unwrap())),
        ["a"]
    );
}

#[test]
fn analyses_are_isolated() {
    let expression = parse("expression");
    let json = parse("json");
    let a = firstfollow::analyze(&expression.grammar);
    let _ = firstfollow::analyze(&json.grammar);
    let b = firstfollow::analyze(&expression.grammar);
    assert_eq!(a.first, b.first);
    assert_eq!(a.follow, b.follow);
}
