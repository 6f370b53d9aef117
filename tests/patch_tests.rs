use codestream::patch::{MatchKind, PatchFailure};
use codestream::{apply_patch, is_patch, PatchEngine};

#[test]
fn test_exact_patch() {
    assert_eq!(
        apply_patch(
            "line1\nline2\nline3",
            "<<<< SEARCH\nline2\n====\nlineX\n>>>> REPLACE"
        ),
        "line1\nlineX\nline3"
    );
}

#[test]
fn test_fuzzy_patch() {
    let report = PatchEngine::default().reconcile(
        "foo   \n  bar",
        "<<<< SEARCH\nfoo\nbar\n====\nBAZ\n>>>> REPLACE",
    );
    assert_eq!(report.content, "BAZ");
    assert_eq!(report.operations[0].matched, MatchKind::Fuzzy);
}

#[test]
fn test_unmatched_patch_leaves_content_untouched() {
    let report =
        PatchEngine::default().reconcile("abc", "<<<< SEARCH\nzzz\n====\nyyy\n>>>> REPLACE");
    assert_eq!(report.content, "abc");
    assert_eq!(
        report.operations[0].matched,
        MatchKind::Unmatched(PatchFailure::NotFound)
    );
}

#[test]
fn test_empty_search_inserts_at_start() {
    assert_eq!(
        apply_patch("abc", "<<<< SEARCH\n====\nNEW\n>>>> REPLACE"),
        "NEWabc"
    );
    assert_eq!(
        apply_patch("", "<<<< SEARCH\n\n====\nconsole.log(1);\n>>>> REPLACE"),
        "console.log(1);"
    );
}

#[test]
fn test_full_rewrite_shortcut() {
    assert_eq!(apply_patch("anything", "hello world"), "hello world");
    assert!(!is_patch("hello world"));
}

#[test]
fn test_sequential_operations_depend_on_order() {
    let patch = "<<<< SEARCH\ncolor: red;\n====\ncolor: blue;\n>>>> REPLACE\n\
<<<< SEARCH\ncolor: blue;\n====\ncolor: green;\n>>>> REPLACE\n";
    assert_eq!(apply_patch("a { color: red; }", patch), "a { color: green; }");

    let reversed = "<<<< SEARCH\ncolor: blue;\n====\ncolor: green;\n>>>> REPLACE\n\
<<<< SEARCH\ncolor: red;\n====\ncolor: blue;\n>>>> REPLACE\n";
    assert_eq!(apply_patch("a { color: red; }", reversed), "a { color: blue; }");
}

#[test]
fn test_original_is_not_mutated() {
    let original = String::from("keep me");
    let patched = apply_patch(&original, "<<<< SEARCH\nkeep\n====\ndrop\n>>>> REPLACE");
    assert_eq!(original, "keep me");
    assert_eq!(patched, "drop me");
}

#[test]
fn test_realistic_html_patch_with_prose() {
    let original = "<html>\n  <head>\n    <title>Old</title>\n  </head>\n  <body>\n    <h1>Hi</h1>\n  </body>\n</html>";
    let patch = "Vou alterar o título e o cabeçalho:\n\
<<<< SEARCH\n<title>Old</title>\n====\n<title>New</title>\n>>>> REPLACE\n\
<<<< SEARCH\n<body>\n<h1>Hi</h1>\n====\n<body>\n    <h1>Hello</h1>\n>>>> REPLACE\n";

    let report = PatchEngine::default().reconcile(original, patch);

    assert!(report.all_applied());
    assert_eq!(report.operations[0].matched, MatchKind::Exact);
    assert_eq!(report.operations[1].matched, MatchKind::Fuzzy);
    assert_eq!(
        report.content,
        "<html>\n  <head>\n    <title>New</title>\n  </head>\n  <body>\n    <h1>Hello</h1>\n  </body>\n</html>"
    );
}
