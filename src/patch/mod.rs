mod ops;

pub use ops::{parse_operations, PatchOperation};

use crate::util::normalize_line_endings;
use ops::SEARCH_TOKEN;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

/// Compiled-size ceiling for one fuzzy search pattern.
pub const DEFAULT_PATTERN_SIZE_LIMIT: usize = 2 * (1 << 20);

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should be valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// Retry unmatched searches with whitespace-insensitive matching.
    pub fuzzy: bool,
    pub pattern_size_limit: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            pattern_size_limit: DEFAULT_PATTERN_SIZE_LIMIT,
        }
    }
}

/// Why a single operation left the content untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum PatchFailure {
    #[error("search text not found")]
    NotFound,
    #[error("flexible search pattern rejected: {0}")]
    Pattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "failure", rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Unmatched(PatchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub index: usize,
    pub operation: PatchOperation,
    pub matched: MatchKind,
    /// 1-based line of the patched text where the replacement starts.
    pub line: Option<usize>,
}

impl OperationOutcome {
    pub fn applied(&self) -> bool {
        !matches!(self.matched, MatchKind::Unmatched(_))
    }

    /// One-line description, e.g. `#2 fuzzy at line 14: fn main() {`.
    pub fn summary(&self) -> String {
        let search = self.operation.search.lines().next().unwrap_or("");
        let number = self.index + 1;
        let verb = match &self.matched {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Unmatched(failure) => {
                return format!("#{number} skipped ({failure}): {search}")
            }
        };
        match self.line {
            Some(line) => format!("#{number} {verb} at line {line}: {search}"),
            None => format!("#{number} {verb}: {search}"),
        }
    }
}

/// Result of reconciling one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub content: String,
    /// The input carried no patch blocks and replaced the original wholesale.
    pub full_rewrite: bool,
    pub operations: Vec<OperationOutcome>,
}

impl PatchReport {
    fn rewrite(content: &str) -> Self {
        Self {
            content: content.to_string(),
            full_rewrite: true,
            operations: Vec::new(),
        }
    }

    pub fn all_applied(&self) -> bool {
        self.operations.iter().all(OperationOutcome::applied)
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.operations.iter().filter(|outcome| !outcome.applied())
    }
}

/// Returns true when `text` contains at least one patch block opener.
pub fn is_patch(text: &str) -> bool {
    text.contains(SEARCH_TOKEN)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine {
    options: PatchOptions,
}

impl PatchEngine {
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    /// Applies every operation of `patch` to `original`, in order.
    ///
    /// Each operation is matched against the output of the ones before it.
    /// Operations that cannot be located are skipped and reported; the rest
    /// still apply. Text without a patch block replaces `original` as is.
    pub fn reconcile(&self, original: &str, patch: &str) -> PatchReport {
        if !is_patch(patch) {
            return PatchReport::rewrite(patch);
        }

        let mut content = normalize_line_endings(original);
        let patch = normalize_line_endings(patch);
        let mut operations = Vec::new();

        for (index, operation) in parse_operations(&patch).into_iter().enumerate() {
            let (matched, line) = match self.apply_operation(&mut content, &operation) {
                Ok((kind, start)) => (kind, Some(line_at(&content, start))),
                Err(failure) => (MatchKind::Unmatched(failure), None),
            };
            match &matched {
                MatchKind::Unmatched(failure) => warn!(
                    index,
                    %failure,
                    search = %operation.search,
                    "patch operation skipped"
                ),
                kind => debug!(index, ?kind, "patch operation applied"),
            }
            operations.push(OperationOutcome {
                index,
                operation,
                matched,
                line,
            });
        }

        PatchReport {
            content,
            full_rewrite: false,
            operations,
        }
    }

    /// Applies one operation in place and returns how it matched plus the
    /// byte offset where the replacement landed.
    fn apply_operation(
        &self,
        content: &mut String,
        operation: &PatchOperation,
    ) -> Result<(MatchKind, usize), PatchFailure> {
        // An empty search matches at offset 0, prepending the replacement.
        if let Some(start) = content.find(&operation.search) {
            content.replace_range(start..start + operation.search.len(), &operation.replace);
            return Ok((MatchKind::Exact, start));
        }

        if !self.options.fuzzy {
            return Err(PatchFailure::NotFound);
        }

        let pattern = flexible_pattern(&operation.search, self.options.pattern_size_limit)
            .map_err(|err| PatchFailure::Pattern(err.to_string()))?;
        let range = pattern
            .find(content.as_str())
            .map(|found| found.range())
            .ok_or(PatchFailure::NotFound)?;
        let start = range.start;
        content.replace_range(range, &operation.replace);
        Ok((MatchKind::Fuzzy, start))
    }
}

fn line_at(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Literal pattern for `search` where any whitespace run matches any
/// non-empty whitespace run.
fn flexible_pattern(search: &str, size_limit: usize) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(search);
    let flexible = WHITESPACE_RUN_RE.replace_all(&escaped, NoExpand(r"\s+"));
    RegexBuilder::new(&flexible).size_limit(size_limit).build()
}

/// Reconciles `patch` against `original` with default options.
pub fn apply_patch(original: &str, patch: &str) -> String {
    PatchEngine::default().reconcile(original, patch).content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(search: &str, replace: &str) -> String {
        format!("<<<< SEARCH\n{search}\n====\n{replace}\n>>>> REPLACE\n")
    }

    #[test]
    fn test_exact_match_replaces_first_occurrence_only() {
        let report = PatchEngine::default().reconcile("a\nb\na", &block("a", "z"));
        assert_eq!(report.content, "z\nb\na");
        assert_eq!(report.operations[0].matched, MatchKind::Exact);
        assert!(!report.full_rewrite);
    }

    #[test]
    fn test_fuzzy_match_tolerates_indentation_drift() {
        let original = "function f() {\n        return 1;\n}";
        let patch = block("function f() {\n  return 1;\n}", "function f() {\n  return 2;\n}");
        let report = PatchEngine::default().reconcile(original, &patch);
        assert_eq!(report.content, "function f() {\n  return 2;\n}");
        assert_eq!(report.operations[0].matched, MatchKind::Fuzzy);
    }

    #[test]
    fn test_fuzzy_match_escapes_metacharacters() {
        let original = "const re = /a+b?/;   (x) [y] {z} $1";
        let patch = block("const re = /a+b?/; (x) [y] {z} $1", "gone");
        assert_eq!(apply_patch(original, &patch), "gone");
    }

    #[test]
    fn test_replacement_is_inserted_literally() {
        let original = "price  =  0";
        let patch = block("price = 0", "price = $1 ${name}");
        assert_eq!(apply_patch(original, &patch), "price = $1 ${name}");
    }

    #[test]
    fn test_fuzzy_can_be_disabled() {
        let engine = PatchEngine::new(PatchOptions {
            fuzzy: false,
            ..PatchOptions::default()
        });
        let report = engine.reconcile("foo   \n  bar", &block("foo\nbar", "BAZ"));
        assert_eq!(report.content, "foo   \n  bar");
        assert_eq!(
            report.operations[0].matched,
            MatchKind::Unmatched(PatchFailure::NotFound)
        );
    }

    #[test]
    fn test_oversized_pattern_is_reported_not_raised() {
        let engine = PatchEngine::new(PatchOptions {
            fuzzy: true,
            pattern_size_limit: 16,
        });
        let search = "word ".repeat(200);
        let report = engine.reconcile("unrelated", &block(&search, "x"));
        assert_eq!(report.content, "unrelated");
        assert!(matches!(
            report.operations[0].matched,
            MatchKind::Unmatched(PatchFailure::Pattern(_))
        ));
    }

    #[test]
    fn test_empty_search_prepends_replacement() {
        let report = PatchEngine::default().reconcile("abc", "<<<< SEARCH\n====\nNEW\n>>>> REPLACE");
        assert_eq!(report.content, "NEWabc");
        assert_eq!(report.operations[0].matched, MatchKind::Exact);
    }

    #[test]
    fn test_empty_search_fills_empty_original() {
        let patch = "<<<< SEARCH\n\n====\nconsole.log(1);\n>>>> REPLACE";
        assert_eq!(apply_patch("", patch), "console.log(1);");
    }

    #[test]
    fn test_outcomes_record_replacement_line() {
        let original = "fn a() {}\n\nfn b() {\n    1\n}";
        let patch = format!(
            "{}{}",
            block("fn b() {\n  1\n}", "fn b() {\n    2\n}"),
            block("gone", "x")
        );
        let report = PatchEngine::default().reconcile(original, &patch);

        assert_eq!(report.operations[0].line, Some(3));
        assert_eq!(report.operations[0].summary(), "#1 fuzzy at line 3: fn b() {");
        assert_eq!(report.operations[1].line, None);
        assert_eq!(
            report.operations[1].summary(),
            "#2 skipped (search text not found): gone"
        );
    }

    #[test]
    fn test_crlf_inputs_are_normalized() {
        let original = "one\r\ntwo\r\nthree";
        let patch = "<<<< SEARCH\r\ntwo\r\n====\r\n2\r\n>>>> REPLACE\r\n";
        assert_eq!(apply_patch(original, patch), "one\n2\nthree");
    }

    #[test]
    fn test_operations_see_previous_results() {
        let patch = format!("{}{}", block("alpha", "beta"), block("beta", "gamma"));
        assert_eq!(apply_patch("alpha", &patch), "gamma");
    }

    #[test]
    fn test_partial_application_reports_failures() {
        let patch = format!("{}{}", block("missing", "x"), block("b", "B"));
        let report = PatchEngine::default().reconcile("a b c", &patch);
        assert_eq!(report.content, "a B c");
        assert!(!report.all_applied());
        let failed: Vec<usize> = report.failures().map(|outcome| outcome.index).collect();
        assert_eq!(failed, vec![0]);
    }

    #[test]
    fn test_full_rewrite_is_returned_verbatim() {
        let report = PatchEngine::default().reconcile("old", "brand\r\nnew");
        assert!(report.full_rewrite);
        assert_eq!(report.content, "brand\r\nnew");
        assert!(report.all_applied());
    }
}
