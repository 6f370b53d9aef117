use super::markers::FENCE;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A```[^\n]*(?:\n|\z)").expect("leading fence regex should be valid"));

static INLINE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:<!--|//|#)[ \t]*(?i:FILENAME:)[ \t]*[A-Za-z0-9_./-]*(?:[ \t]*-->)?[ \t]*\n?")
        .expect("inline marker regex should be valid")
});

/// Strips fence lines and stray `FILENAME:` markers from an extracted body.
///
/// Each pass removes every inline marker, then every leading fence line and
/// every trailing fence, then trims. Removing a marker can splice its
/// neighbours into a new one, so passes repeat until nothing changes and
/// sanitizing twice is the same as sanitizing once.
pub fn sanitize(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let next = strip_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_pass(text: &str) -> String {
    let without_markers = INLINE_MARKER_RE.replace_all(text, "");
    let mut body = without_markers.trim();
    while let Some(fence) = LEADING_FENCE_RE.find(body) {
        body = body[fence.end()..].trim();
    }
    while let Some(rest) = body.strip_suffix(FENCE) {
        body = rest.trim();
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_strips_surrounding_fence() {
        assert_eq!(sanitize("```html\n<p>hi</p>\n```"), "<p>hi</p>");
        assert_eq!(sanitize("```\nplain\n```\n"), "plain");
    }

    #[test]
    fn test_sanitize_strips_inline_marker() {
        let text = "<!-- FILENAME: index.html -->\n<html></html>";
        assert_eq!(sanitize(text), "<html></html>");
        assert_eq!(sanitize("// filename: a.js\nlet a = 1;"), "let a = 1;");
    }

    #[test]
    fn test_sanitize_leaves_plain_code_alone() {
        let code = "fn main() {\n    // keep this comment\n    println!(\"#1\");\n}";
        assert_eq!(sanitize(code), code);
    }

    #[test]
    fn test_sanitize_handles_stacked_fences() {
        assert_eq!(sanitize("```\n```js\nx\n```\n```"), "x");
    }

    #[test]
    fn test_sanitize_strips_many_stacked_fences_in_one_pass() {
        let text = format!("{}body{}", "```\n".repeat(5_000), "\n```".repeat(5_000));
        assert_eq!(strip_pass(&text), "body");
        assert_eq!(sanitize(&text), "body");
    }

    #[test]
    fn test_sanitize_removes_marker_spliced_by_removal() {
        assert_eq!(sanitize("/<!-- FILENAME: a.js -->/ FILENAME: b.js\nx"), "x");
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(text in "[a-z`#/<!> \n:-]{0,60}") {
            let once = sanitize(&text);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_is_idempotent_on_fenced_input(
            tag in "[a-z]{0,6}",
            body in "[a-zA-Z0-9 \n]{0,40}",
        ) {
            let text = format!("```{tag}\n{body}\n```");
            let once = sanitize(&text);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}
