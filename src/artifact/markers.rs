use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const FENCE: &str = "```";
const COMMENT_CLOSE: &str = "-->";
const MARKER_OPENERS: [&str; 3] = ["<!--", "//", "#"];
const MARKER_KEYWORD: &str = "FILENAME:";
/// Longest tail fragment inspected for an unfinished token.
const TAIL_WINDOW: usize = 64;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:<!--|//|#)\s*(?i:FILENAME:)\s*([A-Za-z0-9_./-]+)(?:\s*-->)?")
        .expect("marker regex should be valid")
});

static CONTINUATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<!--\s*NEXT:\s*(.+?)\s*-->").expect("continuation regex should be valid")
});

/// One `FILENAME:` marker located in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Marker<'a> {
    pub path: &'a str,
    /// Offset of the comment opener.
    pub start: usize,
    /// Offset just past the marker, where its body begins.
    pub body_start: usize,
    /// False while the path still runs into the end of the buffer.
    pub complete: bool,
}

pub(crate) fn find_markers(buffer: &str) -> Vec<Marker<'_>> {
    MARKER_RE
        .captures_iter(buffer)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?;
            Some(Marker {
                path: path.as_str(),
                start: whole.start(),
                body_start: whole.end(),
                complete: path.end() < buffer.len(),
            })
        })
        .collect()
}

pub(crate) fn is_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | '/')
}

/// Path named by the first `<!-- NEXT: path -->` continuation marker.
pub fn find_continuation(text: &str) -> Option<String> {
    CONTINUATION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|path| !path.is_empty())
}

/// Byte length of a trailing fragment that may still turn into a fence,
/// a marker comment closer or a marker once more text arrives.
pub(crate) fn pending_tail_len(text: &str) -> usize {
    let backticks = text.bytes().rev().take_while(|&b| b == b'`').count();
    if backticks > 0 && backticks < FENCE.len() {
        return backticks;
    }

    let mut window_start = text.len().saturating_sub(TAIL_WINDOW);
    while !text.is_char_boundary(window_start) {
        window_start += 1;
    }

    text[window_start..]
        .char_indices()
        .map(|(offset, _)| window_start + offset)
        .find(|&start| is_pending_token(&text[start..]))
        .map_or(0, |start| text.len() - start)
}

fn is_pending_token(fragment: &str) -> bool {
    is_partial_comment_close(fragment) || is_partial_marker(fragment)
}

fn is_partial_comment_close(fragment: &str) -> bool {
    fragment.len() < COMMENT_CLOSE.len() && COMMENT_CLOSE.starts_with(fragment)
}

fn is_partial_marker(fragment: &str) -> bool {
    let Some(rest) = MARKER_OPENERS
        .iter()
        .find_map(|opener| fragment.strip_prefix(opener))
    else {
        return MARKER_OPENERS
            .iter()
            .any(|opener| opener.starts_with(fragment));
    };

    let rest = rest.trim_start().to_ascii_uppercase();
    if MARKER_KEYWORD.starts_with(rest.as_str()) {
        return true;
    }
    rest.strip_prefix(MARKER_KEYWORD)
        .is_some_and(|path| path.trim_start().chars().all(is_path_char))
}
