use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use serde::Serialize;

pub(crate) const SEARCH_TOKEN: &str = "<<<< SEARCH";
const DIVIDER_TOKEN: &str = "====";
const REPLACE_TOKEN: &str = ">>>> REPLACE";

const SEARCH_ID: usize = 0;
const DIVIDER_ID: usize = 1;
const REPLACE_ID: usize = 2;

static PATCH_TOKENS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::new([SEARCH_TOKEN, DIVIDER_TOKEN, REPLACE_TOKEN])
        .expect("patch token automaton should build")
});

/// One search/replace instruction, both sides trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    pub search: String,
    pub replace: String,
}

enum Cursor {
    Idle,
    InSearch { body_start: usize },
    InReplace { search: (usize, usize), body_start: usize },
}

/// Splits a patch text into its operations in document order.
///
/// A block only counts once all three delimiters have been seen. Delimiters
/// that show up where another one is expected are part of the body text.
pub fn parse_operations(patch: &str) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    let mut cursor = Cursor::Idle;

    for token in PATCH_TOKENS.find_iter(patch) {
        cursor = match (cursor, token.pattern().as_usize()) {
            (Cursor::Idle, SEARCH_ID) => Cursor::InSearch {
                body_start: token.end(),
            },
            (Cursor::InSearch { body_start }, DIVIDER_ID) => Cursor::InReplace {
                search: (body_start, token.start()),
                body_start: token.end(),
            },
            (Cursor::InReplace { search, body_start }, REPLACE_ID) => {
                operations.push(PatchOperation {
                    search: patch[search.0..search.1].trim().to_string(),
                    replace: patch[body_start..token.start()].trim().to_string(),
                });
                Cursor::Idle
            }
            (cursor, _) => cursor,
        };
    }

    operations
}
