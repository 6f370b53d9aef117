use super::markers::{find_markers, pending_tail_len, FENCE};
use super::sanitize::sanitize;
use crate::types::ArtifactMap;
use crate::util::is_html_path;
use tracing::trace;

const HTML_CLOSE: &str = "</html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Truncate unfenced `.html`/`.htm` bodies after their last `</html>`.
    pub html_fallback: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            html_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// The buffer may still grow; unfinished tail tokens are held back.
    Streaming,
    /// The producer has stopped; the buffer is taken as final.
    Settled,
}

/// Extracts `FILENAME:`-marked artifacts from a response buffer.
///
/// Parsing is a pure function of the buffer: the parser keeps no state
/// between calls, so it can be re-run on every chunk of a growing stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockParser {
    options: ParserOptions,
}

impl BlockParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parses a buffer that is still receiving chunks.
    ///
    /// Content for a path only ever grows between calls on a growing buffer,
    /// as long as the body is a fenced block and no later marker repeats
    /// the path.
    pub fn parse(&self, buffer: &str) -> ArtifactMap {
        self.scan(buffer, ScanMode::Streaming)
    }

    /// Parses a buffer that will not grow any more.
    pub fn parse_settled(&self, buffer: &str) -> ArtifactMap {
        self.scan(buffer, ScanMode::Settled)
    }

    fn scan(&self, buffer: &str, mode: ScanMode) -> ArtifactMap {
        let markers = find_markers(buffer);
        let mut artifacts = ArtifactMap::new();

        for (index, marker) in markers.iter().enumerate() {
            if !marker.complete {
                continue;
            }

            let body_end = markers
                .get(index + 1)
                .map_or(buffer.len(), |next| next.start);
            let mut body = &buffer[marker.body_start..body_end];
            if mode == ScanMode::Streaming && body_end == buffer.len() {
                body = &body[..body.len() - pending_tail_len(body)];
            }

            let content = self.extract_content(marker.path, body);
            if content.is_empty() {
                trace!(path = marker.path, "marker has no content yet");
                continue;
            }
            artifacts.insert(marker.path.to_string(), content);
        }

        artifacts
    }

    fn extract_content(&self, path: &str, body: &str) -> String {
        let body = body.trim();
        let body = match body.find(FENCE) {
            Some(fence_start) => &body[fence_start..],
            None => body,
        };

        let content = match body.strip_prefix(FENCE) {
            Some(after_open) => match after_open.find('\n') {
                // The language tag line is still arriving.
                None => "",
                Some(tag_end) => {
                    let inner = &after_open[tag_end + 1..];
                    match inner.find(FENCE) {
                        Some(close) => &inner[..close],
                        None => self.unterminated(path, inner),
                    }
                }
            },
            None => self.unterminated(path, body),
        };

        sanitize(content)
    }

    fn unterminated<'a>(&self, path: &str, text: &'a str) -> &'a str {
        if self.options.html_fallback && is_html_path(path) {
            if let Some(close) = text.rfind(HTML_CLOSE) {
                return &text[..close + HTML_CLOSE.len()];
            }
        }
        text
    }
}

/// Parses a growing buffer with default options.
pub fn parse(buffer: &str) -> ArtifactMap {
    BlockParser::default().parse(buffer)
}

/// Parses a final buffer with default options.
pub fn parse_settled(buffer: &str) -> ArtifactMap {
    BlockParser::default().parse_settled(buffer)
}
