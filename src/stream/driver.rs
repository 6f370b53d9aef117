use super::session::{conclude, SessionOutcome, SessionOptions};
use crate::artifact::BlockParser;
use crate::types::{ArtifactMap, Snapshot};
use tracing::debug;

/// What a caller gets back after each chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    pub artifacts: ArtifactMap,
    /// Paths whose content differs from the previous update.
    pub changed: Vec<String>,
}

/// Accumulates one session's chunks and re-parses the buffer after each.
#[derive(Debug, Default)]
pub struct StreamDriver {
    parser: BlockParser,
    buffer: String,
    /// Bytes of a UTF-8 sequence split across chunks.
    pending: Vec<u8>,
    artifacts: ArtifactMap,
    chunks: usize,
}

impl StreamDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: BlockParser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> StreamUpdate {
        let text = self.decode(chunk);
        self.push_str(&text)
    }

    pub fn push_str(&mut self, chunk: &str) -> StreamUpdate {
        self.chunks += 1;
        self.buffer.push_str(chunk);

        let artifacts = self.parser.parse(&self.buffer);
        let changed = artifacts.changed_since(&self.artifacts);
        debug!(
            chunk = self.chunks,
            bytes = chunk.len(),
            artifacts = artifacts.len(),
            changed = changed.len(),
            "stream chunk parsed"
        );
        self.artifacts = artifacts.clone();

        StreamUpdate { artifacts, changed }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Artifacts as of the most recent chunk.
    pub fn artifacts(&self) -> &ArtifactMap {
        &self.artifacts
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Ends the session: settles the buffer, looks for a plan and reconciles
    /// patch artifacts against `snapshot`.
    pub fn finish(mut self, snapshot: &Snapshot, options: SessionOptions) -> SessionOutcome {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.buffer.push_str(&tail);
        }
        debug!(
            chunks = self.chunks,
            bytes = self.buffer.len(),
            "stream finished"
        );
        conclude(&self.buffer, &self.parser, snapshot, options)
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::new();

        loop {
            let (valid, invalid) = match std::str::from_utf8(&self.pending) {
                Ok(_) => (self.pending.len(), None),
                Err(err) => (err.valid_up_to(), err.error_len()),
            };
            text.push_str(&String::from_utf8_lossy(&self.pending[..valid]));

            match invalid {
                Some(len) => {
                    text.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + len);
                }
                None => {
                    self.pending.drain(..valid);
                    return text;
                }
            }
        }
    }
}
