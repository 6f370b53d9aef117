mod driver;
mod session;

pub use driver::{StreamDriver, StreamUpdate};
pub use session::{reconcile_artifacts, Reconciled, SessionOptions, SessionOutcome};

use crate::artifact::BlockParser;
use crate::types::Snapshot;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Runs one generation session over a stream of text chunks.
///
/// `on_update` sees the artifact map after every chunk. Once the stream
/// ends the session is settled against `snapshot`. Errors come only from
/// the chunk source itself.
pub async fn drive<S, F>(
    mut chunks: S,
    snapshot: &Snapshot,
    options: SessionOptions,
    mut on_update: F,
) -> Result<SessionOutcome>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
    F: FnMut(&StreamUpdate),
{
    let mut driver = StreamDriver::with_parser(BlockParser::new(options.parser));

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.with_context(|| {
            format!(
                "chunk source failed after {} chunks",
                driver.chunk_count()
            )
        })?;
        let update = driver.push_bytes(&chunk);
        on_update(&update);
    }

    Ok(driver.finish(snapshot, options))
}
