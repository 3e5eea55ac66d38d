/*!
 * Concurrent persistence for repaired frames.
 *
 * Each repaired frame overwrites its original path. Writes touch disjoint
 * paths, so no locking or ordering is needed; concurrency here is purely
 * for I/O throughput. One failed write must not abort its siblings; every
 * failure is captured per path and surfaced together after the join.
 */

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use log::{debug, error};

use crate::erase::engine::RepairedFrame;

/// Write repaired frames back to their original paths over a bounded pool.
///
/// Blocking image encodes run on the blocking thread pool. Returns an error
/// naming every failed path once all writes have completed; overwrites are
/// idempotent, so retrying a failed run is safe.
pub async fn write_frames(repaired: Vec<RepairedFrame>, max_concurrent: usize) -> Result<()> {
    let total = repaired.len();
    let results: Vec<Result<PathBuf, (PathBuf, String)>> = stream::iter(repaired)
        .map(|frame| async move {
            let path = frame.path.clone();
            let write = tokio::task::spawn_blocking(move || frame.image.save(&frame.path)).await;
            match write {
                Ok(Ok(())) => Ok(path),
                Ok(Err(e)) => Err((path, e.to_string())),
                Err(e) => Err((path, format!("write task panicked: {}", e))),
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(_) => {}
            Err((path, message)) => {
                error!("Failed to write repaired frame {}: {}", path.display(), message);
                failures.push(path);
            }
        }
    }

    if failures.is_empty() {
        debug!("Wrote {} repaired frames", total);
        Ok(())
    } else {
        Err(anyhow!(
            "Failed to write {} of {} repaired frames: {}",
            failures.len(),
            total,
            failures
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}
