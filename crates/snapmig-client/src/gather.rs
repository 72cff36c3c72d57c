use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::try_join_all;
use snapmig_types::OutputId;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::node::{NodeOutput, OutputFetcher};

/// Default number of outputs fetched concurrently.
pub const DEFAULT_PARALLEL_QUERIES: usize = 200;

const PROGRESS_EVERY: usize = 10_000;

/// Fetch every output in `ids` with at most `parallelism` requests in
/// flight.
///
/// Each fetch writes only its own slot of a pre-sized result vector, so the
/// results come back in the order of `ids`. The first failed fetch cancels
/// the remaining ones and is returned.
pub async fn gather_outputs<F>(fetcher: &F, ids: &[OutputId], parallelism: usize) -> ClientResult<Vec<NodeOutput>>
where
    F: OutputFetcher + ?Sized,
{
    let total = ids.len();
    info!(total, parallelism, "gathering outputs");

    let semaphore = Semaphore::new(parallelism.max(1));
    let fetched = AtomicUsize::new(0);
    let mut slots: Vec<Option<NodeOutput>> = (0..total).map(|_| None).collect();

    {
        let semaphore = &semaphore;
        let fetched = &fetched;
        let tasks = slots.iter_mut().zip(ids).map(|(slot, id)| async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| ClientError::Protocol("output fetch pool closed".into()))?;
            *slot = Some(fetcher.output_by_id(id).await?);
            let done = fetched.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_EVERY == 0 {
                info!(done, total, "outputs gathered");
            }
            Ok::<_, ClientError>(())
        });
        try_join_all(tasks).await?;
    }

    debug!(total, "all outputs gathered");
    slots
        .into_iter()
        .zip(ids)
        .map(|(slot, id)| {
            slot.ok_or_else(|| ClientError::Protocol(format!("output {id} was not fetched")))
        })
        .collect()
}
