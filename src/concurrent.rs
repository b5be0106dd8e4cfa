use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::BusterError;
use crate::gather::CandidateStream;
use crate::plugin::Plugin;
use crate::result::{Candidate, ProbeResult};
use crate::state::RunState;

type Intake = Arc<Mutex<mpsc::Receiver<Candidate>>>;

/// Bounded worker pool that feeds candidates through a plugin.
///
/// The intake queue, the result stream and the error stream are all bounded
/// by the worker count, so a slow consumer throttles the probes.
pub struct Scheduler<P: ?Sized> {
    plugin: Arc<P>,
    workers: usize,
    state: Arc<RunState>,
    cancel: CancellationToken,
}

/// Output side of a running enumeration.
///
/// Both receivers close once every worker has exited; that is the only
/// completion signal. Drain them concurrently.
pub struct RunHandle {
    pub results: mpsc::Receiver<ProbeResult>,
    pub errors: mpsc::Receiver<BusterError>,
    pub done: JoinHandle<()>,
}

impl RunHandle {
    pub fn into_parts(self) -> (mpsc::Receiver<ProbeResult>, mpsc::Receiver<BusterError>, JoinHandle<()>) {
        (self.results, self.errors, self.done)
    }

    /// Collect everything the run produces. Meant for small runs and tests.
    pub async fn drain(self) -> (Vec<ProbeResult>, Vec<BusterError>) {
        let (mut results, mut errors, done) = self.into_parts();
        let collect_results = async {
            let mut out = Vec::new();
            while let Some(r) = results.recv().await {
                out.push(r);
            }
            out
        };
        let collect_errors = async {
            let mut out = Vec::new();
            while let Some(e) = errors.recv().await {
                out.push(e);
            }
            out
        };
        let (found, failed) = tokio::join!(collect_results, collect_errors);
        if let Err(e) = done.await {
            tracing::error!(error = %e, "scheduler supervisor failed");
        }
        (found, failed)
    }
}

impl<P: Plugin + ?Sized + 'static> Scheduler<P> {
    pub fn new(plugin: Arc<P>, workers: usize, state: Arc<RunState>, cancel: CancellationToken) -> Self {
        Self { plugin, workers: workers.max(1), state, cancel }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start the producer and `workers` worker tasks and return immediately.
    pub fn run(&self, candidates: CandidateStream) -> RunHandle {
        let (intake_tx, intake_rx) = mpsc::channel::<Candidate>(self.workers);
        let (result_tx, result_rx) = mpsc::channel(self.workers);
        let (error_tx, error_rx) = mpsc::channel(self.workers);
        let intake: Intake = Arc::new(Mutex::new(intake_rx));

        let mut pool = JoinSet::new();
        for id in 0..self.workers {
            pool.spawn(worker(
                id,
                Arc::clone(&self.plugin),
                Arc::clone(&intake),
                result_tx.clone(),
                error_tx.clone(),
                Arc::clone(&self.state),
                self.cancel.clone(),
            ));
        }
        // Workers hold the only senders; the streams close when they exit.
        drop(result_tx);
        drop(error_tx);

        let producer = tokio::spawn(produce(candidates, intake_tx, self.cancel.clone()));
        let workers = self.workers;
        let done = tokio::spawn(async move {
            if let Err(e) = producer.await {
                tracing::error!(error = %e, "candidate producer failed");
            }
            while let Some(joined) = pool.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "worker task failed");
                }
            }
            tracing::debug!(workers, "all workers finished");
        });

        RunHandle { results: result_rx, errors: error_rx, done }
    }
}

async fn produce(mut candidates: CandidateStream, intake: mpsc::Sender<Candidate>, cancel: CancellationToken) {
    let mut queued = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = candidates.next() => next,
        };
        let Some(candidate) = next else { break };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = intake.send(candidate) => sent,
        };
        if sent.is_err() {
            break;
        }
        queued += 1;
    }
    tracing::debug!(queued, cancelled = cancel.is_cancelled(), "intake closed");
}

async fn worker<P: Plugin + ?Sized>(
    id: usize,
    plugin: Arc<P>,
    intake: Intake,
    results: mpsc::Sender<ProbeResult>,
    errors: mpsc::Sender<BusterError>,
    state: Arc<RunState>,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut rx = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                guard = intake.lock() => guard,
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = rx.recv() => next,
            }
        };
        let Some(candidate) = next else { break };
        if cancel.is_cancelled() {
            break;
        }

        state.increment_issued();
        match plugin.process(&candidate).await {
            Ok(found) => {
                for result in found {
                    // A closed stream means nobody is listening; keep draining intake.
                    let _ = results.send(result).await;
                }
            }
            Err(e) => {
                state.record_error();
                tracing::debug!(worker = id, candidate = %candidate.value, error = %e, "probe failed");
                let _ = errors.send(e).await;
            }
        }
    }
    tracing::trace!(worker = id, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::result::Rendered;
    use async_trait::async_trait;
    use futures::stream;

    struct Upper;

    #[async_trait]
    impl Plugin for Upper {
        async fn setup(&mut self) -> Result<()> {
            Ok(())
        }

        async fn process(&self, candidate: &Candidate) -> Result<Vec<ProbeResult>> {
            if candidate.value == "bad" {
                return Err(BusterError::Probe { url: candidate.value.clone(), reason: "boom".into() });
            }
            Ok(vec![ProbeResult::entity(candidate.value.to_uppercase())])
        }

        fn result_to_string(&self, result: &ProbeResult) -> Result<Rendered> {
            Ok(Rendered { display: result.entity.clone(), ..Rendered::default() })
        }
    }

    #[tokio::test]
    async fn results_and_errors_are_split_and_counted() {
        let state = Arc::new(RunState::new());
        let scheduler = Scheduler::new(Arc::new(Upper), 3, Arc::clone(&state), CancellationToken::new());
        let words = ["a", "bad", "c"].map(Candidate::word);
        let (mut found, failed) = scheduler.run(stream::iter(words).boxed()).drain().await;

        found.sort_by(|a, b| a.entity.cmp(&b.entity));
        assert_eq!(found.iter().map(|r| r.entity.as_str()).collect::<Vec<_>>(), ["A", "C"]);
        assert_eq!(failed.len(), 1);

        let p = state.snapshot();
        assert_eq!((p.issued, p.errors), (2, 1));
    }

    #[test]
    fn zero_workers_is_clamped_to_one() {
        let s = Scheduler::new(Arc::new(Upper), 0, Arc::new(RunState::new()), CancellationToken::new());
        assert_eq!(s.workers(), 1);
    }
}
