//! Owner of the `{job, stages, candidates}` snapshot for one pipeline board.
//!
//! The source is either seeded by a controlling parent or fetches for itself
//! from `GET /jobs/{job_id}/pipeline`. In both cases it falls back to fetching
//! when part of the snapshot is missing. Fetches are not deduplicated: two
//! overlapping refreshes both run and the one that resolves last wins.
//!
//! A failed fetch records a human-readable `error` and keeps whatever data was
//! loaded before. Results that resolve after [`PipelineDataSource::dispose`] are
//! dropped without touching state.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::domain::{Candidate, CandidateId, Job, JobId, Stage};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::{api::PipelineApi, error::Result, events::PipelineEvent};

/// Data a controlling parent already holds. Any `None` triggers a fetch on open.
#[derive(Debug, Clone, Default)]
pub struct PipelineSeed {
    pub job: Option<Job>,
    pub stages: Option<Vec<Stage>>,
    pub candidates: Option<Vec<Candidate>>,
}

impl PipelineSeed {
    pub fn complete(job: Job, stages: Vec<Stage>, candidates: Vec<Candidate>) -> Self {
        Self {
            job: Some(job),
            stages: Some(stages),
            candidates: Some(candidates),
        }
    }
}

/// Caller-owned reload, used instead of the built-in refetch after a move.
/// Failures that are not a backend response map to [`PipelineError::Reload`].
///
/// [`PipelineError::Reload`]: crate::error::PipelineError::Reload
#[async_trait]
pub trait ReloadHook: Send + Sync {
    async fn reload(&self) -> Result<()>;
}

/// How the source reconciles with the backend after a committed move. Fixed at
/// construction.
#[derive(Clone)]
pub enum ReconcileStrategy {
    Refetch,
    Delegate(Arc<dyn ReloadHook>),
}

impl std::fmt::Debug for ReconcileStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileStrategy::Refetch => f.write_str("Refetch"),
            ReconcileStrategy::Delegate(_) => f.write_str("Delegate"),
        }
    }
}

/// Immutable view of the source at one point in time. Collections are shared,
/// so cloning is cheap and `Arc::ptr_eq` tells whether data changed.
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub job: Option<Job>,
    pub stages: Option<Arc<Vec<Stage>>>,
    pub candidates: Option<Arc<Vec<Candidate>>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub revision: u64,
}

impl PipelineSnapshot {
    pub fn stages(&self) -> &[Stage] {
        self.stages.as_deref().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates
            .as_deref()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn candidate(&self, candidate_id: &CandidateId) -> Option<&Candidate> {
        self.candidates().iter().find(|c| &c.id == candidate_id)
    }

    pub fn is_complete(&self) -> bool {
        self.job.is_some() && self.stages.is_some() && self.candidates.is_some()
    }
}

#[derive(Default)]
struct DataSourceState {
    job: Option<Job>,
    stages: Option<Arc<Vec<Stage>>>,
    candidates: Option<Arc<Vec<Candidate>>>,
    error: Option<String>,
    revision: u64,
    disposed: bool,
}

pub struct PipelineDataSource {
    api: Arc<dyn PipelineApi>,
    job_id: JobId,
    strategy: ReconcileStrategy,
    state: RwLock<DataSourceState>,
    loads_in_flight: AtomicUsize,
    events: broadcast::Sender<PipelineEvent>,
}

/// Counts one fetch as in flight until dropped, so a cancelled refresh does
/// not leave the source loading.
struct LoadInFlight<'a>(&'a AtomicUsize);

impl<'a> LoadInFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadInFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PipelineDataSource {
    pub fn new(
        api: Arc<dyn PipelineApi>,
        job_id: JobId,
        seed: PipelineSeed,
        strategy: ReconcileStrategy,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            job_id,
            strategy,
            state: RwLock::new(DataSourceState {
                job: seed.job,
                stages: seed.stages.map(Arc::new),
                candidates: seed.candidates.map(Arc::new),
                ..DataSourceState::default()
            }),
            loads_in_flight: AtomicUsize::new(0),
            events,
        })
    }

    /// Self-fetching source: nothing seeded, reconciles by refetching.
    pub fn self_fetching(api: Arc<dyn PipelineApi>, job_id: JobId) -> Arc<Self> {
        Self::new(
            api,
            job_id,
            PipelineSeed::default(),
            ReconcileStrategy::Refetch,
        )
    }

    /// Builds the source and runs the initial fetch if anything is missing. A
    /// failed initial fetch is recorded in the snapshot, not returned.
    pub async fn open(
        api: Arc<dyn PipelineApi>,
        job_id: JobId,
        seed: PipelineSeed,
        strategy: ReconcileStrategy,
    ) -> Arc<Self> {
        let source = Self::new(api, job_id, seed, strategy);
        let _ = source.ensure_loaded().await;
        source
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn api(&self) -> Arc<dyn PipelineApi> {
        Arc::clone(&self.api)
    }

    pub fn strategy(&self) -> &ReconcileStrategy {
        &self.strategy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        let state = self.state.read().await;
        PipelineSnapshot {
            job: state.job.clone(),
            stages: state.stages.clone(),
            candidates: state.candidates.clone(),
            is_loading: self.loads_in_flight.load(Ordering::SeqCst) > 0,
            error: state.error.clone(),
            revision: state.revision,
        }
    }

    /// Fetches when job, stages or candidates are missing. Returns whether a
    /// fetch ran.
    pub async fn ensure_loaded(&self) -> Result<bool> {
        let missing = {
            let state = self.state.read().await;
            state.job.is_none() || state.stages.is_none() || state.candidates.is_none()
        };
        if !missing {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    pub async fn refresh(&self) -> Result<()> {
        let in_flight = {
            let mut state = self.state.write().await;
            if state.disposed {
                debug!(job_id = %self.job_id, "pipeline: refresh after dispose ignored");
                return Ok(());
            }
            state.revision += 1;
            LoadInFlight::start(&self.loads_in_flight)
        };

        debug!(job_id = %self.job_id, "pipeline: fetching");
        let result = self.api.fetch_pipeline(&self.job_id).await;

        let mut state = self.state.write().await;
        drop(in_flight);
        if state.disposed {
            debug!(job_id = %self.job_id, "pipeline: discarding fetch result after dispose");
            return result.map(|_| ());
        }
        state.revision += 1;

        match result {
            Ok(response) => {
                state.job = Some(response.job);
                state.stages = Some(Arc::new(response.stages));
                state.candidates = Some(Arc::new(response.candidates));
                state.error = None;
                let revision = state.revision;
                let candidate_count = state.candidates.as_ref().map_or(0, |c| c.len());
                drop(state);

                info!(
                    job_id = %self.job_id,
                    revision,
                    candidates = candidate_count,
                    "pipeline: loaded"
                );
                self.emit(PipelineEvent::Loaded {
                    job_id: self.job_id.clone(),
                    revision,
                });
                Ok(())
            }
            Err(err) => {
                let message = format!("Failed to load pipeline: {err}");
                state.error = Some(message.clone());
                drop(state);

                warn!(
                    job_id = %self.job_id,
                    retryable = err.is_retryable(),
                    "pipeline: load failed: {err}"
                );
                self.emit(PipelineEvent::LoadFailed {
                    job_id: self.job_id.clone(),
                    message,
                });
                Err(err)
            }
        }
    }

    /// Replaces the snapshot with data pushed by a controlling parent.
    pub async fn set_snapshot(&self, job: Job, stages: Vec<Stage>, candidates: Vec<Candidate>) {
        let mut state = self.state.write().await;
        if state.disposed {
            return;
        }
        state.job = Some(job);
        state.stages = Some(Arc::new(stages));
        state.candidates = Some(Arc::new(candidates));
        state.error = None;
        state.revision += 1;
    }

    /// Brings local state back in line with the backend using the strategy
    /// chosen at construction.
    pub async fn reconcile(&self) -> Result<()> {
        match &self.strategy {
            ReconcileStrategy::Refetch => self.refresh().await,
            ReconcileStrategy::Delegate(hook) => {
                let result = hook.reload().await;
                if let Err(err) = &result {
                    let mut state = self.state.write().await;
                    if !state.disposed {
                        state.error = Some(format!("Failed to reload pipeline: {err}"));
                        state.revision += 1;
                    }
                }
                result
            }
        }
    }

    pub async fn dispose(&self) {
        self.state.write().await.disposed = true;
    }

    pub async fn is_disposed(&self) -> bool {
        self.state.read().await.disposed
    }
}

#[cfg(test)]
#[path = "tests/data_source_tests.rs"]
mod tests;
