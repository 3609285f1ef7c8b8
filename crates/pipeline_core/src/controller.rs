//! Stage moves for single candidates.
//!
//! A move is `Idle -> Pending -> Idle`. While a candidate is pending, further
//! moves for it are dropped; moves for other candidates run concurrently. The
//! candidate list is never edited locally: after the backend commits the move the
//! data source reconciles, and the candidate changes column only once that
//! finishes. A rejected move therefore needs no rollback.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use shared::domain::{CandidateId, StageId};
use tracing::{debug, info, warn};

use crate::{
    data_source::PipelineDataSource,
    error::{PipelineError, Result},
    events::PipelineEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The backend committed the move and reconciliation ran.
    Moved,
    /// The candidate is already in the requested stage; nothing was sent.
    Unchanged,
    /// A move for this candidate is still in flight; nothing was sent.
    AlreadyPending,
}

pub struct StageTransitionController {
    source: Arc<PipelineDataSource>,
    pending: Mutex<HashSet<CandidateId>>,
}

impl StageTransitionController {
    pub fn new(source: Arc<PipelineDataSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            pending: Mutex::new(HashSet::new()),
        })
    }

    pub fn source(&self) -> &Arc<PipelineDataSource> {
        &self.source
    }

    pub async fn move_stage(
        &self,
        candidate_id: &CandidateId,
        new_stage_id: &StageId,
    ) -> Result<MoveOutcome> {
        let snapshot = self.source.snapshot().await;
        let Some(candidate) = snapshot.candidate(candidate_id) else {
            return Err(PipelineError::UnknownCandidate(candidate_id.clone()));
        };
        if &candidate.stage_id == new_stage_id {
            debug!(
                candidate_id = %candidate_id,
                stage_id = %new_stage_id,
                "pipeline: candidate already in stage; skipping move"
            );
            return Ok(MoveOutcome::Unchanged);
        }

        let Some(pending) = PendingMove::claim(&self.pending, candidate_id) else {
            debug!(
                candidate_id = %candidate_id,
                "pipeline: move already in progress; skipping duplicate trigger"
            );
            return Ok(MoveOutcome::AlreadyPending);
        };

        info!(
            candidate_id = %candidate_id,
            from = %candidate.stage_id,
            to = %new_stage_id,
            "pipeline: moving candidate"
        );
        self.source.emit(PipelineEvent::MoveStarted {
            candidate_id: candidate_id.clone(),
            stage_id: new_stage_id.clone(),
        });

        let result = self.commit_and_reconcile(candidate_id, new_stage_id).await;
        drop(pending);

        match &result {
            Ok(_) => self.source.emit(PipelineEvent::MoveSucceeded {
                candidate_id: candidate_id.clone(),
                stage_id: new_stage_id.clone(),
            }),
            Err(err) => {
                warn!(
                    candidate_id = %candidate_id,
                    stage_id = %new_stage_id,
                    "pipeline: move failed: {err}"
                );
                self.source.emit(PipelineEvent::MoveFailed {
                    candidate_id: candidate_id.clone(),
                    stage_id: new_stage_id.clone(),
                    message: err.to_string(),
                });
            }
        }
        result
    }

    async fn commit_and_reconcile(
        &self,
        candidate_id: &CandidateId,
        new_stage_id: &StageId,
    ) -> Result<MoveOutcome> {
        self.source
            .api()
            .update_candidate_stage(candidate_id, new_stage_id)
            .await?;

        if self.source.is_disposed().await {
            debug!(candidate_id = %candidate_id, "pipeline: view disposed; skipping reconcile");
            return Ok(MoveOutcome::Moved);
        }

        // The move is committed; a failed reconcile only leaves the view stale.
        if let Err(err) = self.source.reconcile().await {
            warn!(
                candidate_id = %candidate_id,
                "pipeline: reconcile after move failed: {err}"
            );
        }
        Ok(MoveOutcome::Moved)
    }

    pub fn is_pending(&self, candidate_id: &CandidateId) -> bool {
        lock_pending(&self.pending).contains(candidate_id)
    }

    /// Candidates whose move controls should be disabled.
    pub fn pending_candidates(&self) -> HashSet<CandidateId> {
        lock_pending(&self.pending).clone()
    }
}

/// Pending-set entry for one candidate. Dropping it releases the candidate,
/// including when the move future is cancelled mid-request.
struct PendingMove<'a> {
    pending: &'a Mutex<HashSet<CandidateId>>,
    candidate_id: CandidateId,
}

impl<'a> PendingMove<'a> {
    fn claim(
        pending: &'a Mutex<HashSet<CandidateId>>,
        candidate_id: &CandidateId,
    ) -> Option<Self> {
        if !lock_pending(pending).insert(candidate_id.clone()) {
            return None;
        }
        Some(Self {
            pending,
            candidate_id: candidate_id.clone(),
        })
    }
}

impl Drop for PendingMove<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.candidate_id);
    }
}

// The set is only touched in short sync sections, so a poisoned lock still
// holds a consistent set.
fn lock_pending(pending: &Mutex<HashSet<CandidateId>>) -> MutexGuard<'_, HashSet<CandidateId>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
