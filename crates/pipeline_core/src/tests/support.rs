//! In-memory backend and fixtures shared by the engine's unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{Candidate, CandidateId, Job, JobId, Stage, StageId},
    protocol::PipelineResponse,
};
use tokio::sync::{Mutex, Semaphore};

use crate::{
    api::PipelineApi,
    data_source::ReloadHook,
    error::{PipelineError, Result},
};

pub(crate) fn stage(id: &str, order: i64, name: &str) -> Stage {
    Stage {
        id: StageId::from(id),
        name: name.to_string(),
        order,
    }
}

pub(crate) fn candidate(id: &str, stage_id: &str, name: &str, score: Option<f64>) -> Candidate {
    let mut candidate = Candidate::new(id, stage_id);
    candidate.name = Some(name.to_string());
    candidate.match_score = score;
    candidate
}

pub(crate) fn job_id() -> JobId {
    JobId::from("job-1")
}

/// Applied/Offer board with one scored (c1) and one unscored (c2) candidate.
pub(crate) fn sample_pipeline() -> PipelineResponse {
    PipelineResponse {
        job: Job {
            id: job_id(),
            title: "Backend Engineer".into(),
        },
        stages: vec![stage("s2", 1, "Offer"), stage("s1", 0, "Applied")],
        candidates: vec![
            candidate("c1", "s1", "Amy", Some(85.0)),
            candidate("c2", "s1", "Bob", None),
        ],
    }
}

/// Backend double. Updates are applied to the stored pipeline so later fetches
/// observe them; gates hold calls until permits are added.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub pipeline: Mutex<Option<PipelineResponse>>,
    pub fetch_error: Mutex<Option<(u16, String)>>,
    pub update_error: Mutex<Option<(u16, String)>>,
    pub fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    pub update_gate: Mutex<Option<Arc<Semaphore>>>,
    pub fetch_calls: AtomicUsize,
    pub update_calls: Mutex<Vec<(CandidateId, StageId)>>,
}

impl FakeApi {
    pub fn with_pipeline(pipeline: PipelineResponse) -> Arc<Self> {
        let api = Self::default();
        *api.pipeline.try_lock().expect("fresh lock") = Some(pipeline);
        Arc::new(api)
    }

    pub async fn fail_fetches(&self, status: u16, message: &str) {
        *self.fetch_error.lock().await = Some((status, message.to_string()));
    }

    pub async fn succeed_fetches(&self) {
        *self.fetch_error.lock().await = None;
    }

    pub async fn fail_updates(&self, status: u16, message: &str) {
        *self.update_error.lock().await = Some((status, message.to_string()));
    }

    pub async fn gate_fetches(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.fetch_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub async fn gate_updates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.update_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub async fn update_count(&self) -> usize {
        self.update_calls.lock().await.len()
    }
}

async fn pass_gate(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().await.clone();
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn fetch_pipeline(&self, _job_id: &JobId) -> Result<PipelineResponse> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(&self.fetch_gate).await;

        if let Some((status, message)) = self.fetch_error.lock().await.clone() {
            return Err(PipelineError::Status { status, message });
        }
        self.pipeline
            .lock()
            .await
            .clone()
            .ok_or_else(|| PipelineError::Status {
                status: 404,
                message: "job not found".into(),
            })
    }

    async fn update_candidate_stage(
        &self,
        candidate_id: &CandidateId,
        stage_id: &StageId,
    ) -> Result<()> {
        self.update_calls
            .lock()
            .await
            .push((candidate_id.clone(), stage_id.clone()));
        pass_gate(&self.update_gate).await;

        if let Some((status, message)) = self.update_error.lock().await.clone() {
            return Err(PipelineError::Status { status, message });
        }
        if let Some(pipeline) = self.pipeline.lock().await.as_mut() {
            if let Some(candidate) = pipeline
                .candidates
                .iter_mut()
                .find(|c| &c.id == candidate_id)
            {
                candidate.stage_id = stage_id.clone();
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct CountingReload {
    pub calls: AtomicUsize,
    pub fail_with: Option<String>,
}

#[async_trait]
impl ReloadHook for CountingReload {
    async fn reload(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(PipelineError::Reload(message.clone())),
            None => Ok(()),
        }
    }
}

/// Polls `condition` until it holds or roughly two seconds pass.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
