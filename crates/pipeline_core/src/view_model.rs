//! Render-ready board derived from a data source snapshot and the live filters.

use std::{collections::HashSet, sync::Arc};

use shared::domain::{Candidate, CandidateId, FilterState, Job, Stage, StageId};

use crate::{bucket::bucketize, data_source::PipelineSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct StageColumn {
    pub stage_id: StageId,
    /// Stage name, or the raw stage id for stages the stage list lacks.
    pub name: String,
    pub order: Option<i64>,
    pub known: bool,
    pub candidates: Vec<Candidate>,
}

impl StageColumn {
    pub fn count(&self) -> usize {
        self.candidates.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub columns: Vec<StageColumn>,
    pub total_visible: usize,
    pub total_candidates: usize,
}

impl Board {
    pub fn column(&self, stage_id: &StageId) -> Option<&StageColumn> {
        self.columns.iter().find(|column| &column.stage_id == stage_id)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineView {
    pub job: Option<Job>,
    pub board: Arc<Board>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub editable: bool,
    pub moving: HashSet<CandidateId>,
}

impl PipelineView {
    /// Loading skeleton: the first fetch has not produced a job yet.
    pub fn show_skeleton(&self) -> bool {
        self.is_loading && self.job.is_none()
    }

    /// Whether the stage selector for `candidate_id` should be enabled.
    pub fn can_move(&self, candidate_id: &CandidateId) -> bool {
        self.editable && !self.moving.contains(candidate_id)
    }

    pub fn column(&self, stage_id: &StageId) -> Option<&StageColumn> {
        self.board.column(stage_id)
    }
}

struct Memo {
    stages: Option<Arc<Vec<Stage>>>,
    candidates: Option<Arc<Vec<Candidate>>>,
    filters: FilterState,
    board: Arc<Board>,
}

/// Holds the filter state and the last derived board. The board is rebuilt only
/// when the snapshot's stage or candidate collections or the filters change.
pub struct PipelineViewModel {
    filters: FilterState,
    editable: bool,
    memo: Option<Memo>,
}

impl PipelineViewModel {
    /// `editable` is the caller's capability decision; read-only viewers get
    /// every move control disabled.
    pub fn new(editable: bool) -> Self {
        Self {
            filters: FilterState::default(),
            editable,
            memo: None,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
    }

    pub fn set_min_score(&mut self, min_score: Option<f64>) {
        self.filters.min_score = min_score;
    }

    pub fn set_ai_only(&mut self, ai_only: bool) {
        self.filters.ai_only = ai_only;
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterState::default();
    }

    pub fn board(&mut self, snapshot: &PipelineSnapshot) -> Arc<Board> {
        if let Some(memo) = &self.memo {
            if same(&memo.stages, &snapshot.stages)
                && same(&memo.candidates, &snapshot.candidates)
                && memo.filters == self.filters
            {
                return Arc::clone(&memo.board);
            }
        }

        let board = Arc::new(build_board(snapshot, &self.filters));
        self.memo = Some(Memo {
            stages: snapshot.stages.clone(),
            candidates: snapshot.candidates.clone(),
            filters: self.filters.clone(),
            board: Arc::clone(&board),
        });
        board
    }

    pub fn view(
        &mut self,
        snapshot: &PipelineSnapshot,
        moving: HashSet<CandidateId>,
    ) -> PipelineView {
        PipelineView {
            job: snapshot.job.clone(),
            board: self.board(snapshot),
            is_loading: snapshot.is_loading,
            error: snapshot.error.clone(),
            editable: self.editable,
            moving,
        }
    }
}

fn same<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn build_board(snapshot: &PipelineSnapshot, filters: &FilterState) -> Board {
    let buckets = bucketize(snapshot.stages(), snapshot.candidates(), filters);
    let total_visible = buckets.total_visible();
    let columns = buckets
        .into_buckets()
        .into_iter()
        .map(|bucket| {
            let (name, order) = match &bucket.stage {
                Some(stage) => (stage.name.clone(), Some(stage.order)),
                None => (bucket.stage_id.to_string(), None),
            };
            StageColumn {
                known: bucket.stage.is_some(),
                stage_id: bucket.stage_id,
                name,
                order,
                candidates: bucket.candidates,
            }
        })
        .collect();

    Board {
        columns,
        total_visible,
        total_candidates: snapshot.candidates().len(),
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
