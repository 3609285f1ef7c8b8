//! Partitioning of a flat candidate list into ordered per-stage buckets.

use std::{cmp::Ordering, collections::HashMap};

use shared::domain::{Candidate, FilterState, Stage, StageId};

use crate::{filter::CandidateFilter, sort::adaptive_sort_by};

/// Candidates assigned to one stage after filtering.
///
/// `stage` is `None` for ad-hoc buckets created for a `stage_id` the stage list
/// does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub stage_id: StageId,
    pub stage: Option<Stage>,
    pub candidates: Vec<Candidate>,
}

impl Bucket {
    pub fn is_known(&self) -> bool {
        self.stage.is_some()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Buckets in column order: known stages by ascending `order`, then ad-hoc
/// buckets in the order their stage ids were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageBuckets {
    buckets: Vec<Bucket>,
    index: HashMap<StageId, usize>,
}

impl StageBuckets {
    pub fn get(&self, stage_id: &StageId) -> Option<&Bucket> {
        self.index.get(stage_id).map(|&i| &self.buckets[i])
    }

    pub fn candidates(&self, stage_id: &StageId) -> &[Candidate] {
        self.get(stage_id)
            .map(|bucket| bucket.candidates.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_visible(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn into_buckets(self) -> Vec<Bucket> {
        self.buckets
    }

    fn bucket_mut(&mut self, stage_id: &StageId) -> &mut Bucket {
        let i = match self.index.get(stage_id) {
            Some(&i) => i,
            None => {
                self.buckets.push(Bucket {
                    stage_id: stage_id.clone(),
                    stage: None,
                    candidates: Vec::new(),
                });
                let i = self.buckets.len() - 1;
                self.index.insert(stage_id.clone(), i);
                i
            }
        };
        &mut self.buckets[i]
    }
}

/// Stages sorted ascending by `order`; ties keep their input order.
pub fn ordered_stages(stages: &[Stage]) -> Vec<Stage> {
    let mut ordered = stages.to_vec();
    ordered.sort_by_key(|stage| stage.order);
    ordered
}

pub fn bucketize(
    stages: &[Stage],
    candidates: &[Candidate],
    filters: &FilterState,
) -> StageBuckets {
    let mut buckets = StageBuckets::default();
    for stage in ordered_stages(stages) {
        // A duplicated stage id keeps its first (lowest order) column.
        if buckets.index.contains_key(&stage.id) {
            continue;
        }
        buckets.index.insert(stage.id.clone(), buckets.buckets.len());
        buckets.buckets.push(Bucket {
            stage_id: stage.id.clone(),
            stage: Some(stage),
            candidates: Vec::new(),
        });
    }

    let filter = CandidateFilter::new(filters);
    for candidate in candidates.iter().filter(|c| filter.accepts(c)) {
        buckets
            .bucket_mut(&candidate.stage_id)
            .candidates
            .push(candidate.clone());
    }

    for bucket in &mut buckets.buckets {
        adaptive_sort_by(&mut bucket.candidates, compare_candidates);
    }
    buckets
}

/// Pairwise bucket ordering: by `applied_at` when both sides have one,
/// otherwise by case-insensitive name with a missing name sorting as "".
///
/// Not transitive when dated and undated candidates mix.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    if let (Some(a_at), Some(b_at)) = (a.applied_at, b.applied_at) {
        return a_at.cmp(&b_at);
    }
    name_key(a).cmp(&name_key(b))
}

fn name_key(candidate: &Candidate) -> String {
    candidate
        .name
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/bucket_tests.rs"]
mod tests;
