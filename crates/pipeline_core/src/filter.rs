//! Candidate inclusion under the board's live filters.
//!
//! Every active filter is an independent predicate; a candidate is visible only
//! when all of them accept it.
//!
//! - `search`: trimmed, lowercased substring of the lowercased name or email.
//!   A missing name or email never matches a non-empty search.
//! - `ai_only`: the candidate must carry a match score.
//! - `min_score`: the candidate must carry a match score of at least the floor.
//!   Unscored candidates never pass a floor.

use shared::domain::{Candidate, FilterState};

pub fn matches(candidate: &Candidate, filters: &FilterState) -> bool {
    CandidateFilter::new(filters).accepts(candidate)
}

/// A [`FilterState`] with its search needle normalized once, for use across a
/// whole candidate list.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    needle: String,
    ai_only: bool,
    min_score: Option<f64>,
}

impl CandidateFilter {
    pub fn new(filters: &FilterState) -> Self {
        Self {
            needle: filters.search.trim().to_lowercase(),
            ai_only: filters.ai_only,
            min_score: filters.min_score,
        }
    }

    pub fn accepts(&self, candidate: &Candidate) -> bool {
        self.accepts_search(candidate)
            && self.accepts_ai_only(candidate)
            && self.accepts_min_score(candidate)
    }

    fn accepts_search(&self, candidate: &Candidate) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .map(|value| value.to_lowercase().contains(&self.needle))
                .unwrap_or(false)
        };
        contains(&candidate.name) || contains(&candidate.email)
    }

    fn accepts_ai_only(&self, candidate: &Candidate) -> bool {
        !self.ai_only || candidate.match_score.is_some()
    }

    fn accepts_min_score(&self, candidate: &Candidate) -> bool {
        match (self.min_score, candidate.match_score) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(floor), Some(score)) => score >= floor,
        }
    }
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
