use super::*;

fn candidate(name: Option<&str>, email: Option<&str>, score: Option<f64>) -> Candidate {
    let mut candidate = Candidate::new("c1", "s1");
    candidate.name = name.map(str::to_string);
    candidate.email = email.map(str::to_string);
    candidate.match_score = score;
    candidate
}

fn search(term: &str) -> FilterState {
    FilterState {
        search: term.to_string(),
        ..FilterState::default()
    }
}

#[test]
fn empty_filters_accept_everything() {
    let filters = FilterState::default();
    assert!(matches(&candidate(None, None, None), &filters));
    assert!(matches(&candidate(Some("Amy"), None, Some(10.0)), &filters));
}

#[test]
fn search_is_trimmed_and_case_insensitive_over_name() {
    let amy = candidate(Some("Amy Pond"), None, None);
    assert!(matches(&amy, &search("  POND ")));
    assert!(!matches(&amy, &search("rory")));
}

#[test]
fn search_also_matches_email() {
    let amy = candidate(Some("Amy"), Some("amy@Tardis.io"), None);
    assert!(matches(&amy, &search("tardis")));
}

#[test]
fn search_never_matches_missing_name_and_email() {
    let anonymous = candidate(None, None, Some(90.0));
    assert!(!matches(&anonymous, &search("a")));
    assert!(matches(&anonymous, &search("   ")));
}

#[test]
fn ai_only_requires_a_score() {
    let filters = FilterState {
        ai_only: true,
        ..FilterState::default()
    };
    assert!(matches(&candidate(None, None, Some(0.0)), &filters));
    assert!(!matches(&candidate(None, None, None), &filters));
}

#[test]
fn min_score_is_inclusive_and_rejects_unscored() {
    let filters = FilterState {
        min_score: Some(70.0),
        ..FilterState::default()
    };
    assert!(matches(&candidate(None, None, Some(70.0)), &filters));
    assert!(matches(&candidate(None, None, Some(99.5)), &filters));
    assert!(!matches(&candidate(None, None, Some(69.9)), &filters));
    assert!(!matches(&candidate(None, None, None), &filters));
}

#[test]
fn combined_filters_require_every_predicate() {
    let filters = FilterState {
        search: "amy".into(),
        min_score: Some(50.0),
        ai_only: true,
    };
    assert!(matches(&candidate(Some("Amy"), None, Some(80.0)), &filters));
    assert!(!matches(&candidate(Some("Amy"), None, Some(20.0)), &filters));
    assert!(!matches(&candidate(Some("Bob"), None, Some(80.0)), &filters));
    assert!(!matches(&candidate(Some("Amy"), None, None), &filters));
}

#[test]
fn compiled_filter_agrees_with_free_function() {
    let filters = search("bo");
    let compiled = CandidateFilter::new(&filters);
    for c in [
        candidate(Some("Bob"), None, None),
        candidate(Some("Amy"), Some("bob@x.io"), None),
        candidate(Some("Zoe"), None, None),
    ] {
        assert_eq!(compiled.accepts(&c), matches(&c, &filters));
    }
}
