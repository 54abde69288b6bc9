use crate::models::MatchResult;
use std::cmp::Ordering;

/// Order results and assign 1-based ranks
///
/// Sort by overall score (descending), then citation impact (descending), then
/// faculty id (ascending). The order is total, so the same input always gives
/// the same ranking.
///
/// # Arguments
/// * `results` - Scored results in any order
/// * `top_k` - Number of results to keep; `None` keeps all
pub fn rank(mut results: Vec<MatchResult>, top_k: Option<usize>) -> Vec<MatchResult> {
    results.sort_by(compare);

    if let Some(k) = top_k {
        results.truncate(k);
    }

    for (position, result) in results.iter_mut().enumerate() {
        result.rank = position + 1;
    }

    results
}

fn compare(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.overall_score
        .total_cmp(&a.overall_score)
        .then_with(|| b.modifiers.citation_impact.total_cmp(&a.modifiers.citation_impact))
        .then_with(|| a.faculty_id.cmp(&b.faculty_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FacultyId, QualityModifiers};

    fn create_result(id: impl Into<FacultyId>, score: f64, citation_impact: f64) -> MatchResult {
        let faculty_id = id.into();
        MatchResult {
            name: format!("Faculty {}", faculty_id),
            faculty_id,
            university: None,
            department: None,
            rank: 0,
            overall_score: score,
            base_score: score,
            domain_boost: 1.0,
            fallback: false,
            breakdown: vec![],
            modifiers: QualityModifiers {
                citation_impact,
                multiplier: 1.0,
                ..Default::default()
            },
        }
    }

    fn ids(results: &[MatchResult]) -> Vec<FacultyId> {
        results.iter().map(|r| r.faculty_id.clone()).collect()
    }

    #[test]
    fn test_sorted_by_score() {
        let ranked = rank(
            vec![create_result(1, 0.2, 0.0), create_result(2, 0.9, 0.0), create_result(3, 0.5, 0.0)],
            None,
        );
        assert_eq!(ids(&ranked), vec![FacultyId::from(2), FacultyId::from(3), FacultyId::from(1)]);
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_tie_break_citation_then_id() {
        let ranked = rank(
            vec![
                create_result(3, 0.5, 0.1),
                create_result(2, 0.5, 0.4),
                create_result(1, 0.5, 0.1),
            ],
            None,
        );
        assert_eq!(ids(&ranked), vec![FacultyId::from(2), FacultyId::from(1), FacultyId::from(3)]);
    }

    #[test]
    fn test_tie_break_is_stable_across_input_orders() {
        let forward = vec![create_result("b", 0.3, 0.0), create_result("a", 0.3, 0.0)];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(ids(&rank(forward, None)), ids(&rank(backward, None)));
    }

    #[test]
    fn test_top_k() {
        let results: Vec<MatchResult> = (0..10i64).map(|i| create_result(i, i as f64 / 10.0, 0.0)).collect();
        let ranked = rank(results.clone(), Some(3));
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].faculty_id, FacultyId::from(9));

        assert_eq!(rank(results.clone(), Some(50)).len(), 10);
        assert!(rank(results, Some(0)).is_empty());
    }
}
