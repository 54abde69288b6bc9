use crate::models::MatchResult;
use std::collections::BTreeSet;

/// Fraction of the top-k results that are relevant
///
/// The denominator is `min(k, len)`, so a short ranking is not penalised for
/// results it never had.
pub fn precision_at_k(relevant: &[bool], k: usize) -> f64 {
    let depth = k.min(relevant.len());
    if depth == 0 {
        return 0.0;
    }
    relevant[..depth].iter().filter(|r| **r).count() as f64 / depth as f64
}

/// Mean of the precision values at each relevant rank of the full ranking
pub fn average_precision(relevant: &[bool]) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, is_relevant) in relevant.iter().enumerate() {
        if *is_relevant {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

/// Discounted cumulative gain over the first `k` grades: rel / log2(rank + 1)
pub fn dcg_at_k(grades: &[u8], k: usize) -> f64 {
    grades
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, grade)| f64::from(*grade) / ((i + 2) as f64).log2())
        .sum()
}

/// DCG of the ranking divided by the DCG of the ideal ordering of all labels
///
/// # Arguments
/// * `ranked` - Grades in ranked order
/// * `labels` - Every grade of the case, in any order
/// * `k` - Cutoff depth
pub fn ndcg_at_k(ranked: &[u8], labels: &[u8], k: usize) -> f64 {
    let mut ideal = labels.to_vec();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let ideal_dcg = dcg_at_k(&ideal, k);
    if ideal_dcg <= 0.0 {
        return 0.0;
    }
    dcg_at_k(ranked, k) / ideal_dcg
}

/// Distinct departments and universities among the top-k results
///
/// Results without the field do not count.
pub fn diversity(results: &[MatchResult], k: usize) -> (usize, usize) {
    let top = &results[..k.min(results.len())];
    let departments: BTreeSet<String> = top
        .iter()
        .filter_map(|r| r.department.as_deref())
        .map(|d| d.trim().to_lowercase())
        .collect();
    let universities: BTreeSet<String> = top
        .iter()
        .filter_map(|r| r.university.as_deref())
        .map(|u| u.trim().to_lowercase())
        .collect();
    (departments.len(), universities.len())
}
