use crate::core::weights::ResolvedWeights;
use crate::models::{FacultyProfile, ModifierConfig, QualityModifiers, SignalContribution, SignalScore};

/// h-index at which the h-index curve reaches ~63%
const H_INDEX_SCALE: f64 = 20.0;
const CITATION_SCALE: f64 = 2500.0;
const FUNDING_AMOUNT_SCALE: f64 = 2_000_000.0;
const GRANT_COUNT_SCALE: f64 = 4.0;
const ACTIVE_GRANT_SCALE: f64 = 2.0;

const PRESTIGIOUS_AWARDS: &[&str] = &[
    "turing",
    "nobel",
    "fields medal",
    "national academy",
    "acm fellow",
    "ieee fellow",
    "nsf career",
];

const MAJOR_AWARDS: &[&str] = &[
    "best paper",
    "distinguished",
    "outstanding",
    "excellence",
    "research award",
    "teaching award",
];

/// Aggregated score of one pair, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub base_score: f64,
    pub overall_score: f64,
    pub breakdown: Vec<SignalContribution>,
}

/// Combine normalized signals with resolved weights, then apply the quality multiplier
///
/// Scoring formula:
/// base = sum(weight * normalized)
/// overall = min(1, base * multiplier)
///
/// Both factors are non-negative and the multiplier does not depend on any
/// signal, so raising one signal never lowers the overall score.
pub fn aggregate(scores: &[SignalScore], weights: &ResolvedWeights, modifiers: &QualityModifiers) -> Aggregate {
    let breakdown: Vec<SignalContribution> = scores
        .iter()
        .map(|score| SignalContribution {
            signal: score.signal,
            raw_score: score.raw,
            normalized_score: score.normalized,
            weight_used: weights.get(score.signal),
            available: score.available,
        })
        .collect();

    let base_score = breakdown
        .iter()
        .map(|c| c.weight_used * c.normalized_score)
        .sum::<f64>()
        .clamp(0.0, 1.0);

    Aggregate {
        base_score,
        overall_score: (base_score * modifiers.multiplier).clamp(0.0, 1.0),
        breakdown,
    }
}

/// Profile-quality modifiers for one faculty member
///
/// # Arguments
/// * `faculty` - The faculty profile being scored
/// * `config` - Component weights and the maximum shift
pub fn quality_modifiers(faculty: &FacultyProfile, config: &ModifierConfig) -> QualityModifiers {
    let citation_impact = citation_impact(faculty);
    let award_recognition = award_recognition(faculty);
    let funding = funding_strength(faculty);

    let total_weight = config.citation_weight + config.awards_weight + config.funding_weight;
    let quality = if total_weight > 0.0 {
        ((citation_impact * config.citation_weight
            + award_recognition * config.awards_weight
            + funding * config.funding_weight)
            / total_weight)
            .clamp(0.0, 1.0)
    } else {
        0.0
    };

    QualityModifiers {
        citation_impact,
        award_recognition,
        funding,
        quality,
        multiplier: 1.0 + config.max_shift * quality,
    }
}

/// Citation impact (0-1) from h-index and total citations
///
/// Explicit metrics win; otherwise both are derived from per-publication
/// citation counts.
pub fn citation_impact(faculty: &FacultyProfile) -> f64 {
    let metrics = faculty.citation_metrics.unwrap_or_default();
    let h_index = metrics.h_index.map(f64::from).unwrap_or_else(|| {
        let counts: Vec<u64> = faculty.publications.iter().filter_map(|p| p.citation_count).collect();
        h_index(&counts) as f64
    });
    let citations = metrics
        .total_citations
        .unwrap_or_else(|| faculty.publication_citations()) as f64;

    0.7 * saturate(h_index, H_INDEX_SCALE) + 0.3 * saturate(citations, CITATION_SCALE)
}

/// Award recognition (0-1); each award counts once at its highest tier
pub fn award_recognition(faculty: &FacultyProfile) -> f64 {
    let points: f64 = faculty
        .awards
        .iter()
        .map(|award| {
            let name = award.name.to_lowercase();
            if PRESTIGIOUS_AWARDS.iter().any(|term| name.contains(term)) {
                0.5
            } else if MAJOR_AWARDS.iter().any(|term| name.contains(term)) {
                0.3
            } else {
                0.1
            }
        })
        .sum();
    saturate(points, 1.0)
}

/// Funding strength (0-1) from total amount, grant count and active grants
pub fn funding_strength(faculty: &FacultyProfile) -> f64 {
    if faculty.funding.is_empty() {
        return 0.0;
    }
    let amount: f64 = faculty
        .funding
        .iter()
        .filter_map(|f| f.amount)
        .filter(|a| a.is_finite() && *a > 0.0)
        .sum();
    let grants = faculty.funding.len() as f64;
    let active = faculty.funding.iter().filter(|f| f.active).count() as f64;

    0.4 * saturate(amount, FUNDING_AMOUNT_SCALE)
        + 0.3 * saturate(grants, GRANT_COUNT_SCALE)
        + 0.3 * saturate(active, ACTIVE_GRANT_SCALE)
}

/// Largest h such that h counts are at least h
pub fn h_index(citation_counts: &[u64]) -> u32 {
    let mut counts = citation_counts.to_vec();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    counts
        .iter()
        .enumerate()
        .take_while(|(i, c)| **c >= (*i as u64) + 1)
        .count() as u32
}

/// Monotonic diminishing-returns curve: 1 - e^(-x / scale)
#[inline]
fn saturate(value: f64, scale: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    1.0 - (-value / scale).exp()
}
