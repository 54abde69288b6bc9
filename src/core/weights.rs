use crate::core::text::{contains_phrase, words};
use crate::models::{DomainBoosts, Signal, SignalScore, WeightConfig};
use std::collections::BTreeMap;

/// Effective per-signal weights for one pair
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeights {
    weights: BTreeMap<Signal, f64>,
    /// True when no signal was available and the keyword fallback applied
    pub fallback: bool,
}

impl ResolvedWeights {
    pub fn get(&self, signal: Signal) -> f64 {
        self.weights.get(&signal).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.weights.iter().map(|(s, w)| (*s, *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Boost factor for a resume's research interests
///
/// Returns the largest multiplier whose keyword appears as a whole-word phrase
/// in the joined interests, or 1.0 when nothing matches.
pub fn domain_boost(boosts: &DomainBoosts, research_interests: &[String]) -> f64 {
    let interests = words(&research_interests.join(" "));
    boosts
        .iter()
        .filter(|(keyword, _)| contains_phrase(&interests, &words(keyword)))
        .map(|(_, factor)| factor)
        .fold(None, |best: Option<f64>, factor| Some(best.map_or(factor, |b| b.max(factor))))
        .unwrap_or(1.0)
}

/// Resolve the weights used for one pair
///
/// Steps, in order: base weights, zero for unavailable signals, boost on the
/// interest signals, renormalize to 1. With nothing left, the keyword signal
/// takes the full weight so every pair still gets a score.
///
/// # Arguments
/// * `base` - Configured or per-request base weights
/// * `scores` - Normalized scores of the pair, one per signal
/// * `boost` - Domain boost for the request's resume
pub fn resolve_weights(base: &WeightConfig, scores: &[SignalScore], boost: f64) -> ResolvedWeights {
    let mut weights: BTreeMap<Signal, f64> = Signal::ALL.iter().map(|s| (*s, 0.0)).collect();

    for score in scores.iter().filter(|s| s.available) {
        let mut weight = base.get(score.signal);
        if score.signal.is_interest() {
            weight *= boost;
        }
        weights.insert(score.signal, weight);
    }

    let total: f64 = weights.values().sum();
    if total <= 0.0 || !total.is_finite() {
        weights.values_mut().for_each(|w| *w = 0.0);
        weights.insert(Signal::Keyword, 1.0);
        return ResolvedWeights { weights, fallback: true };
    }

    weights.values_mut().for_each(|w| *w /= total);
    ResolvedWeights {
        weights,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawScore;
    use crate::core::normalizer::normalize;

    fn scores(available: &[(Signal, f64)]) -> Vec<SignalScore> {
        Signal::ALL
            .iter()
            .map(|signal| match available.iter().find(|(s, _)| s == signal) {
                Some((_, v)) => normalize(*signal, RawScore::available(*v)),
                None => SignalScore::unavailable(*signal),
            })
            .collect()
    }

    fn interests(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_available_sum_to_one() {
        let all = scores(&[
            (Signal::Lexical, 0.4),
            (Signal::Semantic, 0.1),
            (Signal::Keyword, 0.2),
            (Signal::Structured, 1.0),
        ]);
        let resolved = resolve_weights(&WeightConfig::default(), &all, 1.0);
        assert!((resolved.total() - 1.0).abs() < 1e-9);
        assert!(!resolved.fallback);
        assert!((resolved.get(Signal::Lexical) - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_unavailable_weight_redistributed() {
        let partial = scores(&[(Signal::Keyword, 0.5), (Signal::Structured, 0.5)]);
        let resolved = resolve_weights(&WeightConfig::default(), &partial, 1.0);
        assert_eq!(resolved.get(Signal::Lexical), 0.0);
        assert_eq!(resolved.get(Signal::Semantic), 0.0);
        assert!((resolved.get(Signal::Keyword) - 0.4).abs() < 1e-9);
        assert!((resolved.get(Signal::Structured) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_boost_raises_interest_share() {
        let all = scores(&[
            (Signal::Lexical, 0.4),
            (Signal::Semantic, 0.1),
            (Signal::Keyword, 0.2),
            (Signal::Structured, 1.0),
        ]);
        let plain = resolve_weights(&WeightConfig::default(), &all, 1.0);
        let boosted = resolve_weights(&WeightConfig::default(), &all, 1.2);
        assert!(boosted.get(Signal::Lexical) > plain.get(Signal::Lexical));
        assert!(boosted.get(Signal::Keyword) < plain.get(Signal::Keyword));
        assert!((boosted.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_when_nothing_available() {
        let resolved = resolve_weights(&WeightConfig::default(), &scores(&[]), 1.0);
        assert!(resolved.fallback);
        assert_eq!(resolved.get(Signal::Keyword), 1.0);
        assert_eq!(resolved.total(), 1.0);
    }

    #[test]
    fn test_fallback_when_available_weights_are_zero() {
        let weights = WeightConfig::new([(Signal::Lexical, 1.0)]).unwrap();
        let resolved = resolve_weights(&weights, &scores(&[(Signal::Structured, 1.0)]), 1.0);
        assert!(resolved.fallback);
        assert_eq!(resolved.get(Signal::Keyword), 1.0);
    }

    #[test]
    fn test_domain_boost_picks_max_match() {
        let boosts = DomainBoosts::default();
        assert_eq!(domain_boost(&boosts, &interests(&["Machine Learning", "Robotics"])), 1.2);
        assert_eq!(domain_boost(&boosts, &interests(&["Computer Vision"])), 1.15);
        assert_eq!(domain_boost(&boosts, &interests(&["Medieval History"])), 1.0);
        assert_eq!(domain_boost(&boosts, &[]), 1.0);
        assert_eq!(domain_boost(&DomainBoosts::empty(), &interests(&["Robotics"])), 1.0);
    }

    #[test]
    fn test_domain_boost_needs_whole_words() {
        let boosts = DomainBoosts::default();
        // "robotics" must not match inside "neurorobotics"
        assert_eq!(domain_boost(&boosts, &interests(&["Neurorobotics"])), 1.0);
    }
}
