use crate::models::domain::FacultyId;
use crate::models::signals::Signal;
use serde::{Deserialize, Serialize};

/// One line of a result's explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    #[serde(rename = "signal_name")]
    pub signal: Signal,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub weight_used: f64,
    pub available: bool,
}

/// Profile-quality adjustments applied on top of the weighted signal sum
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityModifiers {
    pub citation_impact: f64,
    pub award_recognition: f64,
    pub funding: f64,
    /// Weighted mean of the three components, in [0, 1]
    pub quality: f64,
    /// Factor applied to the base score, within [1, 1 + max_shift]
    pub multiplier: f64,
}

/// Ranked match for one faculty member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub faculty_id: FacultyId,
    pub name: String,
    pub university: Option<String>,
    pub department: Option<String>,
    /// 1-based position in the ranking
    pub rank: usize,
    pub overall_score: f64,
    /// Weighted signal sum before quality modifiers
    pub base_score: f64,
    pub domain_boost: f64,
    /// True when no signal was usable and the keyword fallback weight was applied
    pub fallback: bool,
    pub breakdown: Vec<SignalContribution>,
    pub modifiers: QualityModifiers,
}

impl MatchResult {
    pub fn contribution(&self, signal: Signal) -> Option<&SignalContribution> {
        self.breakdown.iter().find(|c| c.signal == signal)
    }
}

/// Response for one matching request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub request_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub total_candidates: usize,
    pub matches: Vec<MatchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_serializes_signal_name() {
        let contribution = SignalContribution {
            signal: Signal::Keyword,
            raw_score: 0.5,
            normalized_score: 0.5,
            weight_used: 1.0,
            available: true,
        };
        let json = serde_json::to_value(&contribution).unwrap();
        assert_eq!(json["signal_name"], "keyword");
        assert_eq!(json["weight_used"], 1.0);
    }
}
