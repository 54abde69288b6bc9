use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One independent similarity measurement between a resume and a faculty profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// TF-IDF cosine over interest and publication text
    Lexical,
    /// Dense embedding cosine over interest and publication text
    Semantic,
    /// Jaccard overlap of extracted keywords
    Keyword,
    /// Education field and publication venue overlap
    Structured,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::Lexical,
        Signal::Semantic,
        Signal::Keyword,
        Signal::Structured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Lexical => "lexical",
            Signal::Semantic => "semantic",
            Signal::Keyword => "keyword",
            Signal::Structured => "structured",
        }
    }

    /// Signals that measure research-interest similarity; domain boosts apply to these
    pub fn is_interest(self) -> bool {
        matches!(self, Signal::Lexical | Signal::Semantic)
    }

    /// Known raw output range of the provider behind this signal
    ///
    /// TF-IDF vectors are non-negative, so the lexical cosine never leaves
    /// [0, 1]. Dense embeddings can point in opposite directions.
    pub fn output_range(self) -> (f64, f64) {
        match self {
            Signal::Semantic => (-1.0, 1.0),
            Signal::Lexical | Signal::Keyword | Signal::Structured => (0.0, 1.0),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexical" => Ok(Signal::Lexical),
            "semantic" => Ok(Signal::Semantic),
            "keyword" => Ok(Signal::Keyword),
            "structured" => Ok(Signal::Structured),
            other => Err(MatchError::Config(format!("unknown signal '{}'", other))),
        }
    }
}

/// Raw provider output before normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScore {
    pub value: f64,
    pub available: bool,
}

impl RawScore {
    pub fn available(value: f64) -> Self {
        Self { value, available: true }
    }

    pub fn unavailable() -> Self {
        Self { value: 0.0, available: false }
    }
}

/// Score of one signal for one (resume, faculty) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub signal: Signal,
    pub raw: f64,
    /// Always within [0, 1]; zero when unavailable
    pub normalized: f64,
    pub available: bool,
}

impl SignalScore {
    pub fn unavailable(signal: Signal) -> Self {
        Self {
            signal,
            raw: 0.0,
            normalized: 0.0,
            available: false,
        }
    }
}
