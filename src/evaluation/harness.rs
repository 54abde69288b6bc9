use crate::core::Matcher;
use crate::error::MatchError;
use crate::evaluation::metrics::{average_precision, diversity, ndcg_at_k, precision_at_k};
use crate::models::{
    ConfigOverlay, FacultyId, FacultyProfile, LexicalMode, MatchOptions, ModifierConfig, ProviderToggles, ResumeProfile,
    WeightConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::info;
use validator::Validate;

pub const PRECISION_AT_K: &str = "precision_at_k";
pub const MEAN_AVERAGE_PRECISION: &str = "mean_average_precision";
pub const NDCG_AT_K: &str = "ndcg_at_k";
pub const DIVERSITY_DEPARTMENTS: &str = "diversity_departments";
pub const DIVERSITY_UNIVERSITIES: &str = "diversity_universities";

/// Graded relevance of one faculty member for a case: 3 perfect, 2 strong, 1 weak, 0 not relevant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RelevanceLabel {
    pub faculty_id: FacultyId,
    #[validate(range(max = 3))]
    pub grade: u8,
}

/// Labelled resume and faculty batch used for offline evaluation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GroundTruthCase {
    #[serde(default)]
    pub name: Option<String>,
    #[validate(nested)]
    pub resume: ResumeProfile,
    #[validate(nested)]
    pub faculty: Vec<FacultyProfile>,
    /// Unlabelled faculty count as grade 0
    #[serde(default)]
    #[validate(nested)]
    pub labels: Vec<RelevanceLabel>,
}

impl GroundTruthCase {
    pub fn grade(&self, id: &FacultyId) -> u8 {
        self.labels
            .iter()
            .find(|l| &l.faculty_id == id)
            .map_or(0, |l| l.grade)
    }

    fn all_grades(&self) -> Vec<u8> {
        self.faculty.iter().map(|f| self.grade(&f.id)).collect()
    }
}

/// Metrics of one case under one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub case: String,
    pub precision_at_k: f64,
    pub average_precision: f64,
    pub ndcg_at_k: f64,
    pub diversity_departments: usize,
    pub diversity_universities: usize,
    pub ranking: Vec<FacultyId>,
}

/// Averaged metrics of one configuration over all cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigReport {
    pub name: String,
    pub weights: WeightConfig,
    pub modifiers: ModifierConfig,
    pub providers: ProviderToggles,
    pub lexical_mode: LexicalMode,
    pub boosted_areas: usize,
    pub metrics: BTreeMap<String, f64>,
    /// Signed difference against the baseline; absent for the baseline itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deltas: Option<BTreeMap<String, f64>>,
    pub cases: Vec<CaseReport>,
    pub elapsed_ms: f64,
    /// Mean wall time of one case
    pub mean_case_ms: f64,
    /// Change in mean case time against the baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_case_ms_delta: Option<f64>,
}

/// Result of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub case_count: usize,
    pub configs: Vec<ConfigReport>,
}

impl EvaluationReport {
    pub fn baseline(&self) -> Option<&ConfigReport> {
        self.configs.first()
    }
}

/// Evaluate the matcher's own configuration plus every candidate overlay
///
/// The matcher's configuration is the baseline; each entry of `candidates` is
/// layered over it (weights, boosts, modifiers, provider toggles, lexical
/// mode) and reported with deltas against the baseline. Ground truth is only
/// read.
///
/// # Arguments
/// * `matcher` - Matcher whose configuration is the baseline
/// * `cases` - Labelled cases
/// * `candidates` - Configurations to compare against the baseline
/// * `k` - Cutoff for precision, NDCG and diversity
pub fn evaluate(
    matcher: &Matcher,
    cases: &[GroundTruthCase],
    candidates: &[ConfigOverlay],
    k: usize,
) -> Result<EvaluationReport, MatchError> {
    if k == 0 {
        return Err(MatchError::Config("evaluation cutoff k must be at least 1".to_string()));
    }
    for case in cases {
        case.validate()?;
    }

    let mut runs = vec![("default".to_string(), matcher.clone())];
    for (i, overlay) in candidates.iter().enumerate() {
        let config = overlay.apply(matcher.config());
        config.validate()?;
        let name = overlay.name.clone().unwrap_or_else(|| format!("candidate_{}", i + 1));
        runs.push((name, matcher.with_config(config)));
    }

    let mut configs = Vec::with_capacity(runs.len());
    for (name, run) in &runs {
        configs.push(evaluate_config(run, cases, name.clone(), k)?);
    }

    let (baseline, baseline_ms) = configs
        .first()
        .map(|c| (c.metrics.clone(), c.mean_case_ms))
        .unwrap_or_default();
    for report in configs.iter_mut().skip(1) {
        report.deltas = Some(
            report
                .metrics
                .iter()
                .map(|(metric, value)| (metric.clone(), value - baseline.get(metric).copied().unwrap_or(0.0)))
                .collect(),
        );
        report.mean_case_ms_delta = Some(report.mean_case_ms - baseline_ms);
    }

    Ok(EvaluationReport {
        k,
        case_count: cases.len(),
        configs,
    })
}

fn evaluate_config(
    matcher: &Matcher,
    cases: &[GroundTruthCase],
    name: String,
    k: usize,
) -> Result<ConfigReport, MatchError> {
    let started = Instant::now();
    let options = MatchOptions::default();
    let never = AtomicBool::new(false);

    let mut reports = Vec::with_capacity(cases.len());
    for (index, case) in cases.iter().enumerate() {
        let response = matcher.find_matches(&case.resume, &case.faculty, &options, &never)?;
        let grades: Vec<u8> = response.matches.iter().map(|m| case.grade(&m.faculty_id)).collect();
        let relevant: Vec<bool> = grades.iter().map(|g| *g > 0).collect();
        let (departments, universities) = diversity(&response.matches, k);

        reports.push(CaseReport {
            case: case
                .name
                .clone()
                .unwrap_or_else(|| format!("case_{}", index + 1)),
            precision_at_k: precision_at_k(&relevant, k),
            average_precision: average_precision(&relevant),
            ndcg_at_k: ndcg_at_k(&grades, &case.all_grades(), k),
            diversity_departments: departments,
            diversity_universities: universities,
            ranking: response.matches.into_iter().map(|m| m.faculty_id).collect(),
        });
    }

    let metrics = mean_metrics(&reports);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        "Evaluated {} on {} cases: P@{} {:.3}, MAP {:.3}, NDCG@{} {:.3}",
        name,
        reports.len(),
        k,
        metrics[PRECISION_AT_K],
        metrics[MEAN_AVERAGE_PRECISION],
        k,
        metrics[NDCG_AT_K]
    );

    let config = matcher.config();
    Ok(ConfigReport {
        name,
        weights: config.weights.clone(),
        modifiers: config.modifiers,
        providers: config.providers,
        lexical_mode: config.lexical_mode,
        boosted_areas: config.boosts.iter().count(),
        mean_case_ms: elapsed_ms / reports.len().max(1) as f64,
        metrics,
        deltas: None,
        cases: reports,
        elapsed_ms,
        mean_case_ms_delta: None,
    })
}

fn mean_metrics(reports: &[CaseReport]) -> BTreeMap<String, f64> {
    let n = reports.len().max(1) as f64;
    let mean = |f: fn(&CaseReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    BTreeMap::from([
        (PRECISION_AT_K.to_string(), mean(|r| r.precision_at_k)),
        (MEAN_AVERAGE_PRECISION.to_string(), mean(|r| r.average_precision)),
        (NDCG_AT_K.to_string(), mean(|r| r.ndcg_at_k)),
        (DIVERSITY_DEPARTMENTS.to_string(), mean(|r| r.diversity_departments as f64)),
        (DIVERSITY_UNIVERSITIES.to_string(), mean(|r| r.diversity_universities as f64)),
    ])
}
