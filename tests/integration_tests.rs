// Integration tests for Faculty Match

use faculty_match::core::{EmbeddingBackend, EmbeddingModel, EngineOptions, HashedNgramModel, MatchEngine, Matcher, ModelHandle};
use faculty_match::evaluation::{evaluate, synthetic_cases, synthetic_faculty};
use faculty_match::models::{
    Education, FacultyId, FacultyProfile, LexicalMode, MatchOptions, MatchRequest, MatchResponse, ProviderToggles, ResumeProfile,
    ScoringConfig, Signal, WeightConfig,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn create_test_faculty(id: i64, interests: &[&str], department: &str) -> FacultyProfile {
    let mut profile = FacultyProfile::new(
        id,
        format!("Dr. Faculty {}", id),
        interests.iter().map(|s| s.to_string()).collect(),
    );
    profile.department = Some(department.to_string());
    profile.university = Some("Stanford University".to_string());
    profile
}

fn create_test_resume(interests: &[&str], field: Option<&str>) -> ResumeProfile {
    ResumeProfile {
        name: Some("Test Student".to_string()),
        research_interests: interests.iter().map(|s| s.to_string()).collect(),
        education: field
            .map(|f| {
                vec![Education {
                    degree: Some("MS".to_string()),
                    field: Some(f.to_string()),
                    ..Default::default()
                }]
            })
            .unwrap_or_default(),
        publications: vec![],
    }
}

fn create_matcher() -> Matcher {
    let model: Arc<dyn EmbeddingModel> = Arc::new(HashedNgramModel::new(256).unwrap());
    Matcher::with_default_config().with_model(Some(model))
}

fn run(matcher: &Matcher, resume: &ResumeProfile, faculty: &[FacultyProfile], options: &MatchOptions) -> MatchResponse {
    matcher
        .find_matches(resume, faculty, options, &AtomicBool::new(false))
        .unwrap()
}

fn mixed_faculty() -> Vec<FacultyProfile> {
    vec![
        create_test_faculty(1, &["Machine Learning", "AI Ethics"], "Computer Science"),
        create_test_faculty(2, &["Databases", "Systems"], "Computer Science"),
        create_test_faculty(3, &["Computer Vision", "Robotics"], "Electrical Engineering"),
        create_test_faculty(4, &["Deep Learning", "Computer Vision", "Medical Imaging"], "Computer Science"),
        create_test_faculty(5, &["Programming Languages", "Formal Methods"], "Computer Science"),
        create_test_faculty(6, &[], "Linguistics"),
    ]
}

#[test]
fn test_integration_ml_cv_scenario() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Machine Learning", "Computer Vision"], None);
    let faculty = vec![
        create_test_faculty(1, &["Machine Learning", "AI Ethics"], "Computer Science"),
        create_test_faculty(2, &["Databases", "Systems"], "Computer Science"),
    ];

    let response = run(&matcher, &resume, &faculty, &MatchOptions::default());

    let f1 = response.matches.iter().find(|m| m.faculty_id == FacultyId::from(1)).unwrap();
    let f2 = response.matches.iter().find(|m| m.faculty_id == FacultyId::from(2)).unwrap();
    for signal in [Signal::Lexical, Signal::Semantic] {
        let a = f1.contribution(signal).unwrap().normalized_score;
        let b = f2.contribution(signal).unwrap().normalized_score;
        assert!(a > b, "{} signal: F1 {} should beat F2 {}", signal, a, b);
    }
    assert_eq!(response.matches[0].faculty_id, FacultyId::from(1));
    assert_eq!(response.matches[1].faculty_id, FacultyId::from(2));
}

#[test]
fn test_integration_scores_and_weights_bounded() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Deep Learning", "Computer Vision"], Some("Computer Science"));

    let response = run(&matcher, &resume, &mixed_faculty(), &MatchOptions::default());

    assert_eq!(response.matches.len(), 6);
    for (position, result) in response.matches.iter().enumerate() {
        assert_eq!(result.rank, position + 1);
        assert!(result.overall_score >= 0.0 && result.overall_score <= 1.0);
        let mut weight_sum = 0.0;
        for contribution in &result.breakdown {
            assert!(contribution.normalized_score >= 0.0 && contribution.normalized_score <= 1.0);
            if !contribution.available {
                assert_eq!(contribution.normalized_score, 0.0);
            }
            weight_sum += contribution.weight_used;
        }
        assert!((weight_sum - 1.0).abs() < 1e-9);
    }
    for pair in response.matches.windows(2) {
        assert!(pair[0].overall_score >= pair[1].overall_score);
    }
}

#[test]
fn test_integration_idempotent() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Machine Learning", "Robotics"], Some("Computer Science"));
    let faculty = mixed_faculty();

    let first = run(&matcher, &resume, &faculty, &MatchOptions::default());
    let second = run(&matcher, &resume, &faculty, &MatchOptions::default());

    // Bit-for-bit identical scores and order; only the request envelope differs
    assert_eq!(first.matches, second.matches);
    for (a, b) in first.matches.iter().zip(&second.matches) {
        assert_eq!(a.overall_score.to_bits(), b.overall_score.to_bits());
    }
}

#[test]
fn test_integration_keyword_overlap_monotonic() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Machine Learning", "Computer Vision"], Some("Computer Science"));

    let mut faculty = mixed_faculty();
    faculty[1] = create_test_faculty(2, &["Machine Learning", "Databases"], "Computer Science");
    let before = run(&matcher, &resume, &faculty, &MatchOptions::default());

    // Explicit keywords feed only the keyword signal
    faculty[1].keywords = vec!["Computer Vision".to_string()];
    let after = run(&matcher, &resume, &faculty, &MatchOptions::default());

    let find = |response: &MatchResponse| {
        response
            .matches
            .iter()
            .find(|m| m.faculty_id == FacultyId::from(2))
            .cloned()
            .unwrap()
    };
    let (old, new) = (find(&before), find(&after));

    let old_keyword = old.contribution(Signal::Keyword).unwrap().normalized_score;
    let new_keyword = new.contribution(Signal::Keyword).unwrap().normalized_score;
    assert!(new_keyword > old_keyword);
    for signal in [Signal::Lexical, Signal::Semantic, Signal::Structured] {
        assert_eq!(
            old.contribution(signal).unwrap().normalized_score,
            new.contribution(signal).unwrap().normalized_score
        );
    }
    assert!(new.overall_score >= old.overall_score);
}

#[test]
fn test_integration_graceful_degradation() {
    let matcher = create_matcher();
    let resume = ResumeProfile {
        name: Some("Only A Name".to_string()),
        ..Default::default()
    };
    let faculty = mixed_faculty();

    let response = run(&matcher, &resume, &faculty, &MatchOptions::default());

    assert_eq!(response.matches.len(), faculty.len());
    for result in &response.matches {
        assert!(result.fallback);
        assert_eq!(result.contribution(Signal::Keyword).unwrap().weight_used, 1.0);
        assert!(result.overall_score >= 0.0 && result.overall_score <= 1.0);
    }
}

#[test]
fn test_integration_tie_break_by_identifier() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Robotics"], Some("Computer Science"));
    let faculty = vec![
        create_test_faculty(7, &["Robotics", "Control Systems"], "Computer Science"),
        create_test_faculty(3, &["Robotics", "Control Systems"], "Computer Science"),
        create_test_faculty(5, &["Robotics", "Control Systems"], "Computer Science"),
    ];

    for _ in 0..2 {
        let response = run(&matcher, &resume, &faculty, &MatchOptions::default());
        let scores: Vec<f64> = response.matches.iter().map(|m| m.overall_score).collect();
        assert!(scores.windows(2).all(|w| w[0] == w[1]));

        let ids: Vec<FacultyId> = response.matches.iter().map(|m| m.faculty_id.clone()).collect();
        assert_eq!(ids, vec![FacultyId::from(3), FacultyId::from(5), FacultyId::from(7)]);
    }
}

#[test]
fn test_integration_semantic_toggle_off() {
    let matcher = create_matcher();
    let resume = create_test_resume(&["Deep Learning", "Computer Vision"], Some("Computer Science"));
    let faculty = mixed_faculty();

    let toggled = MatchOptions {
        providers: Some(ProviderToggles {
            lexical: true,
            semantic: false,
        }),
        ..Default::default()
    };
    let without_semantic = run(&matcher, &resume, &faculty, &toggled);

    assert_eq!(without_semantic.matches.len(), faculty.len());
    for result in &without_semantic.matches {
        let semantic = result.contribution(Signal::Semantic).unwrap();
        assert!(!semantic.available);
        assert_eq!(semantic.weight_used, 0.0);
    }

    // Same ranking as giving the semantic signal zero weight
    let mut weights: Vec<(Signal, f64)> = ScoringConfig::default().weights.iter().collect();
    weights.retain(|(s, _)| *s != Signal::Semantic);
    let zero_semantic = MatchOptions {
        weights: Some(WeightConfig::new(weights).unwrap()),
        ..Default::default()
    };
    let reweighted = run(&matcher, &resume, &faculty, &zero_semantic);

    let ranking = |r: &MatchResponse| r.matches.iter().map(|m| m.faculty_id.clone()).collect::<Vec<_>>();
    assert_eq!(ranking(&without_semantic), ranking(&reweighted));
    for (a, b) in without_semantic.matches.iter().zip(&reweighted.matches) {
        assert!((a.overall_score - b.overall_score).abs() < 1e-12);
    }
}

#[test]
fn test_integration_synthetic_evaluation() {
    let report = evaluate(&create_matcher(), &synthetic_cases(), &[], 1).unwrap();
    let baseline = report.baseline().unwrap();

    assert_eq!(report.case_count, 3);
    // Every student's best match is labelled a perfect fit
    assert_eq!(baseline.metrics["precision_at_k"], 1.0);
    assert_eq!(baseline.metrics["ndcg_at_k"], 1.0);
    for value in baseline.metrics.values() {
        assert!(*value >= 0.0);
    }
}

#[test]
fn test_integration_evaluation_comparison() {
    let lexical_only = WeightConfig::new([(Signal::Lexical, 1.0)]).unwrap();
    let report = evaluate(&create_matcher(), &synthetic_cases(), &[lexical_only.clone().into()], 3).unwrap();

    assert_eq!(report.configs.len(), 2);
    assert_eq!(report.configs[1].weights, lexical_only);
    let deltas = report.configs[1].deltas.as_ref().unwrap();
    assert_eq!(deltas.len(), report.configs[0].metrics.len());
    for value in report.configs[1].metrics.values() {
        assert!(value.is_finite());
    }
}

#[tokio::test]
async fn test_integration_engine_request_json() {
    let model: Arc<dyn EmbeddingModel> = Arc::new(HashedNgramModel::new(128).unwrap());
    let engine = MatchEngine::new(
        ScoringConfig::default(),
        Arc::new(ModelHandle::preloaded(model)),
        EngineOptions {
            pool_size: Some(2),
            ..Default::default()
        },
    )
    .unwrap();

    let request = serde_json::json!({
        "resume": {
            "name": "Student 3",
            "research_interests": ["Robotics", "Computer Vision", "Control Systems"],
            "education": [{"degree": "MS", "field": "Electrical Engineering", "year": 2023}]
        },
        "faculty": synthetic_faculty(),
        "top_k": 2
    });
    let request: MatchRequest = serde_json::from_value(request).unwrap();

    let response = engine.rank(request).await.unwrap();
    assert_eq!(response.total_candidates, 5);
    assert_eq!(response.matches.len(), 2);

    let top: Vec<FacultyId> = response.matches.iter().map(|m| m.faculty_id.clone()).collect();
    assert!(top.contains(&FacultyId::from(2)));
    assert!(top.contains(&FacultyId::from(5)));

    let json = serde_json::to_value(&response).unwrap();
    let breakdown = &json["matches"][0]["breakdown"][0];
    assert!(breakdown.get("signal_name").is_some());
    assert!(breakdown.get("normalized_score").is_some());
    assert!(breakdown.get("weight_used").is_some());
}

#[tokio::test]
async fn test_integration_concurrent_requests_share_model() {
    let engine = MatchEngine::new(
        ScoringConfig::default(),
        Arc::new(ModelHandle::new(EmbeddingBackend::Hashed { dimensions: 128 })),
        EngineOptions::default(),
    )
    .unwrap();
    let resume = create_test_resume(&["Machine Learning"], None);

    let (a, b) = tokio::join!(
        engine.find_matches(resume.clone(), mixed_faculty(), MatchOptions::default()),
        engine.find_matches(resume.clone(), mixed_faculty(), MatchOptions::default()),
    );

    assert_eq!(a.unwrap().matches, b.unwrap().matches);
    assert!(engine.models().is_initialized());
}

#[test]
fn test_integration_bm25_lexical_mode() {
    let mut config = ScoringConfig::default();
    config.lexical_mode = LexicalMode::Bm25;
    let matcher = create_matcher().with_config(config);
    let resume = create_test_resume(&["Deep Learning", "Computer Vision"], None);

    let response = run(&matcher, &resume, &mixed_faculty(), &MatchOptions::default());

    assert_eq!(response.matches[0].faculty_id, FacultyId::from(4));
    let lexical: Vec<f64> = response
        .matches
        .iter()
        .map(|m| m.contribution(Signal::Lexical).unwrap().normalized_score)
        .collect();
    // batch-max normalization: the best lexical match is exactly 1
    assert_eq!(lexical.iter().cloned().fold(0.0, f64::max), 1.0);
    assert!(lexical.iter().all(|v| (0.0..=1.0).contains(v)));

    let empty = response
        .matches
        .iter()
        .find(|m| m.faculty_id == FacultyId::from(6))
        .unwrap();
    assert!(!empty.contribution(Signal::Lexical).unwrap().available);
}
