// Criterion benchmarks for Faculty Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use faculty_match::core::{EmbeddingModel, HashedNgramModel, KeywordExtractor, LexicalCorpus, Matcher};
use faculty_match::core::text::{tokenize, unigrams_and_bigrams};
use faculty_match::models::{Education, FacultyProfile, MatchOptions, Publication, ResumeProfile};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const AREAS: &[&str] = &[
    "Machine Learning",
    "Computer Vision",
    "Robotics",
    "Natural Language Processing",
    "Databases",
    "Distributed Systems",
    "Quantum Computing",
    "Human Computer Interaction",
    "Computational Biology",
    "Cybersecurity",
];

fn create_faculty(id: usize) -> FacultyProfile {
    let interests = (0..3).map(|j| AREAS[(id + j * 3) % AREAS.len()].to_string()).collect();
    let mut profile = FacultyProfile::new(id as i64, format!("Dr. Faculty {}", id), interests);
    profile.department = Some(if id % 2 == 0 { "Computer Science" } else { "Electrical Engineering" }.to_string());
    profile.publications.push(Publication {
        title: format!("Advances in {}", AREAS[id % AREAS.len()]),
        abstract_text: Some("We study scalable methods and report results on standard benchmarks.".to_string()),
        citation_count: Some((id * 7 % 300) as u64),
        ..Default::default()
    });
    profile
}

fn create_resume() -> ResumeProfile {
    ResumeProfile {
        name: Some("Bench Student".to_string()),
        research_interests: vec!["Machine Learning".to_string(), "Computer Vision".to_string()],
        education: vec![Education {
            field: Some("Computer Science".to_string()),
            ..Default::default()
        }],
        publications: vec![],
    }
}

fn bench_tokenize(c: &mut Criterion) {
    let text = "Deep reinforcement learning for autonomous robotics and control systems";
    c.bench_function("tokenize_with_bigrams", |b| {
        b.iter(|| unigrams_and_bigrams(&tokenize(black_box(text))));
    });
}

fn bench_keywords(c: &mut Criterion) {
    let extractor = KeywordExtractor::new(24);
    let text = "ML and NLP for medical imaging, computer vision and sensor networks";
    c.bench_function("keyword_extraction", |b| {
        b.iter(|| extractor.extract(black_box(text), &[]));
    });
}

fn bench_lexical_corpus(c: &mut Criterion) {
    let documents: Vec<Vec<String>> = (0..500)
        .map(|i| unigrams_and_bigrams(&tokenize(&create_faculty(i).document_text())))
        .collect();
    c.bench_function("lexical_corpus_fit_500", |b| {
        b.iter(|| LexicalCorpus::fit(black_box(&documents).iter().map(|d| d.as_slice())));
    });
}

fn bench_matching(c: &mut Criterion) {
    let model: Arc<dyn EmbeddingModel> = Arc::new(HashedNgramModel::new(256).unwrap());
    let matcher = Matcher::with_default_config().with_model(Some(model));
    let resume = create_resume();
    let options = MatchOptions::top_k(20);
    let cancel = AtomicBool::new(false);

    let mut group = c.benchmark_group("matching");

    for faculty_count in [10, 50, 100, 500, 1000].iter() {
        let faculty: Vec<FacultyProfile> = (0..*faculty_count).map(create_faculty).collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches", faculty_count),
            faculty_count,
            |b, _| {
                b.iter(|| {
                    matcher.find_matches(
                        black_box(&resume),
                        black_box(&faculty),
                        black_box(&options),
                        &cancel,
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_keywords, bench_lexical_corpus, bench_matching);

criterion_main!(benches);
