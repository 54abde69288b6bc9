use crate::core::embedding::{cosine_similarity, EmbeddingModel};
use crate::core::keywords::{jaccard, KeywordExtractor};
use crate::core::text::{tokenize, unigrams_and_bigrams};
use crate::models::{FacultyProfile, LexicalMode, RawScore, ResumeProfile, ScoringConfig, Signal};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Text features of one profile, extracted once per request
#[derive(Debug, Clone, Default)]
pub struct ProfileFeatures {
    /// Lexical unigrams and bigrams of the interest and publication text
    pub terms: Vec<String>,
    /// Interest and publication text fed to the embedding model
    pub document: String,
    pub keywords: BTreeSet<String>,
    /// Lowercased education fields (plus department for faculty)
    pub fields: Vec<String>,
    /// Lowercased publication venues
    pub venues: Vec<String>,
}

impl ProfileFeatures {
    pub fn from_resume(resume: &ResumeProfile, extractor: &KeywordExtractor) -> Self {
        let document = resume.document_text();
        Self {
            terms: unigrams_and_bigrams(&tokenize(&document)),
            keywords: extractor.extract(&resume.keyword_text(), &[]),
            fields: resume.education_fields(),
            venues: resume.venues(),
            document,
        }
    }

    pub fn from_faculty(faculty: &FacultyProfile, extractor: &KeywordExtractor) -> Self {
        let document = faculty.document_text();
        Self {
            terms: unigrams_and_bigrams(&tokenize(&document)),
            keywords: extractor.extract(&faculty.keyword_text(), &faculty.keywords),
            fields: faculty.education_fields(),
            venues: faculty.venues(),
            document,
        }
    }
}

/// L2-normalized TF-IDF vector, entries sorted by term id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge-join dot product; iteration order is fixed, so results are bit-for-bit stable
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_id, a_val) = self.entries[i];
            let (b_id, b_val) = other.entries[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_val * b_val;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Smoothed IDF table over the faculty batch of one request
#[derive(Debug, Clone, Default)]
pub struct LexicalCorpus {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
    documents: usize,
}

impl LexicalCorpus {
    /// Fit `idf = ln((1 + n) / (1 + df)) + 1` over the given documents
    pub fn fit<'a>(documents: impl IntoIterator<Item = &'a [String]>) -> Self {
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        let mut count = 0usize;
        for terms in documents {
            count += 1;
            let unique: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = count as f64;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (id, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), id as u32);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        Self {
            vocabulary,
            idf,
            documents: count,
        }
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Raw term counts weighted by IDF; terms outside the corpus vocabulary are ignored
    pub fn vectorize(&self, terms: &[String]) -> SparseVector {
        let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
        for term in terms {
            if let Some(id) = self.vocabulary.get(term) {
                *counts.entry(*id).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            entries.iter_mut().for_each(|(_, w)| *w /= norm);
        }
        SparseVector { entries }
    }
}

/// TF-IDF cosine similarity against the current faculty batch
#[derive(Debug, Clone)]
pub struct LexicalProvider {
    corpus: LexicalCorpus,
    resume: Option<SparseVector>,
}

impl LexicalProvider {
    pub fn fit(resume: &ProfileFeatures, faculty: &[ProfileFeatures]) -> Self {
        let corpus = LexicalCorpus::fit(faculty.iter().map(|f| f.terms.as_slice()));
        let resume = (!resume.terms.is_empty()).then(|| corpus.vectorize(&resume.terms));
        Self { corpus, resume }
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        let resume = match &self.resume {
            Some(vector) => vector,
            None => return RawScore::unavailable(),
        };
        if faculty.terms.is_empty() {
            return RawScore::unavailable();
        }
        let vector = self.corpus.vectorize(&faculty.terms);
        RawScore::available(resume.dot(&vector).clamp(0.0, 1.0))
    }
}

/// Okapi BM25 of the resume terms against the faculty batch
///
/// Raw scores are unbounded, so each is divided by the best score in the
/// batch; the top faculty member scores exactly 1.
#[derive(Debug, Clone)]
pub struct Bm25Provider {
    query: Vec<String>,
    idf: HashMap<String, f64>,
    avg_len: f64,
    max_score: f64,
}

impl Bm25Provider {
    pub const K1: f64 = 1.5;
    pub const B: f64 = 0.75;
    /// Floor for negative IDFs, as a fraction of the mean IDF
    pub const EPSILON: f64 = 0.25;

    pub fn fit(resume: &ProfileFeatures, faculty: &[ProfileFeatures]) -> Self {
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total_len = 0usize;
        for features in faculty {
            total_len += features.terms.len();
            let unique: BTreeSet<&str> = features.terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // ln(n - df + 0.5) - ln(df + 0.5); terms in most documents go negative
        let n = faculty.len() as f64;
        let raw_idf: Vec<(&str, f64)> = doc_freq
            .into_iter()
            .map(|(term, df)| (term, (n - df as f64 + 0.5).ln() - (df as f64 + 0.5).ln()))
            .collect();
        let mean_idf = if raw_idf.is_empty() {
            0.0
        } else {
            raw_idf.iter().map(|(_, idf)| idf).sum::<f64>() / raw_idf.len() as f64
        };
        let floor = Self::EPSILON * mean_idf;
        let idf = raw_idf
            .into_iter()
            .map(|(term, idf)| (term.to_string(), if idf < 0.0 { floor } else { idf }))
            .collect();

        let mut provider = Self {
            query: resume.terms.clone(),
            idf,
            avg_len: if faculty.is_empty() { 0.0 } else { total_len as f64 / n },
            max_score: 0.0,
        };
        provider.max_score = faculty
            .iter()
            .map(|f| provider.raw_score(&f.terms))
            .fold(0.0, f64::max);
        provider
    }

    /// Unnormalized BM25; query terms repeat as often as they occur
    pub fn raw_score(&self, terms: &[String]) -> f64 {
        if terms.is_empty() || self.avg_len <= 0.0 {
            return 0.0;
        }
        let mut tf: HashMap<&str, f64> = HashMap::new();
        for term in terms {
            *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
        }
        let length_norm = 1.0 - Self::B + Self::B * terms.len() as f64 / self.avg_len;

        self.query
            .iter()
            .map(|q| {
                let f = tf.get(q.as_str()).copied().unwrap_or(0.0);
                let idf = self.idf.get(q).copied().unwrap_or(0.0);
                idf * f * (Self::K1 + 1.0) / (f + Self::K1 * length_norm)
            })
            .sum()
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        if self.query.is_empty() || faculty.terms.is_empty() {
            return RawScore::unavailable();
        }
        if self.max_score <= 0.0 {
            return RawScore::available(0.0);
        }
        RawScore::available((self.raw_score(&faculty.terms) / self.max_score).clamp(0.0, 1.0))
    }
}

/// Dense embedding cosine similarity
#[derive(Clone)]
pub struct SemanticProvider {
    model: Arc<dyn EmbeddingModel>,
    resume: Option<Vec<f32>>,
}

impl SemanticProvider {
    pub fn new(model: Arc<dyn EmbeddingModel>, resume: &ProfileFeatures) -> Self {
        let resume = if resume.document.is_empty() {
            None
        } else {
            match model.embed(&resume.document) {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!("Resume embedding failed, semantic signal unavailable: {}", e);
                    None
                }
            }
        };
        Self { model, resume }
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        let resume = match &self.resume {
            Some(vector) => vector,
            None => return RawScore::unavailable(),
        };
        if faculty.document.is_empty() {
            return RawScore::unavailable();
        }
        let vector = match self.model.embed(&faculty.document) {
            Ok(vector) => vector,
            Err(e) => {
                debug!("Faculty embedding failed: {}", e);
                return RawScore::unavailable();
            }
        };
        match cosine_similarity(resume, &vector) {
            Some(similarity) => RawScore::available(similarity),
            None => RawScore::unavailable(),
        }
    }
}

impl std::fmt::Debug for SemanticProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticProvider")
            .field("model", &self.model.name())
            .field("resume_embedded", &self.resume.is_some())
            .finish()
    }
}

/// Jaccard overlap of extracted keyword sets
#[derive(Debug, Clone)]
pub struct KeywordProvider {
    resume: BTreeSet<String>,
}

impl KeywordProvider {
    pub fn new(resume: &ProfileFeatures) -> Self {
        Self {
            resume: resume.keywords.clone(),
        }
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        if self.resume.is_empty() || faculty.keywords.is_empty() {
            return RawScore::unavailable();
        }
        RawScore::available(jaccard(&self.resume, &faculty.keywords))
    }
}

/// Education field and publication venue overlap, scored 0, 0.5 or 1
#[derive(Debug, Clone)]
pub struct StructuredProvider {
    fields: Vec<String>,
    venues: Vec<String>,
}

impl StructuredProvider {
    pub fn new(resume: &ProfileFeatures) -> Self {
        Self {
            fields: resume.fields.clone(),
            venues: resume.venues.clone(),
        }
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        let levels = [
            match_level(&self.fields, &faculty.fields),
            match_level(&self.venues, &faculty.venues),
        ];
        levels
            .into_iter()
            .flatten()
            .fold(None, |best: Option<f64>, level| Some(best.map_or(level, |b| b.max(level))))
            .map_or_else(RawScore::unavailable, RawScore::available)
    }
}

/// 1.0 for an exact match, 0.5 when one string contains the other, else 0.0;
/// `None` when either side has nothing to compare
fn match_level(ours: &[String], theirs: &[String]) -> Option<f64> {
    if ours.is_empty() || theirs.is_empty() {
        return None;
    }
    let mut best = 0.0;
    for a in ours {
        for b in theirs {
            if a == b {
                return Some(1.0);
            }
            if a.contains(b.as_str()) || b.contains(a.as_str()) {
                best = 0.5;
            }
        }
    }
    Some(best)
}

/// The similarity provider variants, selected by configuration at construction time
#[derive(Debug, Clone)]
pub enum Provider {
    Lexical(LexicalProvider),
    Bm25(Bm25Provider),
    Semantic(SemanticProvider),
    Keyword(KeywordProvider),
    Structured(StructuredProvider),
}

impl Provider {
    pub fn signal(&self) -> Signal {
        match self {
            Provider::Lexical(_) | Provider::Bm25(_) => Signal::Lexical,
            Provider::Semantic(_) => Signal::Semantic,
            Provider::Keyword(_) => Signal::Keyword,
            Provider::Structured(_) => Signal::Structured,
        }
    }

    pub fn score(&self, faculty: &ProfileFeatures) -> RawScore {
        match self {
            Provider::Lexical(p) => p.score(faculty),
            Provider::Bm25(p) => p.score(faculty),
            Provider::Semantic(p) => p.score(faculty),
            Provider::Keyword(p) => p.score(faculty),
            Provider::Structured(p) => p.score(faculty),
        }
    }
}

/// Providers active for one request, in signal order
#[derive(Debug, Clone)]
pub struct ProviderSet {
    providers: Vec<Provider>,
}

impl ProviderSet {
    /// Build the request's providers
    ///
    /// The lexical corpus is fitted here on the faculty batch and then shared
    /// read-only by every pair. The semantic provider is only built when it is
    /// enabled and a model is loaded.
    pub fn build(
        config: &ScoringConfig,
        model: Option<&Arc<dyn EmbeddingModel>>,
        resume: &ProfileFeatures,
        faculty: &[ProfileFeatures],
    ) -> Self {
        let mut providers = Vec::with_capacity(Signal::ALL.len());
        if config.providers.lexical {
            providers.push(match config.lexical_mode {
                LexicalMode::TfIdf => Provider::Lexical(LexicalProvider::fit(resume, faculty)),
                LexicalMode::Bm25 => Provider::Bm25(Bm25Provider::fit(resume, faculty)),
            });
        }
        if config.providers.semantic {
            if let Some(model) = model {
                providers.push(Provider::Semantic(SemanticProvider::new(Arc::clone(model), resume)));
            }
        }
        providers.push(Provider::Keyword(KeywordProvider::new(resume)));
        providers.push(Provider::Structured(StructuredProvider::new(resume)));
        Self { providers }
    }

    pub fn active_signals(&self) -> Vec<Signal> {
        self.providers.iter().map(Provider::signal).collect()
    }

    /// Raw scores for every signal; inactive signals come back unavailable
    pub fn score_all(&self, faculty: &ProfileFeatures) -> Vec<(Signal, RawScore)> {
        Signal::ALL
            .iter()
            .map(|signal| {
                let raw = self
                    .providers
                    .iter()
                    .find(|p| p.signal() == *signal)
                    .map_or_else(RawScore::unavailable, |p| p.score(faculty));
                (*signal, raw)
            })
            .collect()
    }
}
