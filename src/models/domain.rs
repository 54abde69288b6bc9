use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use validator::{Validate, ValidationError};

/// Faculty identifier as supplied by the faculty store
///
/// Integer ids order numerically and sort before string ids, which keeps the
/// ranker's final tie-break total and reproducible across mixed batches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacultyId {
    Int(i64),
    Str(String),
}

impl Ord for FacultyId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FacultyId::Int(a), FacultyId::Int(b)) => a.cmp(b),
            (FacultyId::Int(_), FacultyId::Str(_)) => Ordering::Less,
            (FacultyId::Str(_), FacultyId::Int(_)) => Ordering::Greater,
            (FacultyId::Str(a), FacultyId::Str(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for FacultyId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FacultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacultyId::Int(id) => write!(f, "{}", id),
            FacultyId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for FacultyId {
    fn from(id: i64) -> Self {
        FacultyId::Int(id)
    }
}

impl From<&str> for FacultyId {
    fn from(id: &str) -> Self {
        FacultyId::Str(id.to_string())
    }
}

fn validate_faculty_id(id: &FacultyId) -> Result<(), ValidationError> {
    match id {
        FacultyId::Str(s) if s.trim().is_empty() => Err(ValidationError::new("empty_faculty_id")),
        _ => Ok(()),
    }
}

/// Names must contain something other than whitespace
fn validate_non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Education record, shared by resumes and faculty profiles
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Education {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

/// Publication record
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Publication {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default)]
    pub venue: Option<String>,
}

/// Award or honour held by a faculty member
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Award {
    #[validate(custom(function = "validate_non_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

/// Research funding record
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Funding {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[serde(default)]
    pub active: bool,
}

/// Aggregate citation metrics, when the faculty store has them
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CitationMetrics {
    #[serde(default)]
    pub h_index: Option<u32>,
    #[serde(default)]
    pub total_citations: Option<u64>,
}

/// Parsed student resume, as handed over by the resume parser
///
/// Every field is optional: a resume with only a name is valid input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResumeProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub research_interests: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub education: Vec<Education>,
    #[serde(default)]
    #[validate(nested)]
    pub publications: Vec<Publication>,
}

impl ResumeProfile {
    /// Interests plus publication titles and abstracts
    pub fn document_text(&self) -> String {
        document_text(&self.research_interests, &self.publications)
    }

    /// Interests plus publication titles, the source of extracted keywords
    pub fn keyword_text(&self) -> String {
        keyword_text(&self.research_interests, &self.publications)
    }

    pub fn education_fields(&self) -> Vec<String> {
        education_fields(&self.education)
    }

    pub fn venues(&self) -> Vec<String> {
        venues(&self.publications)
    }
}

/// Faculty profile, as handed over by the faculty store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FacultyProfile {
    #[serde(alias = "faculty_id")]
    #[validate(custom(function = "validate_faculty_id"))]
    pub id: FacultyId,
    #[validate(custom(function = "validate_non_blank"))]
    pub name: String,
    #[serde(alias = "university_name", default)]
    pub university: Option<String>,
    #[serde(alias = "department_name", default)]
    pub department: Option<String>,
    #[serde(default)]
    pub research_interests: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    #[validate(nested)]
    pub awards: Vec<Award>,
    #[serde(default)]
    #[validate(nested)]
    pub funding: Vec<Funding>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub citation_metrics: Option<CitationMetrics>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
}

impl FacultyProfile {
    /// Minimal profile with a name and interests; the remaining fields empty
    pub fn new(id: impl Into<FacultyId>, name: impl Into<String>, research_interests: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            university: None,
            department: None,
            research_interests,
            publications: vec![],
            awards: vec![],
            funding: vec![],
            keywords: vec![],
            education: vec![],
            citation_metrics: None,
            email: None,
            profile_url: None,
        }
    }

    /// Interests plus publication titles and abstracts
    ///
    /// Explicit keywords are left out; they feed the keyword signal only.
    pub fn document_text(&self) -> String {
        document_text(&self.research_interests, &self.publications)
    }

    /// Interests plus publication titles; abstracts are too long for salient keywords
    pub fn keyword_text(&self) -> String {
        keyword_text(&self.research_interests, &self.publications)
    }

    /// Education fields plus the department, which stands in for the field
    /// when the store has no education records
    pub fn education_fields(&self) -> Vec<String> {
        let mut fields = education_fields(&self.education);
        if let Some(dept) = self.department.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            fields.push(dept.to_lowercase());
        }
        fields
    }

    pub fn venues(&self) -> Vec<String> {
        venues(&self.publications)
    }

    /// Sum of per-publication citation counts
    pub fn publication_citations(&self) -> u64 {
        self.publications
            .iter()
            .filter_map(|p| p.citation_count)
            .sum()
    }
}

fn join_phrases(phrases: &[String]) -> String {
    phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn document_text(interests: &[String], publications: &[Publication]) -> String {
    let mut parts: Vec<&str> = interests.iter().map(String::as_str).collect();
    for publication in publications {
        parts.push(&publication.title);
        if let Some(text) = publication.abstract_text.as_deref() {
            parts.push(text);
        }
    }

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn keyword_text(interests: &[String], publications: &[Publication]) -> String {
    let titles: Vec<String> = publications.iter().map(|p| p.title.clone()).collect();
    join_phrases(&[interests, titles.as_slice()].concat())
}

fn education_fields(education: &[Education]) -> Vec<String> {
    education
        .iter()
        .filter_map(|e| e.field.as_deref())
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

fn venues(publications: &[Publication]) -> Vec<String> {
    publications
        .iter()
        .filter_map(|p| p.venue.as_deref())
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
