use crate::evaluation::harness::{GroundTruthCase, RelevanceLabel};
use crate::models::{Award, CitationMetrics, Education, FacultyId, FacultyProfile, Funding, ResumeProfile};

const PERFECT: u8 = 3;
const STRONG: u8 = 2;
const WEAK: u8 = 1;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn education(degree: &str, field: &str, institution: &str, year: i32) -> Education {
    Education {
        degree: Some(degree.to_string()),
        field: Some(field.to_string()),
        institution: Some(institution.to_string()),
        year: Some(year),
    }
}

fn award(name: &str) -> Award {
    Award {
        name: name.to_string(),
        year: None,
    }
}

fn grant(title: &str, amount: f64) -> Funding {
    Funding {
        title: Some(title.to_string()),
        amount: Some(amount),
        active: true,
    }
}

fn faculty(
    id: i64,
    name: &str,
    department: &str,
    university: &str,
    interests: &[&str],
    phd: Education,
) -> FacultyProfile {
    let mut profile = FacultyProfile::new(id, name, strings(interests));
    profile.department = Some(department.to_string());
    profile.university = Some(university.to_string());
    profile.education.push(phd);
    profile
}

/// Faculty shared by every synthetic case
pub fn synthetic_faculty() -> Vec<FacultyProfile> {
    let mut alice = faculty(
        1,
        "Dr. Alice Smith",
        "Computer Science",
        "Stanford University",
        &["Machine Learning", "Deep Neural Networks", "Computer Vision", "AI Ethics"],
        education("PhD", "Computer Science", "MIT", 2010),
    );
    alice.citation_metrics = Some(CitationMetrics {
        h_index: Some(25),
        total_citations: Some(5000),
    });
    alice.awards = vec![award("ACM Distinguished Scientist"), award("Outstanding Teaching Award")];

    let mut bob = faculty(
        2,
        "Dr. Bob Johnson",
        "Electrical Engineering",
        "MIT",
        &["Robotics", "Computer Vision", "Sensor Networks", "Autonomous Systems"],
        education("PhD", "Electrical Engineering", "Stanford University", 2008),
    );
    bob.funding = vec![
        grant("Advanced Computer Vision Research", 1_500_000.0),
        grant("Robotics Initiative", 750_000.0),
    ];

    let mut carol = faculty(
        3,
        "Dr. Carol Williams",
        "Computer Science",
        "UC Berkeley",
        &["Natural Language Processing", "Machine Translation", "Information Extraction"],
        education("PhD", "Linguistics", "Stanford University", 2012),
    );
    carol.citation_metrics = Some(CitationMetrics {
        h_index: Some(18),
        total_citations: Some(3200),
    });

    let david = faculty(
        4,
        "Dr. David Lee",
        "Computer Science",
        "Stanford University",
        &["Reinforcement Learning", "Game Theory", "Multi-agent Systems"],
        education("PhD", "Computer Science", "UC Berkeley", 2011),
    );

    let mut emily = faculty(
        5,
        "Dr. Emily Chen",
        "Electrical Engineering",
        "UC Berkeley",
        &["Computer Vision", "Robotics", "Medical Imaging"],
        education("PhD", "Electrical Engineering", "MIT", 2014),
    );
    emily.awards = vec![award("NSF CAREER Award"), award("Outstanding Young Researcher")];

    vec![alice, bob, carol, david, emily]
}

fn labels(grades: &[(i64, u8)]) -> Vec<RelevanceLabel> {
    grades
        .iter()
        .map(|(id, grade)| RelevanceLabel {
            faculty_id: FacultyId::from(*id),
            grade: *grade,
        })
        .collect()
}

/// Built-in labelled dataset: three students, each against the same five faculty
pub fn synthetic_cases() -> Vec<GroundTruthCase> {
    let faculty = synthetic_faculty();

    let students = [
        (
            "Student 1",
            ["Machine Learning", "Deep Learning", "Computer Vision"],
            education("MS", "Computer Science", "Stanford University", 2023),
            labels(&[(1, PERFECT), (2, STRONG), (5, WEAK)]),
        ),
        (
            "Student 2",
            ["Natural Language Processing", "Information Retrieval", "Text Mining"],
            education("BS", "Computer Science", "MIT", 2022),
            labels(&[(3, PERFECT), (4, WEAK)]),
        ),
        (
            "Student 3",
            ["Robotics", "Computer Vision", "Control Systems"],
            education("MS", "Electrical Engineering", "UC Berkeley", 2023),
            labels(&[(2, PERFECT), (5, PERFECT), (1, WEAK)]),
        ),
    ];

    students
        .into_iter()
        .map(|(name, interests, degree, labels)| GroundTruthCase {
            name: Some(name.to_string()),
            resume: ResumeProfile {
                name: Some(name.to_string()),
                research_interests: strings(&interests),
                education: vec![degree],
                publications: vec![],
            },
            faculty: faculty.clone(),
            labels,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_synthetic_cases_shape() {
        let cases = synthetic_cases();
        assert_eq!(cases.len(), 3);
        for case in &cases {
            assert_eq!(case.faculty.len(), 5);
            assert!(case.validate().is_ok());
            assert!(case.labels.iter().any(|l| l.grade == PERFECT));
        }
        assert_eq!(cases[2].grade(&FacultyId::from(5)), PERFECT);
        assert_eq!(cases[1].grade(&FacultyId::from(1)), 0);
    }
}
