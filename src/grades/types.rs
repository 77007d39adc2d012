//! Data types used by the grade aggregation pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// One grade line as reported by the portal for a semester.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRecord {
    pub subject_name: String,
    pub subject_code: String,
    pub grade_letter: String,
    /// Pass/fail flag. The portal has sent this as text, number and bool.
    #[serde(default, deserialize_with = "text_or_scalar")]
    pub result: String,
}

impl SubjectRecord {
    pub fn new(subject_name: &str, subject_code: &str, grade_letter: &str, result: &str) -> Self {
        Self {
            subject_name: subject_name.to_string(),
            subject_code: subject_code.to_string(),
            grade_letter: grade_letter.to_string(),
            result: result.to_string(),
        }
    }
}

fn text_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// A subject after table lookup, with whitespace-normalised fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedSubject {
    pub subject_name: String,
    pub subject_code: String,
    pub grade_letter: String,
    pub result: String,
    pub credit: f64,
}

/// GPA for a single semester together with the sums that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SemesterResult {
    pub semester: u32,
    pub gpa: f64,
    /// Σ credit × point over counted subjects.
    pub point_sum: f64,
    /// Σ credit over counted subjects; failed subjects are not counted.
    pub credit_sum: f64,
    /// Every reported subject in portal order, failed ones included.
    pub subjects: Vec<GradedSubject>,
}

impl SemesterResult {
    /// Label used by the API, e.g. `"Semester 3"`.
    pub fn label(&self) -> String {
        format!("Semester {}", self.semester)
    }
}

/// CGPA plus the per-semester results in ascending semester order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub cgpa: f64,
    pub semesters: Vec<SemesterResult>,
}
