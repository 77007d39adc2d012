use tracing::warn;

use crate::error::PortalError;
use crate::grades::tables::{CreditTable, LetterGrades};
use crate::grades::types::{AggregateResult, GradedSubject, SemesterResult, SubjectRecord};
use crate::grades::utility::{normalize_whitespace, weighted_average};

/// Scores one semester's subject list.
///
/// Every record must resolve in both tables; a single miss fails the call with
/// [`PortalError::UnsupportedDepartment`] since a partial GPA would be wrong.
/// Subjects graded [`LetterGrades::FAIL`] are listed but add nothing to either
/// sum.
pub fn compute_semester_gpa(
    semester: u32,
    records: &[SubjectRecord],
    credits: &CreditTable,
    letters: &LetterGrades,
) -> Result<SemesterResult, PortalError> {
    let mut point_sum = 0.0;
    let mut credit_sum = 0.0;
    let mut subjects = Vec::with_capacity(records.len());

    for record in records {
        let subject_name = normalize_whitespace(&record.subject_name);
        let subject_code = normalize_whitespace(&record.subject_code);
        let grade_letter = normalize_whitespace(&record.grade_letter);

        let (Some(credit), Some(points)) =
            (credits.credit_for(record), letters.points(&grade_letter))
        else {
            warn!(
                semester,
                subject_code = %subject_code,
                subject_name = %subject_name,
                grade = %grade_letter,
                "No table entry for subject"
            );
            return Err(PortalError::UnsupportedDepartment {
                subject_code,
                subject_name,
                grade: grade_letter,
            });
        };

        if !LetterGrades::is_fail(&grade_letter) {
            point_sum += credit * f64::from(points);
            credit_sum += credit;
        }

        subjects.push(GradedSubject {
            subject_name,
            subject_code,
            grade_letter,
            result: record.result.trim().to_string(),
            credit,
        });
    }

    Ok(SemesterResult {
        semester,
        gpa: weighted_average(point_sum, credit_sum),
        point_sum,
        credit_sum,
        subjects,
    })
}

/// Scores every semester in the order given and derives the CGPA from the
/// summed numerators and denominators.
pub fn aggregate(
    semesters: Vec<(u32, Vec<SubjectRecord>)>,
    credits: &CreditTable,
    letters: &LetterGrades,
) -> Result<AggregateResult, PortalError> {
    let results = semesters
        .iter()
        .map(|(semester, records)| compute_semester_gpa(*semester, records, credits, letters))
        .collect::<Result<Vec<_>, _>>()?;

    let total_points: f64 = results.iter().map(|s| s.point_sum).sum();
    let total_credits: f64 = results.iter().map(|s| s.credit_sum).sum();

    Ok(AggregateResult {
        cgpa: weighted_average(total_points, total_credits),
        semesters: results,
    })
}
