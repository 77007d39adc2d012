//! Credit tables and credit-weighted GPA aggregation.
//!
//! [`CreditTable`] and [`LetterGrades`] are the immutable lookup tables loaded
//! once at startup. [`aggregate::aggregate`] turns the portal's per-semester
//! subject lists into per-semester GPAs and an overall CGPA.

pub mod aggregate;
pub mod tables;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate, compute_semester_gpa};
pub use tables::{CreditTable, LetterGrades, SubjectKey};
pub use types::{AggregateResult, GradedSubject, SemesterResult, SubjectRecord};
