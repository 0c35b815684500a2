use crate::canonicalizer::{Canonicalizer, GradeStatus, Lexicon};
use crate::extractor::GradeExtractor;
use crate::models::StudentRecord;
use std::collections::{BTreeMap, BTreeSet};

/// One subject row in a student's report: canonical subject name, canonical
/// current and predicted grade tokens, and how they relate.
#[derive(Debug, Clone)]
pub struct SubjectOutcome {
    pub subject: String,
    pub current: String,
    pub predicted: String,
    pub status: GradeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Priority::High => "priority-high",
            Priority::Medium => "priority-medium",
            Priority::Low => "priority-low",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudentAnalysis {
    pub name: String,
    pub school: String,
    pub year: String,
    /// Sorted by canonical subject name for reproducible report output.
    pub subjects: Vec<SubjectOutcome>,
    pub exceeding: usize,
    pub meeting: usize,
    pub below: usize,
    pub priority: Priority,
}

impl StudentAnalysis {
    pub fn has_data(&self) -> bool {
        !self.subjects.is_empty()
    }

    pub fn needs_attention(&self) -> bool {
        self.below >= 2
    }
}

#[derive(Debug, Clone)]
pub struct CohortAnalysis {
    pub students: Vec<StudentAnalysis>,
    pub total_exceeding: usize,
    pub total_meeting: usize,
    pub total_below: usize,
    pub all_subjects: BTreeSet<String>,
    pub students_with_data: usize,
}

/// Runs the extract -> canonicalize -> compare pipeline over student rows.
/// Each call is independent; the only shared state is the read-only lexicon.
pub struct GradeAnalyzer<'a> {
    extractor: GradeExtractor<'a>,
    canonicalizer: Canonicalizer<'a>,
}

impl<'a> GradeAnalyzer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            extractor: GradeExtractor::new(lexicon),
            canonicalizer: Canonicalizer::new(lexicon),
        }
    }

    /// Build the per-subject comparison for one student row.
    ///
    /// When two raw fragments resolve to the same canonical subject within
    /// one cell, the later pair overwrites the earlier one: a later, more
    /// specific match refines an earlier keyword-fallback hit.
    pub fn analyze_student(&self, record: &StudentRecord) -> StudentAnalysis {
        let mut subjects: BTreeMap<String, (String, String)> = BTreeMap::new();

        for (subject, grade) in self.extractor.extract(&record.raw_current) {
            let subject = self.canonicalizer.canonicalize_subject(&subject);
            let grade = self.canonicalizer.canonicalize_grade(&grade);
            subjects
                .entry(subject)
                .or_insert_with(|| ("N/A".to_string(), "N/A".to_string()))
                .0 = grade;
        }
        for (subject, grade) in self.extractor.extract(&record.raw_predicted) {
            let subject = self.canonicalizer.canonicalize_subject(&subject);
            let grade = self.canonicalizer.canonicalize_grade(&grade);
            subjects
                .entry(subject)
                .or_insert_with(|| ("N/A".to_string(), "N/A".to_string()))
                .1 = grade;
        }

        let mut outcomes = Vec::with_capacity(subjects.len());
        let mut exceeding = 0;
        let mut meeting = 0;
        let mut below = 0;

        for (subject, (current, predicted)) in subjects {
            let status = self.canonicalizer.compare(&current, &predicted);
            match status {
                GradeStatus::Exceeding => exceeding += 1,
                GradeStatus::Meeting => meeting += 1,
                GradeStatus::Below => below += 1,
                _ => {}
            }
            outcomes.push(SubjectOutcome {
                subject,
                current,
                predicted,
                status,
            });
        }

        let priority = if below >= 3 {
            Priority::High
        } else if below >= 1 {
            Priority::Medium
        } else {
            Priority::Low
        };

        StudentAnalysis {
            name: record.name.clone(),
            school: record.school.clone(),
            year: record.year.clone(),
            subjects: outcomes,
            exceeding,
            meeting,
            below,
            priority,
        }
    }

    /// Analyze every row and aggregate the cohort statistics.
    pub fn analyze_all(&self, records: &[StudentRecord]) -> CohortAnalysis {
        let mut students = Vec::with_capacity(records.len());
        let mut total_exceeding = 0;
        let mut total_meeting = 0;
        let mut total_below = 0;
        let mut all_subjects = BTreeSet::new();
        let mut students_with_data = 0;

        for record in records {
            let analysis = self.analyze_student(record);
            total_exceeding += analysis.exceeding;
            total_meeting += analysis.meeting;
            total_below += analysis.below;
            for outcome in &analysis.subjects {
                all_subjects.insert(outcome.subject.clone());
            }
            if analysis.has_data() {
                students_with_data += 1;
            }
            students.push(analysis);
        }

        CohortAnalysis {
            students,
            total_exceeding,
            total_meeting,
            total_below,
            all_subjects,
            students_with_data,
        }
    }
}
