//! Scoring engine: validates a submission against an exam snapshot and
//! computes the percentage score. Pure; no I/O.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::{exam::ExamDefinition, question::Question, submission::Submission};

/// Everything wrong with a submission, by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionIssues {
    /// Exam questions the submission did not answer.
    pub missing_questions: Vec<i64>,
    /// Submitted question ids that are not part of the exam.
    pub unexpected_questions: Vec<i64>,
    /// Question ids answered more than once.
    pub duplicate_questions: Vec<i64>,
    /// Questions whose chosen answer does not belong to them.
    pub invalid_answers: Vec<i64>,
}

impl SubmissionIssues {
    pub fn is_empty(&self) -> bool {
        self.missing_questions.is_empty()
            && self.unexpected_questions.is_empty()
            && self.duplicate_questions.is_empty()
            && self.invalid_answers.is_empty()
    }
}

impl fmt::Display for SubmissionIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_questions.is_empty() {
            parts.push(format!("missing questions {:?}", self.missing_questions));
        }
        if !self.unexpected_questions.is_empty() {
            parts.push(format!("unexpected questions {:?}", self.unexpected_questions));
        }
        if !self.duplicate_questions.is_empty() {
            parts.push(format!("duplicate questions {:?}", self.duplicate_questions));
        }
        if !self.invalid_answers.is_empty() {
            parts.push(format!("invalid answers for questions {:?}", self.invalid_answers));
        }
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("invalid submission: {0}")]
    Invalid(SubmissionIssues),

    /// The percentage is undefined for an exam without questions.
    #[error("exam has no questions")]
    NoQuestions,
}

/// Outcome of scoring a valid submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub correct: usize,
    pub total: usize,
    /// correct / total * 100, in [0.0, 100.0].
    pub score: f64,
    /// score >= pass mark; reaching the pass mark exactly passes.
    pub is_passed: bool,
}

/// Checks that the submission answers every question of the exam exactly
/// once, and only with answers that belong to the question.
pub fn validate_submission(
    exam: &ExamDefinition,
    submission: &Submission,
) -> Result<(), ScoringError> {
    if exam.questions.is_empty() {
        return Err(ScoringError::NoQuestions);
    }

    let questions: HashMap<i64, &Question> = exam.questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::with_capacity(submission.len());
    let mut duplicates = BTreeSet::new();
    let mut unexpected = BTreeSet::new();
    let mut invalid = BTreeSet::new();

    for &(question_id, answer_id) in submission.entries() {
        if !seen.insert(question_id) {
            duplicates.insert(question_id);
            continue;
        }
        match questions.get(&question_id) {
            None => {
                unexpected.insert(question_id);
            }
            Some(question) => {
                if !question.answers.iter().any(|a| a.id == answer_id) {
                    invalid.insert(question_id);
                }
            }
        }
    }

    let mut missing: Vec<i64> = questions
        .keys()
        .filter(|id| !seen.contains(*id))
        .copied()
        .collect();
    missing.sort_unstable();

    let issues = SubmissionIssues {
        missing_questions: missing,
        unexpected_questions: unexpected.into_iter().collect(),
        duplicate_questions: duplicates.into_iter().collect(),
        invalid_answers: invalid.into_iter().collect(),
    };

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ScoringError::Invalid(issues))
    }
}

/// Validates and scores a submission.
///
/// A question counts as correct when the chosen answer is flagged correct.
/// If a question has several answers flagged correct, choosing any of them
/// counts; exclusivity is not checked.
pub fn grade(exam: &ExamDefinition, submission: &Submission) -> Result<Grade, ScoringError> {
    validate_submission(exam, submission)?;

    let correct = submission
        .entries()
        .iter()
        .filter(|&&(question_id, answer_id)| {
            exam.question(question_id).is_some_and(|q| {
                q.answers
                    .iter()
                    .any(|a| a.id == answer_id && a.is_correct)
            })
        })
        .count();
    let total = exam.questions.len();

    let score = (correct as f64 * 100.0) / total as f64;
    // Compare on integers so the pass boundary is exact.
    let is_passed = correct as i64 * 100 >= i64::from(exam.exam.pass_mark) * total as i64;

    Ok(Grade {
        correct,
        total,
        score,
        is_passed,
    })
}
