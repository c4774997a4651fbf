//! Submission orchestrator.
//!
//! Runs one exam attempt end to end: eligibility, validation, duplicate
//! check, scoring, persistence and, for a pass, the certificate. Nothing is
//! persisted unless every step up to scoring succeeds. A certificate failure
//! is logged and leaves `certificate_path` empty; the result stays recorded.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::{
    models::{
        candidate::Candidate,
        exam::Exam,
        result::{ExamResult, NewResult},
        submission::Submission,
    },
    services::{
        certificate::{CertificateError, CertificateGenerator},
        scoring::{self, ScoringError},
    },
    store::{CandidateDirectory, ExamCatalog, ResultStore, StoreError},
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("exam {0} not found")]
    ExamNotFound(i64),

    #[error("candidate profile not found")]
    CandidateNotFound,

    #[error("result {0} not found")]
    ResultNotFound(i64),

    #[error("this exam is not active")]
    ExamInactive,

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// The (candidate, exam) pair already has a result.
    #[error("you have already attempted this exam")]
    AlreadyAttempted,

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Store(StoreError),
}

pub struct SubmissionService {
    catalog: Arc<dyn ExamCatalog>,
    candidates: Arc<dyn CandidateDirectory>,
    results: Arc<dyn ResultStore>,
    certificates: CertificateGenerator,
}

impl SubmissionService {
    pub fn new(
        catalog: Arc<dyn ExamCatalog>,
        candidates: Arc<dyn CandidateDirectory>,
        results: Arc<dyn ResultStore>,
        certificates: CertificateGenerator,
    ) -> Self {
        Self {
            catalog,
            candidates,
            results,
            certificates,
        }
    }

    /// Scores and records one attempt by the identity `user_id`.
    pub async fn submit(
        &self,
        user_id: i64,
        exam_id: i64,
        submission: &Submission,
    ) -> Result<ExamResult, SubmitError> {
        let definition = self
            .catalog
            .load_exam(exam_id)
            .await
            .map_err(SubmitError::Store)?
            .ok_or(SubmitError::ExamNotFound(exam_id))?;

        if !definition.exam.is_active {
            tracing::info!(exam_id, user_id, "Submission rejected: exam inactive");
            return Err(SubmitError::ExamInactive);
        }

        if let Err(e) = scoring::validate_submission(&definition, submission) {
            tracing::info!(exam_id, user_id, error = %e, "Submission rejected");
            return Err(e.into());
        }

        let candidate = self
            .candidates
            .get_or_create(user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => SubmitError::CandidateNotFound,
                other => SubmitError::Store(other),
            })?;

        // Fast path only; the insert below is what actually guards the pair.
        let previous = self
            .results
            .find_attempt(candidate.id, exam_id)
            .await
            .map_err(SubmitError::Store)?;
        if previous.is_some() {
            tracing::info!(exam_id, candidate_id = candidate.id, "Submission rejected: already attempted");
            return Err(SubmitError::AlreadyAttempted);
        }

        let grade = scoring::grade(&definition, submission)?;

        let new_result = NewResult {
            candidate_id: candidate.id,
            exam_id,
            score: grade.score,
            is_passed: grade.is_passed,
            completed_at: Utc::now(),
        };

        let mut result = match self.results.insert(&new_result).await {
            Ok(result) => result,
            Err(StoreError::Duplicate) => {
                tracing::warn!(
                    exam_id,
                    candidate_id = candidate.id,
                    "Concurrent submission lost on the unique constraint"
                );
                return Err(SubmitError::AlreadyAttempted);
            }
            Err(e) => return Err(SubmitError::Store(e)),
        };

        tracing::info!(
            result_id = result.id,
            exam_id,
            candidate_id = candidate.id,
            score = result.score,
            passed = result.is_passed,
            "Exam submitted"
        );

        if result.is_passed {
            result.certificate_path = self
                .issue_certificate(&result, &candidate, &definition.exam)
                .await;
        }

        Ok(result)
    }

    /// Generates and records the certificate, swallowing failures.
    async fn issue_certificate(
        &self,
        result: &ExamResult,
        candidate: &Candidate,
        exam: &Exam,
    ) -> Option<String> {
        let path = match self.certificates.generate(result, candidate, exam).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(
                    result_id = result.id,
                    error = %e,
                    "Certificate generation failed; result kept without certificate"
                );
                return None;
            }
        };

        if let Err(e) = self.results.set_certificate_path(result.id, &path).await {
            tracing::error!(
                result_id = result.id,
                error = %e,
                "Failed to record certificate path"
            );
            return None;
        }

        Some(path)
    }

    /// Regenerates the certificate of a passed result, e.g. after an earlier
    /// write failure. Unlike the submission path, failures are returned.
    pub async fn regenerate_certificate(&self, result_id: i64) -> Result<ExamResult, SubmitError> {
        let mut result = self
            .results
            .get(result_id)
            .await
            .map_err(SubmitError::Store)?
            .ok_or(SubmitError::ResultNotFound(result_id))?;

        let candidate = self
            .candidates
            .find_by_id(result.candidate_id)
            .await
            .map_err(SubmitError::Store)?
            .ok_or(SubmitError::CandidateNotFound)?;

        let definition = self
            .catalog
            .load_exam(result.exam_id)
            .await
            .map_err(SubmitError::Store)?
            .ok_or(SubmitError::ExamNotFound(result.exam_id))?;

        let path = self
            .certificates
            .generate(&result, &candidate, &definition.exam)
            .await?;

        self.results
            .set_certificate_path(result.id, &path)
            .await
            .map_err(SubmitError::Store)?;

        result.certificate_path = Some(path);
        Ok(result)
    }
}
