// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    models::{
        candidate::{Candidate, User},
        exam::{CreateExamRequest, Exam, ExamDefinition},
        question::{Answer, CreateQuestionRequest, Question},
        result::{ExamResult, NewResult},
    },
    store::{CandidateDirectory, ExamCatalog, ResultStore, StoreError},
};

/// In-process store for tests and local runs.
///
/// Every operation takes the same lock, which makes the result insert the
/// serialization point that the unique index is in Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, User>,
    candidates: BTreeMap<i64, Candidate>,
    exams: BTreeMap<i64, Exam>,
    /// Questions in insertion order, answers attached.
    questions: Vec<Question>,
    results: BTreeMap<i64, ExamResult>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity, standing in for the external account service.
    pub async fn add_user(&self, user: User) {
        self.inner.lock().await.users.insert(user.id, user);
    }

    /// Number of stored results, for assertions.
    pub async fn result_count(&self) -> usize {
        self.inner.lock().await.results.len()
    }
}

fn newest_first(results: &mut [ExamResult]) {
    results.sort_by(|a, b| {
        b.completed_at
            .cmp(&a.completed_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl ExamCatalog for MemoryStore {
    async fn list_exams(&self, include_inactive: bool) -> Result<Vec<Exam>, StoreError> {
        let inner = self.inner.lock().await;
        let mut exams: Vec<Exam> = inner
            .exams
            .values()
            .filter(|e| include_inactive || e.is_active)
            .cloned()
            .collect();
        exams.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(exams)
    }

    async fn load_exam(&self, exam_id: i64) -> Result<Option<ExamDefinition>, StoreError> {
        let inner = self.inner.lock().await;
        let Some(exam) = inner.exams.get(&exam_id).cloned() else {
            return Ok(None);
        };
        let questions = inner
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect();
        Ok(Some(ExamDefinition { exam, questions }))
    }

    async fn create_exam(&self, req: &CreateExamRequest) -> Result<Exam, StoreError> {
        let mut inner = self.inner.lock().await;
        let exam = Exam {
            id: inner.next_id(),
            title: req.title.clone(),
            description: req.description.clone(),
            duration_minutes: req.duration_minutes,
            pass_mark: req.pass_mark,
            is_active: req.is_active,
            total_questions: 0,
            created_at: Utc::now(),
        };
        inner.exams.insert(exam.id, exam.clone());
        Ok(exam)
    }

    async fn add_question(
        &self,
        exam_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Question, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.exams.contains_key(&exam_id) {
            return Err(StoreError::NotFound);
        }

        let question_id = inner.next_id();
        let mut answers = Vec::with_capacity(req.answers.len());
        for answer in &req.answers {
            answers.push(Answer {
                id: inner.next_id(),
                question_id,
                text: answer.text.clone(),
                is_correct: answer.is_correct,
            });
        }
        let question = Question {
            id: question_id,
            exam_id,
            text: req.text.clone(),
            marks: req.marks,
            explanation: req.explanation.clone(),
            created_at: Utc::now(),
            answers,
        };
        inner.questions.push(question.clone());

        let total = inner.questions.iter().filter(|q| q.exam_id == exam_id).count();
        if let Some(exam) = inner.exams.get_mut(&exam_id) {
            exam.total_questions = i32::try_from(total).unwrap_or(i32::MAX);
        }

        Ok(question)
    }
}

#[async_trait]
impl CandidateDirectory for MemoryStore {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Candidate>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .candidates
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, candidate_id: i64) -> Result<Option<Candidate>, StoreError> {
        Ok(self.inner.lock().await.candidates.get(&candidate_id).cloned())
    }

    async fn get_or_create(&self, user_id: i64) -> Result<Candidate, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(candidate) = inner.candidates.values().find(|c| c.user_id == user_id) {
            return Ok(candidate.clone());
        }

        let user = inner.users.get(&user_id).cloned().ok_or(StoreError::NotFound)?;
        let candidate = Candidate {
            id: inner.next_id(),
            user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: String::new(),
            bio: String::new(),
            is_active: true,
        };
        inner.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn find_attempt(
        &self,
        candidate_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .results
            .values()
            .find(|r| r.candidate_id == candidate_id && r.exam_id == exam_id)
            .cloned())
    }

    async fn insert(&self, new: &NewResult) -> Result<ExamResult, StoreError> {
        let mut inner = self.inner.lock().await;
        let taken = inner
            .results
            .values()
            .any(|r| r.candidate_id == new.candidate_id && r.exam_id == new.exam_id);
        if taken {
            return Err(StoreError::Duplicate);
        }

        let result = ExamResult {
            id: inner.next_id(),
            candidate_id: new.candidate_id,
            exam_id: new.exam_id,
            score: new.score,
            is_passed: new.is_passed,
            completed_at: new.completed_at,
            certificate_path: None,
        };
        inner.results.insert(result.id, result.clone());
        Ok(result)
    }

    async fn get(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError> {
        Ok(self.inner.lock().await.results.get(&result_id).cloned())
    }

    async fn list_for_candidate(&self, candidate_id: i64) -> Result<Vec<ExamResult>, StoreError> {
        let inner = self.inner.lock().await;
        let mut results: Vec<ExamResult> = inner
            .results
            .values()
            .filter(|r| r.candidate_id == candidate_id)
            .cloned()
            .collect();
        newest_first(&mut results);
        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<ExamResult>, StoreError> {
        let inner = self.inner.lock().await;
        let mut results: Vec<ExamResult> = inner.results.values().cloned().collect();
        newest_first(&mut results);
        Ok(results)
    }

    async fn set_certificate_path(&self, result_id: i64, path: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let result = inner
            .results
            .get_mut(&result_id)
            .ok_or(StoreError::NotFound)?;
        result.certificate_path = Some(path.to_string());
        Ok(())
    }
}
