// tests/submission_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use exam_board::{
    models::{
        candidate::User,
        exam::{CreateExamRequest, Exam},
        question::{CreateAnswerRequest, CreateQuestionRequest, Question},
        submission::Submission,
    },
    services::{
        certificate::{CertificateError, CertificateGenerator, CertificateSink, MemorySink},
        scoring::ScoringError,
        submission::{SubmissionService, SubmitError},
    },
    store::{CandidateDirectory, ExamCatalog, MemoryStore, ResultStore},
};

const USER_ID: i64 = 1000;

/// A sink whose disk is always full.
struct FailingSink;

#[async_trait]
impl CertificateSink for FailingSink {
    async fn write(&self, _path: &str, _bytes: &[u8]) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        ))
    }
}

fn service(store: &Arc<MemoryStore>, sink: Arc<dyn CertificateSink>) -> SubmissionService {
    SubmissionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        CertificateGenerator::new(sink),
    )
}

async fn add_user(store: &MemoryStore, id: i64, first_name: &str) {
    store
        .add_user(User {
            id,
            username: format!("user{id}"),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("user{id}@example.com"),
        })
        .await;
}

/// Seeds an exam whose questions each have a correct first answer and a
/// wrong second answer.
async fn seed_exam(
    store: &MemoryStore,
    pass_mark: i32,
    question_count: usize,
    is_active: bool,
) -> (Exam, Vec<Question>) {
    let exam = store
        .create_exam(&CreateExamRequest {
            title: "Rust Basics".to_string(),
            description: "Ownership and borrowing".to_string(),
            duration_minutes: 30,
            pass_mark,
            is_active,
        })
        .await
        .unwrap();

    let mut questions = Vec::new();
    for i in 0..question_count {
        let question = store
            .add_question(
                exam.id,
                &CreateQuestionRequest {
                    text: format!("Question {i}"),
                    marks: 1,
                    explanation: String::new(),
                    answers: vec![
                        CreateAnswerRequest {
                            text: "right".to_string(),
                            is_correct: true,
                        },
                        CreateAnswerRequest {
                            text: "wrong".to_string(),
                            is_correct: false,
                        },
                    ],
                },
            )
            .await
            .unwrap();
        questions.push(question);
    }

    (exam, questions)
}

/// Answers the first `correct` questions right and the rest wrong.
fn answers(questions: &[Question], correct: usize) -> Submission {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let choice = if i < correct { 0 } else { 1 };
            (q.id, q.answers[choice].id)
        })
        .collect()
}

async fn setup(pass_mark: i32, question_count: usize) -> (Arc<MemoryStore>, Exam, Vec<Question>) {
    let store = Arc::new(MemoryStore::new());
    add_user(&store, USER_ID, "Ada").await;
    let (exam, questions) = seed_exam(&store, pass_mark, question_count, true).await;
    (store, exam, questions)
}

#[tokio::test]
async fn pass_at_pass_mark_issues_certificate() {
    let (store, exam, questions) = setup(60, 5).await;
    let sink = Arc::new(MemorySink::new());
    let service = service(&store, sink.clone());

    let result = service
        .submit(USER_ID, exam.id, &answers(&questions, 3))
        .await
        .unwrap();

    assert_eq!(result.score, 60.0);
    assert!(result.is_passed);
    let path = result.certificate_path.clone().expect("certificate path");
    assert!(path.starts_with("certificates/"));
    assert!(sink.get(&path).unwrap().starts_with(b"%PDF"));

    let stored = store.get(result.id).await.unwrap().unwrap();
    assert_eq!(stored.certificate_path.as_deref(), Some(path.as_str()));
}

#[tokio::test]
async fn fail_has_no_certificate() {
    let (store, exam, questions) = setup(60, 5).await;
    let sink = Arc::new(MemorySink::new());
    let service = service(&store, sink.clone());

    let result = service
        .submit(USER_ID, exam.id, &answers(&questions, 2))
        .await
        .unwrap();

    assert_eq!(result.score, 40.0);
    assert!(!result.is_passed);
    assert_eq!(result.certificate_path, None);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn incomplete_submission_is_rejected_without_a_row() {
    let (store, exam, questions) = setup(60, 5).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let submission: Submission = answers(&questions, 5).entries()[..4].iter().copied().collect();
    let err = service.submit(USER_ID, exam.id, &submission).await.unwrap_err();

    match err {
        SubmitError::Scoring(ScoringError::Invalid(issues)) => {
            assert_eq!(issues.missing_questions, vec![questions[4].id]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.result_count().await, 0);
}

#[tokio::test]
async fn answer_from_another_exam_is_rejected() {
    let (store, exam, questions) = setup(60, 2).await;
    let (_, other_questions) = seed_exam(&store, 60, 1, true).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let submission = Submission::new()
        .answer(questions[0].id, questions[0].answers[0].id)
        .answer(questions[1].id, other_questions[0].answers[0].id);
    let err = service.submit(USER_ID, exam.id, &submission).await.unwrap_err();

    match err {
        SubmitError::Scoring(ScoringError::Invalid(issues)) => {
            assert_eq!(issues.invalid_answers, vec![questions[1].id]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.result_count().await, 0);
}

#[tokio::test]
async fn resubmission_is_rejected_and_original_kept() {
    let (store, exam, questions) = setup(60, 5).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let first = service
        .submit(USER_ID, exam.id, &answers(&questions, 2))
        .await
        .unwrap();

    let err = service
        .submit(USER_ID, exam.id, &answers(&questions, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::AlreadyAttempted));

    let stored = store.get(first.id).await.unwrap().unwrap();
    assert_eq!(stored, first);
    assert_eq!(store.result_count().await, 1);
}

#[tokio::test]
async fn inactive_exam_is_rejected_before_validation() {
    let store = Arc::new(MemoryStore::new());
    add_user(&store, USER_ID, "Ada").await;
    let (exam, _) = seed_exam(&store, 60, 3, false).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    // Empty on purpose: eligibility is checked before the answer set.
    let err = service
        .submit(USER_ID, exam.id, &Submission::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::ExamInactive));
    assert_eq!(store.result_count().await, 0);
}

#[tokio::test]
async fn exam_without_questions_cannot_be_scored() {
    let (store, _, _) = setup(60, 1).await;
    let (empty, _) = seed_exam(&store, 60, 0, true).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let err = service
        .submit(USER_ID, empty.id, &Submission::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Scoring(ScoringError::NoQuestions)));
    assert_eq!(store.result_count().await, 0);
}

#[tokio::test]
async fn unknown_exam_is_not_found() {
    let (store, _, _) = setup(60, 1).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let err = service
        .submit(USER_ID, 9_999, &Submission::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::ExamNotFound(9_999)));
}

#[tokio::test]
async fn unknown_identity_is_not_found() {
    let (store, exam, questions) = setup(60, 2).await;
    let service = service(&store, Arc::new(MemorySink::new()));

    let err = service
        .submit(4242, exam.id, &answers(&questions, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::CandidateNotFound));
    assert_eq!(store.result_count().await, 0);
}

#[tokio::test]
async fn candidate_profile_is_created_on_first_submission() {
    let (store, exam, questions) = setup(50, 2).await;
    let service = service(&store, Arc::new(MemorySink::new()));
    assert!(store.find_by_user(USER_ID).await.unwrap().is_none());

    let result = service
        .submit(USER_ID, exam.id, &answers(&questions, 1))
        .await
        .unwrap();

    let candidate = store.find_by_user(USER_ID).await.unwrap().unwrap();
    assert_eq!(result.candidate_id, candidate.id);
    assert_eq!(candidate.full_name(), "Ada Tester");
}

#[tokio::test]
async fn certificate_failure_keeps_the_result() {
    let (store, exam, questions) = setup(60, 5).await;
    let service = service(&store, Arc::new(FailingSink));

    let result = service
        .submit(USER_ID, exam.id, &answers(&questions, 5))
        .await
        .unwrap();

    assert!(result.is_passed);
    assert_eq!(result.certificate_path, None);

    let stored = store.get(result.id).await.unwrap().unwrap();
    assert!(stored.is_passed);
    assert_eq!(stored.certificate_path, None);
}

#[tokio::test]
async fn certificate_can_be_regenerated_after_failure() {
    let (store, exam, questions) = setup(60, 5).await;
    let failed = service(&store, Arc::new(FailingSink))
        .submit(USER_ID, exam.id, &answers(&questions, 4))
        .await
        .unwrap();
    assert_eq!(failed.certificate_path, None);

    let sink = Arc::new(MemorySink::new());
    let retried = service(&store, sink.clone())
        .regenerate_certificate(failed.id)
        .await
        .unwrap();

    let path = retried.certificate_path.clone().unwrap();
    assert!(sink.get(&path).is_some());
    assert_eq!(retried.score, failed.score);
    assert_eq!(retried.completed_at, failed.completed_at);

    let stored = store.get(failed.id).await.unwrap().unwrap();
    assert_eq!(stored.certificate_path, Some(path));
}

#[tokio::test]
async fn regenerating_a_failed_attempt_is_refused() {
    let (store, exam, questions) = setup(60, 5).await;
    let service = service(&store, Arc::new(MemorySink::new()));
    let result = service
        .submit(USER_ID, exam.id, &answers(&questions, 1))
        .await
        .unwrap();

    let err = service.regenerate_certificate(result.id).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Certificate(CertificateError::NotPassed(_))
    ));
}

#[tokio::test]
async fn different_candidates_get_distinct_certificates() {
    let (store, exam, questions) = setup(60, 3).await;
    // Same display name on purpose.
    add_user(&store, USER_ID + 1, "Ada").await;
    let sink = Arc::new(MemorySink::new());
    let service = service(&store, sink.clone());

    let a = service
        .submit(USER_ID, exam.id, &answers(&questions, 3))
        .await
        .unwrap();
    let b = service
        .submit(USER_ID + 1, exam.id, &answers(&questions, 3))
        .await
        .unwrap();

    assert_ne!(a.certificate_path, b.certificate_path);
    assert_eq!(sink.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_record_one_attempt() {
    let (store, exam, questions) = setup(60, 5).await;
    let service = Arc::new(service(&store, Arc::new(MemorySink::new())));
    let submission = answers(&questions, 4);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let submission = submission.clone();
        let exam_id = exam.id;
        handles.push(tokio::spawn(async move {
            service.submit(USER_ID, exam_id, &submission).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(SubmitError::AlreadyAttempted) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(store.result_count().await, 1);
}
