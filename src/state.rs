use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        certificate::{CertificateGenerator, CertificateSink},
        submission::SubmissionService,
    },
    store::{CandidateDirectory, ExamCatalog, ResultStore},
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn ExamCatalog>,
    pub candidates: Arc<dyn CandidateDirectory>,
    pub results: Arc<dyn ResultStore>,
    pub submissions: Arc<SubmissionService>,
}

impl AppState {
    /// Wires every collaborator to one store and one certificate sink.
    pub fn new<S>(config: Config, store: Arc<S>, sink: Arc<dyn CertificateSink>) -> Self
    where
        S: ExamCatalog + CandidateDirectory + ResultStore + 'static,
    {
        let catalog: Arc<dyn ExamCatalog> = store.clone();
        let candidates: Arc<dyn CandidateDirectory> = store.clone();
        let results: Arc<dyn ResultStore> = store;

        let submissions = SubmissionService::new(
            catalog.clone(),
            candidates.clone(),
            results.clone(),
            CertificateGenerator::new(sink),
        );

        Self {
            config,
            catalog,
            candidates,
            results,
            submissions: Arc::new(submissions),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
