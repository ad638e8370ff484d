use serde_json::Value as Json;

use super::result::{input_descriptor_path, EvaluationResult, Status};
use crate::config::EvaluationOptions;
use crate::core::presentation::Presentation;

/// Session state shared by the handlers of one evaluation run.
///
/// The result log can only grow: handlers append through
/// [EvaluationContext::push_result] and never get mutable access to earlier
/// records.
#[derive(Clone, Debug)]
pub struct EvaluationContext {
    results: Vec<EvaluationResult>,
    presentation: Presentation,
    options: EvaluationOptions,
}

impl EvaluationContext {
    /// Returns a fresh context whose presentation holds the candidate credentials.
    pub fn new(credentials: Vec<Json>, options: EvaluationOptions) -> Self {
        Self {
            results: Vec::new(),
            presentation: Presentation::new(credentials),
            options,
        }
    }

    /// Return the result log, in the order the records were produced.
    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    /// Append a record to the result log.
    pub fn push_result(&mut self, result: EvaluationResult) {
        self.results.push(result);
    }

    /// Append a record addressing descriptor `descriptor` and credential
    /// `credential` by position.
    pub fn record(
        &mut self,
        evaluator: &str,
        descriptor: usize,
        credential: usize,
        status: Status,
        message: impl Into<String>,
        payload: Json,
    ) {
        let verifiable_credential_path = self.credential_path(credential);
        self.push_result(EvaluationResult {
            input_descriptor_path: input_descriptor_path(descriptor),
            verifiable_credential_path,
            evaluator: evaluator.to_string(),
            status,
            message: message.into(),
            payload,
        });
    }

    pub fn results_with_status(&self, status: Status) -> impl Iterator<Item = &EvaluationResult> {
        self.results
            .iter()
            .filter(move |result| result.status == status)
    }

    pub fn has_errors(&self) -> bool {
        self.results_with_status(Status::Error).next().is_some()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Address of the credential at `index`, following the configured style.
    pub fn credential_path(&self, index: usize) -> String {
        self.options.credential_path.path(index)
    }

    /// Consume the context, returning the result log and the presentation.
    pub fn into_parts(self) -> (Vec<EvaluationResult>, Presentation) {
        (self.results, self.presentation)
    }
}
