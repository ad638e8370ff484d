use super::presentation_submission::PresentationSubmission;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// The presentation assembled while evaluating a presentation definition.
///
/// It starts out holding the candidate credentials. Handlers may attach a
/// [PresentationSubmission] and append disclosed credentials to it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Presentation {
    #[serde(rename = "@context")]
    context: Json,
    #[serde(rename = "type")]
    types: Json,
    #[serde(
        rename = "verifiableCredential",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    verifiable_credential: Option<Vec<Json>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    presentation_submission: Option<PresentationSubmission>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            context: Json::String(CREDENTIALS_V1_CONTEXT.to_string()),
            types: Json::String(VERIFIABLE_PRESENTATION_TYPE.to_string()),
            verifiable_credential: None,
            presentation_submission: None,
        }
    }
}

impl Presentation {
    /// Returns a presentation holding the given credentials and no submission.
    pub fn new(credentials: Vec<Json>) -> Self {
        Self {
            verifiable_credential: Some(credentials),
            ..Default::default()
        }
    }

    /// Return the credentials of the presentation, if the list exists.
    pub fn verifiable_credential(&self) -> Option<&Vec<Json>> {
        self.verifiable_credential.as_ref()
    }

    /// Append a credential, creating the credential list if it is absent.
    pub fn push_credential(&mut self, credential: Json) {
        self.verifiable_credential
            .get_or_insert_with(Vec::new)
            .push(credential);
    }

    /// Return the presentation submission, if one was computed.
    pub fn presentation_submission(&self) -> Option<&PresentationSubmission> {
        self.presentation_submission.as_ref()
    }

    /// Replace the presentation submission.
    pub fn set_presentation_submission(&mut self, submission: PresentationSubmission) {
        self.presentation_submission = Some(submission);
    }
}

impl From<Presentation> for Json {
    fn from(value: Presentation) -> Self {
        serde_json::to_value(value)
            // SAFETY: a presentation only holds JSON values and string-keyed
            //         maps, which always serialize.
            .unwrap()
    }
}
