use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Outcome level of a single evaluation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The requirement is satisfied.
    Info,
    /// The requirement could only partially be checked.
    Warn,
    /// The requirement is not satisfied.
    Error,
}

/// A diagnostic record appended to the result log by a handler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Address of the input descriptor, `$.input_descriptors[i]`.
    pub input_descriptor_path: String,
    /// Address of the credential, `$[j]` or `$.verifiableCredential[j]`.
    pub verifiable_credential_path: String,
    /// Name of the handler that produced the record.
    pub evaluator: String,
    pub status: Status,
    pub message: String,
    /// Handler specific details.
    pub payload: Json,
}

/// Address of the input descriptor at `index`.
pub fn input_descriptor_path(index: usize) -> String {
    format!("$.input_descriptors[{index}]")
}

/// Inverse of [input_descriptor_path].
pub fn input_descriptor_index(path: &str) -> Option<usize> {
    path.strip_prefix("$.input_descriptors[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}
