use serde::{Deserialize, Serialize};

use crate::core::credential_format::ClaimFormatDesignation;

/// Options of an evaluation run.
///
/// Every key is optional when deserializing; missing keys take their
/// default value.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EvaluationOptions {
    /// How credentials are addressed in results and descriptor map entries.
    pub credential_path: CredentialPathStyle,
    /// Format written into each descriptor map entry.
    pub submission_format: ClaimFormatDesignation,
}

/// Addressing convention for a credential in the candidate list.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPathStyle {
    /// `$[j]`, relative to the credential list itself.
    #[default]
    Root,
    /// `$.verifiableCredential[j]`, relative to an enclosing presentation.
    VerifiableCredential,
}

impl CredentialPathStyle {
    /// Address of the credential at `index`.
    pub fn path(&self, index: usize) -> String {
        match self {
            Self::Root => format!("$[{index}]"),
            Self::VerifiableCredential => format!("$.verifiableCredential[{index}]"),
        }
    }
}
