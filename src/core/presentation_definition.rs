use super::input_descriptor::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Presentation Exchange version a definition was written against.
///
/// Version 1 input descriptors declare the schema URIs a credential must
/// carry; version 2 removed schema matching entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PexVersion {
    V1,
    #[default]
    V2,
}

/// A presentation definition is a JSON object that describes the information a [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) requires of a [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder).
///
/// Presentation Definitions are composed of inputs, which describe the forms and details of the
/// proofs they require.
///
/// The [PexVersion] is not part of the serialized form. It is discovered
/// when deserializing: a definition whose input descriptors declare a
/// `schema` is a version 1 definition.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawPresentationDefinition")]
pub struct PresentationDefinition {
    id: String,
    #[serde(skip)]
    version: PexVersion,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
}

#[derive(Deserialize)]
struct RawPresentationDefinition {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    name: Option<String>,
    purpose: Option<String>,
}

impl From<RawPresentationDefinition> for PresentationDefinition {
    fn from(raw: RawPresentationDefinition) -> Self {
        let version = if raw
            .input_descriptors
            .iter()
            .any(|descriptor| !descriptor.schema().is_empty())
        {
            PexVersion::V1
        } else {
            PexVersion::V2
        };

        Self {
            id: raw.id,
            version,
            input_descriptors: raw.input_descriptors,
            name: raw.name,
            purpose: raw.purpose,
        }
    }
}

impl PresentationDefinition {
    /// Create a version 1 definition holding a single input descriptor.
    pub fn v1(id: impl Into<String>, input_descriptor: InputDescriptor) -> Self {
        Self::with_version(id, PexVersion::V1, input_descriptor)
    }

    /// Create a version 2 definition holding a single input descriptor.
    pub fn v2(id: impl Into<String>, input_descriptor: InputDescriptor) -> Self {
        Self::with_version(id, PexVersion::V2, input_descriptor)
    }

    fn with_version(id: impl Into<String>, version: PexVersion, input: InputDescriptor) -> Self {
        Self {
            id: id.into(),
            version,
            input_descriptors: vec![input],
            ..Default::default()
        }
    }

    /// Return the id of the presentation definition.
    pub fn id(&self) -> &String {
        &self.id
    }

    /// Return the Presentation Exchange version of the definition.
    pub fn version(&self) -> PexVersion {
        self.version
    }

    /// Add a new input descriptor to the presentation definition.
    pub fn add_input_descriptors(mut self, input_descriptor: InputDescriptor) -> Self {
        self.input_descriptors.push(input_descriptor);
        self
    }

    /// Return the input descriptors of the presentation definition.
    pub fn input_descriptors(&self) -> &Vec<InputDescriptor> {
        &self.input_descriptors
    }

    /// Set the name of the presentation definition.
    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Return the name of the presentation definition.
    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// Set the purpose of the presentation definition.
    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Return the purpose of the presentation definition.
    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }
}

impl TryFrom<Json> for PresentationDefinition {
    type Error = anyhow::Error;

    fn try_from(raw: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(raw).context("invalid presentation definition")
    }
}
