use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value as Json};
use serde_json_path::JsonPath;
use tracing::{debug, warn};

use super::result::{input_descriptor_index, Status};
use super::{EvaluationContext, EvaluationError, EvaluationHandler};
use crate::core::presentation_definition::{PexVersion, PresentationDefinition};
use crate::core::presentation_submission::{DescriptorMap, PresentationSubmission};
use crate::utils::one_or_many;

static ENCODED_HASHLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"hl:[a-zA-Z0-9]+:[a-zA-Z0-9]+").expect("valid hashlink pattern"));

static HASHLINK_QUERY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s?#]*\?(?:[^\s#]*&)?hl=[a-zA-Z0-9]+")
        .expect("valid hashlink url pattern")
});

const MATCH_MESSAGE: &str =
    "a credential @context, credentialSchema or type uri equals one of the input descriptor schema uris";
const MISMATCH_MESSAGE: &str =
    "none of the credential @context, credentialSchema or type uris equals an input descriptor schema uri";
const UNRESTRICTED_MESSAGE: &str =
    "presentation definition v2 does not restrict credential schema uris";
const HASHLINK_MESSAGE: &str = "hashlink verification is not supported";

/// Returns `true` if `uri` contains an encoded hashlink, `hl:<hash>:<metadata>`.
pub fn is_encoded_hashlink(uri: &str) -> bool {
    ENCODED_HASHLINK.is_match(uri)
}

/// Returns `true` if `uri` is an http(s) URL carrying an `hl` query parameter.
pub fn is_hashlink_query_url(uri: &str) -> bool {
    HASHLINK_QUERY_URL.is_match(uri)
}

/// Checks that candidate credentials declare one of the schema URIs of each
/// version 1 input descriptor, and derives the presentation submission from
/// the successful checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct UriEvaluationHandler;

impl UriEvaluationHandler {
    pub const NAME: &'static str = "UriEvaluation";

    fn evaluate_schema_uris(
        context: &mut EvaluationContext,
        descriptor_index: usize,
        credential_index: usize,
        descriptor_uris: &[&str],
        credential: &Map<String, Json>,
    ) {
        for uri in descriptor_uris {
            if is_encoded_hashlink(uri) || is_hashlink_query_url(uri) {
                warn!(uri, "input descriptor schema uri is a hashlink");
                context.record(
                    Self::NAME,
                    descriptor_index,
                    credential_index,
                    Status::Warn,
                    HASHLINK_MESSAGE,
                    json!({ "uri": uri }),
                );
            }
        }

        let declared: HashSet<&str> = descriptor_uris.iter().copied().collect();
        let matched = credential_uris(credential)
            .iter()
            .any(|uri| declared.contains(uri));

        let (status, message) = if matched {
            (Status::Info, MATCH_MESSAGE)
        } else {
            (Status::Error, MISMATCH_MESSAGE)
        };

        context.record(
            Self::NAME,
            descriptor_index,
            credential_index,
            status,
            message,
            uri_payload(credential, descriptor_uris),
        );
    }

    /// Build a submission with one descriptor map entry per INFO record of
    /// the whole result log.
    fn submission(
        context: &EvaluationContext,
        definition: &PresentationDefinition,
    ) -> Result<PresentationSubmission, EvaluationError> {
        let format = &context.options().submission_format;

        let descriptor_map = context
            .results_with_status(Status::Info)
            .map(|result| {
                let descriptor = input_descriptor_index(&result.input_descriptor_path)
                    .and_then(|index| definition.input_descriptors().get(index))
                    .ok_or_else(|| {
                        EvaluationError::UnresolvedDescriptorPath(
                            result.input_descriptor_path.clone(),
                        )
                    })?;

                let expression = &result.verifiable_credential_path;
                let path = JsonPath::parse(expression)
                    .map_err(|source| EvaluationError::invalid_path(expression, source))?;

                Ok(DescriptorMap::new(descriptor.id(), format.clone(), path))
            })
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        Ok(PresentationSubmission::new(
            uuid::Uuid::new_v4(),
            definition.id().clone(),
            descriptor_map,
        ))
    }
}

impl EvaluationHandler for UriEvaluationHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handle(
        &self,
        context: &mut EvaluationContext,
        definition: &PresentationDefinition,
        credentials: &[Json],
    ) -> Result<(), EvaluationError> {
        debug!(
            definition = %definition.id(),
            version = ?definition.version(),
            credentials = credentials.len(),
            "evaluating credential schema uris"
        );

        for (i, descriptor) in definition.input_descriptors().iter().enumerate() {
            let descriptor_uris: Vec<&str> = descriptor.schema_uris().collect();

            for (j, credential) in credentials.iter().enumerate() {
                let credential = credential
                    .as_object()
                    .ok_or_else(|| EvaluationError::MalformedCredential {
                        path: context.credential_path(j),
                    })?;

                match definition.version() {
                    PexVersion::V1 => {
                        Self::evaluate_schema_uris(context, i, j, &descriptor_uris, credential)
                    }
                    PexVersion::V2 => context.record(
                        Self::NAME,
                        i,
                        j,
                        Status::Info,
                        UNRESTRICTED_MESSAGE,
                        uri_payload(credential, &[]),
                    ),
                }
            }
        }

        let submission = Self::submission(context, definition)?;
        debug!(
            entries = submission.descriptor_map().len(),
            "computed presentation submission"
        );
        context
            .presentation_mut()
            .set_presentation_submission(submission);

        Ok(())
    }
}

/// URIs declared by a credential: `@context` values, then `credentialSchema`
/// ids, then `type` values. Duplicates are kept.
fn credential_uris(credential: &Map<String, Json>) -> Vec<&str> {
    let contexts = one_or_many(credential.get("@context"))
        .iter()
        .filter_map(Json::as_str);
    let schemas = one_or_many(credential.get("credentialSchema"))
        .iter()
        .filter_map(|schema| schema.get("id").and_then(Json::as_str));
    let types = one_or_many(credential.get("type"))
        .iter()
        .filter_map(Json::as_str);

    contexts.chain(schemas).chain(types).collect()
}

fn uri_payload(credential: &Map<String, Json>, descriptor_uris: &[&str]) -> Json {
    json!({
        "context": credential.get("@context").cloned().unwrap_or(Json::Null),
        "credentialSchema": credential.get("credentialSchema").cloned().unwrap_or(Json::Null),
        "descriptorUris": descriptor_uris,
    })
}
