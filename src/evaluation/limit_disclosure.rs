use std::collections::HashMap;

use serde_json::{json, Map, Value as Json};
use tracing::{debug, warn};

use super::path_resolver::{JsonPathResolver, PathMatch, PathResolver, PathSegment};
use super::result::Status;
use super::{EvaluationContext, EvaluationError, EvaluationHandler};
use crate::core::input_descriptor::ConstraintsField;
use crate::core::presentation_definition::PresentationDefinition;

/// Credential properties every disclosed credential keeps, whatever the
/// input descriptor asks for.
pub const MANDATORY_FIELDS: [&str; 5] = [
    "@context",
    "id",
    "credentialSchema",
    "credentialSubject",
    "type",
];

/// Evaluator name stamped into the results of [LimitDisclosureHandler].
pub const NAME: &str = "LimitDisclosureEvaluation";

const DISCLOSED_MESSAGE: &str = "field disclosed in the limited disclosure credential";
const MISSING_MESSAGE: &str = "mandatory field not present in the credential";

/// Rewrites the candidate credentials of input descriptors requiring limited
/// disclosure into credentials holding only the mandatory properties and the
/// fields selected by the descriptor constraints.
///
/// Disclosed credentials are appended to the presentation, once per
/// descriptor map entry of the input descriptor. The original credentials
/// stay in place.
#[derive(Clone, Debug, Default)]
pub struct LimitDisclosureHandler<R = JsonPathResolver> {
    resolver: R,
}

impl<R: PathResolver> LimitDisclosureHandler<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    fn disclose(
        &self,
        context: &mut EvaluationContext,
        fields: &[ConstraintsField],
        descriptor_index: usize,
        credential_index: usize,
        credential: &Json,
    ) -> Result<Json, EvaluationError> {
        let source = credential
            .as_object()
            .ok_or_else(|| EvaluationError::MalformedCredential {
                path: context.credential_path(credential_index),
            })?;

        // Absent mandatory properties are written as `null`.
        let mut disclosed = Json::Object(
            MANDATORY_FIELDS
                .iter()
                .map(|key| (key.to_string(), source.get(*key).cloned().unwrap_or(Json::Null)))
                .collect::<Map<_, _>>(),
        );

        let mut placed = HashMap::new();

        for field in fields {
            match self.first_match(credential, field)? {
                Some(found) => {
                    place(&mut disclosed, &found, &mut placed)?;
                    context.record(
                        NAME,
                        descriptor_index,
                        credential_index,
                        Status::Info,
                        DISCLOSED_MESSAGE,
                        found.path_json(),
                    );
                }
                None => {
                    warn!(
                        paths = ?field.path(),
                        credential = credential_index,
                        "limited disclosure field not found"
                    );
                    context.record(
                        NAME,
                        descriptor_index,
                        credential_index,
                        Status::Error,
                        MISSING_MESSAGE,
                        json!(field.path().to_vec()),
                    );
                }
            }
        }

        Ok(disclosed)
    }

    /// First match of the first path expression of `field` that resolves.
    fn first_match(
        &self,
        credential: &Json,
        field: &ConstraintsField,
    ) -> Result<Option<PathMatch>, EvaluationError> {
        for expression in field.path().iter() {
            if let Some(found) = self.resolver.resolve(credential, expression)?.into_iter().next() {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}

impl<R: PathResolver> EvaluationHandler for LimitDisclosureHandler<R> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn handle(
        &self,
        context: &mut EvaluationContext,
        definition: &PresentationDefinition,
        credentials: &[Json],
    ) -> Result<(), EvaluationError> {
        for (i, descriptor) in definition.input_descriptors().iter().enumerate() {
            if !descriptor.requires_limited_disclosure() {
                continue;
            }

            let fields = descriptor
                .constraints()
                .map(|constraints| constraints.fields().as_slice())
                .unwrap_or_default();

            for (j, credential) in credentials.iter().enumerate() {
                let disclosed = self.disclose(context, fields, i, j, credential)?;

                let copies = context
                    .presentation()
                    .presentation_submission()
                    .and_then(|submission| {
                        submission
                            .descriptor_map_by_id()
                            .get(descriptor.id())
                            .map(Vec::len)
                    })
                    .unwrap_or_default();

                debug!(
                    descriptor = descriptor.id(),
                    credential = j,
                    copies,
                    "disclosed credential"
                );

                for _ in 0..copies {
                    context.presentation_mut().push_credential(disclosed.clone());
                }
            }
        }

        Ok(())
    }
}

/// How a location of a disclosed credential was last written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// Container rebuilt to hold selected fields only.
    Rebuilt,
    /// Value copied verbatim from the source credential.
    Copied,
}

/// Copy the matched value into `disclosed` at the matched location.
///
/// Containers along the way are rebuilt: an object when the next segment is
/// a key, a single-element array otherwise. Index segments into a rebuilt
/// array address that single element. A location is rebuilt once per
/// credential; later fields going through the same location reuse it.
/// Below a value copied verbatim by an earlier field nothing is rebuilt and
/// index segments address the source element.
fn place(
    disclosed: &mut Json,
    found: &PathMatch,
    placed: &mut HashMap<Vec<PathSegment>, Placement>,
) -> Result<(), EvaluationError> {
    let segments = match found.path.split_first() {
        Some((PathSegment::Root, rest)) => rest,
        _ => found.path.as_slice(),
    };

    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let unreachable = || EvaluationError::UnreachableSegment {
        path: found.path_json().to_string(),
    };

    let mut cursor = disclosed;
    let mut rebuilt = false;
    let mut copied = false;
    for (k, segment) in parents.iter().enumerate() {
        let slot = child(cursor, segment, rebuilt).ok_or_else(unreachable)?;

        if !copied {
            match placed.get(&segments[..=k]) {
                Some(Placement::Copied) => copied = true,
                Some(Placement::Rebuilt) => {}
                None => {
                    *slot = match segments[k + 1] {
                        PathSegment::Key(_) => Json::Object(Map::new()),
                        _ => Json::Array(vec![Json::Null]),
                    };
                    placed.insert(segments[..=k].to_vec(), Placement::Rebuilt);
                }
            }
        }
        rebuilt = !copied;

        cursor = slot;
    }

    let slot = child(cursor, last, rebuilt).ok_or_else(unreachable)?;
    *slot = found.value.clone();
    if !copied {
        placed.insert(segments.to_vec(), Placement::Copied);
    }

    Ok(())
}

/// `single_slot` is set for arrays rebuilt by [place].
fn child<'a>(
    container: &'a mut Json,
    segment: &PathSegment,
    single_slot: bool,
) -> Option<&'a mut Json> {
    match (container, segment) {
        (Json::Object(map), PathSegment::Key(key)) => {
            Some(map.entry(key.clone()).or_insert(Json::Null))
        }
        (Json::Array(items), PathSegment::Index(index)) => {
            if single_slot {
                if items.is_empty() {
                    items.push(Json::Null);
                }
                items.first_mut()
            } else {
                items.get_mut(*index)
            }
        }
        _ => None,
    }
}
