use serde_json::Value as Json;
use serde_json_path::{JsonPath, PathElement};

use super::EvaluationError;

/// One step of a resolved path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// The document root, `$`. Always the first segment of a match.
    Root,
    Key(String),
    Index(usize),
}

impl From<&PathElement<'_>> for PathSegment {
    fn from(element: &PathElement<'_>) -> Self {
        match element {
            PathElement::Name(name) => Self::Key(name.to_string()),
            PathElement::Index(index) => Self::Index(*index),
        }
    }
}

impl From<&PathSegment> for Json {
    fn from(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Root => Json::String("$".into()),
            PathSegment::Key(key) => Json::String(key.clone()),
            PathSegment::Index(index) => Json::from(*index),
        }
    }
}

/// A value found by a path expression, together with its location.
#[derive(Clone, Debug, PartialEq)]
pub struct PathMatch {
    pub path: Vec<PathSegment>,
    pub value: Json,
}

impl PathMatch {
    /// The location as a JSON array, e.g. `["$", "credentialSubject", "name"]`.
    pub fn path_json(&self) -> Json {
        Json::Array(self.path.iter().map(Json::from).collect())
    }
}

/// Resolves path expressions against untyped documents.
pub trait PathResolver {
    /// Returns every match of `expression` in `document`, in document order.
    ///
    /// # Errors
    ///
    /// Fails when `expression` is not a valid path expression.
    fn resolve(
        &self,
        document: &Json,
        expression: &str,
    ) -> Result<Vec<PathMatch>, EvaluationError>;
}

/// [PathResolver] backed by RFC 9535 JSONPath.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPathResolver;

impl PathResolver for JsonPathResolver {
    fn resolve(
        &self,
        document: &Json,
        expression: &str,
    ) -> Result<Vec<PathMatch>, EvaluationError> {
        let path = JsonPath::parse(expression)
            .map_err(|source| EvaluationError::invalid_path(expression, source))?;

        Ok(path
            .query_located(document)
            .into_iter()
            .map(|node| PathMatch {
                path: std::iter::once(PathSegment::Root)
                    .chain(node.location().iter().map(PathSegment::from))
                    .collect(),
                value: node.node().clone(),
            })
            .collect())
    }
}
