//! Evaluation of candidate credentials against a presentation definition.
//!
//! An evaluation run threads one [EvaluationContext] through an ordered list
//! of [EvaluationHandler]s. Each handler appends [EvaluationResult]s to the
//! context and may update the presentation being assembled. Unsatisfied
//! requirements are reported as results with [Status::Error]; an
//! [EvaluationError] means the run itself could not complete.

pub mod context;
pub mod limit_disclosure;
pub mod path_resolver;
pub mod result;
pub mod uri;

pub use context::EvaluationContext;
pub use limit_disclosure::LimitDisclosureHandler;
pub use path_resolver::{JsonPathResolver, PathMatch, PathResolver, PathSegment};
pub use result::{EvaluationResult, Status};
pub use uri::UriEvaluationHandler;

use serde_json::Value as Json;
use tracing::debug;

use crate::config::EvaluationOptions;
use crate::core::presentation_definition::PresentationDefinition;

/// Evaluation error.
///
/// Raised when the inputs break an assumption the pipeline relies on. It is
/// distinct from a completed evaluation reporting failed requirements.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// A constraint field path is not a valid path expression.
    #[error("invalid path expression `{expression}`: {source}")]
    InvalidPathExpression {
        expression: String,
        #[source]
        source: serde_json_path::ParseError,
    },

    /// A candidate credential is not a JSON object.
    #[error("credential at {path} is not a JSON object")]
    MalformedCredential { path: String },

    /// A result refers to an input descriptor the definition does not have.
    #[error("`{0}` does not address an input descriptor of the presentation definition")]
    UnresolvedDescriptorPath(String),

    /// A disclosed value cannot be placed at its location.
    #[error("cannot place disclosed value at {path}")]
    UnreachableSegment { path: String },
}

impl EvaluationError {
    pub(crate) fn invalid_path(expression: &str, source: serde_json_path::ParseError) -> Self {
        Self::InvalidPathExpression {
            expression: expression.to_string(),
            source,
        }
    }
}

/// A step of the evaluation pipeline.
///
/// Handlers keep no state between runs: everything they produce goes into
/// the context they are given.
pub trait EvaluationHandler {
    /// Name stamped into every result the handler produces.
    fn name(&self) -> &'static str;

    /// Evaluate `credentials` against `definition`.
    ///
    /// The length of `credentials` is authoritative for the call. Per-item
    /// failures are recorded in `context`; an `Err` aborts the run and leaves
    /// `context` partially updated.
    fn handle(
        &self,
        context: &mut EvaluationContext,
        definition: &PresentationDefinition,
        credentials: &[Json],
    ) -> Result<(), EvaluationError>;
}

/// Ordered list of handlers run against a fresh context.
pub struct EvaluationPipeline {
    handlers: Vec<Box<dyn EvaluationHandler>>,
    options: EvaluationOptions,
}

impl Default for EvaluationPipeline {
    /// Schema URI evaluation followed by limited disclosure.
    fn default() -> Self {
        Self::new(EvaluationOptions::default())
            .with_handler(UriEvaluationHandler)
            .with_handler(LimitDisclosureHandler::new(JsonPathResolver))
    }
}

impl EvaluationPipeline {
    /// Returns a pipeline without any handler.
    pub fn new(options: EvaluationOptions) -> Self {
        Self {
            handlers: Vec::new(),
            options,
        }
    }

    /// Append a handler, run after the ones already registered.
    pub fn with_handler(mut self, handler: impl EvaluationHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Names of the registered handlers, in execution order.
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Evaluate `credentials` against `definition` in a fresh context.
    pub fn evaluate(
        &self,
        definition: &PresentationDefinition,
        credentials: &[Json],
    ) -> Result<EvaluationContext, EvaluationError> {
        let mut context = EvaluationContext::new(credentials.to_vec(), self.options.clone());
        self.run(&mut context, definition, credentials)?;
        Ok(context)
    }

    /// Run every handler against `context`, stopping at the first error.
    pub fn run(
        &self,
        context: &mut EvaluationContext,
        definition: &PresentationDefinition,
        credentials: &[Json],
    ) -> Result<(), EvaluationError> {
        for handler in &self.handlers {
            debug!(handler = handler.name(), "running evaluation handler");
            handler.handle(context, definition, credentials)?;
        }

        Ok(())
    }
}
