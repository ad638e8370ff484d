//! This library evaluates candidate credentials against a
//! [DIF Presentation Exchange] presentation definition.
//!
//! [DIF Presentation Exchange]: <https://identity.foundation/presentation-exchange/>
//!
//! # Usage
//!
//! ```ignore
//! use pex_evaluation::core::presentation_definition::PresentationDefinition;
//! use pex_evaluation::evaluation::{EvaluationPipeline, Status};
//!
//! let definition: PresentationDefinition = serde_json::from_value(definition_json)?;
//!
//! // Run schema URI evaluation, then limited disclosure.
//! let context = EvaluationPipeline::default().evaluate(&definition, &credentials)?;
//!
//! if context.has_errors() {
//!     for result in context.results_with_status(Status::Error) {
//!         println!("{}: {}", result.input_descriptor_path, result.message);
//!     }
//! }
//!
//! // The presentation holds the candidates, the disclosed credentials and
//! // the presentation submission.
//! let (_, presentation) = context.into_parts();
//! let document: serde_json::Value = presentation.into();
//! ```
//!
//! # Evaluation
//!
//! 1. *Schema URIs*: the [`UriEvaluationHandler`] checks each credential's
//!    `@context`, `credentialSchema` and `type` URIs against the `schema` of
//!    each version 1 input descriptor, warns about hashlinks it cannot
//!    verify, and derives the presentation submission from the matches.
//! 2. *Limited disclosure*: the [`LimitDisclosureHandler`] rewrites the
//!    credentials of input descriptors with `limit_disclosure: required` so
//!    they only carry the mandatory properties and the selected fields.
//!
//! Every check produces an [`EvaluationResult`] in the context's result log.
//! Further handlers can be plugged in by implementing [`EvaluationHandler`].
//!
//! [`UriEvaluationHandler`]: crate::evaluation::UriEvaluationHandler
//! [`LimitDisclosureHandler`]: crate::evaluation::LimitDisclosureHandler
//! [`EvaluationResult`]: crate::evaluation::EvaluationResult
//! [`EvaluationHandler`]: crate::evaluation::EvaluationHandler

pub mod config;
pub mod core;
pub mod evaluation;
pub mod utils;
