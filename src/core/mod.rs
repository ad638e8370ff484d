//! Presentation Exchange data model: definitions, input descriptors,
//! submissions and the presentation produced by an evaluation.

pub mod credential_format;
pub mod input_descriptor;
pub mod presentation;
pub mod presentation_definition;
pub mod presentation_submission;
