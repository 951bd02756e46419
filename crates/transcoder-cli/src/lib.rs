//! Create a Transcoder job template that publishes job notifications to Pub/Sub.

pub mod args;
pub mod create_template;
pub mod logging;

pub use args::Args;
pub use create_template::{build_request, create_job_template, CreateTemplateRequest};
