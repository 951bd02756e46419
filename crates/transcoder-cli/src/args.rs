//! Command-line arguments.

use clap::Parser;

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_TEMPLATE_ID: &str = "my-job-template";

/// Create a job template that converts input to SD and HD MP4 and publishes
/// job completion notifications to a Pub/Sub topic.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "create-job-template", version)]
pub struct Args {
    /// Your Cloud project ID.
    #[arg(long = "project-id")]
    pub project_id: String,

    /// The location to store this template in.
    #[arg(long, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// The job template ID.
    #[arg(long = "template-id", default_value = DEFAULT_TEMPLATE_ID)]
    pub template_id: String,

    /// The Pub/Sub topic for sending job completion notifications.
    #[arg(long = "pubsub_topic")]
    pub pubsub_topic: String,
}
