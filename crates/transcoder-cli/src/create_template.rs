//! Build the SD/HD MP4 job template request and submit it.

use anyhow::Context;
use tracing::info;
use transcoder_client::TranscoderClient;
use transcoder_models::{sd_hd_mp4_template, JobTemplate, LocationName, TopicName};

use crate::args::Args;

/// Everything needed for one create call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTemplateRequest {
    pub parent: LocationName,
    pub template_id: String,
    pub template: JobTemplate,
}

/// Marshal the arguments into a create request.
///
/// The topic lives in the same project as the template.
pub fn build_request(args: &Args) -> CreateTemplateRequest {
    let parent = LocationName::new(&args.project_id, &args.location);
    let name = parent.job_template(&args.template_id);
    let topic = TopicName::new(&args.project_id, &args.pubsub_topic);

    CreateTemplateRequest {
        template: sd_hd_mp4_template(&name, &topic),
        template_id: args.template_id.clone(),
        parent,
    }
}

/// Create the job template and return the resource the service stored.
pub async fn create_job_template(client: &TranscoderClient, args: &Args) -> anyhow::Result<JobTemplate> {
    let request = build_request(args);

    info!(
        parent = %request.parent,
        template_id = %request.template_id,
        "Creating job template"
    );

    client
        .create_job_template(&request.parent, &request.template_id, &request.template)
        .await
        .with_context(|| {
            format!(
                "failed to create job template '{}' in {}",
                request.template_id, request.parent
            )
        })
}
