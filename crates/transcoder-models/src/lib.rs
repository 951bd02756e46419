//! Job template models for the Transcoder API.
//!
//! This crate provides Serde-serializable types for:
//! - Job templates and job configs (REST v1 JSON shape)
//! - Elementary and mux stream definitions
//! - Resource names for locations, templates and Pub/Sub topics
//! - The SD/HD MP4 preset with completion notifications

pub mod job_template;
pub mod presets;
pub mod resource;

// Re-export common types
pub use job_template::{
    AudioStream, ElementaryStream, ElementaryStreamKind, JobConfig, JobTemplate, MuxStream,
    PubsubDestination, TextStream, VideoCodecSettings, VideoStream,
};
pub use presets::{sd_hd_mp4_config, sd_hd_mp4_template};
pub use resource::{JobTemplateName, LocationName, ResourceNameError, TopicName};
