//! Resource names for locations, job templates and Pub/Sub topics.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a resource name does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} name '{name}': expected {expected}")]
pub struct ResourceNameError {
    pub kind: &'static str,
    pub name: String,
    pub expected: &'static str,
}

/// A project location, `projects/{project}/locations/{location}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationName {
    pub project_id: String,
    pub location: String,
}

impl LocationName {
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
        }
    }

    /// Name of a job template stored in this location.
    pub fn job_template(&self, template_id: impl Into<String>) -> JobTemplateName {
        JobTemplateName {
            parent: self.clone(),
            template_id: template_id.into(),
        }
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/locations/{}", self.project_id, self.location)
    }
}

/// A job template, `projects/{project}/locations/{location}/jobTemplates/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobTemplateName {
    pub parent: LocationName,
    pub template_id: String,
}

impl JobTemplateName {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        LocationName::new(project_id, location).job_template(template_id)
    }
}

impl fmt::Display for JobTemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/jobTemplates/{}", self.parent, self.template_id)
    }
}

impl FromStr for JobTemplateName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_segments(s).as_slice() {
            ["projects", project, "locations", location, "jobTemplates", id] => {
                Ok(Self::new(*project, *location, *id))
            }
            _ => Err(ResourceNameError {
                kind: "job template",
                name: s.to_string(),
                expected: "projects/{project}/locations/{location}/jobTemplates/{template_id}",
            }),
        }
    }
}

/// A Pub/Sub topic, `projects/{project}/topics/{topic}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName {
    pub project_id: String,
    pub topic: String,
}

impl TopicName {
    pub fn new(project_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            topic: topic.into(),
        }
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/topics/{}", self.project_id, self.topic)
    }
}

impl FromStr for TopicName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_segments(s).as_slice() {
            ["projects", project, "topics", topic] => Ok(Self::new(*project, *topic)),
            _ => Err(ResourceNameError {
                kind: "topic",
                name: s.to_string(),
                expected: "projects/{project}/topics/{topic}",
            }),
        }
    }
}

/// Split on '/', rejecting empty segments.
fn split_segments(s: &str) -> Vec<&str> {
    let segments: Vec<&str> = s.split('/').collect();
    if segments.iter().any(|seg| seg.is_empty()) {
        return Vec::new();
    }
    segments
}
