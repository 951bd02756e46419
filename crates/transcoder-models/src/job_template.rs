//! Job template types in the Transcoder REST v1 JSON shape.
//!
//! Field names serialize as camelCase. Wire-level oneofs (`videoStream` vs
//! `audioStream` vs `textStream`, `h264` vs `h265` vs `vp9`) are modelled as
//! enums so a value can only ever carry one of them.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reusable server-side configuration for transcoding jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobTemplate {
    /// Full resource name (`projects/*/locations/*/jobTemplates/*`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Job configuration applied to jobs created from this template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JobConfig>,

    /// User labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl JobTemplate {
    /// Create a template with the given name and config.
    pub fn new(name: impl Into<String>, config: JobConfig) -> Self {
        Self {
            name: name.into(),
            config: Some(config),
            labels: BTreeMap::new(),
        }
    }

    /// Returns the template with an added label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Job configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    /// Encoded audio/video tracks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elementary_streams: Vec<ElementaryStream>,

    /// Output containers combining elementary streams
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mux_streams: Vec<MuxStream>,

    /// Where job state notifications are published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub_destination: Option<PubsubDestination>,
}

impl JobConfig {
    /// Look up an elementary stream by key.
    pub fn elementary_stream(&self, key: &str) -> Option<&ElementaryStream> {
        self.elementary_streams.iter().find(|s| s.key == key)
    }

    /// Look up a mux stream by key.
    pub fn mux_stream(&self, key: &str) -> Option<&MuxStream> {
        self.mux_streams.iter().find(|s| s.key == key)
    }
}

/// A single encoded audio, video or text track.
///
/// On the wire the stream kind is a oneof of `videoStream`, `audioStream` and
/// `textStream` next to `key`. Kinds this crate does not model deserialize as
/// [`ElementaryStreamKind::Unknown`] so the surrounding template still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawElementaryStream", into = "RawElementaryStream")]
pub struct ElementaryStream {
    /// Identifier referenced by mux streams
    pub key: String,

    /// The stream definition
    pub kind: ElementaryStreamKind,
}

/// Stream kind of an elementary stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementaryStreamKind {
    Video(VideoStream),
    Audio(AudioStream),
    Text(TextStream),
    /// A kind added to the API after this crate; serializes as the key only
    Unknown,
}

/// Wire form of [`ElementaryStream`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RawElementaryStream {
    #[serde(default)]
    key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_stream: Option<VideoStream>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_stream: Option<AudioStream>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_stream: Option<TextStream>,
}

impl From<RawElementaryStream> for ElementaryStream {
    fn from(raw: RawElementaryStream) -> Self {
        let kind = match (raw.video_stream, raw.audio_stream, raw.text_stream) {
            (Some(video), _, _) => ElementaryStreamKind::Video(video),
            (None, Some(audio), _) => ElementaryStreamKind::Audio(audio),
            (None, None, Some(text)) => ElementaryStreamKind::Text(text),
            (None, None, None) => ElementaryStreamKind::Unknown,
        };
        Self { key: raw.key, kind }
    }
}

impl From<ElementaryStream> for RawElementaryStream {
    fn from(stream: ElementaryStream) -> Self {
        let mut raw = RawElementaryStream {
            key: stream.key,
            ..Default::default()
        };
        match stream.kind {
            ElementaryStreamKind::Video(v) => raw.video_stream = Some(v),
            ElementaryStreamKind::Audio(a) => raw.audio_stream = Some(a),
            ElementaryStreamKind::Text(t) => raw.text_stream = Some(t),
            ElementaryStreamKind::Unknown => {}
        }
        raw
    }
}

impl JsonSchema for ElementaryStream {
    fn schema_name() -> String {
        "ElementaryStream".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        RawElementaryStream::json_schema(gen)
    }
}

impl ElementaryStream {
    /// Create a video elementary stream.
    pub fn video(key: impl Into<String>, stream: VideoStream) -> Self {
        Self {
            key: key.into(),
            kind: ElementaryStreamKind::Video(stream),
        }
    }

    /// Create an audio elementary stream.
    pub fn audio(key: impl Into<String>, stream: AudioStream) -> Self {
        Self {
            key: key.into(),
            kind: ElementaryStreamKind::Audio(stream),
        }
    }

    /// Create a text (caption) elementary stream.
    pub fn text(key: impl Into<String>, stream: TextStream) -> Self {
        Self {
            key: key.into(),
            kind: ElementaryStreamKind::Text(stream),
        }
    }

    pub fn as_video(&self) -> Option<&VideoStream> {
        match &self.kind {
            ElementaryStreamKind::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioStream> {
        match &self.kind {
            ElementaryStreamKind::Audio(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextStream> {
        match &self.kind {
            ElementaryStreamKind::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Text (caption/subtitle) stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextStream {
    /// Caption codec (e.g., "webvtt", "srt", "cea608")
    #[serde(default)]
    pub codec: String,

    /// BCP-47 language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Video stream, keyed by codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoStream {
    H264(VideoCodecSettings),
    H265(VideoCodecSettings),
    Vp9(VideoCodecSettings),
}

impl VideoStream {
    /// H.264 stream at the given resolution, bitrate and frame rate.
    pub fn h264(width_pixels: u32, height_pixels: u32, bitrate_bps: u32, frame_rate: f64) -> Self {
        Self::H264(VideoCodecSettings::new(
            width_pixels,
            height_pixels,
            bitrate_bps,
            frame_rate,
        ))
    }

    /// Codec name as used on the wire.
    pub fn codec(&self) -> &'static str {
        match self {
            VideoStream::H264(_) => "h264",
            VideoStream::H265(_) => "h265",
            VideoStream::Vp9(_) => "vp9",
        }
    }

    pub fn settings(&self) -> &VideoCodecSettings {
        match self {
            VideoStream::H264(s) | VideoStream::H265(s) | VideoStream::Vp9(s) => s,
        }
    }
}

/// Codec settings shared by the H.264, H.265 and VP9 variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoCodecSettings {
    #[serde(default)]
    pub width_pixels: u32,

    #[serde(default)]
    pub height_pixels: u32,

    /// Video bitrate in bits per second
    #[serde(default)]
    pub bitrate_bps: u32,

    /// Target frame rate in frames per second
    #[serde(default)]
    pub frame_rate: f64,

    /// Codec profile (e.g., "high"); the service picks one if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Encoder preset (e.g., "veryfast"); the service picks one if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl VideoCodecSettings {
    pub fn new(width_pixels: u32, height_pixels: u32, bitrate_bps: u32, frame_rate: f64) -> Self {
        Self {
            width_pixels,
            height_pixels,
            bitrate_bps,
            frame_rate,
            profile: None,
            preset: None,
        }
    }
}

/// Audio stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    /// Audio codec (e.g., "aac", "mp3", "opus")
    #[serde(default)]
    pub codec: String,

    /// Audio bitrate in bits per second
    #[serde(default)]
    pub bitrate_bps: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate_hertz: Option<u32>,
}

impl AudioStream {
    pub fn new(codec: impl Into<String>, bitrate_bps: u32) -> Self {
        Self {
            codec: codec.into(),
            bitrate_bps,
            channel_count: None,
            sample_rate_hertz: None,
        }
    }
}

/// Output container combining elementary streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MuxStream {
    /// Identifier of the output
    #[serde(default)]
    pub key: String,

    /// Container format (e.g., "mp4", "ts", "fmp4")
    #[serde(default)]
    pub container: String,

    /// Keys of the elementary streams muxed into this output
    #[serde(default)]
    pub elementary_streams: Vec<String>,

    /// Output file name; the service derives one from the key if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl MuxStream {
    pub fn new<I, S>(key: impl Into<String>, container: impl Into<String>, elementary_streams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            container: container.into(),
            elementary_streams: elementary_streams.into_iter().map(Into::into).collect(),
            file_name: None,
        }
    }
}

/// Pub/Sub destination for job state notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PubsubDestination {
    /// Full topic name (`projects/*/topics/*`)
    pub topic: String,
}
