//! Built-in job template presets.

use crate::job_template::{
    AudioStream, ElementaryStream, JobConfig, JobTemplate, MuxStream, PubsubDestination,
    VideoStream,
};
use crate::resource::{JobTemplateName, TopicName};

/// SD video elementary stream key
pub const SD_VIDEO_KEY: &str = "video-stream0";
/// HD video elementary stream key
pub const HD_VIDEO_KEY: &str = "video-stream1";
/// Shared audio elementary stream key
pub const AUDIO_KEY: &str = "audio-stream0";

/// SD output mux key
pub const SD_MUX_KEY: &str = "sd";
/// HD output mux key
pub const HD_MUX_KEY: &str = "hd";

pub const VIDEO_CODEC: &str = "h264";
pub const AUDIO_CODEC: &str = "aac";
pub const CONTAINER: &str = "mp4";
pub const FRAME_RATE: f64 = 60.0;

/// SD rendition: 640x360 at 550 kbps
pub const SD_WIDTH: u32 = 640;
pub const SD_HEIGHT: u32 = 360;
pub const SD_BITRATE_BPS: u32 = 550_000;

/// HD rendition: 1280x720 at 2.5 Mbps
pub const HD_WIDTH: u32 = 1280;
pub const HD_HEIGHT: u32 = 720;
pub const HD_BITRATE_BPS: u32 = 2_500_000;

pub const AUDIO_BITRATE_BPS: u32 = 64_000;

/// Two H.264 renditions and one AAC track, muxed into SD and HD MP4 outputs,
/// with job notifications published to `topic`.
pub fn sd_hd_mp4_config(topic: &TopicName) -> JobConfig {
    JobConfig {
        elementary_streams: vec![
            ElementaryStream::video(
                SD_VIDEO_KEY,
                VideoStream::h264(SD_WIDTH, SD_HEIGHT, SD_BITRATE_BPS, FRAME_RATE),
            ),
            ElementaryStream::video(
                HD_VIDEO_KEY,
                VideoStream::h264(HD_WIDTH, HD_HEIGHT, HD_BITRATE_BPS, FRAME_RATE),
            ),
            ElementaryStream::audio(AUDIO_KEY, AudioStream::new(AUDIO_CODEC, AUDIO_BITRATE_BPS)),
        ],
        mux_streams: vec![
            MuxStream::new(SD_MUX_KEY, CONTAINER, [SD_VIDEO_KEY, AUDIO_KEY]),
            MuxStream::new(HD_MUX_KEY, CONTAINER, [HD_VIDEO_KEY, AUDIO_KEY]),
        ],
        pubsub_destination: Some(PubsubDestination {
            topic: topic.to_string(),
        }),
    }
}

/// The SD/HD MP4 preset as a named job template.
pub fn sd_hd_mp4_template(name: &JobTemplateName, topic: &TopicName) -> JobTemplate {
    JobTemplate::new(name.to_string(), sd_hd_mp4_config(topic))
}
