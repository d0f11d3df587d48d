use core::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde_json::Value;
use url::Url;

use crate::utils::safe_filename;

#[derive(Debug)]
pub enum YtEndpoint {
    Player,
}

impl YtEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum YtClient {
    Web,
    /// Returns plain stream URLs, no signature cipher and no PoToken.
    /// YouTube Kids videos aren't returned on this client.
    AndroidVr,
}

impl YtClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::AndroidVr => "android_vr",
        }
    }
}

pub const DEFAULT_YT_CLIENT: YtClient = YtClient::Web;
pub const PREFERRED_LOCALE: &str = "en";
pub const YT_URL: &str = "https://www.youtube.com";
pub const PLAYER_JS_MAIN_VARIANT: &str = "player_ias.vflset/en_US/base.js";
/// Longest file name, in bytes, most filesystems accept.
pub const MAX_FILENAME_BYTES: usize = 255;

pub enum PlayerIdentifier {
    PlayerId(String),
    PlayerUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct VideoId(String);

impl VideoId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self> {
        let s = s.into();
        if s.len() != 11 {
            return Err(anyhow!(
                "invalid length: expected 11 characters, got {}",
                s.len()
            ));
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!("invalid characters in video ID: {}", s));
        }

        Ok(Self(s))
    }

    /// Pulls the video id out of any of the usual YouTube URL shapes
    /// (`watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/live/`), or accepts a bare id.
    pub fn from_url(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Ok(id) = Self::new(input) {
            return Ok(id);
        }

        let url = Url::parse(input).or_else(|_| Url::parse(&format!("https://{input}")))?;
        let host = url.host_str().unwrap_or_default();

        let candidate = if host == "youtu.be" || host.ends_with(".youtu.be") {
            url.path_segments().and_then(|mut s| s.next()).map(str::to_string)
        } else if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            Some(v.into_owned())
        } else {
            let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
            match segments.as_slice() {
                [kind, id, ..] if matches!(*kind, "embed" | "shorts" | "live" | "v" | "e") => {
                    Some(id.to_string())
                }
                _ => None,
            }
        };

        candidate
            .ok_or_else(|| anyhow!("could not find a video ID in \"{input}\""))
            .and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<VideoId> for Value {
    fn from(value: VideoId) -> Self {
        Value::String(value.0)
    }
}

impl FromStr for VideoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ext {
    Mp4,
    M4a,
    Webm,
    ThreeGp,
    Mp3,
    Mkv,
    Mka,
    Ogg,
    Flv,
    Mov,
    Ts,
    #[default]
    Unknown,
}

impl Ext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::M4a => "m4a",
            Self::Webm => "webm",
            Self::ThreeGp => "3gp",
            Self::Mp3 => "mp3",
            Self::Mkv => "mkv",
            Self::Mka => "mka",
            Self::Ogg => "ogg",
            Self::Flv => "flv",
            Self::Mov => "mov",
            Self::Ts => "ts",
            Self::Unknown => "unknown_video",
        }
    }
}

#[derive(Debug, Clone)]
pub enum YtStreamSource {
    URL(String),
    Signature(String),
}

#[derive(Debug, Clone)]
pub struct YtStream {
    pub itag: u32,
    /// Bare MIME type, e.g. `video/mp4`, without the codecs parameter.
    pub mime_type: String,
    pub ext: Ext,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub resolution: Option<String>,
    pub fps: Option<u64>,
    pub abr: Option<String>,
    pub bitrate: Option<u64>,
    pub file_size: Option<u64>,
    pub title: String,
    pub source: YtStreamSource,
    /// User agent of the innertube client the stream URL was issued to.
    pub user_agent: Option<String>,
}

impl YtStream {
    /// `video` or `audio`, taken from the MIME type.
    pub fn stream_type(&self) -> &str {
        self.mime_type.split('/').next().unwrap_or_default()
    }

    pub fn is_progressive(&self) -> bool {
        self.video_codec.is_some() && self.audio_codec.is_some()
    }

    pub fn includes_video_track(&self) -> bool {
        self.is_progressive() || self.stream_type() == "video"
    }

    pub fn includes_audio_track(&self) -> bool {
        self.is_progressive() || self.stream_type() == "audio"
    }

    pub fn default_filename(&self) -> String {
        let ext = self.ext.as_str();
        let mut name = safe_filename(&self.title, MAX_FILENAME_BYTES - ext.len() - 1);
        if name.is_empty() {
            name = format!("itag-{}", self.itag);
        }

        format!("{}.{}", name, ext)
    }
}

impl fmt::Display for YtStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![
            format!("itag=\"{}\"", self.itag),
            format!("mime_type=\"{}\"", self.mime_type),
        ];

        if self.includes_video_track() {
            parts.push(format!(
                "res=\"{}\"",
                self.resolution.as_deref().unwrap_or_default()
            ));
            parts.push(format!("fps=\"{}fps\"", self.fps.unwrap_or_default()));
            parts.push(format!(
                "vcodec=\"{}\"",
                self.video_codec.as_deref().unwrap_or_default()
            ));
            if self.is_progressive() {
                parts.push(format!(
                    "acodec=\"{}\"",
                    self.audio_codec.as_deref().unwrap_or_default()
                ));
            }
        } else {
            parts.push(format!("abr=\"{}\"", self.abr.as_deref().unwrap_or_default()));
            parts.push(format!(
                "acodec=\"{}\"",
                self.audio_codec.as_deref().unwrap_or_default()
            ));
        }

        parts.push(format!("progressive=\"{}\"", self.is_progressive()));
        parts.push(format!("type=\"{}\"", self.stream_type()));

        write!(f, "<Stream: {}>", parts.join(" "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct YtVideoInfo {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub channel_id: String,
    pub length_seconds: u64,
    pub view_count: u64,
    pub short_description: String,
    pub is_live: bool,
}
