use std::collections::HashSet;

use anyhow::{Result, anyhow};
use fancy_regex::Regex;
use log::{debug, warn};
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use crate::{
    extractor::{
        client::INNERTUBE_CLIENTS, json::ExtractorJsonHandle, player::ExtractorPlayerHandle,
    },
    format::itag_profile,
    utils::{convert_to_query_string, json_u64, mime_type_to_ext, parse_codecs, split_mime_type},
    youtube::YouTubeOptions,
    yt_interface::{
        PREFERRED_LOCALE, VideoId, YtClient, YtStream, YtStreamSource, YtVideoInfo,
    },
};

pub struct YtExtractor {
    pub http_client: reqwest::Client,
    pub prefer_insecure: bool,
}

pub trait InfoExtractor {
    fn generate_checkok_params(&self) -> Map<String, Value>;
    fn extract_ytcfg(&self, webpage_content: &str) -> Result<Map<String, Value>>;
    fn extract_initial_player_response(
        &self,
        webpage_content: &str,
        video_id: &VideoId,
    ) -> Result<Option<Map<String, Value>>>;
    fn extract_video_details(&self, player_response: &Map<String, Value>)
    -> Result<YtVideoInfo>;
    fn extract_formats(
        &self,
        player_response: &Map<String, Value>,
        client: &YtClient,
    ) -> Result<Vec<YtStream>>;
}

impl YtExtractor {
    pub fn new(options: &YouTubeOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();

        // Skip the EU consent interstitial and pin the interface language.
        let pref = convert_to_query_string([("hl", PREFERRED_LOCALE), ("tz", "UTC")]);
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("SOCS=CAI; PREF={}", pref))?,
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        if !options.source_address.is_empty() {
            headers.insert(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_str(&options.source_address)?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            prefer_insecure: options.prefer_insecure,
        })
    }

    pub fn http_scheme(&self) -> &'static str {
        if self.prefer_insecure { "http" } else { "https" }
    }
}

impl InfoExtractor for YtExtractor {
    fn generate_checkok_params(&self) -> Map<String, Value> {
        let mut checkout_params_map = Map::new();

        checkout_params_map.insert("contentCheckOk".into(), true.into());
        checkout_params_map.insert("racyCheckOk".into(), true.into());

        checkout_params_map
    }

    fn extract_ytcfg(&self, webpage_content: &str) -> Result<Map<String, Value>> {
        if webpage_content.is_empty() {
            return Ok(Map::new());
        }

        let search_re = Regex::new(r"ytcfg\.set\s*\(\s*(\{.+?\})\s*\)\s*;")?;
        let json_str = search_re
            .captures(webpage_content)?
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
            .unwrap_or("{}");

        let ytcfg: Map<String, Value> = serde_json::from_str(json_str).unwrap_or_else(|e| {
            debug!("Could not parse ytcfg: {e}");
            Map::new()
        });

        Ok(ytcfg)
    }

    fn extract_initial_player_response(
        &self,
        webpage_content: &str,
        video_id: &VideoId,
    ) -> Result<Option<Map<String, Value>>> {
        let Some(initial_pr) =
            self.search_json(r"ytInitialPlayerResponse\s*=", webpage_content)?
        else {
            return Ok(None);
        };

        if let Some(other_id) = self.invalid_player_response(&initial_pr, video_id) {
            warn!(
                "Watch page embedded a player response for \"{}\" instead of \"{}\".",
                other_id, video_id
            );
            return Ok(None);
        }

        Ok(Some(initial_pr))
    }

    fn extract_video_details(
        &self,
        player_response: &Map<String, Value>,
    ) -> Result<YtVideoInfo> {
        let details = player_response
            .get("videoDetails")
            .ok_or_else(|| anyhow!("Player response has no videoDetails"))?;

        let text = |key: &str| {
            details
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(YtVideoInfo {
            video_id: text("videoId"),
            title: text("title"),
            author: text("author"),
            channel_id: text("channelId"),
            length_seconds: json_u64(details.get("lengthSeconds")).unwrap_or_default(),
            view_count: json_u64(details.get("viewCount")).unwrap_or_default(),
            short_description: text("shortDescription"),
            is_live: details
                .get("isLiveContent")
                .and_then(Value::as_bool)
                .unwrap_or_default(),
        })
    }

    fn extract_formats(
        &self,
        player_response: &Map<String, Value>,
        client: &YtClient,
    ) -> Result<Vec<YtStream>> {
        let mut streams: Vec<YtStream> = vec![];
        let mut seen_itags = HashSet::new();

        let title = player_response
            .get("videoDetails")
            .and_then(|vd| vd.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let user_agent = INNERTUBE_CLIENTS
            .get(client)
            .and_then(|c| c.innertube_context.get("client"))
            .and_then(|c| c.get("userAgent"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut all_formats = Vec::new();

        if let Some(streaming_data) = player_response.get("streamingData") {
            if let Some(formats) = streaming_data.get("formats").and_then(Value::as_array) {
                all_formats.extend(formats.iter());
            }
            if let Some(adaptive_formats) = streaming_data
                .get("adaptiveFormats")
                .and_then(Value::as_array)
            {
                all_formats.extend(adaptive_formats.iter());
            }
        }

        for fmt in all_formats {
            // Skip livestream.
            if fmt.get("targetDurationSec").is_some() {
                continue;
            }

            let Some(itag) = json_u64(fmt.get("itag")).and_then(|i| u32::try_from(i).ok()) else {
                continue;
            };

            if !seen_itags.insert(itag) {
                continue;
            }

            let stream_source = if let Some(sc) = fmt.get("signatureCipher").and_then(Value::as_str)
            {
                YtStreamSource::Signature(sc.to_string())
            } else if let Some(fmt_url) = fmt.get("url").and_then(Value::as_str) {
                YtStreamSource::URL(fmt_url.to_string())
            } else {
                continue;
            };

            let raw_mime_type = fmt
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let (mime_type, codecs) = split_mime_type(raw_mime_type)?;
            let (mut video_codec, mut audio_codec) = parse_codecs(&codecs)?;

            // Single codec with a prefix we don't know: trust the MIME type.
            if video_codec.is_none() && audio_codec.is_none() && !codecs.trim().is_empty() {
                if mime_type.starts_with("audio/") {
                    audio_codec = Some(codecs.trim().to_string());
                } else {
                    video_codec = Some(codecs.trim().to_string());
                }
            }

            let (profile_res, profile_abr) = itag_profile(itag);
            let bitrate = json_u64(fmt.get("averageBitrate")).or_else(|| json_u64(fmt.get("bitrate")));

            let resolution = fmt
                .get("qualityLabel")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| profile_res.map(str::to_string));

            let abr = profile_abr.map(str::to_string).or_else(|| {
                mime_type
                    .starts_with("audio/")
                    .then(|| bitrate.map(|b| format!("{}kbps", b / 1000)))
                    .flatten()
            });

            streams.push(YtStream {
                itag,
                ext: mime_type_to_ext(&mime_type),
                mime_type,
                video_codec,
                audio_codec,
                resolution,
                fps: json_u64(fmt.get("fps")),
                abr,
                bitrate,
                file_size: json_u64(fmt.get("contentLength")),
                title: title.clone(),
                source: stream_source,
                user_agent: user_agent.clone(),
            });
        }

        debug!(
            "Extracted {} streams from the {} player response",
            streams.len(),
            client.as_str()
        );

        Ok(streams)
    }
}
