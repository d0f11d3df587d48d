use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use flate2::{Compression, write::GzEncoder};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{youtube::YouTube, yt_interface::VideoId};

/// Everything fetched for a video, kept so extraction problems can be replayed offline.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub url: String,
    pub js: String,
    pub watch_html: String,
    pub video_info: Map<String, Value>,
}

pub fn report_file_name(video_id: &VideoId, timestamp: i64) -> String {
    format!("yt-video-{}-{}.json.gz", video_id, timestamp)
}

/// Writes `report` as gzip-compressed JSON.
pub fn write_report(path: &Path, report: &PlaybackReport) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, report)?;
    encoder.finish()?.flush()?;

    Ok(())
}

/// Fetches the player script, watch page and player response for `yt`, and dumps
/// them into `output_dir/yt-video-<id>-<unix time>.json.gz`.
pub async fn build_playback_report(yt: &YouTube) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().timestamp();
    let path = yt
        .options()
        .output_dir
        .join(report_file_name(yt.video_id(), timestamp));

    let report = PlaybackReport {
        url: yt.url().to_string(),
        js: yt.js().await?.to_string(),
        watch_html: yt.watch_html().await?.to_string(),
        video_info: yt.vid_info().await?.clone(),
    };

    tokio::fs::create_dir_all(&yt.options().output_dir).await?;
    write_report(&path, &report)?;
    info!("Playback report written to {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;

    fn read_report_json(path: &Path) -> String {
        let mut json = String::new();
        flate2::read::GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut json)
            .unwrap();
        json
    }

    #[test]
    fn file_name() {
        let id = VideoId::new("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            report_file_name(&id, 1_700_000_000),
            "yt-video-dQw4w9WgXcQ-1700000000.json.gz"
        );
    }

    #[test]
    fn report_is_gzipped_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json.gz");
        let report = PlaybackReport {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            js: "var a = 1;".into(),
            watch_html: "<html></html>".into(),
            video_info: serde_json::from_value(json!({ "playabilityStatus": { "status": "OK" } }))
                .unwrap(),
        };

        write_report(&path, &report).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let back: PlaybackReport = serde_json::from_str(&read_report_json(&path)).unwrap();
        assert_eq!(back.url, report.url);
        assert_eq!(back.js, report.js);
        assert_eq!(back.video_info["playabilityStatus"]["status"], "OK");
    }

    #[test]
    fn video_info_keeps_payload_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json.gz");
        let raw = r#"{"responseContext":{"zz":1,"aa":2},"playabilityStatus":{"status":"OK"},"streamingData":{},"videoDetails":{"videoId":"dQw4w9WgXcQ"}}"#;
        let report = PlaybackReport {
            url: String::new(),
            js: String::new(),
            watch_html: String::new(),
            video_info: serde_json::from_str(raw).unwrap(),
        };

        write_report(&path, &report).unwrap();

        let json = read_report_json(&path);
        assert!(json.contains(&format!("\"video_info\":{}", raw)), "{json}");
    }
}
