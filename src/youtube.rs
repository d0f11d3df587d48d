use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use log::{info, warn};
use reqwest::Url;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use crate::{
    extractor::{
        download::ExtractorDownloadHandle,
        extract::{InfoExtractor, YtExtractor},
        player::ExtractorPlayerHandle,
    },
    format::human_readable_size,
    stream_downloader::{DEFAULT_CHUNK_SIZE, OnProgress, StreamDownloader},
    yt_interface::{VideoId, YT_URL, YtClient, YtStream, YtStreamSource, YtVideoInfo},
};

pub struct YouTubeOptions {
    /// Attempts to fetch over http instead of https.
    pub prefer_insecure: bool,
    /// Provide an address to set it as the `X-Forwarded-For` header when requesting YouTube.
    pub source_address: String,
    /// Bytes requested per range when downloading a stream.
    pub chunk_size: u64,
    /// Where downloads and playback reports are written.
    pub output_dir: PathBuf,
}

impl Default for YouTubeOptions {
    fn default() -> Self {
        Self {
            prefer_insecure: false,
            source_address: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_dir: PathBuf::from("."),
        }
    }
}

/// The client whose player response supplies the streams.
const STREAMS_CLIENT: YtClient = YtClient::AndroidVr;
/// The client the watch page, and so its embedded player response, is fetched with.
const WATCH_PAGE_CLIENT: YtClient = YtClient::Web;

/// A player response and the innertube client its stream URLs were issued to.
struct PlayerResponse {
    client: YtClient,
    data: Map<String, Value>,
}

/// A handle on one video. Every page and payload is fetched at most once.
pub struct YouTube {
    url: String,
    video_id: VideoId,
    options: YouTubeOptions,
    extractor: YtExtractor,
    on_progress: Option<OnProgress>,
    watch_html: OnceCell<String>,
    vid_info: OnceCell<PlayerResponse>,
    js: OnceCell<String>,
}

impl YouTube {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_options(url, YouTubeOptions::default())
    }

    pub fn with_options(url: &str, options: YouTubeOptions) -> Result<Self> {
        let video_id = VideoId::from_url(url)?;
        let extractor = YtExtractor::new(&options)?;

        Ok(Self {
            url: url.to_string(),
            video_id,
            options,
            extractor,
            on_progress: None,
            watch_html: OnceCell::new(),
            vid_info: OnceCell::new(),
            js: OnceCell::new(),
        })
    }

    /// Registers a callback invoked after each downloaded chunk.
    pub fn on_progress(mut self, on_progress: OnProgress) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Uses an already fetched `android_vr` player response instead of asking YouTube for one.
    pub fn with_player_response(self, player_response: Map<String, Value>) -> Self {
        self.with_client_player_response(STREAMS_CLIENT, player_response)
    }

    /// Like [`YouTube::with_player_response`], for a response issued to `client`.
    pub fn with_client_player_response(
        self,
        client: YtClient,
        player_response: Map<String, Value>,
    ) -> Self {
        Self {
            vid_info: OnceCell::new_with(Some(PlayerResponse {
                client,
                data: player_response,
            })),
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn options(&self) -> &YouTubeOptions {
        &self.options
    }

    pub fn watch_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}://www.youtube.com/watch",
            self.extractor.http_scheme()
        ))?)
    }

    /// Raw HTML of the watch page.
    pub async fn watch_html(&self) -> Result<&str> {
        let html = self
            .watch_html
            .get_or_try_init(|| async {
                self.extractor
                    .download_webpage(self.watch_url()?, &WATCH_PAGE_CLIENT, Some(&self.video_id))
                    .await
            })
            .await?;

        Ok(html.as_str())
    }

    /// Raw player response payload for the video.
    pub async fn vid_info(&self) -> Result<&Map<String, Value>> {
        Ok(&self.player_response().await?.data)
    }

    async fn player_response(&self) -> Result<&PlayerResponse> {
        self.vid_info
            .get_or_try_init(|| self.fetch_player_response())
            .await
    }

    /// Raw player script referenced by the watch page.
    pub async fn js(&self) -> Result<&str> {
        let js = self
            .js
            .get_or_try_init(|| async {
                let html = self.watch_html().await?;
                let ytcfg = self.extractor.extract_ytcfg(html)?;

                let player_url = match self.extractor.get_player_url(&ytcfg) {
                    Some(player_url) => player_url,
                    None => self
                        .extractor
                        .download_player_url(&self.video_id)
                        .await?
                        .ok_or_else(|| anyhow!("Could not find the player URL for {}", self.video_id))?,
                };

                self.extractor.load_player(&player_url).await
            })
            .await?;

        Ok(js.as_str())
    }

    pub async fn video_info(&self) -> Result<YtVideoInfo> {
        self.extractor.extract_video_details(self.vid_info().await?)
    }

    pub async fn streams(&self) -> Result<StreamQuery> {
        let pr = self.player_response().await?;
        let streams = self.extractor.extract_formats(&pr.data, &pr.client)?;

        Ok(StreamQuery::new(streams))
    }

    /// Writes `stream` to `output_dir/<default filename>` and returns the path.
    pub async fn download(&self, stream: &YtStream) -> Result<PathBuf> {
        let url = match &stream.source {
            YtStreamSource::URL(url) => url,
            YtStreamSource::Signature(_) => bail!(
                "Stream with itag {} is signature-ciphered and cannot be downloaded.",
                stream.itag
            ),
        };

        tokio::fs::create_dir_all(&self.options.output_dir).await?;
        let output = self.options.output_dir.join(stream.default_filename());

        let downloader =
            StreamDownloader::new(self.extractor.http_client.clone(), self.options.chunk_size);
        let written = downloader
            .download(stream, url, &output, self.on_progress.as_ref())
            .await?;

        info!("Wrote {} to {}", human_readable_size(written), output.display());

        Ok(output)
    }

    async fn fetch_player_response(&self) -> Result<PlayerResponse> {
        match self
            .extractor
            .extract_player_response(&STREAMS_CLIENT, &self.video_id)
            .await
        {
            Ok(pr) if self.extractor.is_playable(&pr) => {
                return Ok(PlayerResponse {
                    client: STREAMS_CLIENT,
                    data: pr,
                });
            }
            Ok(pr) => warn!(
                "Skipping client \"{}\": {}",
                STREAMS_CLIENT.as_str(),
                self.extractor
                    .playability_reason(&pr)
                    .unwrap_or_else(|| "video is not playable".into())
            ),
            Err(e) => warn!("Skipping client \"{}\": {e}", STREAMS_CLIENT.as_str()),
        }

        info!("Falling back to the player response embedded in {YT_URL}/watch");
        self.watch_page_player_response().await
    }

    async fn watch_page_player_response(&self) -> Result<PlayerResponse> {
        let html = self.watch_html().await?;
        let initial_pr = self
            .extractor
            .extract_initial_player_response(html, &self.video_id)?
            .ok_or_else(|| anyhow!("Failed to extract any player response."))?;

        if !self.extractor.is_playable(&initial_pr) {
            bail!(
                "{} is unavailable: {}",
                self.video_id,
                self.extractor
                    .playability_reason(&initial_pr)
                    .unwrap_or_else(|| "unknown reason".into())
            );
        }

        Ok(PlayerResponse {
            client: WATCH_PAGE_CLIENT,
            data: initial_pr,
        })
    }
}

impl YtStream {
    /// Downloads this stream through the handle it was listed from.
    pub async fn download(&self, yt: &YouTube) -> Result<PathBuf> {
        yt.download(self).await
    }
}

/// The streams offered for one video.
pub struct StreamQuery {
    streams: Vec<YtStream>,
}

impl StreamQuery {
    pub fn new(streams: Vec<YtStream>) -> Self {
        Self { streams }
    }

    pub fn all(&self) -> &[YtStream] {
        &self.streams
    }

    pub fn get_by_itag(&self, itag: u32) -> Option<&YtStream> {
        self.streams.iter().find(|s| s.itag == itag)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl<'a> IntoIterator for &'a StreamQuery {
    type Item = &'a YtStream;
    type IntoIter = std::slice::Iter<'a, YtStream>;

    fn into_iter(self) -> Self::IntoIter {
        self.streams.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract::tests::player_response_fixture;

    fn handle() -> YouTube {
        YouTube::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .unwrap()
            .with_player_response(player_response_fixture())
    }

    #[test]
    fn rejects_urls_without_a_video() {
        assert!(YouTube::new("https://www.youtube.com/").is_err());
    }

    #[tokio::test]
    async fn streams_lookup_by_itag() {
        let yt = handle();
        let streams = yt.streams().await.unwrap();

        assert_eq!(streams.len(), 4);
        assert_eq!(streams.get_by_itag(137).unwrap().resolution.as_deref(), Some("1080p"));
        assert!(streams.get_by_itag(22).is_none());
        assert_eq!((&streams).into_iter().count(), streams.all().len());
    }

    #[tokio::test]
    async fn metadata_from_player_response() {
        let yt = handle();
        let info = yt.video_info().await.unwrap();

        assert_eq!(yt.video_id().as_str(), "dQw4w9WgXcQ");
        assert_eq!(info.title, "Rick Astley - Never Gonna Give You Up (Official Music Video)");
        assert_eq!(info.length_seconds, 212);
    }

    #[tokio::test]
    async fn ciphered_streams_refuse_to_download() {
        let dir = tempfile::tempdir().unwrap();
        let yt = YouTube::with_options(
            "dQw4w9WgXcQ",
            YouTubeOptions {
                output_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        )
        .unwrap()
        .with_player_response(player_response_fixture());

        let streams = yt.streams().await.unwrap();
        let ciphered = streams.get_by_itag(251).unwrap();
        let err = ciphered.download(&yt).await.unwrap_err();

        assert!(err.to_string().contains("251"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    fn watch_page(player_response: &Value) -> String {
        format!(
            "<html><script>var ytInitialPlayerResponse = {};var meta = {{}};</script></html>",
            player_response
        )
    }

    #[tokio::test]
    async fn android_vr_streams_carry_its_user_agent() {
        let streams = handle().streams().await.unwrap();

        assert!(streams.all().iter().all(|s| {
            s.user_agent.as_deref().is_some_and(|ua| ua.contains("oculus"))
        }));
    }

    #[tokio::test]
    async fn watch_page_fallback_streams_carry_the_web_user_agent() {
        let pr = Value::Object(player_response_fixture());
        let mut yt = YouTube::new("dQw4w9WgXcQ").unwrap();
        yt.watch_html = OnceCell::new_with(Some(watch_page(&pr)));

        let fallback = yt.watch_page_player_response().await.unwrap();
        assert_eq!(fallback.client, YtClient::Web);

        let yt = yt.with_client_player_response(fallback.client, fallback.data);
        let streams = yt.streams().await.unwrap();

        assert_eq!(streams.len(), 4);
        assert!(streams.all().iter().all(|s| {
            s.user_agent
                .as_deref()
                .is_some_and(|ua| ua.contains("Chrome") && !ua.contains("oculus"))
        }));
    }

    #[tokio::test]
    async fn unplayable_watch_page_response_is_an_error() {
        let pr = serde_json::json!({
            "videoDetails": { "videoId": "dQw4w9WgXcQ" },
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": "Sign in to confirm your age" }
        });
        let mut yt = YouTube::new("dQw4w9WgXcQ").unwrap();
        yt.watch_html = OnceCell::new_with(Some(watch_page(&pr)));

        let err = yt.watch_page_player_response().await.err().unwrap();
        assert!(err.to_string().contains("Sign in to confirm your age"));
    }
}
