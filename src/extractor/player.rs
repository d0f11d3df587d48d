use anyhow::{Result, anyhow};
use fancy_regex::Regex;
use log::debug;
use reqwest::Url;
use serde_json::{Map, Value, json};

use crate::{
    extractor::{
        api::ExtractorApiHandle,
        download::ExtractorDownloadHandle,
        extract::{InfoExtractor, YtExtractor},
        json::ExtractorJsonHandle,
    },
    yt_interface::{
        PLAYER_JS_MAIN_VARIANT, PlayerIdentifier, VideoId, YT_URL, YtClient, YtEndpoint,
    },
};

pub trait ExtractorPlayerHandle {
    fn is_playable(&self, player_response: &Map<String, Value>) -> bool;
    fn playability_reason(&self, player_response: &Map<String, Value>) -> Option<String>;
    fn generate_player_context(&self) -> Map<String, Value>;
    fn construct_player_url(&self, player_identifier: PlayerIdentifier) -> String;
    fn extract_player_info(&self, player_url: &str) -> Result<String>;
    fn get_player_url(&self, ytcfg: &Map<String, Value>) -> Option<String>;
    fn invalid_player_response(
        &self,
        pr: &Map<String, Value>,
        video_id: &VideoId,
    ) -> Option<String>;
    async fn download_player_url(&self, video_id: &VideoId) -> Result<Option<String>>;
    async fn load_player(&self, player_url: &str) -> Result<String>;
    async fn extract_player_response(
        &self,
        client: &YtClient,
        video_id: &VideoId,
    ) -> Result<Map<String, Value>>;
}

impl ExtractorPlayerHandle for YtExtractor {
    fn extract_player_info(&self, player_url: &str) -> Result<String> {
        const PLAYER_INFO_RE: [&str; 3] = [
            r"/s/player/(?P<id>[a-zA-Z0-9_-]{8,})/(?:tv-)?player",
            r"/(?P<id>[a-zA-Z0-9_-]{8,})/player(?:_ias\.vflset(?:/[a-zA-Z]{2,3}_[a-zA-Z]{2,3})?|-plasma-ias-(?:phone|tablet)-[a-z]{2}_[A-Z]{2}\.vflset)/base\.js$",
            r"\b(?P<id>vfl[a-zA-Z0-9_-]+)\b.*?\.js$",
        ];

        for player_info_re in PLAYER_INFO_RE {
            let re = Regex::new(player_info_re)?;
            if let Ok(Some(caps)) = re.captures(player_url) {
                if let Some(matched) = caps.name("id") {
                    return Ok(matched.as_str().to_string());
                }
            }
        }

        Err(anyhow!("Cannot identify player: {}", player_url))
    }

    fn construct_player_url(&self, player_identifier: PlayerIdentifier) -> String {
        match player_identifier {
            PlayerIdentifier::PlayerUrl(player_url) if player_url.starts_with("//") => {
                format!("https:{}", player_url)
            }
            PlayerIdentifier::PlayerUrl(player_url) if player_url.starts_with('/') => {
                format!("{}{}", YT_URL, player_url)
            }
            PlayerIdentifier::PlayerUrl(player_url) => player_url,
            PlayerIdentifier::PlayerId(player_id) => format!(
                "{}/s/player/{}/{}",
                YT_URL, player_id, PLAYER_JS_MAIN_VARIANT
            ),
        }
    }

    fn get_player_url(&self, ytcfg: &Map<String, Value>) -> Option<String> {
        if let Some(Value::String(url)) = ytcfg.get("PLAYER_JS_URL") {
            return Some(self.construct_player_url(PlayerIdentifier::PlayerUrl(url.clone())));
        }

        if let Some(Value::Object(web_player_context)) = ytcfg.get("WEB_PLAYER_CONTEXT_CONFIGS")
        {
            for v in web_player_context.values() {
                if let Some(js_url) = v.get("jsUrl").and_then(Value::as_str) {
                    return Some(
                        self.construct_player_url(PlayerIdentifier::PlayerUrl(js_url.to_string())),
                    );
                }
            }
        }

        let ytcfg_value = Value::Object(ytcfg.clone());
        self.find_key(&ytcfg_value, "jsUrl")
            .map(|js_url| self.construct_player_url(PlayerIdentifier::PlayerUrl(js_url)))
    }

    fn invalid_player_response(
        &self,
        pr: &Map<String, Value>,
        video_id: &VideoId,
    ) -> Option<String> {
        // YouTube may return a different video player response than expected.
        let pr_id = pr
            .get("videoDetails")
            .and_then(|vd| vd.get("videoId"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        if pr_id != video_id.as_str() {
            return Some(pr_id.to_string());
        }

        None
    }

    fn is_playable(&self, player_response: &Map<String, Value>) -> bool {
        player_response
            .get("playabilityStatus")
            .and_then(|ps| ps.get("status"))
            .and_then(Value::as_str)
            .is_some_and(|status| status == "OK")
    }

    fn playability_reason(&self, player_response: &Map<String, Value>) -> Option<String> {
        let status = player_response.get("playabilityStatus")?;
        status
            .get("reason")
            .and_then(Value::as_str)
            .or_else(|| status.get("status").and_then(Value::as_str))
            .map(str::to_string)
    }

    async fn download_player_url(&self, video_id: &VideoId) -> Result<Option<String>> {
        let iframe_url = Url::parse(&format!("{}/iframe_api", YT_URL))?;
        let iframe_webpage = self
            .download_webpage(iframe_url, &YtClient::Web, None)
            .await?;

        let player_version_re = Regex::new(r"player\\?/([0-9a-fA-F]{8})\\?/")?;
        let player_version = player_version_re.captures(&iframe_webpage)?;

        if let Some(m) = player_version.and_then(|caps| caps.get(1)) {
            debug!("[{video_id}] Using player {} from iframe API", m.as_str());
            return Ok(Some(self.construct_player_url(
                PlayerIdentifier::PlayerId(m.as_str().to_string()),
            )));
        }

        Ok(None)
    }

    async fn load_player(&self, player_url: &str) -> Result<String> {
        debug!("Loading player {}", self.extract_player_info(player_url)?);

        let code = self
            .download_webpage(Url::parse(player_url)?, &YtClient::Web, None)
            .await?;

        if code.is_empty() {
            return Err(anyhow!("Player {} returned an empty body", player_url));
        }

        Ok(code)
    }

    fn generate_player_context(&self) -> Map<String, Value> {
        let checkout_params = self.generate_checkok_params();

        let mut player_context = Map::new();

        player_context.insert(
            "playbackContext".into(),
            json!({
                "contentPlaybackContext": {
                    "html5Preference": "HTML5_PREF_WANTS"
                }
            }),
        );

        player_context.extend(checkout_params);
        player_context
    }

    async fn extract_player_response(
        &self,
        client: &YtClient,
        video_id: &VideoId,
    ) -> Result<Map<String, Value>> {
        let mut yt_query = Map::new();
        yt_query.insert("videoId".into(), video_id.clone().into());
        yt_query.extend(self.generate_player_context());

        let player_response = self
            .call_api(YtEndpoint::Player, yt_query, Some(client))
            .await?;

        if let Some(invalid_pr_id) = self.invalid_player_response(&player_response, video_id) {
            return Err(anyhow!(
                "Received invalid player response for video with ID \"{}\", got \"{}\" instead.",
                video_id,
                invalid_pr_id
            ));
        }

        Ok(player_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::YouTubeOptions;

    fn extractor() -> YtExtractor {
        YtExtractor::new(&YouTubeOptions::default()).unwrap()
    }

    fn map(v: Value) -> Map<String, Value> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn player_url_from_ytcfg() {
        let ex = extractor();
        let direct = map(json!({ "PLAYER_JS_URL": "/s/player/0004de42/player_ias.vflset/en_US/base.js" }));
        assert_eq!(
            ex.get_player_url(&direct).as_deref(),
            Some("https://www.youtube.com/s/player/0004de42/player_ias.vflset/en_US/base.js")
        );

        let nested = map(json!({
            "WEB_PLAYER_CONTEXT_CONFIGS": {
                "WEB_PLAYER_CONTEXT_CONFIG_ID_KEVLAR_WATCH": { "jsUrl": "/s/player/abcdef12/player_ias.vflset/en_US/base.js" }
            }
        }));
        assert_eq!(
            ex.get_player_url(&nested).as_deref(),
            Some("https://www.youtube.com/s/player/abcdef12/player_ias.vflset/en_US/base.js")
        );

        assert!(ex.get_player_url(&Map::new()).is_none());
    }

    #[test]
    fn player_id_from_url() {
        let ex = extractor();
        let url = ex.construct_player_url(PlayerIdentifier::PlayerId("0004de42".into()));
        assert_eq!(ex.extract_player_info(&url).unwrap(), "0004de42");
        assert!(ex.extract_player_info("https://example.com/app.js").is_err());
    }

    #[test]
    fn playability() {
        let ex = extractor();
        let ok = map(json!({ "playabilityStatus": { "status": "OK" } }));
        let blocked = map(json!({
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": "Sign in to confirm your age" }
        }));

        assert!(ex.is_playable(&ok));
        assert!(!ex.is_playable(&blocked));
        assert!(!ex.is_playable(&Map::new()));
        assert_eq!(
            ex.playability_reason(&blocked).as_deref(),
            Some("Sign in to confirm your age")
        );
    }

    #[test]
    fn mismatched_video_id_is_invalid() {
        let ex = extractor();
        let video_id = VideoId::new("dQw4w9WgXcQ").unwrap();
        let pr = map(json!({ "videoDetails": { "videoId": "aaaaaaaaaaa" } }));

        assert_eq!(
            ex.invalid_player_response(&pr, &video_id).as_deref(),
            Some("aaaaaaaaaaa")
        );

        let pr = map(json!({ "videoDetails": { "videoId": "dQw4w9WgXcQ" } }));
        assert!(ex.invalid_player_response(&pr, &video_id).is_none());
    }
}
