use anyhow::Result;
use log::debug;
use reqwest::{Url, header::USER_AGENT};

use crate::{
    extractor::{extract::YtExtractor, ytcfg::ExtractorYtCfgHandle},
    yt_interface::{VideoId, YtClient},
};

pub trait ExtractorDownloadHandle {
    async fn download_webpage(
        &self,
        webpage_url: Url,
        webpage_client: &YtClient,
        video_id: Option<&VideoId>,
    ) -> Result<String>;
}

impl ExtractorDownloadHandle for YtExtractor {
    async fn download_webpage(
        &self,
        webpage_url: Url,
        webpage_client: &YtClient,
        video_id: Option<&VideoId>,
    ) -> Result<String> {
        debug!("Downloading {webpage_url}");

        let mut webpage_request = self.http_client.get(webpage_url);

        if let Some(video_id) = video_id {
            webpage_request = webpage_request.query(&[
                ("bpctr", "9999999999"),
                ("has_verified", "1"),
                ("v", video_id.as_str()),
            ]);
        }

        if let Some(user_agent) = self.select_user_agent(Some(webpage_client)) {
            webpage_request = webpage_request.header(USER_AGENT, user_agent);
        }

        let response = webpage_request.send().await?.error_for_status()?;
        let webpage = response.text().await?;

        Ok(webpage)
    }
}
