use std::collections::HashMap;

use anyhow::Result;
use log::debug;
use reqwest::Url;
use serde_json::{Map, Value};

use crate::{
    extractor::{extract::YtExtractor, ytcfg::ExtractorYtCfgHandle},
    yt_interface::{DEFAULT_YT_CLIENT, YtClient, YtEndpoint},
};

pub trait ExtractorApiHandle {
    fn generate_api_headers(
        &self,
        default_client: Option<&YtClient>,
    ) -> Result<HashMap<&'static str, String>>;
    async fn call_api(
        &self,
        endpoint: YtEndpoint,
        query: Map<String, Value>,
        default_client: Option<&YtClient>,
    ) -> Result<Map<String, Value>>;
}

impl ExtractorApiHandle for YtExtractor {
    fn generate_api_headers(
        &self,
        default_client: Option<&YtClient>,
    ) -> Result<HashMap<&'static str, String>> {
        let client = default_client.unwrap_or(&DEFAULT_YT_CLIENT);
        let innertube_client = self.select_innertube_client(Some(client))?;
        let host_name = self.select_api_hostname(Some(client))?;

        let origin = format!("{}://{}", self.http_scheme(), host_name);
        let mut headers = HashMap::new();

        headers.insert(
            "X-YouTube-Client-Name",
            innertube_client.innertube_context_client_name.to_string(),
        );

        headers.insert(
            "X-YouTube-Client-Version",
            self.select_client_version(Some(client))?.to_string(),
        );

        headers.insert("Origin", origin);

        if let Some(user_agent) = self.select_user_agent(Some(client)) {
            headers.insert("User-Agent", user_agent.to_string());
        }

        Ok(headers)
    }

    async fn call_api(
        &self,
        endpoint: YtEndpoint,
        query: Map<String, Value>,
        default_client: Option<&YtClient>,
    ) -> Result<Map<String, Value>> {
        let client = default_client.unwrap_or(&DEFAULT_YT_CLIENT);

        let host_name = self.select_api_hostname(Some(client))?;
        let ep = endpoint.as_str();
        let api_url = format!("{}://{}/youtubei/v1/{}", self.http_scheme(), host_name, ep);
        let yt_url = Url::parse(api_url.as_str())?;

        let mut body = query;
        body.insert("context".into(), self.select_context(Some(client))?);

        let mut request_builder = self
            .http_client
            .post(yt_url)
            .json(&body)
            .query(&[("prettyPrint", "false")]);

        for (key, value) in self.generate_api_headers(Some(client))? {
            request_builder = request_builder.header(key, value);
        }

        debug!("Calling innertube \"{}\" as {}", ep, client.as_str());

        let response = request_builder.send().await?.error_for_status()?;
        let data: Map<String, Value> = response.json().await?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::YouTubeOptions;

    #[test]
    fn api_headers_identify_the_client() {
        let extractor = YtExtractor::new(&YouTubeOptions::default()).unwrap();
        let headers = extractor
            .generate_api_headers(Some(&YtClient::AndroidVr))
            .unwrap();

        assert_eq!(headers["X-YouTube-Client-Name"], "28");
        assert_eq!(headers["X-YouTube-Client-Version"], "1.65.10");
        assert_eq!(headers["Origin"], "https://www.youtube.com");
        assert!(headers["User-Agent"].contains("oculus"));
    }

    #[test]
    fn insecure_origin() {
        let options = YouTubeOptions {
            prefer_insecure: true,
            ..Default::default()
        };
        let extractor = YtExtractor::new(&options).unwrap();
        let headers = extractor.generate_api_headers(None).unwrap();

        assert_eq!(headers["Origin"], "http://www.youtube.com");
    }
}
