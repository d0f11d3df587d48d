use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::{
    extractor::{
        client::{INNERTUBE_CLIENTS, InnerTubeClient},
        extract::YtExtractor,
    },
    yt_interface::{DEFAULT_YT_CLIENT, PREFERRED_LOCALE, YtClient},
};

pub trait ExtractorYtCfgHandle {
    fn select_innertube_client(
        &self,
        default_client: Option<&YtClient>,
    ) -> Result<&'static InnerTubeClient>;
    fn select_api_hostname(&self, default_client: Option<&YtClient>) -> Result<&'static str>;
    fn select_client_version(&self, default_client: Option<&YtClient>) -> Result<&'static str>;
    fn select_user_agent(&self, default_client: Option<&YtClient>) -> Option<&'static str>;
    fn select_context(&self, default_client: Option<&YtClient>) -> Result<Value>;
}

impl ExtractorYtCfgHandle for YtExtractor {
    fn select_innertube_client(
        &self,
        default_client: Option<&YtClient>,
    ) -> Result<&'static InnerTubeClient> {
        let client = default_client.unwrap_or(&DEFAULT_YT_CLIENT);
        INNERTUBE_CLIENTS
            .get(client)
            .ok_or_else(|| anyhow!("No innertube config for client \"{}\"", client.as_str()))
    }

    fn select_api_hostname(&self, default_client: Option<&YtClient>) -> Result<&'static str> {
        Ok(self.select_innertube_client(default_client)?.innertube_host)
    }

    fn select_client_version(&self, default_client: Option<&YtClient>) -> Result<&'static str> {
        let innertube_client = self.select_innertube_client(default_client)?;

        innertube_client
            .innertube_context
            .get("client")
            .and_then(|c| c.get("clientVersion"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Innertube client is missing a clientVersion"))
    }

    fn select_user_agent(&self, default_client: Option<&YtClient>) -> Option<&'static str> {
        self.select_innertube_client(default_client)
            .ok()?
            .innertube_context
            .get("client")?
            .get("userAgent")?
            .as_str()
    }

    fn select_context(&self, default_client: Option<&YtClient>) -> Result<Value> {
        let innertube_client = self.select_innertube_client(default_client)?;
        let mut client_context: HashMap<&str, Value> = innertube_client
            .innertube_context
            .get("client")
            .cloned()
            .unwrap_or_default();

        client_context.insert("hl", PREFERRED_LOCALE.into());
        client_context.insert("timeZone", "UTC".into());
        client_context.insert("utcOffsetMinutes", 0.into());

        Ok(json!({ "client": client_context }))
    }
}
