use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use crate::yt_interface::{PREFERRED_LOCALE, YtClient};

#[derive(Debug, Clone)]
pub struct InnerTubeClient {
    pub innertube_context: HashMap<&'static str, HashMap<&'static str, Value>>,
    pub innertube_host: &'static str,
    pub innertube_context_client_name: i32,
}

pub static INNERTUBE_CLIENTS: Lazy<HashMap<YtClient, InnerTubeClient>> = Lazy::new(|| {
    const DEFAULT_INNERTUBE_HOST: &str = "www.youtube.com";

    let mut m = HashMap::new();

    let mut web_context = HashMap::new();
    let mut web_context_client: HashMap<&str, Value> = HashMap::new();

    web_context_client.insert("clientName", "WEB".into());
    web_context_client.insert("clientVersion", "2.20250925.01.00".into());
    web_context_client.insert(
        "userAgent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36".into(),
    );
    web_context_client.insert("hl", PREFERRED_LOCALE.into());

    web_context.insert("client", web_context_client);
    m.insert(
        YtClient::Web,
        InnerTubeClient {
            innertube_context: web_context,
            innertube_host: DEFAULT_INNERTUBE_HOST,
            innertube_context_client_name: 1,
        },
    );

    let mut android_vr_context = HashMap::new();
    let mut android_vr_context_client: HashMap<&str, Value> = HashMap::new();

    android_vr_context_client.insert("clientName", "ANDROID_VR".into());
    android_vr_context_client.insert("clientVersion", "1.65.10".into());
    android_vr_context_client.insert("deviceMake", "Oculus".into());
    android_vr_context_client.insert("deviceModel", "Quest 3".into());
    android_vr_context_client.insert("androidSdkVersion", 32.into());
    android_vr_context_client.insert(
        "userAgent",
        "com.google.android.apps.youtube.vr.oculus/1.65.10 (Linux; U; Android 12L; eureka-user Build/SQ3A.220605.009.A1) gzip".into(),
    );
    android_vr_context_client.insert("osName", "Android".into());
    android_vr_context_client.insert("osVersion", "12L".into());
    android_vr_context_client.insert("hl", PREFERRED_LOCALE.into());

    android_vr_context.insert("client", android_vr_context_client);
    m.insert(
        YtClient::AndroidVr,
        InnerTubeClient {
            innertube_context: android_vr_context,
            innertube_host: DEFAULT_INNERTUBE_HOST,
            innertube_context_client_name: 28,
        },
    );

    m
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_client_has_a_context() {
        for client in [YtClient::Web, YtClient::AndroidVr] {
            let innertube_client = INNERTUBE_CLIENTS.get(&client).unwrap();
            let context = innertube_client.innertube_context.get("client").unwrap();
            assert!(context.get("clientName").and_then(Value::as_str).is_some());
            assert!(context.get("clientVersion").and_then(Value::as_str).is_some());
            assert!(context.get("userAgent").and_then(Value::as_str).is_some());
        }
    }
}
