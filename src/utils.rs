use anyhow::Result;
use fancy_regex::Regex;
use maplit::hashmap;
use once_cell::sync::Lazy;

use crate::yt_interface::Ext;
use url::form_urlencoded;

static CODEC_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("codec split pattern is valid"));
static CODEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<cp>[A-Za-z0-9-]+)(?:\.(?P<params>.+))?$").expect("codec pattern is valid")
});
static MIME_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<mime>[\w-]+/[\w.+-]+)(?:\s*;\s*codecs="(?P<codecs>[^"]*)")?"#)
        .expect("mime pattern is valid")
});

pub fn convert_to_query_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }

    serializer.finish()
}

pub fn mime_type_to_ext(mime_type: &str) -> Ext {
    let mime_type_map = hashmap! {
        // Video
        "3gpp" => Ext::ThreeGp,
        "mp2t" => Ext::Ts,
        "mp4" => Ext::Mp4,
        "quicktime" => Ext::Mov,
        "webm" => Ext::Webm,
        "x-flv" => Ext::Flv,
        "x-matroska" => Ext::Mkv,
        "x-mp4-fragmented" => Ext::Mp4,
        // Audio
        "audio/mp4" => Ext::M4a,
        // Per RFC 3003, audio/mpeg can be .mp1, .mp2 or .mp3.
        "audio/mpeg" => Ext::Mp3,
        "audio/webm" => Ext::Webm,
        "audio/x-matroska" => Ext::Mka,
        "ogg" => Ext::Ogg,
        "x-m4a" => Ext::M4a,
    };

    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let subtype = mime.rsplit('/').next().unwrap_or("");

    let subtype_plus = subtype.rsplit('+').next().unwrap_or("");

    mime_type_map
        .get(mime.as_str())
        .or_else(|| mime_type_map.get(subtype))
        .or_else(|| mime_type_map.get(subtype_plus))
        .copied()
        .unwrap_or_default()
}

/// Splits a player `mimeType` such as `video/mp4; codecs="avc1.42001E, mp4a.40.2"`
/// into the bare MIME type and the raw codecs list.
pub fn split_mime_type(mime_type: &str) -> Result<(String, String)> {
    let Some(caps) = MIME_TYPE_RE.captures(mime_type.trim())? else {
        return Ok((mime_type.trim().to_string(), String::new()));
    };

    let mime = caps
        .name("mime")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let codecs = caps
        .name("codecs")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    Ok((mime, codecs))
}

/// Parses `codecs_str` to return (vcodec, acodec)
pub fn parse_codecs(codecs: &str) -> Result<(Option<String>, Option<String>)> {
    if codecs.trim().is_empty() {
        return Ok((None, None));
    }

    // VIDEO prefixes
    const VIDEO_PREFIXES: &[&str] = &[
        "avc1", "avc2", "avc3", "avc4", "vp9", "vp09", "vp8", "hev1", "hev2", "h263", "h264",
        "mp4v", "hvc1", "av1", "av01", "theora", "dvh1", "dvhe",
    ];

    // AUDIO prefixes
    const AUDIO_PREFIXES: &[&str] = &[
        "flac", "mp4a", "opus", "vorbis", "mp3", "aac", "ac-4", "ac-3", "ec-3", "eac3", "dtsc",
        "dtse", "dtsh", "dtsl",
    ];

    let trimmed = codecs.trim().trim_matches(',');

    let mut vcodec: Option<String> = None;
    let mut acodec: Option<String> = None;

    for full_codec in CODEC_SPLIT_RE.split(trimmed) {
        let full_codec = full_codec?.trim();
        if full_codec.is_empty() {
            continue;
        }

        let Some(caps) = CODEC_RE.captures(full_codec)? else {
            continue;
        };

        let Some(codec_prefix) = caps.name("cp").map(|m| m.as_str().to_lowercase()) else {
            continue;
        };
        let params = caps.name("params").map(|m| m.as_str().to_string());

        // Keep the codec as written, minus leading zeros in purely numeric segments.
        let full = if let Some(param_str) = params {
            let cleaned_parts: Vec<String> = param_str
                .split('.')
                .map(|p| {
                    if p.chars().all(|c| c.is_ascii_digit()) {
                        let stripped = p.trim_start_matches('0');
                        if stripped.is_empty() {
                            "0".to_string()
                        } else {
                            stripped.to_string()
                        }
                    } else {
                        p.to_string()
                    }
                })
                .collect();

            format!("{}.{}", codec_prefix, cleaned_parts.join("."))
        } else {
            codec_prefix.clone()
        };

        if VIDEO_PREFIXES.contains(&codec_prefix.as_str()) {
            if vcodec.is_none() {
                vcodec = Some(full);
            }
        } else if AUDIO_PREFIXES.contains(&codec_prefix.as_str()) && acodec.is_none() {
            acodec = Some(full);
        }
    }

    Ok((vcodec, acodec))
}

/// Strips characters that are illegal (or awkward) in file names on common platforms.
/// Strips characters that are unsafe in file names and cuts the result to at most
/// `max_len` bytes on a char boundary.
pub fn safe_filename(s: &str, max_len: usize) -> String {
    const ILLEGAL: &[char] = &[
        '"', '#', '$', '%', '\'', '*', ',', '.', '/', ':', ';', '<', '>', '?', '\\', '^', '|',
        '~', '=',
    ];

    let cleaned: String = s.chars().filter(|c| !ILLEGAL.contains(c)).collect();
    let mut name = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if name.len() > max_len {
        let mut cut = max_len;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
        name = name.trim_end().to_string();
    }

    name
}

pub fn json_u64(value: Option<&serde_json::Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
