use phf::phf_map;

/// Display profile of a well-known itag: (resolution, audio bitrate).
pub type ItagProfile = (Option<&'static str>, Option<&'static str>);

/// Static itag table, used when a player payload omits `qualityLabel` or `bitrate`.
pub static ITAGS: phf::Map<u32, ItagProfile> = phf_map! {
    // Progressive
    5u32 => (Some("240p"), Some("64kbps")),
    6u32 => (Some("270p"), Some("64kbps")),
    13u32 => (Some("144p"), None),
    17u32 => (Some("144p"), Some("24kbps")),
    18u32 => (Some("360p"), Some("96kbps")),
    22u32 => (Some("720p"), Some("192kbps")),
    34u32 => (Some("360p"), Some("128kbps")),
    35u32 => (Some("480p"), Some("128kbps")),
    36u32 => (Some("240p"), None),
    37u32 => (Some("1080p"), Some("192kbps")),
    38u32 => (Some("3072p"), Some("192kbps")),
    43u32 => (Some("360p"), Some("128kbps")),
    44u32 => (Some("480p"), Some("128kbps")),
    45u32 => (Some("720p"), Some("192kbps")),
    46u32 => (Some("1080p"), Some("192kbps")),
    // DASH video
    133u32 => (Some("240p"), None),
    134u32 => (Some("360p"), None),
    135u32 => (Some("480p"), None),
    136u32 => (Some("720p"), None),
    137u32 => (Some("1080p"), None),
    138u32 => (Some("2160p"), None),
    160u32 => (Some("144p"), None),
    242u32 => (Some("240p"), None),
    243u32 => (Some("360p"), None),
    244u32 => (Some("480p"), None),
    247u32 => (Some("720p"), None),
    248u32 => (Some("1080p"), None),
    264u32 => (Some("1440p"), None),
    266u32 => (Some("2160p"), None),
    271u32 => (Some("1440p"), None),
    272u32 => (Some("4320p"), None),
    278u32 => (Some("144p"), None),
    298u32 => (Some("720p"), None),
    299u32 => (Some("1080p"), None),
    302u32 => (Some("720p"), None),
    303u32 => (Some("1080p"), None),
    308u32 => (Some("1440p"), None),
    313u32 => (Some("2160p"), None),
    315u32 => (Some("2160p"), None),
    394u32 => (Some("144p"), None),
    395u32 => (Some("240p"), None),
    396u32 => (Some("360p"), None),
    397u32 => (Some("480p"), None),
    398u32 => (Some("720p"), None),
    399u32 => (Some("1080p"), None),
    400u32 => (Some("1440p"), None),
    401u32 => (Some("2160p"), None),
    402u32 => (Some("4320p"), None),
    // DASH audio
    139u32 => (None, Some("48kbps")),
    140u32 => (None, Some("128kbps")),
    141u32 => (None, Some("256kbps")),
    171u32 => (None, Some("128kbps")),
    172u32 => (None, Some("256kbps")),
    249u32 => (None, Some("50kbps")),
    250u32 => (None, Some("70kbps")),
    251u32 => (None, Some("160kbps")),
    256u32 => (None, Some("192kbps")),
    258u32 => (None, Some("384kbps")),
    599u32 => (None, Some("31kbps")),
    600u32 => (None, Some("35kbps")),
};

pub fn itag_profile(itag: u32) -> ItagProfile {
    ITAGS.get(&itag).copied().unwrap_or((None, None))
}

pub fn compact_num(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn human_readable_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let b = bytes as f64;

    if b >= GIB {
        format!("{:.2}GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2}MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2}KiB", b / KIB)
    } else {
        format!("{}B", bytes)
    }
}

/// `H:MM:SS`, or `M:SS` under an hour.
pub fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
