mod extractor;
mod utils;

#[cfg(feature = "cli")]
pub mod cli;
pub mod format;
#[cfg(feature = "logging")]
pub mod logger;
pub mod progress;
pub mod report;
pub mod stream_downloader;
pub mod youtube;
pub mod yt_interface;

pub use crate::youtube::*;
pub use crate::yt_interface::*;
