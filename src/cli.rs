use std::{future::Future, io, path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser};
use colored::Colorize;
use log::{debug, warn};
use tokio::fs::File;

use crate::{
    format::{compact_num, format_duration},
    progress::{DEFAULT_FILL, DEFAULT_SCALE, display_progress_bar},
    report,
    youtube::{YouTube, YouTubeOptions},
    yt_interface::YtStream,
};

/// Command line application to list and download YouTube streams.
#[derive(Parser, Debug)]
#[command(name = "ytfetch", version, about)]
pub struct Args {
    /// The YouTube /watch url
    pub url: Option<String>,

    /// The itag for the desired stream
    #[arg(long)]
    pub itag: Option<u32>,

    /// Return a list of streams available to download
    #[arg(short, long)]
    pub list: bool,

    /// Verbosity level, repeat for more
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,

    /// Save the html and js to disk
    #[arg(long)]
    pub build_playback_report: bool,

    /// Directory downloads and reports are written to
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListStreams,
    BuildPlaybackReport,
    Download(u32),
    ShowMetadata,
}

impl Args {
    /// The single action a run performs. `--list` wins over `--build-playback-report`,
    /// which wins over `--itag`.
    pub fn action(&self) -> Action {
        if self.list {
            Action::ListStreams
        } else if self.build_playback_report {
            Action::BuildPlaybackReport
        } else if let Some(itag) = self.itag {
            Action::Download(itag)
        } else {
            Action::ShowMetadata
        }
    }

    pub fn options(&self) -> YouTubeOptions {
        YouTubeOptions {
            output_dir: self.target.clone().unwrap_or_else(|| PathBuf::from(".")),
            ..Default::default()
        }
    }
}

pub async fn run(args: Args) -> Result<ExitCode> {
    let Some(url) = args.url.as_deref() else {
        Args::command().print_help()?;
        return Ok(ExitCode::from(1));
    };

    let yt = YouTube::with_options(url, args.options())?.on_progress(Box::new(on_progress));
    execute(&yt, args.action()).await?;

    Ok(ExitCode::SUCCESS)
}

pub async fn execute(yt: &YouTube, action: Action) -> Result<()> {
    debug!("Running {:?} for {}", action, yt.video_id());

    match action {
        Action::ListStreams => display_streams(yt).await,
        Action::BuildPlaybackReport => build_playback_report(yt).await,
        Action::Download(itag) => download(yt, itag).await,
        Action::ShowMetadata => display_metadata(yt).await,
    }
}

pub async fn display_streams(yt: &YouTube) -> Result<()> {
    for stream in yt.streams().await?.all() {
        println!("{}", stream);
    }

    Ok(())
}

pub async fn display_metadata(yt: &YouTube) -> Result<()> {
    let info = yt.video_info().await?;

    println!("{}", info.title.bold());
    println!("{} {}", "Author:".cyan(), info.author);
    println!("{} {}", "Video ID:".cyan(), info.video_id);
    if info.is_live {
        println!("{} {}", "Length:".cyan(), "live".red());
    } else {
        println!("{} {}", "Length:".cyan(), format_duration(info.length_seconds));
    }
    println!("{} {}", "Views:".cyan(), compact_num(info.view_count));

    if !info.short_description.is_empty() {
        println!();
        println!("{}", info.short_description.dimmed());
    }

    Ok(())
}

pub async fn build_playback_report(yt: &YouTube) -> Result<()> {
    let path = report::build_playback_report(yt).await?;
    println!("{}", path.display());

    Ok(())
}

pub async fn download(yt: &YouTube, itag: u32) -> Result<()> {
    if download_stream(yt, itag).await?.is_some() {
        println!();
    }

    Ok(())
}

/// Downloads the stream with `itag`, or returns `None` after telling the user it doesn't exist.
/// Ctrl-C stops the download and exits the process.
pub async fn download_stream(yt: &YouTube, itag: u32) -> Result<Option<PathBuf>> {
    let streams = yt.streams().await?;
    let Some(stream) = streams.get_by_itag(itag) else {
        println!("Could not find a stream with itag: {}", itag);
        return Ok(None);
    };

    let size = stream
        .file_size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".into());
    println!("\n{} | {} bytes", stream.default_filename(), size);

    match unless_interrupted(stream.download(yt), tokio::signal::ctrl_c()).await {
        Some(path) => path.map(Some),
        None => {
            println!();
            std::process::exit(0);
        }
    }
}

/// Runs `work` to completion, or returns `None` as soon as `interrupt` fires. If the
/// interrupt can't be listened for, `work` simply runs to completion.
async fn unless_interrupted<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = io::Result<()>>,
) -> Option<T> {
    tokio::pin!(work);

    tokio::select! {
        out = &mut work => Some(out),
        signal = interrupt => match signal {
            Ok(()) => None,
            Err(e) => {
                warn!("Can't listen for Ctrl-C: {e}");
                Some(work.await)
            }
        },
    }
}

fn on_progress(stream: &YtStream, _chunk: &[u8], _file: &File, bytes_remaining: u64) {
    let filesize = stream.file_size.unwrap_or_default();
    let received = filesize.saturating_sub(bytes_remaining);

    if let Err(e) = display_progress_bar(received, filesize, DEFAULT_FILL, DEFAULT_SCALE) {
        debug!("Failed to draw progress bar: {e}");
    }
}
