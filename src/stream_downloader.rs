use std::path::Path;

use anyhow::{Result, anyhow, bail};
use log::debug;
use reqwest::{Client, RequestBuilder, header};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::yt_interface::YtStream;

/// Called after every chunk written to disk with the stream, the chunk, the open
/// output file and the number of bytes still to download.
pub type OnProgress = Box<dyn Fn(&YtStream, &[u8], &File, u64) + Send + Sync>;

pub const DEFAULT_CHUNK_SIZE: u64 = 9 * 1024 * 1024;

/// Fetches a stream as consecutive byte ranges, one request at a time.
pub struct StreamDownloader {
    client: Client,
    chunk_size: u64,
}

impl StreamDownloader {
    pub fn new(client: Client, chunk_size: u64) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }

    fn request(&self, builder: RequestBuilder, stream: &YtStream) -> RequestBuilder {
        match &stream.user_agent {
            Some(user_agent) => builder.header(header::USER_AGENT, user_agent),
            None => builder,
        }
    }

    pub async fn content_length(&self, url: &str, stream: &YtStream) -> Result<u64> {
        let response = self
            .request(self.client.head(url), stream)
            .send()
            .await?
            .error_for_status()?;

        let len = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .ok_or_else(|| anyhow!("Missing Content-Length"))?
            .to_str()?
            .parse::<u64>()?;

        Ok(len)
    }

    /// Downloads `url` into `output`, returning the number of bytes written.
    pub async fn download(
        &self,
        stream: &YtStream,
        url: &str,
        output: &Path,
        on_progress: Option<&OnProgress>,
    ) -> Result<u64> {
        let len = match stream.file_size {
            Some(len) => len,
            None => self.content_length(url, stream).await?,
        };

        let mut stream = stream.clone();
        stream.file_size = Some(len);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(output)
            .await?;

        debug!(
            "Downloading itag {} ({} bytes) to {}",
            stream.itag,
            len,
            output.display()
        );

        let mut downloaded = 0u64;

        while downloaded < len {
            let start = downloaded;
            let end = start.saturating_add(self.chunk_size).min(len) - 1;
            let range_header = format!("bytes={}-{}", start, end);

            let mut resp = self
                .request(self.client.get(url), &stream)
                .header(header::RANGE, range_header)
                .send()
                .await?
                .error_for_status()?;

            while let Some(chunk) = resp.chunk().await? {
                file.write_all(&chunk).await?;
                downloaded += chunk.len() as u64;

                if let Some(on_progress) = on_progress {
                    on_progress(&stream, &chunk, &file, len.saturating_sub(downloaded));
                }
            }

            if downloaded == start {
                bail!(
                    "Server returned no data for bytes {}-{} of itag {}",
                    start,
                    end,
                    stream.itag
                );
            }
        }

        file.flush().await?;

        Ok(downloaded)
    }
}
