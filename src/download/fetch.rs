//! HTTP retrieval of stream bytes and cover images

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::FetchError;

/// MIME type assumed for images that neither declare nor reveal their type
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Image bytes with their MIME type, ready to embed as cover art
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Fetches remote assets with a single GET each, never retrying
#[derive(Clone)]
pub struct Fetcher {
    http_client: Client,
}

impl Fetcher {
    pub fn new() -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("tunedl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http_client })
    }

    /// Download an audio stream
    ///
    /// The body is read chunk by chunk so a cancelled token stops the
    /// transfer promptly; a cancelled download returns nothing.
    pub async fn fetch_audio(&self, url: &str, cancel: &CancellationToken) -> Result<Bytes, FetchError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.http_client.get(url).send() => response?,
        };
        let response = check_status(response)?;

        // Services answer with an error document instead of audio
        if let Some(content_type) = content_type(&response) {
            if content_type.contains("json") || content_type.contains("xml") {
                return Err(FetchError::UnexpectedContent(content_type));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                chunk = stream.next() => match chunk {
                    Some(chunk) => body.extend_from_slice(&chunk?),
                    None => break,
                },
            }
        }

        debug!("Fetched {} bytes of audio", body.len());
        Ok(body.freeze())
    }

    /// Download an image and determine its MIME type
    ///
    /// Uses the `Content-Type` header, then the image signature, then JPEG.
    pub async fn fetch_image(&self, url: &str) -> Result<CoverArt, FetchError> {
        let response = check_status(self.http_client.get(url).send().await?)?;
        let declared = content_type(&response).filter(|t| t.starts_with("image/"));
        let data = response.bytes().await?.to_vec();

        let mime_type = declared
            .or_else(|| {
                image::guess_format(&data)
                    .ok()
                    .map(|format| format.to_mime_type().to_string())
            })
            .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string());

        debug!("Fetched {} byte cover ({})", data.len(), mime_type);
        Ok(CoverArt { mime_type, data })
    }
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status(status))
    }
}

/// Media type without parameters, lowercased
fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}
