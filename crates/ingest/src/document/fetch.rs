use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::ExtractionError;

/// A downloaded document, held in memory.
pub(crate) struct Fetched {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub(crate) async fn fetch_url(client: &Client, url: &Url) -> Result<Fetched, ExtractionError> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let headers = response.headers();
    let filename = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .unwrap_or_else(|| filename_from_url(url));
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await?;
    debug!(%url, %filename, bytes = bytes.len(), "downloaded");

    Ok(Fetched {
        filename,
        content_type,
        bytes,
    })
}

/// Filename from a `Content-Disposition` header value.
///
/// Handles quoted and bare `filename=` parameters as well as RFC 5987
/// `filename*=UTF-8''...` values, which are percent-decoded.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            "filename*" => {
                let value = value.trim().trim_matches('"');
                // charset'language'encoded-name
                let encoded = value.rsplit('\'').next().unwrap_or(value);
                extended = urlencoding::decode(encoded).ok().map(|s| s.into_owned());
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| base_name(&name).to_string())
        .filter(|name| !name.is_empty())
}

/// Last path segment of the URL, or the host with dots replaced when the path is empty.
pub fn filename_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    if !segment.is_empty() {
        return urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string());
    }
    url.host_str().unwrap_or("download").replace('.', "_")
}

/// Strip any directory components a server may have put in the name.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
