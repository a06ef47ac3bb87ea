use std::{path::PathBuf, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("[E001] API key is required\n\nSuggestions:\n  • Pass the key from your Codequiry account settings\n  • Make sure the key is not an empty string")]
    MissingApiKey,

    #[error("[E002] API key contains characters that cannot be sent in an HTTP header\n\nSuggestions:\n  • Copy the key again from your Codequiry account settings\n  • Remove trailing newlines or control characters")]
    InvalidApiKey,

    #[error("[E003] Cannot connect to Codequiry at {url}\n\nSuggestions:\n  • Check your internet connection\n  • Verify the endpoint URL is correct\n  • The service may be temporarily unavailable")]
    Unreachable { url: Url },

    #[error("[E004] Cannot decode JSON returned by {url} (status {status}): {source}\n\nSuggestions:\n  • The service may be returning an error page\n  • Verify the endpoint URL points at the Codequiry API")]
    UndecodableResponse {
        url: Url,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("[E005] File '{}' does not exist\n\nSuggestions:\n  • Check the path to the zip archive\n  • Upload expects a regular file, not a directory", .0.display())]
    MissingFile(PathBuf),

    #[error("[E006] Upload was rejected with status {0}\n\nSuggestions:\n  • Verify the check id belongs to your account\n  • Make sure the file is a zip archive")]
    UploadRejected(StatusCode),

    #[error("[E007] Invalid base URL: {0}\n\nSuggestions:\n  • Provide a valid HTTP or HTTPS URL\n  • Example: https://codequiry.com/api/v1/\n  • Ensure the URL includes the protocol (http:// or https://)")]
    CannotBeBase(Url),

    #[error("[E008] Invalid URL format: {0}\n\nSuggestions:\n  • Check the URL format is correct\n  • Use absolute URLs with protocol (http:// or https://)")]
    InvalidUrl(#[from] url::ParseError),

    #[error("[E009] Check id is required to listen for job status\n\nSuggestions:\n  • Use the id returned by create_check")]
    MissingCheckId,

    #[error("[E010] No terminal job status received within {0:?}\n\nSuggestions:\n  • Poll check_status to see the current progress\n  • Increase the listen timeout for large submissions")]
    ListenTimeout(Duration),

    #[error("[E011] Job status subscription ended: {0}\n\nSuggestions:\n  • Poll check_status to see the current progress\n  • Verify the real-time endpoint URL is correct")]
    Subscription(String),

    #[error(transparent)]
    Socket(#[from] rust_socketio::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl ApiClientError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "E001",
            Self::InvalidApiKey => "E002",
            Self::Unreachable { .. } => "E003",
            Self::UndecodableResponse { .. } => "E004",
            Self::MissingFile(_) => "E005",
            Self::UploadRejected(_) => "E006",
            Self::CannotBeBase(_) => "E007",
            Self::InvalidUrl(_) => "E008",
            Self::MissingCheckId => "E009",
            Self::ListenTimeout(_) => "E010",
            Self::Subscription(_) => "E011",
            Self::Socket(_) | Self::Reqwest(_) | Self::IoError(_) => "E999", // Transport errors get generic code
        }
    }

    /// Turn a transport failure into [`ApiClientError::Unreachable`] when
    /// the remote side could not be reached at all.
    pub(crate) fn from_transport(url: &Url, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            log::debug!("Transport failure for {url}: {err}");
            Self::Unreachable { url: url.clone() }
        } else {
            Self::Reqwest(err)
        }
    }
}
