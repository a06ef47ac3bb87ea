use url::Url;

use super::errors::ApiClientError;

pub const BASE_URL: &str = "https://codequiry.com/api/v1/";
pub const UPLOAD_URL: &str = "https://codequiry.com/api/v1/check/upload";
pub const SOCKET_URL: &str = "https://api.codequiry.com/";

/// The three remote services a client talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    upload: Url,
    socket: Url,
}

impl Endpoints {
    /// # Errors
    ///
    /// Fails if any of the provided `Url`s cannot be a base. The client
    /// relies on that invariant when joining paths onto `base`.
    pub fn new(mut base: Url, upload: Url, socket: Url) -> Result<Self, ApiClientError> {
        for url in [&base, &upload, &socket] {
            if url.cannot_be_a_base() {
                return Err(ApiClientError::CannotBeBase(url.clone()));
            }
        }

        // Without the trailing slash `join` would replace the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            upload,
            socket,
        })
    }

    /// # Errors
    ///
    /// Will return `Err` if any of the strings is not a valid URL.
    pub fn parse(base: &str, upload: &str, socket: &str) -> Result<Self, ApiClientError> {
        Self::new(Url::parse(base)?, Url::parse(upload)?, Url::parse(socket)?)
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    pub const fn upload(&self) -> &Url {
        &self.upload
    }

    pub const fn socket(&self) -> &Url {
        &self.socket
    }
}

impl Default for Endpoints {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::parse(BASE_URL, UPLOAD_URL, SOCKET_URL).expect("constant endpoints are valid")
    }
}
