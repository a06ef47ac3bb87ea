use std::{fmt::Display, fs, ops::ControlFlow, path::Path, time::Duration};

use reqwest::{
    blocking::{multipart, Client},
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    StatusCode,
};
use serde_json::Value;
use url::Url;

use crate::language::LanguageCode;

use super::endpoints::Endpoints;
use super::errors::ApiClientError;
use super::listen;
use super::models::{JobStatus, ListenOutcome, UploadOutcome};

pub const API_KEY_HEADER: &str = "apikey";
const JSON: &str = "application/json";
const ZIP: &str = "application/zip";

/// Blocking client for the Codequiry REST and push APIs.
///
/// Every REST call is a bodyless POST carrying the `apikey` header. The
/// underlying session is shared by clones of the client.
#[derive(Clone, Debug)]
pub struct ApiClient {
    endpoints: Endpoints,
    client: Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails if the `api_key` is empty or can't be used as a header value.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, ApiClientError> {
        Self::with_endpoints(api_key, Endpoints::default())
    }

    /// # Errors
    ///
    /// Fails if the `api_key` is empty or can't be used as a header value.
    pub fn with_endpoints(
        api_key: impl AsRef<str>,
        endpoints: Endpoints,
    ) -> Result<Self, ApiClientError> {
        let api_key = api_key.as_ref();
        if api_key.trim().is_empty() {
            return Err(ApiClientError::MissingApiKey);
        }

        let mut key = HeaderValue::from_str(api_key).map_err(|_| ApiClientError::InvalidApiKey)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { endpoints, client })
    }

    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn api_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiClientError> {
        let mut url = self.endpoints.base().join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn account_url(&self) -> Result<Url, ApiClientError> {
        self.api_url("account", &[])
    }

    /// Lists the account details. Handy for testing if the API key works.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn get_account_details(&self) -> Result<Value, ApiClientError> {
        self.send(self.account_url()?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn create_check_url(
        &self,
        check_name: &str,
        lang: impl Into<LanguageCode>,
    ) -> Result<Url, ApiClientError> {
        self.api_url(
            "check/create",
            &[
                ("name", check_name.to_owned()),
                ("language", lang.into().to_string()),
            ],
        )
    }

    /// Creates a new check. The response contains the id of the check.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn create_check(
        &self,
        check_name: &str,
        lang: impl Into<LanguageCode>,
    ) -> Result<Value, ApiClientError> {
        self.send(self.create_check_url(check_name, lang)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn list_checks_url(&self) -> Result<Url, ApiClientError> {
        self.api_url("checks", &[])
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn list_checks(&self) -> Result<Value, ApiClientError> {
        self.send(self.list_checks_url()?)
    }

    /// Uploads a zip archive to an existing check.
    ///
    /// A non-200 answer is not an error, it comes back as
    /// [`UploadOutcome::Rejected`].
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file is missing or can't be read, on
    /// network failure, or if a 200 response can't be decoded.
    pub fn upload(
        &self,
        check_id: impl Display,
        file_path: impl AsRef<Path>,
    ) -> Result<UploadOutcome, ApiClientError> {
        let file_path = file_path.as_ref();
        if !file_path.is_file() {
            return Err(ApiClientError::MissingFile(file_path.to_path_buf()));
        }

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_zip = file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            log::warn!("Uploading {file_name}, which doesn't look like a zip archive");
        }

        let content = fs::read(file_path)?;
        let file = multipart::Part::bytes(content)
            .file_name(file_name)
            .mime_str(ZIP)?;
        let body = multipart::Form::new()
            .part("file", file)
            .text("check_id", check_id.to_string());

        // The form sets its own multipart content type with the boundary
        let url = self.endpoints.upload().clone();
        let response = self
            .client
            .post(url.clone())
            .multipart(body)
            .send()
            .map_err(|e| ApiClientError::from_transport(&url, e))?;

        match response.status() {
            StatusCode::OK => {
                let body = Self::decode(&url, StatusCode::OK, &response.bytes()?)?;
                Ok(UploadOutcome::Uploaded(body))
            }
            status_code => {
                log::debug!("Upload to {url} rejected with {status_code}");
                Ok(UploadOutcome::Rejected(status_code))
            }
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn run_check_url(&self, check_id: impl Display) -> Result<Url, ApiClientError> {
        self.api_url(
            "check/start",
            &[
                ("check_id", check_id.to_string()),
                ("webcheck", "1".to_owned()),
                ("dbcheck", "1".to_owned()),
            ],
        )
    }

    /// Starts the analysis of an uploaded check, including the web and
    /// database comparisons.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn run_check(&self, check_id: impl Display) -> Result<Value, ApiClientError> {
        self.send(self.run_check_url(check_id)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn check_status_url(&self, check_id: impl Display) -> Result<Url, ApiClientError> {
        self.api_url("check/get", &[("check_id", check_id.to_string())])
    }

    /// Polls the progress of a running check.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn check_status(&self, check_id: impl Display) -> Result<Value, ApiClientError> {
        self.send(self.check_status_url(check_id)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn overview_url(&self, check_id: impl Display) -> Result<Url, ApiClientError> {
        self.api_url("check/overview", &[("check_id", check_id.to_string())])
    }

    /// Summary results of a check, including the submission ids.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn get_overview(&self, check_id: impl Display) -> Result<Value, ApiClientError> {
        self.send(self.overview_url(check_id)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be built.
    pub fn detailed_results_url(
        &self,
        check_id: impl Display,
        submission_id: impl Display,
    ) -> Result<Url, ApiClientError> {
        self.api_url(
            "check/results",
            &[
                ("check_id", check_id.to_string()),
                ("submission_id", submission_id.to_string()),
            ],
        )
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or an undecodable response.
    pub fn get_detailed_results(
        &self,
        check_id: impl Display,
        submission_id: impl Display,
    ) -> Result<Value, ApiClientError> {
        self.send(self.detailed_results_url(check_id, submission_id)?)
    }

    /// Subscribes to status events of `check_id` and hands each one to
    /// `callback` on the calling thread.
    ///
    /// Blocks until the service reports an error or 100 percent, or the
    /// callback returns [`ControlFlow::Break`]. There is no timeout, see
    /// [`Self::job_listen_with_timeout`].
    ///
    /// `check_id` is sent with its JSON type unchanged, so pass the id
    /// exactly as `create_check` returned it (usually a number).
    ///
    /// # Errors
    ///
    /// Will return `Err` if `check_id` is empty, the socket can't be
    /// opened, or it closes before the job finishes. Any `error` event
    /// raised by the socket client also ends the subscription, including
    /// ones it would recover from by reconnecting.
    pub fn job_listen<F>(
        &self,
        check_id: impl Into<Value>,
        callback: F,
    ) -> Result<ListenOutcome, ApiClientError>
    where
        F: FnMut(&JobStatus) -> ControlFlow<()>,
    {
        self.listen(check_id.into(), None, callback)
    }

    /// Same as [`Self::job_listen`], giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// As [`Self::job_listen`], plus [`ApiClientError::ListenTimeout`].
    pub fn job_listen_with_timeout<F>(
        &self,
        check_id: impl Into<Value>,
        timeout: Duration,
        callback: F,
    ) -> Result<ListenOutcome, ApiClientError>
    where
        F: FnMut(&JobStatus) -> ControlFlow<()>,
    {
        self.listen(check_id.into(), Some(timeout), callback)
    }

    fn listen<F>(
        &self,
        check_id: Value,
        timeout: Option<Duration>,
        callback: F,
    ) -> Result<ListenOutcome, ApiClientError>
    where
        F: FnMut(&JobStatus) -> ControlFlow<()>,
    {
        if listen::is_blank_id(&check_id) {
            return Err(ApiClientError::MissingCheckId);
        }

        let (socket, events) = listen::subscribe(self.endpoints.socket(), &check_id)?;
        let outcome = listen::pump(&events, timeout, callback);

        if let Err(e) = socket.disconnect() {
            log::warn!("Failed to close job status connection: {e}");
        }

        outcome
    }

    fn send(&self, url: Url) -> Result<Value, ApiClientError> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, JSON)
            .send()
            .map_err(|e| ApiClientError::from_transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("{url} returned {status}");
        }

        let bytes = response.bytes()?;
        Self::decode(&url, status, &bytes)
    }

    fn decode(url: &Url, status: StatusCode, bytes: &[u8]) -> Result<Value, ApiClientError> {
        log::debug!("Raw API Response: {}", String::from_utf8_lossy(bytes));

        serde_json::from_slice(bytes).map_err(|source| {
            log::error!("Failed to parse JSON response from {url}: {source}");
            ApiClientError::UndecodableResponse {
                url: url.clone(),
                status,
                source,
            }
        })
    }
}
