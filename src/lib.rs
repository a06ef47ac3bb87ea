//! # Codequiry
//!
//! A blocking Rust client for the [Codequiry](https://codequiry.com)
//! source code plagiarism detection API.
//!
//! ## Features
//!
//! - **Checks**: Create, list, start and poll plagiarism checks
//! - **Uploads**: Send zip archives of submissions as multipart forms
//! - **Results**: Fetch check overviews and per-submission details
//! - **Live status**: Follow a running check over the real-time endpoint
//! - **Language codes**: Typed table of the languages the service accepts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::ops::ControlFlow;
//!
//! use codequiry::{api::ApiClient, language::Language};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("your-api-key")?;
//!
//! let check = client.create_check("Final Project", Language::Python)?;
//! let check_id = check["id"].as_u64().ok_or("check id missing")?;
//!
//! client.upload(check_id, "submissions.zip")?.into_result()?;
//! client.run_check(check_id)?;
//!
//! client.job_listen(check_id, |status| {
//!     println!("{:?}% done", status.percent());
//!     ControlFlow::Continue(())
//! })?;
//!
//! println!("{}", client.get_overview(check_id)?);
//! # Ok(())
//! # }
//! ```

/// API client and types for talking to the Codequiry services
pub mod api;

/// Language codes accepted when creating a check
pub mod language;
