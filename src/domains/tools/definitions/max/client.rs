//! HTTP client for the MAX reporting endpoints.
//!
//! The reporting API is a set of plain GET endpoints; the response body is
//! relayed to the caller as-is (JSON and CSV alike), so this module never
//! parses payloads. It uses `reqwest::blocking` and therefore must run on a
//! dedicated thread (the tools call it through `spawn_blocking`).

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Path of the revenue report endpoint.
pub const REVENUE_REPORT_PATH: &str = "maxReport";

/// Path of the revenue cohort endpoint (also the fallback endpoint).
pub const COHORT_REVENUE_PATH: &str = "maxCohort";

/// Path of the impression cohort endpoint.
pub const COHORT_IMPRESSION_PATH: &str = "maxCohort/imp";

/// Path of the session cohort endpoint.
pub const COHORT_SESSION_PATH: &str = "maxCohort/session";

/// Reports over long ranges can be slow to aggregate upstream.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced while talking to the reporting API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The query parameters could not be encoded.
    #[error("error while encoding max api query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// The endpoint URL could not be parsed.
    #[error("error while parsing max api url: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be sent.
    #[error("error while sending max api request: {0}")]
    Transport(reqwest::Error),

    /// The response body could not be read.
    #[error("error while reading max api response body: {0}")]
    Body(reqwest::Error),

    /// The API answered with a non-success status.
    #[error("max api returned status code: {status}. response body: {body}")]
    Status { status: u16, body: String },
}

/// Issue a GET against a reporting endpoint and return the raw body.
///
/// `200 OK` and `202 Accepted` are success; any other status is returned as
/// an error carrying the status code and the body text, which usually holds
/// the API's own error description.
pub fn fetch_report(
    base_url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<String, UpstreamError> {
    let mut url = Url::parse(&format!("{}/{}", base_url.trim_end_matches('/'), path))?;
    url.set_query(Some(&serde_urlencoded::to_string(query)?));

    // The query carries the api_key, so only the path is logged.
    debug!("GET {}/{}", base_url.trim_end_matches('/'), path);

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(UpstreamError::Transport)?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(UpstreamError::Transport)?;

    let status = response.status();

    // Read the body on every path; error responses carry the API's
    // explanation in the body.
    let body = response.text().map_err(UpstreamError::Body)?;

    if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::ACCEPTED {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
