//! Client for the AppMap server API.

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::RemoteError;

pub const DEFAULT_URL: &str = "https://app.land";
pub const DEFAULT_RETRIES: u32 = 3;

/// Server location and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            api_key: None,
        }
    }
}

impl Settings {
    /// Reads `APPLAND_URL` and `APPLAND_API_KEY`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("APPLAND_URL").ok(),
            std::env::var("APPLAND_API_KEY").ok(),
        )
    }

    fn from_vars(url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Absolute URL of an API path.
    pub fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|url| url.join(path.trim_start_matches('/')))
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {e}", self.base_url)))
    }
}

/// Triage status the server holds for one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingStatus {
    pub identity_hash: String,
    #[serde(default)]
    pub status: String,
}

/// Source of the finding statuses already known for an app.
pub trait FindingStatusSource {
    fn finding_status(&self, app_id: &str) -> Result<Vec<FindingStatus>, RemoteError>;
}

/// Response to a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub id: Option<u64>,
    /// Where the uploaded findings can be viewed.
    #[serde(skip)]
    pub location: Option<String>,
}

pub struct AppLandClient {
    settings: Settings,
    http: Client,
    retries: u32,
    backoff: Duration,
}

impl AppLandClient {
    /// Fails without an API key; every endpoint is authenticated.
    pub fn new(settings: Settings) -> Result<Self, RemoteError> {
        if settings.api_key.is_none() {
            return Err(RemoteError::MissingApiKey);
        }
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("appmap-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport {
                url: settings.base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            settings,
            http,
            retries: DEFAULT_RETRIES,
            backoff: Duration::from_secs(1),
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn api_key(&self) -> &str {
        self.settings.api_key.as_deref().unwrap_or_default()
    }

    /// Posts a scanner job.
    pub fn upload<T: Serialize>(&self, payload: &T) -> Result<UploadReceipt, RemoteError> {
        let url = self.settings.endpoint("api/scanner_jobs")?;
        retry(self.retries, self.backoff, |_| {
            let response = self
                .http
                .post(url.clone())
                .bearer_auth(self.api_key())
                .json(payload)
                .send()
                .map_err(|e| transport(&url, e))?;
            let response = success(response)?;
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let mut receipt: UploadReceipt = response.json().unwrap_or_else(|e| {
                debug!(error = %e, "Upload response has no JSON body");
                UploadReceipt::default()
            });
            receipt.location = location;
            Ok(receipt)
        })
    }
}

impl FindingStatusSource for AppLandClient {
    fn finding_status(&self, app_id: &str) -> Result<Vec<FindingStatus>, RemoteError> {
        let mut url = self.settings.endpoint("api/apps")?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.settings.base_url.clone()))?
            .push(app_id)
            .push("finding_status");
        retry(self.retries, self.backoff, |_| {
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(self.api_key())
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .map_err(|e| transport(&url, e))?;
            read_json(&url, response)
        })
    }
}

fn transport(url: &Url, error: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        url: url.to_string(),
        message: error.to_string(),
    }
}

fn success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(RemoteError::Http {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or(body),
    })
}

fn read_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, RemoteError> {
    success(response)?.json().map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// `error.message` of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Runs `op` until it succeeds, fails with a non-retryable error or has been
/// retried `retries` times. The n-th retry waits `n * backoff`.
pub fn retry<T>(
    retries: u32,
    backoff: Duration,
    mut op: impl FnMut(u32) -> Result<T, RemoteError>,
) -> Result<T, RemoteError> {
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(error = %e, attempt, retries, "Retrying request");
                thread::sleep(backoff * attempt);
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> RemoteError {
        RemoteError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        }
    }

    #[test]
    fn test_retry_until_success() {
        let mut calls = 0;
        let result = retry(3, Duration::ZERO, |attempt| {
            calls += 1;
            if attempt < 2 { Err(unavailable()) } else { Ok(attempt) }
        });
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_gives_up_after_ceiling() {
        let mut calls = 0;
        let result: Result<(), _> = retry(2, Duration::ZERO, |_| {
            calls += 1;
            Err(unavailable())
        });
        assert!(matches!(result, Err(RemoteError::Http { status: 503, .. })));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_stops_on_permanent_error() {
        let mut calls = 0;
        let result: Result<(), _> = retry(5, Duration::ZERO, |_| {
            calls += 1;
            Err(RemoteError::Http {
                status: 401,
                message: "Unauthorized".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_vars(None, Some("  ".into()));
        assert_eq!(settings.base_url, DEFAULT_URL);
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let settings = Settings::from_vars(Some("http://localhost:3000/appland/".into()), None);
        let url = settings.endpoint("api/scanner_jobs").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/appland/api/scanner_jobs");
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = Settings::from_vars(Some("not a url".into()), None);
        assert!(matches!(
            settings.endpoint("api/apps"),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = AppLandClient::new(Settings::default());
        assert!(matches!(result, Err(RemoteError::MissingApiKey)));
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"error": {"message": "App not found"}}"#).as_deref(),
            Some("App not found")
        );
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_finding_status_deserialize() {
        let statuses: Vec<FindingStatus> = serde_json::from_str(
            r#"[{"identity_hash": "abc", "status": "deferred"}, {"identity_hash": "def"}]"#,
        )
        .unwrap();
        assert_eq!(statuses[0].status, "deferred");
        assert_eq!(statuses[1].identity_hash, "def");
    }
}
