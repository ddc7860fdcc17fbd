// Shared transport configuration for building the reqwest::Client.
//
// The token manager and the API client share one client, so timeouts,
// the user agent, and the mobile-app identity headers are set in one place.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::ApiError;

/// Production OAuth host.
pub const DEFAULT_OAUTH_URL: &str = "https://oauth.blue.fermax.com";

/// Production REST API host.
pub const DEFAULT_API_URL: &str = "https://blue.fermax.com";

/// Default request budget for every call, including the token exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the client presents itself to the vendor API.
///
/// The cloud API expects the headers the official iOS app sends; requests
/// without them are served but rate-limited more aggressively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub app_version: String,
    pub app_build: String,
    pub phone_os: String,
    pub phone_model: String,
    pub accept_language: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            app_version: "3.2.1".into(),
            app_build: "3".into(),
            phone_os: "16.4".into(),
            phone_model: "iPad14,5".into(),
            accept_language: "en-ES;q=1.0, es-ES;q=0.9".into(),
        }
    }
}

impl AppIdentity {
    /// The Alamofire-style user agent of the official app.
    pub fn user_agent(&self) -> String {
        format!(
            "Blue/{version} (com.fermax.bluefermax; build:{build}; iOS {os}) Alamofire/{version}",
            version = self.app_version,
            build = self.app_build,
            os = self.phone_os,
        )
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        let pairs = [
            ("app-version", &self.app_version),
            ("app-build", &self.app_build),
            ("phone-os", &self.phone_os),
            ("phone-model", &self.phone_model),
        ];
        for (name, value) in pairs {
            headers.insert(HeaderName::from_static(name), header_value(name, value)?);
        }
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("accept-language", &self.accept_language)?,
        );
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::ClientSetup(format!("invalid {name} header value: {e}")))
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the OAuth server (`/oauth/token` is appended).
    pub oauth_url: Url,
    /// Base URL of the REST API.
    pub api_url: Url,
    pub timeout: Duration,
    pub identity: AppIdentity,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            oauth_url: Url::parse(DEFAULT_OAUTH_URL).expect("static OAuth URL is valid"),
            api_url: Url::parse(DEFAULT_API_URL).expect("static API URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            identity: AppIdentity::default(),
        }
    }
}

impl TransportConfig {
    /// Point both the OAuth and REST endpoints at a single host.
    ///
    /// Used by tests against a mock server and by self-hosted proxies.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            oauth_url: base_url.clone(),
            api_url: base_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The app identity headers are installed as defaults so every request,
    /// the token exchange included, carries them.
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.identity.user_agent())
            .default_headers(self.identity.headers()?)
            .build()
            .map_err(|e| ApiError::ClientSetup(format!("failed to build HTTP client: {e}")))
    }
}

/// Append path segments to a base URL, percent-encoding each segment.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl(format!("cannot use {base} as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
