//! Shared HTTP plumbing for the REST clients

use reqwest::Client;
use std::time::Duration;

/// Build a client with the run-wide connect timeout.
///
/// No overall request timeout is set; reads use the client default.
pub fn build_client(connect_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("reltag/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join `endpoint` onto `base_url`.
///
/// Endpoints may arrive as API-relative paths (`/app/rest/builds/id:1`) or as
/// hrefs that already carry the base URL; both resolve to the same URL.
pub fn resolve_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = endpoint.strip_prefix(base).unwrap_or(endpoint);
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Endpoint as shown in logs, with the base URL removed
pub fn display_endpoint<'a>(base_url: &str, endpoint: &'a str) -> &'a str {
    endpoint
        .strip_prefix(base_url.trim_end_matches('/'))
        .unwrap_or(endpoint)
}
