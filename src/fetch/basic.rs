use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Plain `reqwest` transport with per-call timeouts.
///
/// Redirects are not followed here; [`super::auth::CookieJar`] follows them so
/// that cookies set on intermediate responses are kept.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
