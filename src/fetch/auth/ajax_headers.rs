use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};

use crate::error::PortalError;
use crate::fetch::client::HttpClient;

const X_CSRF_TOKEN: HeaderName = HeaderName::from_static("x-csrf-token");
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// An [`HttpClient`] wrapper that marks every request as a same-session XHR
/// carrying `csrf_token`.
///
/// The portal only answers the marks endpoint with JSON when the request
/// carries the CSRF token header and looks like an AJAX call from a browser.
pub struct AjaxHeaders<C> {
    inner: C,
    csrf_token: HeaderValue,
}

impl<C> AjaxHeaders<C> {
    /// Fails with [`PortalError::TokenExtraction`] if the token cannot be sent
    /// as a header value.
    pub fn new(inner: C, csrf_token: &str) -> Result<Self, PortalError> {
        let csrf_token =
            HeaderValue::from_str(csrf_token).map_err(|_| PortalError::TokenExtraction {
                field: X_CSRF_TOKEN.to_string(),
            })?;
        Ok(Self { inner, csrf_token })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for AjaxHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let headers = req.headers_mut();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(X_CSRF_TOKEN, self.csrf_token.clone());
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        self.inner.execute(req).await
    }
}
