mod basic;
mod client;
pub mod auth;

#[cfg(test)]
pub(crate) mod testing;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, Url};

use crate::error::PortalError;

/// Sends `req` and fails with [`PortalError::UnexpectedStatus`] on a non-2xx answer.
pub async fn send_checked<C: HttpClient + ?Sized>(
    client: &C,
    req: Request,
) -> Result<Response, PortalError> {
    let url = req.url().to_string();
    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PortalError::UnexpectedStatus { url, status });
    }
    Ok(resp)
}

/// GETs `url` and returns the body as text.
pub async fn fetch_text<C: HttpClient + ?Sized>(client: &C, url: Url) -> Result<String, PortalError> {
    let resp = send_checked(client, Request::new(Method::GET, url)).await?;
    Ok(resp.text().await?)
}

/// Builds a POST with an `application/x-www-form-urlencoded` body.
pub fn form_request<K, V>(url: Url, pairs: &[(K, V)]) -> Request
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    // url's query serializer is the form-urlencoded encoder
    let mut scratch = url.clone();
    scratch.set_query(None);
    scratch
        .query_pairs_mut()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    let body = scratch.query().unwrap_or_default().to_string();

    let mut req = Request::new(Method::POST, url);
    req.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    *req.body_mut() = Some(body.into());
    req
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedClient;
    use super::*;

    fn url() -> Url {
        "https://portal.test/login".parse().unwrap()
    }

    #[test]
    fn test_form_request_encodes_body() {
        let req = form_request(url(), &[("_token", "a b&c"), ("email", "2117@x")]);

        assert_eq!(req.method(), Method::POST);
        assert_eq!(
            req.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"_token=a+b%26c&email=2117%40x");
        assert_eq!(req.url().query(), None);
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let client = ScriptedClient::new().reply(200, "<html>ok</html>");
        let text = fetch_text(&client, url()).await.unwrap();
        assert_eq!(text, "<html>ok</html>");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let client = ScriptedClient::new().reply(500, "boom");
        let err = fetch_text(&client, url()).await.unwrap_err();
        assert!(matches!(err, PortalError::UnexpectedStatus { status, .. } if status == 500));
    }
}
