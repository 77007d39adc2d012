use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION};
use reqwest::{Method, Request, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::debug;

use crate::fetch::client::HttpClient;
use crate::session::SessionState;

const MAX_REDIRECTS: usize = 10;

/// An [`HttpClient`] wrapper that keeps the cookies of one portal exchange.
///
/// Every request is sent with the cookies gathered so far and every
/// `Set-Cookie` is recorded, including those on redirect responses, which is
/// why this wrapper follows redirects itself. A jar lives for one API call.
pub struct CookieJar<C> {
    inner: C,
    session: Mutex<SessionState>,
}

impl<C> CookieJar<C> {
    pub fn new(inner: C) -> Self {
        Self::with_session(inner, SessionState::new())
    }

    /// Starts from cookies the caller already holds.
    pub fn with_session(inner: C, session: SessionState) -> Self {
        Self {
            inner,
            session: Mutex::new(session),
        }
    }

    /// Cookies gathered so far.
    pub async fn session(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    pub fn into_session(self) -> SessionState {
        self.session.into_inner()
    }
}

impl<C: HttpClient> CookieJar<C> {
    async fn send_once(&self, mut req: Request) -> reqwest::Result<Response> {
        if let Some(cookie) = self.session.lock().await.cookie_header() {
            req.headers_mut().insert(COOKIE, cookie);
        }
        let resp = self.inner.execute(req).await?;
        self.session.lock().await.absorb_set_cookies(resp.headers());
        Ok(resp)
    }
}

/// Builds the request for the next hop, or `None` if `resp` is not a
/// followable redirect. Redirects that leave the origin of `base` are not
/// followed, so neither the jar nor the caller's headers reach another host.
fn next_hop(
    resp: &Response,
    base: &reqwest::Url,
    method: &Method,
    replay: Option<Request>,
) -> Option<Request> {
    let status = resp.status();
    if !status.is_redirection() {
        return None;
    }
    let location = resp.headers().get(LOCATION)?.to_str().ok()?;
    let target = base.join(location).ok()?;
    if target.origin() != base.origin() {
        debug!(to = %target, "Not following cross-origin redirect");
        return None;
    }

    match status {
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => {
            let mut replay = replay?;
            *replay.url_mut() = target;
            Some(replay)
        }
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
            let method = if *method == Method::HEAD {
                Method::HEAD
            } else {
                Method::GET
            };
            let mut next = Request::new(method, target);
            if let Some(original) = replay {
                // keep caller headers, drop the ones describing the old body
                *next.headers_mut() = original.headers().clone();
                next.headers_mut().remove(CONTENT_TYPE);
                next.headers_mut().remove(CONTENT_LENGTH);
            }
            Some(next)
        }
        _ => None,
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for CookieJar<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        let mut req = req;
        let mut hops = 0;
        loop {
            let method = req.method().clone();
            let base = req.url().clone();
            let replay = req.try_clone();
            let resp = self.send_once(req).await?;

            if hops == MAX_REDIRECTS {
                return Ok(resp);
            }
            match next_hop(&resp, &base, &method, replay) {
                Some(next) => {
                    debug!(status = %resp.status(), to = %next.url(), "Following redirect");
                    hops += 1;
                    req = next;
                }
                None => return Ok(resp),
            }
        }
    }
}
