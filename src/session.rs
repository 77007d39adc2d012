//! Session cookies carried between the portal and the API caller.
//!
//! A [`SessionState`] is created by a successful portal login, handed to the
//! caller as `Set-Cookie` headers and rebuilt from the caller's `Cookie`
//! header on the next request. Nothing is stored server-side.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::PortalError;

/// Attributes added to every cookie handed to the caller.
const CALLER_COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=None";

/// Name → value cookie bag. Values are never transformed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    cookies: BTreeMap<String, String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fails with [`PortalError::NotAuthenticated`] unless every name in
    /// `required` is present with a non-empty value.
    pub fn require<S: AsRef<str>>(&self, required: &[S]) -> Result<(), PortalError> {
        let complete = required
            .iter()
            .all(|name| self.get(name.as_ref()).is_some_and(|v| !v.is_empty()));
        if complete {
            Ok(())
        } else {
            Err(PortalError::NotAuthenticated)
        }
    }

    /// Copy holding only the cookies named in `names`.
    pub fn only<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let cookies = names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.get(name).map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        Self { cookies }
    }

    /// Rebuilds a session from every `Cookie` header in `headers`.
    pub fn from_cookie_headers(headers: &HeaderMap) -> Self {
        let mut session = Self::new();
        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    let name = name.trim();
                    if !name.is_empty() {
                        session.insert(name, value.trim());
                    }
                }
            }
        }
        session
    }

    /// Records every `Set-Cookie` in `headers`. A cookie that is already
    /// expired, through `Max-Age<=0` or an `Expires` date in the past, is
    /// dropped from the bag. `Max-Age` wins when both are present.
    pub fn absorb_set_cookies(&mut self, headers: &HeaderMap) {
        self.absorb_set_cookies_at(headers, Utc::now());
    }

    fn absorb_set_cookies_at(&mut self, headers: &HeaderMap, now: DateTime<Utc>) {
        for header in headers.get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            let mut parts = raw.split(';');
            let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let mut max_age_expired = None;
            let mut expires_passed = false;
            for (key, attr) in parts.filter_map(|attr| attr.split_once('=')) {
                let (key, attr) = (key.trim(), attr.trim());
                if key.eq_ignore_ascii_case("max-age") {
                    max_age_expired = Some(attr.starts_with(['0', '-']));
                } else if key.eq_ignore_ascii_case("expires") {
                    expires_passed = expires_at(attr).is_some_and(|at| at <= now);
                }
            }

            if max_age_expired.unwrap_or(expires_passed) {
                self.cookies.remove(name);
            } else {
                self.insert(name, value.trim());
            }
        }
    }

    /// Value for an outgoing `Cookie` header, or `None` if the bag is empty.
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        if self.is_empty() {
            return None;
        }
        let joined = self
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    /// One caller-facing `Set-Cookie` value per cookie, marked secure,
    /// http-only and cross-site.
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        self.iter()
            .filter_map(|(k, v)| {
                HeaderValue::from_str(&format!("{k}={v}; {CALLER_COOKIE_ATTRIBUTES}")).ok()
            })
            .collect()
    }
}

/// Parses a cookie `Expires` date, in either `Thu, 01 Jan 1970 00:00:00 GMT`
/// or the dashed `Thu, 01-Jan-1970 00:00:00 GMT` form.
fn expires_at(value: &str) -> Option<DateTime<Utc>> {
    let spaced = value.replace('-', " ");
    NaiveDateTime::parse_from_str(&spaced, "%a, %d %b %Y %H:%M:%S GMT")
        .ok()
        .map(|at| at.and_utc())
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // names only; values are credentials
        f.debug_set().entries(self.cookies.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut session = Self::new();
        for (k, v) in iter {
            session.insert(k, v);
        }
        session
    }
}
