//! Scripted transport for unit tests.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, Response, ResponseBuilderExt};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::client::HttpClient;

/// What a [`ScriptedClient`] saw.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

struct Canned {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

/// Replies with canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Canned>>,
    seen: Mutex<Vec<Recorded>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.reply_with(status, &[], body)
    }

    pub fn reply_with(self, status: u16, headers: &[(&'static str, &str)], body: &str) -> Self {
        self.replies.lock().unwrap().push_back(Canned {
            status,
            headers: headers.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            body: body.to_string(),
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.seen.lock().unwrap().push(Recorded {
            method: req.method().clone(),
            url: req.url().to_string(),
            headers: req.headers().clone(),
            body: req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default(),
        });

        let canned = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedClient ran out of replies");

        let mut builder = axum::http::Response::builder()
            .status(canned.status)
            .url(req.url().clone());
        for (name, value) in &canned.headers {
            builder = builder.header(*name, value.as_str());
        }
        Ok(Response::from(builder.body(canned.body).unwrap()))
    }
}
