//! Shared helpers: a scripted portal transport and a router wired to it.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use grade_bridge::config::PortalConfig;
use grade_bridge::fetch::HttpClient;
use grade_bridge::grades::{CreditTable, LetterGrades};
use grade_bridge::infra::ims::ImsClient;
use grade_bridge::parser::FormFieldExtractor;
use grade_bridge::server::{AppState, router};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const ORIGIN: &str = "https://grades.example";

pub const LOGIN_PAGE: &str =
    r#"<form method="POST"><input type="hidden" name="_token" value="login-tok"></form>"#;
pub const REPORT_PAGE: &str = r#"<meta name="csrf"><input type="hidden" name="_token" value="csrf-tok">"#;
pub const FAILED_LOGIN: &str = "<div>These credentials do not match our records.</div>";

/// Replies in order, counts calls.
#[derive(Default)]
pub struct FakePortal {
    replies: Mutex<VecDeque<(u16, Vec<(String, String)>, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakePortal {
    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.reply_with(status, &[], body)
    }

    pub fn reply_with(&self, status: u16, headers: &[(&str, &str)], body: &str) -> &Self {
        self.replies.lock().unwrap().push_back((
            status,
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body.to_string(),
        ));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for FakePortal {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.calls.lock().unwrap().push(req.url().to_string());
        let (status, headers, body) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("FakePortal ran out of replies");

        let mut builder = Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        Ok(reqwest::Response::from(builder.body(body).unwrap()))
    }
}

/// Marks payload for one semester from `(code, grade)` pairs.
pub fn marks(rows: &[(&str, &str)]) -> String {
    let data: Vec<_> = rows
        .iter()
        .map(|(code, grade)| {
            serde_json::json!({
                "subject_name": format!("Subject {code}"),
                "subject_code": format!(" {code} "),
                "grade_letter": grade,
                "result": if *grade == "U" { "FAIL" } else { "PASS" },
            })
        })
        .collect();
    serde_json::json!({ "data": data }).to_string()
}

/// Router over `portal` with the built-in credit table and semesters 1-2.
pub fn app(portal: Arc<FakePortal>) -> Router {
    let config = PortalConfig {
        base_url: "https://portal.test".to_string(),
        semesters: "1-2".parse().unwrap(),
        ..PortalConfig::default()
    };
    let state = AppState {
        portal: Arc::new(ImsClient::new(
            portal,
            FormFieldExtractor::new().unwrap(),
            config,
        )),
        credits: Arc::new(CreditTable::builtin()),
        letters: Arc::new(LetterGrades::default()),
    };
    router(state, &[ORIGIN.to_string()]).unwrap()
}

pub fn grades_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
