mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::*;
use std::sync::Arc;
use tower::ServiceExt;

const BOTH_COOKIES: &str = "XSRF-TOKEN=x1; laravel_session=s1";

fn login_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let portal = Arc::new(FakePortal::default());
    portal
        .reply_with(200, &[("set-cookie", "XSRF-TOKEN=t0; path=/")], LOGIN_PAGE)
        .reply_with(
            302,
            &[
                ("location", "https://portal.test/home"),
                ("set-cookie", "XSRF-TOKEN=t1; path=/"),
                ("set-cookie", "laravel_session=s1; path=/; httponly"),
            ],
            "",
        )
        .reply(200, "<h1>Welcome</h1>");

    let response = app(portal.clone())
        .oneshot(login_request(
            r#"{"register_number":"2117001","phone_number":"9876543210"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        cookies,
        vec![
            "XSRF-TOKEN=t1; Path=/; HttpOnly; Secure; SameSite=None",
            "laravel_session=s1; Path=/; HttpOnly; Secure; SameSite=None",
        ]
    );
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "message": "Login successful" })
    );
    assert_eq!(portal.calls(), 3);
}

#[tokio::test]
async fn test_login_with_wrong_credentials() {
    let portal = Arc::new(FakePortal::default());
    portal.reply(200, LOGIN_PAGE).reply(200, FAILED_LOGIN);

    let response = app(portal.clone())
        .oneshot(login_request(
            r#"{"register_number":"2117001","phone_number":"0000000000"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Invalid credentials" })
    );
    assert_eq!(portal.calls(), 2);
}

#[tokio::test]
async fn test_login_page_markup_changed() {
    let portal = Arc::new(FakePortal::default());
    portal.reply(200, "<html>new login form</html>");

    let response = app(portal.clone())
        .oneshot(login_request(
            r#"{"register_number":"2117001","phone_number":"1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(portal.calls(), 1);
}

#[tokio::test]
async fn test_grades_without_cookies_makes_no_portal_call() {
    for cookie in [None, Some("XSRF-TOKEN=x1"), Some("laravel_session=s1")] {
        let portal = Arc::new(FakePortal::default());

        let response = app(portal.clone())
            .oneshot(grades_request("/api/get_grades", cookie))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Not logged in" })
        );
        assert_eq!(portal.calls(), 0);
    }
}

#[tokio::test]
async fn test_grades_success() {
    let portal = Arc::new(FakePortal::default());
    portal
        .reply(200, REPORT_PAGE)
        .reply(200, &marks(&[("CS3351", "A"), ("CS3381", "O"), ("MA3354", "U")]))
        .reply(200, &marks(&[("CS3391", "B+"), ("AD3351", "O")]));

    let response = app(portal.clone())
        .oneshot(grades_request("/api/get_grades", Some(BOTH_COOKIES)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    // (32 + 15) / 5.5 and (21 + 40) / 7, CGPA 108 / 12.5
    assert_eq!(
        text,
        r#"{"CGPA":8.64,"grades":{"Semester 1":{"GPA":8.545},"Semester 2":{"GPA":8.714}}}"#
    );
    assert_eq!(portal.calls(), 3);
}

#[tokio::test]
async fn test_grades_with_subject_detail() {
    let portal = Arc::new(FakePortal::default());
    portal
        .reply(200, REPORT_PAGE)
        .reply(200, &marks(&[("CS3351", "A"), ("MA3354", "U")]))
        .reply(200, &marks(&[]));

    let response = app(portal)
        .oneshot(grades_request(
            "/api/get_grades?include_subjects=true",
            Some(BOTH_COOKIES),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let first = &body["grades"]["Semester 1"];
    assert_eq!(first["GPA"], 8.0);
    assert_eq!(first["credits"], 4.0);
    assert_eq!(first["subjects"][1]["subject_code"], "MA3354");
    assert_eq!(first["subjects"][1]["grade_letter"], "U");
    assert_eq!(first["subjects"][1]["result"], "FAIL");
    assert_eq!(body["grades"]["Semester 2"]["GPA"], 0.0);
    assert_eq!(body["CGPA"], 8.0);
}

#[tokio::test]
async fn test_grades_unsupported_department() {
    let portal = Arc::new(FakePortal::default());
    portal
        .reply(200, REPORT_PAGE)
        .reply(200, &marks(&[("CS3351", "A"), ("EE9999", "O")]));

    let response = app(portal.clone())
        .oneshot(grades_request("/api/get_grades", Some(BOTH_COOKIES)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Your department isn't supported yet. Please try later." })
    );
}

#[tokio::test]
async fn test_grades_malformed_semester_is_fatal() {
    let portal = Arc::new(FakePortal::default());
    portal
        .reply(200, REPORT_PAGE)
        .reply(200, &marks(&[("CS3351", "A")]))
        .reply(200, "<html>Server Error</html>");

    let response = app(portal.clone())
        .oneshot(grades_request("/api/get_grades", Some(BOTH_COOKIES)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body.get("CGPA").is_none());
    assert_eq!(portal.calls(), 3);
}

#[tokio::test]
async fn test_cors_allows_listed_origin_with_credentials() {
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/get_grades")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    };

    let response = app(Arc::new(FakePortal::default()))
        .oneshot(preflight(ORIGIN))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let response = app(Arc::new(FakePortal::default()))
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
