//! HTTP API: `POST /api/auth/login` and `GET /api/get_grades`.

use anyhow::{Context, Result};
use axum::extract::{Json, Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::PortalError;
use crate::grades::{AggregateResult, CreditTable, GradedSubject, LetterGrades, aggregate};
use crate::services::portal_api::PortalApi;
use crate::session::SessionState;

pub const UNSUPPORTED_DEPARTMENT: &str = "Your department isn't supported yet. Please try later.";

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<dyn PortalApi>,
    pub credits: Arc<CreditTable>,
    pub letters: Arc<LetterGrades>,
}

/// Maps [`PortalError`] onto the API's status codes and bodies.
pub struct ApiError(PortalError);

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PortalError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            PortalError::NotAuthenticated => (StatusCode::FORBIDDEN, "Not logged in"),
            PortalError::UnsupportedDepartment { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, UNSUPPORTED_DEPARTMENT)
            }
            other => {
                error!(error = %other, "Portal call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Portal request failed")
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub register_number: String,
    pub phone_number: String,
}

#[derive(Deserialize, Default)]
pub struct GradesQuery {
    #[serde(default)]
    pub include_subjects: bool,
}

/// Success body of `GET /api/get_grades`.
#[derive(Serialize)]
pub struct GradesBody {
    #[serde(rename = "CGPA")]
    pub cgpa: f64,
    pub grades: SemesterGrades,
}

/// `"Semester <n>"` → entry, serialised in semester order.
pub struct SemesterGrades(Vec<(String, SemesterBody)>);

impl Serialize for SemesterGrades {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(label, body)| (label, body)))
    }
}

#[derive(Serialize)]
pub struct SemesterBody {
    #[serde(rename = "GPA")]
    pub gpa: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<GradedSubject>>,
}

impl GradesBody {
    /// Builds the response body. Subject detail is only included on request.
    pub fn new(result: AggregateResult, include_subjects: bool) -> Self {
        let grades = result
            .semesters
            .into_iter()
            .map(|sem| {
                let label = sem.label();
                let body = SemesterBody {
                    gpa: sem.gpa,
                    credits: include_subjects.then_some(sem.credit_sum),
                    subjects: include_subjects.then_some(sem.subjects),
                };
                (label, body)
            })
            .collect();
        Self {
            cgpa: result.cgpa,
            grades: SemesterGrades(grades),
        }
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'")))
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/get_grades", get(get_grades))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn run_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = router(state, &config.allowed_origins)?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, origins = ?config.allowed_origins, "API listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .portal
        .login(&request.register_number, &request.phone_number)
        .await?;

    let mut response = Json(serde_json::json!({ "message": "Login successful" })).into_response();
    for cookie in session.set_cookie_headers() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn get_grades(
    State(state): State<AppState>,
    Query(query): Query<GradesQuery>,
    headers: HeaderMap,
) -> Result<Json<GradesBody>, ApiError> {
    let session = SessionState::from_cookie_headers(&headers);
    let semesters = state.portal.fetch_grades(&session).await?;
    let result = aggregate(semesters, &state.credits, &state.letters)?;

    info!(cgpa = result.cgpa, semesters = result.semesters.len(), "Grades computed");
    Ok(Json(GradesBody::new(result, query.include_subjects)))
}
