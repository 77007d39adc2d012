use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::fetch::auth::{AjaxHeaders, CookieJar};
use crate::fetch::{HttpClient, fetch_text, form_request, send_checked};
use crate::grades::SubjectRecord;
use crate::parser::TokenExtractor;
use crate::services::portal_api::{PortalApi, SemesterRecords};
use crate::session::SessionState;

/// Body of the marks endpoint.
#[derive(Deserialize)]
struct MarksResponse {
    data: Vec<SubjectRecord>,
}

/// [`PortalApi`] for the IMS portal.
///
/// `C` is the transport and `T` pulls anti-forgery tokens out of HTML pages.
/// Each call builds its own [`CookieJar`], so concurrent calls with different
/// sessions never share cookies.
pub struct ImsClient<C, T> {
    http: C,
    extractor: T,
    config: PortalConfig,
}

impl<C: HttpClient, T: TokenExtractor> ImsClient<C, T> {
    pub fn new(http: C, extractor: T, config: PortalConfig) -> Self {
        Self {
            http,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    async fn fetch_semester<H: HttpClient>(
        &self,
        client: &H,
        semester: u32,
    ) -> Result<Vec<SubjectRecord>, PortalError> {
        let url = self.config.marks_url()?;
        let req = form_request(url.clone(), &[("semester", semester.to_string())]);
        let resp = client.execute(req).await?;

        // an expired session is redirected to the login form
        let login_url = self.config.login_url()?;
        if resp.url().origin() == login_url.origin() && resp.url().path() == login_url.path() {
            warn!(semester, "Marks request landed on the login page");
            return Err(PortalError::NotAuthenticated);
        }

        match resp.status() {
            // Laravel answers an XHR with an expired session or stale token this way
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(PortalError::NotAuthenticated);
            }
            status if status.as_u16() == 419 => return Err(PortalError::NotAuthenticated),
            status if !status.is_success() => {
                return Err(PortalError::UnexpectedStatus {
                    url: url.to_string(),
                    status,
                });
            }
            _ => {}
        }

        let body = resp.bytes().await?;
        let marks: MarksResponse = serde_json::from_slice(&body)
            .map_err(|source| PortalError::Decode { semester, source })?;
        Ok(marks.data)
    }
}

#[async_trait]
impl<C: HttpClient, T: TokenExtractor> PortalApi for ImsClient<C, T> {
    #[tracing::instrument(skip(self, phone_number))]
    async fn login(
        &self,
        register_number: &str,
        phone_number: &str,
    ) -> Result<SessionState, PortalError> {
        let jar = CookieJar::new(&self.http);
        let login_url = self.config.login_url()?;

        let page = fetch_text(&jar, login_url.clone()).await?;
        let token = self.extractor.extract(&page, &self.config.token_field)?;

        let req = form_request(
            login_url,
            &[
                (self.config.token_field.as_str(), token.as_str()),
                ("email", register_number),
                ("password", phone_number),
            ],
        );
        let body = send_checked(&jar, req).await?.text().await?;

        if body.contains(&self.config.failure_phrase) {
            info!("Portal rejected credentials");
            return Err(PortalError::InvalidCredentials);
        }

        let session = jar.into_session();
        info!(cookies = session.len(), "Portal login succeeded");
        Ok(session)
    }

    #[tracing::instrument(skip_all)]
    async fn fetch_grades(&self, session: &SessionState) -> Result<SemesterRecords, PortalError> {
        session.require(&self.config.session_cookies)?;

        let jar = CookieJar::with_session(&self.http, session.only(&self.config.session_cookies));

        // the token rotates per session, so it is fetched on every call
        let report = fetch_text(&jar, self.config.csrf_url()?).await?;
        let csrf_token = self
            .extractor
            .extract(&report, &self.config.token_field)
            .inspect_err(|_| warn!("No CSRF token on report page, session may have expired"))?;
        let client = AjaxHeaders::new(&jar, &csrf_token)?;

        debug!(semesters = %self.config.semesters, "Fetching semester marks");

        let mut semesters = Vec::with_capacity(self.config.semesters.count());
        for semester in self.config.semesters.iter() {
            let records = self.fetch_semester(&client, semester).await?;
            debug!(semester, subjects = records.len(), "Semester marks received");
            semesters.push((semester, records));
        }

        Ok(semesters)
    }
}
