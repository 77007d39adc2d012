//! Trait for the two authenticated interactions with an academic portal.

use crate::error::PortalError;
use crate::grades::SubjectRecord;
use crate::session::SessionState;

/// Subject lists for each fetched semester, in ascending semester order.
pub type SemesterRecords = Vec<(u32, Vec<SubjectRecord>)>;

/// Abstraction over an academic records portal (e.g., the IMS portal).
///
/// Implementations hold no per-student state: the session is created by
/// [`PortalApi::login`], owned by the caller, and passed back in.
#[async_trait::async_trait]
pub trait PortalApi: Send + Sync {
    /// Performs the login handshake and returns every cookie set during it.
    async fn login(
        &self,
        register_number: &str,
        phone_number: &str,
    ) -> Result<SessionState, PortalError>;

    /// Fetches the subject records of every configured semester.
    ///
    /// Fails with [`PortalError::NotAuthenticated`] before any network call if
    /// the session lacks a required cookie.
    async fn fetch_grades(&self, session: &SessionState) -> Result<SemesterRecords, PortalError>;
}
