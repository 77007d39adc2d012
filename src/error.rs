//! Error taxonomy for the portal handshake and grade aggregation.

/// Everything that can end a login or grade-fetch call.
///
/// None of these are retried internally; the caller decides whether to log in
/// again or re-submit the request.
#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    /// The expected hidden form field was missing from a portal page, which
    /// usually means the portal's markup changed.
    #[error("form field '{field}' not found in portal page")]
    TokenExtraction {
        /// name attribute that was searched for
        field: String,
    },
    /// The portal answered the login form with its failure phrase.
    #[error("portal rejected the supplied credentials")]
    InvalidCredentials,
    /// The caller did not present both session cookies.
    #[error("session cookies missing")]
    NotAuthenticated,
    /// A subject or grade letter has no entry in the static tables.
    #[error("no table entry for subject '{subject_code}' ({subject_name}) with grade '{grade}'")]
    UnsupportedDepartment {
        subject_code: String,
        subject_name: String,
        grade: String,
    },
    /// Network failure or timeout talking to the portal.
    #[error("portal request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The portal answered with a non-success status.
    #[error("portal returned status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    /// A semester's marks body was not the expected JSON.
    #[error("malformed marks payload for semester {semester}: {source}")]
    Decode {
        semester: u32,
        #[source]
        source: serde_json::Error,
    },
    /// A configured portal URL could not be parsed.
    #[error("invalid portal url '{0}'")]
    InvalidUrl(String),
}

impl PortalError {
    /// True for the transport family: network, status, decode and url errors.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PortalError::Transport(_)
                | PortalError::UnexpectedStatus { .. }
                | PortalError::Decode { .. }
                | PortalError::InvalidUrl(_)
        )
    }
}
