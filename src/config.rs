//! Portal and server settings.
//!
//! Defaults describe the RIT Chennai IMS portal; the CLI in `main.rs`
//! overrides any of them from flags or environment variables.

use reqwest::Url;
use std::fmt;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PortalError;

pub const DEFAULT_BASE_URL: &str = "https://ims.ritchennai.edu.in";
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "https://localhost:4433",
    "https://grades-scrapper-fe.vercel.app",
];

/// Inclusive range of semester indices to fetch, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemesterRange {
    first: u32,
    last: u32,
}

impl SemesterRange {
    /// Highest semester index accepted.
    pub const MAX: u32 = 12;

    pub fn new(first: u32, last: u32) -> Result<Self, String> {
        if first == 0 || first > last {
            return Err(format!("invalid semester range {first}-{last}"));
        }
        if last > Self::MAX {
            return Err(format!(
                "semester {last} is out of range, the highest is {}",
                Self::MAX
            ));
        }
        Ok(Self { first, last })
    }

    pub fn iter(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }

    pub fn count(&self) -> usize {
        (self.last - self.first + 1) as usize
    }
}

impl Default for SemesterRange {
    fn default() -> Self {
        Self { first: 1, last: 5 }
    }
}

impl FromStr for SemesterRange {
    type Err = String;

    /// Accepts `"1-5"` or a single semester such as `"3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{s}' is not a semester or semester range"))
        };
        match s.split_once('-') {
            Some((first, last)) => Self::new(parse(first)?, parse(last)?),
            None => {
                let only = parse(s)?;
                Self::new(only, only)
            }
        }
    }
}

impl fmt::Display for SemesterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Everything the portal client needs to know about the remote portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub login_path: String,
    pub csrf_path: String,
    pub marks_path: String,
    /// Text the login page shows when credentials are rejected.
    pub failure_phrase: String,
    /// Name of the hidden anti-forgery input on portal forms.
    pub token_field: String,
    /// Cookies that must be present for an authenticated call.
    pub session_cookies: Vec<String>,
    pub semesters: SemesterRange,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl PortalConfig {
    /// Resolves `path` against the base url.
    pub fn url(&self, path: &str) -> Result<Url, PortalError> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(path))
            .map_err(|_| PortalError::InvalidUrl(format!("{}{path}", self.base_url)))
    }

    pub fn login_url(&self) -> Result<Url, PortalError> {
        self.url(&self.login_path)
    }

    pub fn csrf_url(&self) -> Result<Url, PortalError> {
        self.url(&self.csrf_path)
    }

    pub fn marks_url(&self) -> Result<Url, PortalError> {
        self.url(&self.marks_path)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: "/login".to_string(),
            csrf_path: "/admin/grade/student/mark/report".to_string(),
            marks_path: "/admin/grade/student/mark/get_marks".to_string(),
            failure_phrase: "These credentials do not match our records.".to_string(),
            token_field: "_token".to_string(),
            session_cookies: vec!["XSRF-TOKEN".to_string(), "laravel_session".to_string()],
            semesters: SemesterRange::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Settings for the HTTP API.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Origins allowed to call the API with credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        }
    }
}
