//! [`HttpClient`](super::HttpClient) wrappers that carry portal session state.
//!
//! [`CookieJar`] keeps the cookies of one exchange and follows redirects.
//! [`AjaxHeaders`] adds the CSRF and XHR headers the marks endpoint expects.

mod ajax_headers;
mod cookie_jar;

pub use ajax_headers::AjaxHeaders;
pub use cookie_jar::CookieJar;
