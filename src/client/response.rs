//! Remote response classification

use serde_json::{Value, json};

use crate::{Error, Result};

/// Maximum characters of a non-JSON success body kept in the result
pub const MAX_TEXT_BODY: usize = 2000;

/// Maximum characters of an error body carried in [`Error::RemoteStatus`]
pub const MAX_ERROR_BODY: usize = 500;

/// Leading characters of the body inspected for the login-page fingerprint
const LOGIN_SNIFF_LIMIT: usize = 4000;

/// Markers that must all appear in an interactive login page
const LOGIN_MARKERS: [&str; 4] = [
    "<html",
    "/idaas/mtfim/sps/idaas/login",
    "runtime=true",
    "location.href",
];

/// Error code reported when the tenant answers with its login page
pub const AUTH_REDIRECT_DETECTED: &str = "AUTH_REDIRECT_DETECTED";

/// Decoded outcome of one remote call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// JSON body
    Json {
        /// HTTP status code
        status: u16,
        /// Decoded body
        body: Value,
    },
    /// 204 or empty body
    NoContent {
        /// HTTP status code
        status: u16,
    },
    /// Success status with a body that is not JSON
    Text {
        /// HTTP status code
        status: u16,
        /// Body text, capped at [`MAX_TEXT_BODY`] characters
        body: String,
    },
    /// The tenant served its interactive login page instead of API JSON
    LoginRedirect {
        /// HTTP status code the page came back with
        status: u16,
    },
}

impl ApiResponse {
    /// HTTP status code of the response
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. }
            | Self::NoContent { status }
            | Self::Text { status, .. }
            | Self::LoginRedirect { status } => *status,
        }
    }

    /// Whether the response represents a failure for the caller
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::LoginRedirect { .. })
    }

    /// Caller-facing JSON value
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json { body, .. } => body,
            Self::NoContent { status } => json!({
                "status": "success",
                "http_code": status,
            }),
            Self::Text { status, body } => json!({
                "status": "success",
                "http_code": status,
                "body": body,
            }),
            Self::LoginRedirect { status } => json!({
                "status": "error",
                "error_code": AUTH_REDIRECT_DETECTED,
                "http_code": status,
                "message": "Verify returned an interactive login HTML page instead of API JSON.",
                "hint": "Token may lack scope/permission for this endpoint or session/auth context is invalid.",
            }),
        }
    }
}

/// Detect the tenant's interactive login page served in place of API JSON
#[must_use]
pub fn is_login_page(content_type: &str, body: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    if !content_type.contains("text/html") && !content_type.contains("application/xhtml+xml") {
        return false;
    }

    let head: String = body.chars().take(LOGIN_SNIFF_LIMIT).collect::<String>().to_lowercase();
    LOGIN_MARKERS.iter().all(|marker| head.contains(marker))
}

/// Classify a fully read response.
///
/// The login-page check runs before the status check because the page is
/// usually served with 200.
pub fn classify(status: u16, content_type: &str, body: String) -> Result<ApiResponse> {
    if is_login_page(content_type, &body) {
        return Ok(ApiResponse::LoginRedirect { status });
    }

    if !(200..300).contains(&status) {
        return Err(Error::RemoteStatus {
            status,
            body: truncate_chars(&body, MAX_ERROR_BODY),
        });
    }

    if status == 204 || body.is_empty() {
        return Ok(ApiResponse::NoContent { status });
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(ApiResponse::Json {
            status,
            body: value,
        }),
        Err(_) => Ok(ApiResponse::Text {
            status,
            body: truncate_chars(&body, MAX_TEXT_BODY),
        }),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<HTML><head><script>
var runtime=true;
window.location.href = "/idaas/mtfim/sps/idaas/login?Target=abc";
</script></head></HTML>"#;

    #[test]
    fn login_page_needs_html_content_type() {
        assert!(is_login_page("text/html; charset=utf-8", LOGIN_PAGE));
        assert!(is_login_page("application/xhtml+xml", LOGIN_PAGE));
        assert!(!is_login_page("application/json", LOGIN_PAGE));
    }

    #[test]
    fn login_page_needs_every_marker() {
        let partial = LOGIN_PAGE.replace("runtime=true", "runtime=false");
        assert!(!is_login_page("text/html", &partial));
        assert!(!is_login_page("text/html", "<html><body>Maintenance</body></html>"));
    }

    #[test]
    fn login_page_markers_outside_sniff_window_are_ignored() {
        let padded = format!("{}{LOGIN_PAGE}", " ".repeat(LOGIN_SNIFF_LIMIT));
        assert!(!is_login_page("text/html", &padded));
    }

    #[test]
    fn login_page_wins_over_status_check() {
        let response = classify(200, "text/html", LOGIN_PAGE.to_string()).unwrap();
        assert!(response.is_error());

        let value = response.into_value();
        assert_eq!(value["error_code"], AUTH_REDIRECT_DETECTED);
        assert_eq!(value["http_code"], 200);
        assert_eq!(value["status"], "error");

        let forbidden = classify(403, "text/html", LOGIN_PAGE.to_string()).unwrap();
        assert_eq!(forbidden.status(), 403);
    }

    #[test]
    fn non_success_status_is_error_with_truncated_body() {
        let err = classify(404, "application/json", "x".repeat(800)).unwrap_err();
        match err {
            Error::RemoteStatus { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_content_carries_only_status() {
        let value = classify(204, "", String::new()).unwrap().into_value();
        assert_eq!(value, json!({"status": "success", "http_code": 204}));

        let empty = classify(200, "application/json", String::new()).unwrap();
        assert_eq!(empty, ApiResponse::NoContent { status: 200 });
    }

    #[test]
    fn json_body_is_decoded() {
        let response = classify(200, "application/scim+json", r#"{"totalResults":1}"#.to_string())
            .unwrap();
        assert_eq!(response.into_value(), json!({"totalResults": 1}));
    }

    #[test]
    fn non_json_success_falls_back_to_text() {
        let body = "é".repeat(2500);
        let value = classify(200, "text/plain", body).unwrap().into_value();
        assert_eq!(value["status"], "success");
        assert_eq!(value["http_code"], 200);
        assert_eq!(value["body"].as_str().unwrap().chars().count(), MAX_TEXT_BODY);
    }
}
