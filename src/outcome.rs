//! Tagged results of the four meta-tool operations

use serde_json::Value;

/// Character ceiling for any serialized tool response
pub const MAX_RESPONSE_CHARS: usize = 50_000;

/// Notice appended to truncated responses
pub const TRUNCATION_NOTICE: &str =
    "\n\n⚠️ Response truncated at 50000 characters. Use filters or pagination to narrow results.";

/// Result of a tool operation.
///
/// Expected failure modes (unknown endpoint, remote error, login page) are
/// `Failure` values rather than `Err`, so the caller always gets a structured
/// object back.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Operation succeeded
    Success(Value),
    /// Operation failed in an anticipated way
    Failure(Value),
}

impl ToolOutcome {
    /// Whether this is a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow the carried value
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Success(v) | Self::Failure(v) => v,
        }
    }

    /// Take the carried value
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Success(v) | Self::Failure(v) => v,
        }
    }

    /// Pretty-printed JSON capped at [`MAX_RESPONSE_CHARS`]
    #[must_use]
    pub fn render(&self) -> String {
        let text = serde_json::to_string_pretty(self.value()).unwrap_or_else(|_| self.value().to_string());
        truncate_response(text)
    }
}

/// Cut `text` to [`MAX_RESPONSE_CHARS`] characters and append the notice
#[must_use]
pub fn truncate_response(text: String) -> String {
    match text.char_indices().nth(MAX_RESPONSE_CHARS) {
        None => text,
        Some((cut, _)) => {
            let mut truncated = text;
            truncated.truncate(cut);
            truncated.push_str(TRUNCATION_NOTICE);
            truncated
        }
    }
}
