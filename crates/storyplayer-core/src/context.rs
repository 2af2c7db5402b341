//! Request context threaded into every collaborator call.

use std::fmt;

/// Credentials and language for one collaborator call.
///
/// Replaces process-wide default headers: every fetch and publish receives the
/// context explicitly.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// SDK token issued for the embedding app.
    pub token: String,
    /// Preferred language, sent as `Accept-Language` when set.
    pub language: Option<String>,
}

impl RequestContext {
    /// Creates a context without a language preference.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            language: None,
        }
    }

    /// Returns a copy of this context carrying `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("SDK {}", self.token)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("token", &"<redacted>")
            .field("language", &self.language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_uses_sdk_scheme() {
        let ctx = RequestContext::new("abc123");
        assert_eq!(ctx.authorization(), "SDK abc123");
    }

    #[test]
    fn test_debug_redacts_token() {
        let ctx = RequestContext::new("secret-token").with_language("de");
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("de"));
    }
}
