/// How a failed model call should be handled by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The stored credential is stale or invalid; drop it and ask for a new one.
    AuthStale,
    Generic,
}

const AUTH_STALE_MARKERS: &[&str] = &["Requested entity was not found", "404", "API key"];

pub fn classify_failure(message: &str) -> FailureKind {
    if AUTH_STALE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        FailureKind::AuthStale
    } else {
        FailureKind::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_auth_stale() {
        assert_eq!(
            classify_failure("Requested entity was not found."),
            FailureKind::AuthStale
        );
        assert_eq!(
            classify_failure("Gemini request failed with status 404 Not Found: model missing"),
            FailureKind::AuthStale
        );
        assert_eq!(
            classify_failure("API key not valid. Please pass a valid API key."),
            FailureKind::AuthStale
        );
    }

    #[test]
    fn other_failures_are_generic() {
        assert_eq!(
            classify_failure("Gemini request failed with status 500: internal"),
            FailureKind::Generic
        );
        assert_eq!(classify_failure("No image data found in response."), FailureKind::Generic);
        assert_eq!(classify_failure("api key"), FailureKind::Generic);
    }
}
