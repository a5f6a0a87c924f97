use thiserror::Error;

/// Failures raised by providers and the resolver.
///
/// None of these reach the presentation layer as hard errors: resolution turns
/// them into "strategy yielded nothing" and fetches turn them into stale or
/// synthetic data. They exist so that logs and tests can tell the cases apart.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Timeout, connection error or non-2xx status.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Every resolution strategy came back empty.
    #[error("No location matches '{0}'")]
    NoMatch(String),

    /// The provider answered, but the body lacked fields we rely on.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("No API key configured for the weather provider")]
    MissingApiKey,

    #[error("Provider '{provider}' does not serve {what}")]
    Unsupported {
        provider: &'static str,
        what: &'static str,
    },
}

impl WeatherError {
    pub(crate) fn timeout(what: &str, after: std::time::Duration) -> Self {
        Self::NetworkFailure(format!("{what} timed out after {after:?}"))
    }

    /// Failures that follow from configuration rather than from the provider
    /// misbehaving; they are logged quietly.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::Unsupported { .. })
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
