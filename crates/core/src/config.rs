use std::time::Duration;
use url::Url;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime configuration for the model-backed extractor. Constructed once at
/// process start and passed into the components that need it; there is no
/// ambient global.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub api_base: Url,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl RankerConfig {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        // Url::join drops the last path segment unless the base ends with
        // a slash.
        let mut normalized = api_base.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        Ok(Self {
            api_base: Url::parse(&normalized)?,
            api_key: api_key.into(),
            model: model.into(),
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_gains_trailing_slash() {
        let config = RankerConfig::new(
            "https://api.openai.com/v1",
            "key",
            DEFAULT_MODEL,
            DEFAULT_REQUEST_TIMEOUT,
        )
        .expect("valid url");

        assert_eq!(config.api_base.as_str(), "https://api.openai.com/v1/");
        let endpoint = config.api_base.join("chat/completions").expect("joinable");
        assert_eq!(
            endpoint.as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_api_base_is_rejected() {
        assert!(RankerConfig::new("not a url", "key", "model", DEFAULT_REQUEST_TIMEOUT).is_err());
    }
}
