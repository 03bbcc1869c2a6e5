//! API client struct and builder.

use funcall_types::{
    Completion, CompletionError, CompletionPort, Conversation, FunctionSignature,
};

use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::{from_api_response, to_api_request};

/// Default model used when none is configured.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Implements [`CompletionPort`] for use anywhere a completion port is
/// accepted.
///
/// # Example
///
/// ```no_run
/// use funcall_provider_openai::OpenAi;
///
/// let port = OpenAi::new("sk-...")
///     .model("gpt-4o-mini")
///     .base_url("https://my-azure-deployment.example.com")
///     .organization("org-...");
/// ```
pub struct OpenAi {
    /// API key, sent as a bearer token.
    pub(crate) api_key: String,
    /// Deployment or model name.
    pub(crate) model: String,
    /// API base URL (override for testing, proxies, or Azure).
    pub(crate) base_url: String,
    /// Optional organization ID for multi-org accounts.
    pub(crate) organization: Option<String>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl OpenAi {
    /// Create a new client with the given API key and defaults.
    ///
    /// Default model: `gpt-4o`. Default base URL:
    /// `https://api.openai.com`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            organization: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the default model (in Azure, the deployment name).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the organization ID, sent as the `OpenAI-Organization`
    /// header on every request.
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Build the chat completions endpoint URL.
    pub(crate) fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl CompletionPort for OpenAi {
    async fn complete(
        &self,
        conversation: &Conversation,
        system: &str,
        signatures: &[FunctionSignature],
    ) -> Result<Completion, CompletionError> {
        let body = to_api_request(conversation, system, signatures, &self.model);

        tracing::debug!(
            model = %self.model,
            turns = conversation.len(),
            functions = signatures.len(),
            "sending completion request"
        );

        let mut request = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &text));
        }

        let json: serde_json::Value = response.json().await.map_err(map_reqwest_error)?;
        from_api_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_set() {
        let client = OpenAi::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
    }

    #[test]
    fn default_base_url_is_set() {
        let client = OpenAi::new("test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_model_and_base_url() {
        let client = OpenAi::new("test-key")
            .model("gpt-4o-mini")
            .base_url("http://localhost:9999");
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn organization_defaults_to_none() {
        assert!(OpenAi::new("test-key").organization.is_none());
        let client = OpenAi::new("test-key").organization("org-abc123");
        assert_eq!(client.organization, Some("org-abc123".to_string()));
    }

    #[test]
    fn completions_url_includes_path() {
        let client = OpenAi::new("test-key").base_url("http://localhost:9999");
        assert_eq!(
            client.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
