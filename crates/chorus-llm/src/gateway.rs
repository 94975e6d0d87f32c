//! Reqwest-backed gateway client for text and image generation.
//!
//! The gateway exposes two pass-through endpoints:
//!
//! - `POST /api/llm` `{prompt, add_context_from_internet, file_urls?,
//!   response_json_schema?}` → `{"text": …}` in plain mode, a structured
//!   object in schema mode
//! - `POST /api/image` `{prompt}` → `{"url": …}`
//!
//! Some gateway deployments wrap schema-mode replies in the `{"text": …}`
//! envelope with the object serialized inside; both forms are accepted.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::provider::{
    GenerateRequest, ImageProvider, ProviderError, ProviderResult, TextProvider,
};

/// Client for the generation gateway.
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self { base_url, client }
    }

    /// Build the `/api/llm` request body.
    fn build_body(request: &GenerateRequest, schema: Option<&Value>) -> Value {
        let mut body = json!({
            "prompt": request.prompt,
            "add_context_from_internet": request.open_domain,
        });
        if !request.file_refs.is_empty() {
            body["file_urls"] = json!(request.file_refs);
        }
        if let Some(schema) = schema {
            body["response_json_schema"] = schema.clone();
        }
        body
    }

    /// POST a body and return the parsed 2xx JSON reply.
    async fn post_json(&self, path: &str, body: &Value) -> ProviderResult<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextProvider for GatewayClient {
    #[instrument(skip_all, fields(open_domain = request.open_domain, files = request.file_refs.len()))]
    async fn generate(&self, request: GenerateRequest) -> ProviderResult<String> {
        debug!(prompt_bytes = request.prompt.len(), "sending generation request");
        let body = Self::build_body(&request, None);
        let reply = self.post_json("/api/llm", &body).await?;

        reply
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::Malformed {
                message: "reply has no text field".into(),
            })
    }

    #[instrument(skip_all, fields(open_domain = request.open_domain))]
    async fn generate_structured(
        &self,
        request: GenerateRequest,
        schema: Value,
    ) -> ProviderResult<Value> {
        debug!(prompt_bytes = request.prompt.len(), "sending structured generation request");
        let body = Self::build_body(&request, Some(&schema));
        let reply = self.post_json("/api/llm", &body).await?;

        // Unwrap the text envelope when the structured object was serialized
        // inside it; otherwise the reply is the object.
        if let Some(text) = reply.get("text").and_then(Value::as_str) {
            if let Ok(inner) = serde_json::from_str::<Value>(text) {
                return Ok(inner);
            }
        }
        Ok(reply)
    }
}

#[async_trait]
impl ImageProvider for GatewayClient {
    #[instrument(skip_all)]
    async fn generate_image(&self, prompt: &str) -> ProviderResult<String> {
        let body = json!({ "prompt": prompt });
        let reply = self.post_json("/api/image", &body).await?;

        reply
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::Malformed {
                message: "reply has no url field".into(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
