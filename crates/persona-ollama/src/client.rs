// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an Ollama-compatible server.

use std::time::Duration;

use persona_core::PersonaError;
use tracing::{debug, warn};

use crate::types::{ApiError, GenerateOptions, GenerateRequest, GenerateResponse};

/// Delay before the single retry of a transient failure.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Non-streaming `/api/generate` client with one retry on transient statuses.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OllamaClient {
    /// `timeout` bounds each HTTP attempt.
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, PersonaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersonaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: 1,
            retry_delay: RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one completion and return the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, PersonaError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };
        let url = format!("{}/api/generate", self.base_url);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generate request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| PersonaError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "generate response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| PersonaError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: GenerateResponse =
                    serde_json::from_str(&body).map_err(|e| PersonaError::Provider {
                        message: format!("failed to parse Ollama response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(parsed.response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PersonaError::Provider {
                    message: format!("Ollama returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_err) => format!("Ollama error ({status}): {}", api_err.error),
                Err(_) => format!("Ollama returned {status}: {body}"),
            };
            return Err(PersonaError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| PersonaError::Provider {
            message: "generate request failed after retries".into(),
            source: None,
        }))
    }

    /// `GET /api/tags`, used as a liveness probe.
    pub async fn ping(&self) -> Result<(), PersonaError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| PersonaError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PersonaError::Provider {
                message: format!("Ollama returned {}", response.status()),
                source: None,
            })
        }
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OllamaClient {
        OllamaClient::new(base_url, "llama3.2", Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
                "options": {"temperature": 0.0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "response": "it_expert",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = test_client(&server.uri()).generate("classify").await.unwrap();
        assert_eq!(text, "it_expert");
    }

    #[tokio::test]
    async fn trailing_slash_is_normalised() {
        let client = test_client("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[tokio::test]
    async fn generate_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "hr_expert"})),
            )
            .mount(&server)
            .await;

        let text = test_client(&server.uri()).generate("classify").await.unwrap();
        assert_eq!(text, "hr_expert");
    }

    #[tokio::test]
    async fn generate_exhausts_retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).generate("classify").await.unwrap_err();
        assert!(err.to_string().contains("429"), "got: {err}");
    }

    #[tokio::test]
    async fn generate_fails_fast_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'llama3.2' not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).generate("classify").await.unwrap_err();
        assert!(matches!(err, PersonaError::Provider { .. }));
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).generate("classify").await.unwrap_err();
        assert!(err.to_string().contains("failed to parse"), "got: {err}");
    }
}
