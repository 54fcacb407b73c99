//! services/api/src/adapters/summarizer.rs
//!
//! This module contains the adapter for the hosted summarization model.
//! It implements the `SummarizationService` port from the `core` crate by calling a
//! Hugging Face style inference endpoint: one request, one response, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use summarizer_core::{
    domain::SummaryParameters,
    ports::{PortError, PortResult, SummarizationService},
};
use tracing::{debug, error};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    min_length: i64,
    max_length: i64,
    do_sample: bool,
}

#[derive(Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SummarizationService` over HTTP.
#[derive(Clone)]
pub struct HuggingFaceSummarizer {
    client: Client,
    api_url: String,
    api_token: Option<String>,
}

impl HuggingFaceSummarizer {
    /// Creates a new `HuggingFaceSummarizer` whose requests give up after `timeout`.
    pub fn new(api_url: String, api_token: Option<String>, timeout: Duration) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url,
            api_token,
        })
    }
}

fn unavailable() -> PortError {
    PortError::ServiceUnavailable("Summary service temporarily unavailable".to_string())
}

//=========================================================================================
// `SummarizationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SummarizationService for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str, parameters: &SummaryParameters) -> PortResult<String> {
        let payload = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                min_length: parameters.min_length,
                max_length: parameters.max_length,
                do_sample: parameters.do_sample,
            },
        };

        let mut request = self.client.post(&self.api_url).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Summarization request failed: {}", e);
            unavailable()
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Summarization endpoint returned {}", status);
            return Err(unavailable());
        }

        let outputs: Vec<InferenceOutput> = response.json().await.map_err(|e| {
            error!("Summarization response could not be decoded: {}", e);
            unavailable()
        })?;

        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| {
                error!("Summarization endpoint returned no results");
                unavailable()
            })?;

        debug!(input_chars = text.chars().count(), summary_chars = summary.chars().count(), "Summarization complete");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> SummaryParameters {
        SummaryParameters {
            min_length: 50,
            max_length: 120,
            do_sample: false,
        }
    }

    fn summarizer(server: &MockServer, token: Option<&str>, timeout: Duration) -> HuggingFaceSummarizer {
        HuggingFaceSummarizer::new(
            format!("{}/models/bart", server.uri()),
            token.map(ToString::to_string),
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_inputs_and_parameters_and_reads_first_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/bart"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_json(json!({
                "inputs": "some long text",
                "parameters": {"min_length": 50, "max_length": 120, "do_sample": false}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"summary_text": "short"},
                {"summary_text": "ignored"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let result = summarizer(&server, Some("hf_test"), Duration::from_secs(5))
            .summarize("some long text", &params())
            .await
            .unwrap();

        assert_eq!(result, "short");
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
            .expect(1)
            .mount(&server)
            .await;

        let err = summarizer(&server, None, Duration::from_secs(5))
            .summarize("text", &params())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_or_empty_body_is_unavailable() {
        for body in [json!({"error": "nope"}), json!([]), json!([{"generated_text": "x"}])] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let err = summarizer(&server, None, Duration::from_secs(5))
                .summarize("text", &params())
                .await
                .unwrap_err();
            assert!(matches!(err, PortError::ServiceUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"summary_text": "late"}]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = summarizer(&server, None, Duration::from_millis(50))
            .summarize("text", &params())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let summarizer = HuggingFaceSummarizer::new(
            "http://127.0.0.1:9/models/bart".to_string(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = summarizer.summarize("text", &params()).await.unwrap_err();
        assert!(matches!(err, PortError::ServiceUnavailable(_)));
    }
}
