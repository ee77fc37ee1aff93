//! Mistral chat-completions provider

use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use super::traits::{CompletionProvider, ProviderError};
use crate::config::CompletionProviderSettings;
use crate::network::{HttpClient, ProviderRequest};
use crate::results::{AnswerResponse, SearchHit};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const NAME: &str = "mistral";

/// Mistral chat completions client
pub struct Mistral {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl Mistral {
    pub fn new(client: HttpClient, settings: &CompletionProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs_f64(settings.timeout),
        }
    }

    fn request(&self, query: &str, hits: &[SearchHit]) -> Result<ProviderRequest, ProviderError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: NAME.to_string(),
            })?;

        Ok(ProviderRequest {
            provider: NAME.to_string(),
            url: format!("{}/v1/chat/completions", self.base_url),
            api_key,
            body: json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": build_user_prompt(query, hits)},
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for Mistral {
    fn name(&self) -> &str {
        NAME
    }

    async fn answer(
        &self,
        query: &str,
        hits: &[SearchHit],
    ) -> Result<AnswerResponse, ProviderError> {
        let request = self.request(query, hits)?;
        let response = self
            .client
            .execute(request, self.timeout)
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json()?;
        let answer = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Decode {
                provider: NAME.to_string(),
                message: "completion contained no message content".to_string(),
            })?;

        Ok(AnswerResponse::from_hits(answer, hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, api_key: Option<&str>) -> Mistral {
        let settings = CompletionProviderSettings {
            base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        Mistral::new(HttpClient::new().unwrap(), &settings)
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn test_answer_with_sources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer m-key"))
            .and(body_partial_json(json!({
                "model": "mistral-large-latest",
                "max_tokens": 1000,
                "messages": [{"role": "system", "content": SYSTEM_PROMPT}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("## Answer")))
            .expect(1)
            .mount(&server)
            .await;

        let hits = vec![
            SearchHit::new("https://a.example", "A", "alpha"),
            SearchHit::new("https://b.example", "", "beta"),
        ];
        let mistral = provider(&server.uri(), Some("m-key"));
        let response = mistral.answer("what", &hits).await.unwrap();

        assert_eq!(response.answer, "## Answer");
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].title, "A");
        assert_eq!(response.sources[1].title, "https://b.example");
    }

    #[tokio::test]
    async fn test_empty_choices_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let mistral = provider(&server.uri(), Some("m-key"));
        let err = mistral.answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let mistral = provider("http://127.0.0.1:9", Some(""));
        let err = mistral.answer("q", &[]).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.provider(), "mistral");
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let mistral = provider(&server.uri(), Some("m-key"));
        let err = mistral.answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_slow_completion_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let settings = CompletionProviderSettings {
            base_url: server.uri(),
            api_key: Some("m-key".into()),
            timeout: 0.2,
            ..Default::default()
        };
        let mistral = Mistral::new(HttpClient::new().unwrap(), &settings);

        let err = mistral.answer("q", &[]).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.provider(), "mistral");
    }
}
