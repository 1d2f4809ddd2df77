use async_trait::async_trait;
use glowbot_core::{ChatModel, Embedder, PromptMessage, ToolInvocation, ToolSpec};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::retry::retry_with_backoff;

/// OpenAI-compatible chat/embeddings provider.
///
/// Model names and the base URL come from configuration, so any endpoint
/// speaking the same wire format works.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// Precision loss is acceptable for embedding values.
    #[expect(clippy::cast_possible_truncation, reason = "embeddings use f32")]
    const fn f64_to_f32(x: f64) -> f32 {
        x as f32
    }

    pub fn new(api_key: String, model: String) -> Self {
        info!("Creating OpenAiProvider for model {model}");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.2,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_embedding_model(mut self, embedding_model: String) -> Self {
        self.embedding_model = embedding_model;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn try_send(&self, request: &Value) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(response)
    }

    fn parse_content(response: &Value) -> anyhow::Result<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))
    }

    fn parse_tool_call(response: &Value) -> anyhow::Result<ToolInvocation> {
        let call = &response["choices"][0]["message"]["tool_calls"][0];
        let name = call["function"]["name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing tool call name"))?;
        let raw_arguments = call["function"]["arguments"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing tool arguments"))?;
        let arguments: Value = serde_json::from_str(raw_arguments)?;
        Ok(ToolInvocation {
            tool: name.to_string(),
            arguments,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    async fn invoke(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
        });

        info!("Sending chat request: model={}", self.model);

        // Backoff ladder: 2s, 4s, 6s, 8s, then 10s x 3.
        let base_delays: [u64; 4] = [2, 4, 6, 8];
        let final_retries = 3;

        let response =
            retry_with_backoff(|| self.try_send(&request), &base_delays, final_retries).await?;

        Self::parse_content(&response)
    }

    async fn invoke_with_forced_tool(
        &self,
        messages: &[PromptMessage],
        tool: &ToolSpec,
    ) -> anyhow::Result<ToolInvocation> {
        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
            "tools": [tool.definition()],
            "tool_choice": {
                "type": "function",
                "function": { "name": tool.name }
            },
        });

        info!("Sending forced-tool request: model={} tool={}", self.model, tool.name);

        let base_delays: [u64; 4] = [2, 4, 6, 8];
        let final_retries = 3;

        let response =
            retry_with_backoff(|| self.try_send(&request), &base_delays, final_retries).await?;

        Self::parse_tool_call(&response)
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.embedding_model,
                "input": text,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let embedding = response["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing embedding"))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(Self::f64_to_f32)
                    .ok_or_else(|| anyhow::anyhow!("Invalid embedding value"))
            })
            .collect::<Result<Vec<f32>, _>>()?;

        Ok(embedding)
    }
}
