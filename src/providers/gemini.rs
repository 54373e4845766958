use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use super::{join_url, read_json};
use crate::error::{ApiError, Result};

const SERVICE: &str = "gemini";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content,
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: ClientWithMiddleware,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        http: ClientWithMiddleware,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Runs one completion and returns the concatenated text of the first candidate.
    pub async fn generate_json(&self, system: &str, contents: &[Content]) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::config("GEMINI_API_KEY is not set"))?;

        let body = GenerateRequest {
            system_instruction: Content::text(None, system),
            contents,
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.4,
            },
        };
        let url = join_url(
            &self.base_url,
            &format!("/v1beta/models/{}:generateContent", self.model),
        );
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;
        let out: GenerateResponse = read_json(SERVICE, resp).await?;
        first_text(out)
    }
}

fn first_text(resp: GenerateResponse) -> Result<String> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(ApiError::parse("model returned no candidates"));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(ApiError::parse(format!(
            "model returned empty content (finishReason={reason})"
        )));
    }
    Ok(text)
}
